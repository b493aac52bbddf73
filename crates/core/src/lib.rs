//! Fineflow Core - Domain types
//!
//! This crate contains the fundamental types used across Fineflow:
//! - `Amount`: Non-negative decimal wrapper for monetary values
//! - `Actor` / `Role`: identity and the closed set of operator roles
//! - `Clock`: injectable time source so every component is testable
//! - `SystemConfig`: immutable-per-period configuration value

pub mod actor;
pub mod amount;
pub mod clock;
pub mod config;

pub use actor::{Actor, Role};
pub use amount::Amount;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::SystemConfig;
