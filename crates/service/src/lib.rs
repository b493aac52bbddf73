//! Fineflow Service - the wired-up compliance system
//!
//! [`ComplianceService`] composes the lifecycle engine, the
//! contestation workflow and the impound manager over one shared
//! record store and one shared audit chain. This crate owns all
//! cross-component coordination; the engines never call each other.

pub mod error;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use service::{ComplianceService, ContraventionTicket};
