//! Fineflow Catalog - violation reference data
//!
//! Administrator-owned, effectively immutable at evaluation time.
//! The catalog is built once at startup and handed to the engines;
//! amount ranges, aggravation parameters and impound flags all come
//! from here.

pub mod catalog;
pub mod error;
pub mod violation;

pub use catalog::InfractionCatalog;
pub use error::CatalogError;
pub use violation::{ViolationCategory, ViolationType};
