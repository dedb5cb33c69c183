//! Domain layer - Pure business abstractions
//!
//! Repository contracts, domain value types and the domain error type.
//! Storage is reached only through the traits in `repositories`.

pub mod errors;
pub mod repositories;
pub mod types;

pub use errors::{DomainError, is_unique_violation};
pub use repositories::*;
pub use types::*;
