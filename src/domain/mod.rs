//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no SeaORM, no Axum).
//! Only trait definitions, domain types and domain error types.

pub mod actor;
pub mod bulk_operation;
pub mod errors;
pub mod figure;
pub mod repositories;

pub use actor::{Actor, Capability, IdentityProvider, UserRole};
pub use bulk_operation::*;
pub use errors::{DomainError, ValidationErrors, NON_FIELD_ERRORS};
pub use figure::{Figure, FigureRole, ReviewStatus};
pub use repositories::*;
