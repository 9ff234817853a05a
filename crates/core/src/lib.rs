//! `gestor-core` — shared identifiers and domain errors.
//!
//! This crate is intentionally free of IO, HTTP, and storage concerns.

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{RequestId, TenantId, UserId};
