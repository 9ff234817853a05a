//! `gestor-store` — data access layer with tenant scoping and soft deletes.
//!
//! Every entity read/write flows through a single chokepoint
//! ([`op::Operation`] executed by a [`DataStore`]). The
//! [`scoped::ScopedStore`] decorator rewrites operations before they reach
//! the backend: tenant filters for tenant-scoped entities, default
//! soft-delete visibility, and delete-to-update rewrites. Repositories never
//! need to remember any of that — and cannot forget it.
//!
//! The rules an entity participates in are declared as compile-time
//! capability tags on its [`entity::Entity`] impl, not looked up by name at
//! runtime.

pub mod entity;
pub mod error;
pub mod filter;
pub mod memory;
pub mod op;
pub mod records;
pub mod resilient;
pub mod scoped;

pub use entity::Entity;
pub use error::StoreError;
pub use filter::{DeletedAtClause, FieldValue, Filter};
pub use memory::MemoryStore;
pub use op::{DataStore, Operation, Outcome, Patch};
pub use resilient::{BreakerConfig, ResilientStore};
pub use scoped::ScopedStore;
