//! The operation chokepoint.
//!
//! Every read/write is an [`Operation`] value executed by a [`DataStore`].
//! Keeping the operation reified (entity kind + operation kind + arguments)
//! is what lets one decorator rewrite all data access uniformly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entity::Entity;
use crate::error::StoreError;
use crate::filter::Filter;

/// A write payload for update operations.
#[derive(Debug, Clone)]
pub enum Patch<E: Entity> {
    /// Entity-specific field changes.
    Fields(E::Update),
    /// Set `deleted_at = at, active = false` (the delete rewrite).
    SoftDelete { at: DateTime<Utc> },
}

/// One data-access operation against entity kind `E`.
#[derive(Debug, Clone)]
pub enum Operation<E: Entity> {
    /// Direct lookup by unique key.
    FindUnique { key: E::Key },
    /// First row matching a filter.
    FindFirst { filter: Filter<E> },
    /// All rows matching a filter.
    FindMany { filter: Filter<E> },
    /// Count of rows matching a filter.
    Count { filter: Filter<E> },
    /// Insert a row.
    Create { row: E },
    /// Patch the first row matching a filter.
    Update { filter: Filter<E>, patch: Patch<E> },
    /// Patch every row matching a filter.
    UpdateMany { filter: Filter<E>, patch: Patch<E> },
    /// Remove the first row matching a filter.
    Delete { filter: Filter<E> },
    /// Remove every row matching a filter.
    DeleteMany { filter: Filter<E> },
}

impl<E: Entity> Operation<E> {
    /// Operation-kind name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::FindUnique { .. } => "find_unique",
            Operation::FindFirst { .. } => "find_first",
            Operation::FindMany { .. } => "find_many",
            Operation::Count { .. } => "count",
            Operation::Create { .. } => "create",
            Operation::Update { .. } => "update",
            Operation::UpdateMany { .. } => "update_many",
            Operation::Delete { .. } => "delete",
            Operation::DeleteMany { .. } => "delete_many",
        }
    }
}

/// Result of executing an [`Operation`].
#[derive(Debug, Clone)]
pub enum Outcome<E: Entity> {
    /// FindUnique / FindFirst / Update / Delete.
    One(Option<E>),
    /// FindMany.
    Many(Vec<E>),
    /// Count / UpdateMany / DeleteMany (affected-row count).
    Count(u64),
    /// Create.
    Created(E),
}

impl<E: Entity> Outcome<E> {
    pub fn into_one(self) -> Result<Option<E>, StoreError> {
        match self {
            Outcome::One(row) => Ok(row),
            other => Err(shape_error::<E>("One", &other)),
        }
    }

    pub fn into_many(self) -> Result<Vec<E>, StoreError> {
        match self {
            Outcome::Many(rows) => Ok(rows),
            other => Err(shape_error::<E>("Many", &other)),
        }
    }

    pub fn into_count(self) -> Result<u64, StoreError> {
        match self {
            Outcome::Count(n) => Ok(n),
            other => Err(shape_error::<E>("Count", &other)),
        }
    }

    pub fn into_created(self) -> Result<E, StoreError> {
        match self {
            Outcome::Created(row) => Ok(row),
            other => Err(shape_error::<E>("Created", &other)),
        }
    }

    fn variant(&self) -> &'static str {
        match self {
            Outcome::One(_) => "One",
            Outcome::Many(_) => "Many",
            Outcome::Count(_) => "Count",
            Outcome::Created(_) => "Created",
        }
    }
}

fn shape_error<E: Entity>(expected: &str, got: &Outcome<E>) -> StoreError {
    StoreError::Internal(format!(
        "unexpected outcome shape for {}: expected {expected}, got {}",
        E::KIND,
        got.variant()
    ))
}

/// Storage backend seam.
///
/// Implemented by the in-memory reference backend, by decorators
/// ([`crate::ScopedStore`], [`crate::ResilientStore`]), and by whatever a
/// real SQL backend would look like.
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    async fn execute<E: Entity>(&self, op: Operation<E>) -> Result<Outcome<E>, StoreError>;
}
