//! In-memory backend.
//!
//! Reference implementation of [`DataStore`], intended for tests/dev; a SQL
//! backend would implement the same trait. Note this layer is deliberately
//! dumb: it executes operations verbatim — including physical deletes —
//! because all scoping policy lives in [`crate::ScopedStore`].

use std::any::Any;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::entity::Entity;
use crate::error::StoreError;
use crate::op::{DataStore, Operation, Outcome, Patch};

type Table = Box<dyn Any + Send + Sync>;

/// In-memory table-per-entity-kind store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows directly, bypassing all decorators (test/seed helper).
    pub fn seed<E: Entity>(&self, rows: impl IntoIterator<Item = E>) {
        let Ok(mut tables) = self.tables.write() else {
            return;
        };
        let table = tables
            .entry(E::KIND)
            .or_insert_with(|| Box::new(Vec::<E>::new()));
        if let Some(table) = table.downcast_mut::<Vec<E>>() {
            table.extend(rows);
        }
    }

    /// Snapshot of every row of `E`, regardless of tenant or soft-delete
    /// state (assertion helper).
    pub fn rows<E: Entity>(&self) -> Vec<E> {
        self.tables
            .read()
            .ok()
            .and_then(|tables| {
                tables
                    .get(E::KIND)
                    .and_then(|t| t.downcast_ref::<Vec<E>>())
                    .cloned()
            })
            .unwrap_or_default()
    }

    fn with_table<E: Entity, R>(
        &self,
        f: impl FnOnce(&mut Vec<E>) -> R,
    ) -> Result<R, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))?;
        let table = tables
            .entry(E::KIND)
            .or_insert_with(|| Box::new(Vec::<E>::new()));
        let table = table
            .downcast_mut::<Vec<E>>()
            .ok_or_else(|| StoreError::Internal(format!("table type mismatch for {}", E::KIND)))?;
        Ok(f(table))
    }
}

fn apply_patch<E: Entity>(row: &mut E, patch: &Patch<E>) {
    match patch {
        Patch::Fields(update) => row.apply_update(update),
        Patch::SoftDelete { at } => row.mark_deleted(*at),
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn execute<E: Entity>(&self, op: Operation<E>) -> Result<Outcome<E>, StoreError> {
        match op {
            Operation::FindUnique { key } => self.with_table(|table: &mut Vec<E>| {
                Outcome::One(table.iter().find(|row| row.key() == key).cloned())
            }),
            Operation::FindFirst { filter } => self.with_table(|table: &mut Vec<E>| {
                Outcome::One(table.iter().find(|row| filter.matches(row)).cloned())
            }),
            Operation::FindMany { filter } => self.with_table(|table: &mut Vec<E>| {
                Outcome::Many(
                    table
                        .iter()
                        .filter(|row| filter.matches(row))
                        .cloned()
                        .collect(),
                )
            }),
            Operation::Count { filter } => self.with_table(|table: &mut Vec<E>| {
                Outcome::Count(table.iter().filter(|row| filter.matches(row)).count() as u64)
            }),
            Operation::Create { row } => self.with_table(|table: &mut Vec<E>| {
                table.push(row.clone());
                Outcome::Created(row)
            }),
            Operation::Update { filter, patch } => self.with_table(|table: &mut Vec<E>| {
                match table.iter_mut().find(|row| filter.matches(row)) {
                    Some(row) => {
                        apply_patch(row, &patch);
                        Outcome::One(Some(row.clone()))
                    }
                    None => Outcome::One(None),
                }
            }),
            Operation::UpdateMany { filter, patch } => self.with_table(|table: &mut Vec<E>| {
                let mut affected = 0u64;
                for row in table.iter_mut().filter(|row| filter.matches(row)) {
                    apply_patch(row, &patch);
                    affected += 1;
                }
                Outcome::Count(affected)
            }),
            Operation::Delete { filter } => self.with_table(|table: &mut Vec<E>| {
                match table.iter().position(|row| filter.matches(row)) {
                    Some(idx) => Outcome::One(Some(table.remove(idx))),
                    None => Outcome::One(None),
                }
            }),
            Operation::DeleteMany { filter } => self.with_table(|table: &mut Vec<E>| {
                let before = table.len();
                table.retain(|row| !filter.matches(row));
                Outcome::Count((before - table.len()) as u64)
            }),
        }
    }
}
