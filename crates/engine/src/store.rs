use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use kvgate_common::Datum;
use tracing::trace;

use crate::error::CommandError;
use crate::value::{Entry, Value, ValueKind};

/// Concurrent key → value mapping with the command dispatch table on top.
///
/// The top-level map is sharded, so insertion and deletion of one key never
/// serialise reads of unrelated keys. Each entry carries its own mutex; see
/// `Entry`. Cloning is cheap and shares the pool.
#[derive(Debug, Default, Clone)]
pub struct Store {
    pool: Arc<DashMap<String, Arc<Entry>>>,
}

impl Store {
    pub fn new() -> Store {
        Store::default()
    }

    /// Runs one command against the store. The name is case-folded; unknown
    /// names report `UnsupportedCommand`.
    pub fn execute(&self, cmd: &str, args: &[Datum]) -> Result<Datum, CommandError> {
        crate::commands::execute(self, cmd, args)
    }

    /// Looks a key up, treating a dead entry as absent and removing it as a
    /// side effect of the lookup.
    pub(crate) fn live_entry(&self, key: &str) -> Option<Arc<Entry>> {
        let cell = self.pool.get(key)?.clone();
        if cell.is_alive() {
            return Some(cell);
        }
        trace!(key, "removing expired entry");
        self.pool
            .remove_if(key, |_, c| Arc::ptr_eq(c, &cell) && !c.is_alive());
        None
    }

    /// Looks a key up for a write of variant `kind`, creating an empty value
    /// of that variant when the key is absent or dead. A live value of a
    /// different variant is never replaced; that is a type mismatch.
    pub(crate) fn ensure(&self, key: &str, kind: ValueKind) -> Result<Arc<Entry>, CommandError> {
        loop {
            let cell = self
                .pool
                .entry(key.to_owned())
                .or_insert_with(|| Arc::new(Entry::new(kind)))
                .clone();
            if cell.is_alive() {
                if cell.kind() == kind {
                    return Ok(cell);
                }
                return Err(CommandError::TypeMismatch);
            }
            // Dead leftover; drop it and retry so the caller gets a fresh
            // value of the expected variant.
            self.pool.remove_if(key, |_, c| Arc::ptr_eq(c, &cell));
        }
    }

    /// Creates a scalar holding `datum` unless a live entry already exists.
    /// Returns whether the write happened; an existing live non-scalar is a
    /// type mismatch.
    pub(crate) fn set_if_absent(&self, key: &str, datum: Datum) -> Result<bool, CommandError> {
        loop {
            let existing = match self.pool.entry(key.to_owned()) {
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(Arc::new(Entry::from_value(Value::Scalar(datum.clone()))));
                    return Ok(true);
                }
                dashmap::mapref::entry::Entry::Occupied(slot) => slot.get().clone(),
            };
            if existing.is_alive() {
                if existing.kind() == ValueKind::Scalar {
                    return Ok(false);
                }
                return Err(CommandError::TypeMismatch);
            }
            self.pool.remove_if(key, |_, c| Arc::ptr_eq(c, &existing));
        }
    }

    /// Removes a key. Reports true only when a live entry was dropped; an
    /// expired leftover counts as already absent.
    pub(crate) fn remove(&self, key: &str) -> bool {
        match self.pool.remove(key) {
            Some((_, cell)) => cell.is_alive(),
            None => false,
        }
    }

    /// Installs `members` as the destination of a *STORE operation. This is
    /// the one write path allowed to reassign a key's variant.
    pub(crate) fn replace_set(&self, key: &str, members: HashSet<Datum>) {
        self.pool
            .insert(key.to_owned(), Arc::new(Entry::from_value(Value::Set(members))));
    }

    /// Snapshot of one set operand: absent or dead reads as empty, a live
    /// value of another variant is a type mismatch.
    pub(crate) fn set_snapshot(&self, key: &str) -> Result<HashSet<Datum>, CommandError> {
        match self.live_entry(key) {
            None => Ok(HashSet::new()),
            Some(cell) => {
                if cell.kind() != ValueKind::Set {
                    return Err(CommandError::TypeMismatch);
                }
                Ok(cell.with_value(|v| v.set_snapshot()))
            }
        }
    }

    /// Read-side entry access with the variant tag check applied: absent or
    /// dead yields `Ok(None)`, a live entry of the wrong variant is a type
    /// mismatch.
    pub(crate) fn read_entry(
        &self,
        key: &str,
        kind: ValueKind,
    ) -> Result<Option<Arc<Entry>>, CommandError> {
        match self.live_entry(key) {
            None => Ok(None),
            Some(cell) => {
                if cell.kind() != kind {
                    return Err(CommandError::TypeMismatch);
                }
                Ok(Some(cell))
            }
        }
    }
}
