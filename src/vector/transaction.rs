use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::errors::Result;
use crate::vector::native::NativeStore;

/// Represents an in-flight transaction on a store.
///
/// It can either be committed by calling [`commit`](Transaction::commit) or rolled back by
/// calling [`rollback`](Transaction::rollback).
///
/// If the transaction is not explicitly committed when it is dropped, it is implicitly rolled
/// back.
#[derive(Debug)]
pub(crate) struct Transaction<'a, S: NativeStore> {
    store: &'a mut S,
    rollback_on_drop: bool,
}

impl<'a, S: NativeStore> Transaction<'a, S> {
    pub(crate) fn start(store: &'a mut S) -> Result<Self> {
        store.start_transaction()?;
        Ok(Transaction {
            store,
            rollback_on_drop: true,
        })
    }

    /// Commits this transaction.
    ///
    /// Records committed by earlier transactions stay committed if this fails.
    pub(crate) fn commit(mut self) -> Result<()> {
        self.rollback_on_drop = false;
        self.store.commit_transaction()
    }

    /// Rolls back the store to its state before the start of this transaction.
    pub(crate) fn rollback(mut self) -> Result<()> {
        self.rollback_on_drop = false;
        self.store.rollback_transaction()
    }
}

impl<S: NativeStore> Deref for Transaction<'_, S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        self.store
    }
}

impl<S: NativeStore> DerefMut for Transaction<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.store
    }
}

impl<S: NativeStore> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        if self.rollback_on_drop {
            // We silently swallow any errors, because we have no way to report them from a
            // drop function apart from panicking.
            if let Err(e) = self.store.rollback_transaction() {
                warn!("Implicit rollback failed: {e}");
            }
        }
    }
}
