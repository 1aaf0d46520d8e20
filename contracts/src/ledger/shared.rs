//! Thread-safe handle to a single ledger.
//!
//! Every mutating call takes the write lock for its whole admission and
//! commit, so concurrent callers are applied one at a time and no reader
//! ever sees a half-applied batch.

use std::sync::Arc;

use parking_lot::RwLock;

use super::account::{AccountState, Address, Amount};
use super::engine::{Ledger, LedgerSnapshot};
use super::error::LedgerError;
use super::operation::Operation;

/// Cloneable, `Send + Sync` wrapper around a [`Ledger`].
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    /// Takes ownership of `ledger`.
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Applies `op` for `caller` under the write lock.
    pub fn execute(&self, caller: &Address, op: &Operation) -> Result<(), LedgerError> {
        self.inner.write().execute(caller, op)
    }

    /// Runs `f` against a consistent read-only view.
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Balance and lock figures for `address`.
    pub fn account(&self, address: &Address) -> AccountState {
        self.inner.read().account(address)
    }

    /// Total units owned by `address`.
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.inner.read().balance_of(address)
    }

    /// Units of `address` the owner cannot move.
    pub fn locked_of(&self, address: &Address) -> Amount {
        self.inner.read().locked_of(address)
    }

    /// Units of `address` the owner may transfer.
    pub fn unlocked_of(&self, address: &Address) -> Amount {
        self.inner.read().unlocked_of(address)
    }

    /// Copies the ledger under the read lock.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.read().snapshot()
    }

    /// See [`Ledger::check_invariants`].
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        self.inner.read().check_invariants()
    }
}
