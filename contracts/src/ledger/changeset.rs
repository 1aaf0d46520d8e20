//! Staged account mutations.
//!
//! A [`Changeset`] reads through to the committed account map but writes
//! into its own overlay. Operations (and every step of a batch) run against
//! the overlay; the ledger commits it only when the whole operation has been
//! admitted. Dropping a changeset discards everything it staged.

use std::collections::HashMap;

use super::account::{AccountState, Address, Amount};
use super::error::LedgerError;

/// Copy-on-write view over the committed accounts.
pub(crate) struct Changeset<'a> {
    committed: &'a HashMap<Address, AccountState>,
    staged: HashMap<Address, AccountState>,
}

impl<'a> Changeset<'a> {
    pub(crate) fn new(committed: &'a HashMap<Address, AccountState>) -> Self {
        Self {
            committed,
            staged: HashMap::new(),
        }
    }

    /// Current view of `address`: staged value, else committed, else zero.
    pub(crate) fn get(&self, address: &Address) -> AccountState {
        self.staged
            .get(address)
            .or_else(|| self.committed.get(address))
            .copied()
            .unwrap_or_default()
    }

    fn entry(&mut self, address: &Address) -> &mut AccountState {
        let committed = self.committed;
        self.staged
            .entry(address.clone())
            .or_insert_with(|| committed.get(address).copied().unwrap_or_default())
    }

    /// Removes `amount` from `from`, admitted against its unlocked balance.
    pub(crate) fn debit_unlocked(
        &mut self,
        from: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let account = self.entry(from);
        let unlocked = account.unlocked();
        if amount > unlocked {
            return Err(LedgerError::InsufficientUnlockedBalance {
                account: from.clone(),
                unlocked,
                requested: amount,
            });
        }
        account.balance -= amount;
        Ok(())
    }

    /// Adds `amount` to the balance of `to`.
    pub(crate) fn credit(&mut self, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        let account = self.entry(to);
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                account: to.clone(),
                amount,
            })?;
        Ok(())
    }

    /// Standard transfer: unlocked-balance admission, locks untouched.
    pub(crate) fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.debit_unlocked(from, amount)?;
        self.credit(to, amount)
    }

    pub(crate) fn lock(&mut self, address: &Address, amount: Amount) -> Result<(), LedgerError> {
        let account = self.entry(address);
        match account.locked.checked_add(amount) {
            Some(locked) if locked <= account.balance => {
                account.locked = locked;
                Ok(())
            }
            _ => Err(LedgerError::LockExceedsBalance {
                account: address.clone(),
                balance: account.balance,
                locked: account.locked,
                requested: amount,
            }),
        }
    }

    pub(crate) fn unlock(&mut self, address: &Address, amount: Amount) -> Result<(), LedgerError> {
        let account = self.entry(address);
        if amount > account.locked {
            return Err(LedgerError::UnlockExceedsLocked {
                account: address.clone(),
                locked: account.locked,
                requested: amount,
            });
        }
        account.locked -= amount;
        Ok(())
    }

    /// Transfer immediately followed by a lock of the full amount on `to`.
    pub(crate) fn transfer_and_lock(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.transfer(from, to, amount)?;
        self.lock(to, amount)
    }

    /// Moves `amount` of `holder`'s locked units to `controller`.
    ///
    /// Both `balance` and `locked` of the holder drop by `amount`; the
    /// holder's unlocked balance is unchanged.
    pub(crate) fn recall(
        &mut self,
        holder: &Address,
        controller: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.unlock(holder, amount)?;
        let account = self.entry(holder);
        // locked <= balance held before the unlock, so this cannot underflow.
        account.balance -= amount;
        self.credit(controller, amount)
    }

    /// Hands the staged overlay to the ledger for commit.
    pub(crate) fn into_staged(self) -> HashMap<Address, AccountState> {
        self.staged
    }
}
