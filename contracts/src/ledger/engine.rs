//! The [`Ledger`] state machine.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::account::{AccountState, Address, Amount};
use super::changeset::Changeset;
use super::error::LedgerError;
use crate::config::TokenConfig;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Descriptive fields fixed at deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Human-readable token name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Decimal precision used to scale the initial supply.
    pub decimals: u8,
    /// Total supply in base units. Constant for the life of the ledger.
    pub total_supply: Amount,
    /// The privileged identity.
    pub controller: Address,
    /// When the ledger was constructed.
    pub deployed_at: DateTime<Utc>,
}

/// Point-in-time copy of the whole ledger, accounts sorted by address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Token metadata.
    pub metadata: TokenMetadata,
    /// Every materialized account.
    pub accounts: BTreeMap<Address, AccountState>,
    /// Non-zero allowances, `owner -> spender -> remaining`.
    pub allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
}

/// The lockable token ledger.
///
/// Holds per-account balances and locked amounts. Every mutating operation
/// stages its writes in a [`Changeset`] and commits them only after the
/// whole operation is admitted, so a rejected call leaves no trace.
///
/// `Ledger` is single-writer by construction (`&mut self`). Share it across
/// threads through [`SharedLedger`](super::SharedLedger).
#[derive(Debug, Clone)]
pub struct Ledger {
    metadata: TokenMetadata,
    accounts: HashMap<Address, AccountState>,
    /// `(owner, spender) -> remaining allowance`.
    allowances: HashMap<(Address, Address), Amount>,
}

impl Ledger {
    /// Validates `config` and creates a ledger whose initial owner holds the
    /// entire scaled supply and acts as controller.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidConfig`] for empty name, symbol or
    /// owner, [`LedgerError::InvalidAmount`] for out-of-range decimals and
    /// [`LedgerError::SupplyOverflow`] if the scaled supply overflows.
    pub fn deploy(config: &TokenConfig) -> Result<Self, LedgerError> {
        let total_supply = config.validate()?;
        let controller = config.initial_owner.clone();

        let mut accounts = HashMap::new();
        accounts.insert(controller.clone(), AccountState::with_balance(total_supply));

        info!(
            name = %config.name,
            symbol = %config.symbol,
            decimals = config.decimals,
            total_supply = %total_supply,
            controller = %controller,
            "ledger deployed"
        );

        Ok(Self {
            metadata: TokenMetadata {
                name: config.name.clone(),
                symbol: config.symbol.clone(),
                decimals: config.decimals,
                total_supply,
                controller,
                deployed_at: Utc::now(),
            },
            accounts,
            allowances: HashMap::new(),
        })
    }

    /// Convenience constructor taking the deployment parameters directly.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        initial_supply: u64,
        decimals: u8,
        initial_owner: impl Into<Address>,
    ) -> Result<Self, LedgerError> {
        Self::deploy(&TokenConfig {
            name: name.into(),
            symbol: symbol.into(),
            initial_supply,
            decimals,
            initial_owner: initial_owner.into(),
        })
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    /// Token name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    /// Decimal precision.
    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    /// Total supply in base units.
    pub fn total_supply(&self) -> Amount {
        self.metadata.total_supply
    }

    /// The privileged identity.
    pub fn controller(&self) -> &Address {
        &self.metadata.controller
    }

    /// All deployment-time fields.
    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Balance and lock figures for `address` (zero if never referenced).
    pub fn account(&self, address: &Address) -> AccountState {
        self.accounts.get(address).copied().unwrap_or_default()
    }

    /// Total units owned by `address`.
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.account(address).balance
    }

    /// Units of `address` the owner cannot move.
    pub fn locked_of(&self, address: &Address) -> Amount {
        self.account(address).locked
    }

    /// Units of `address` the owner may transfer: `balance - locked`.
    pub fn unlocked_of(&self, address: &Address) -> Amount {
        self.account(address).unlocked()
    }

    /// Remaining amount `spender` may move out of `owner`.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Iterates over every materialized account, in no particular order.
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &AccountState)> {
        self.accounts.iter()
    }

    /// Copies the ledger into a serializable, deterministically ordered form.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut allowances: BTreeMap<Address, BTreeMap<Address, Amount>> = BTreeMap::new();
        for ((owner, spender), &amount) in &self.allowances {
            allowances
                .entry(owner.clone())
                .or_default()
                .insert(spender.clone(), amount);
        }

        LedgerSnapshot {
            metadata: self.metadata.clone(),
            accounts: self
                .accounts
                .iter()
                .map(|(address, state)| (address.clone(), *state))
                .collect(),
            allowances,
        }
    }

    /// Verifies `locked <= balance` for every account and that balances sum
    /// to the total supply.
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        let mut sum: Amount = 0;
        for (address, state) in &self.accounts {
            if !state.is_consistent() {
                return Err(LedgerError::InvariantViolation(format!(
                    "{} has {} locked but only {} balance",
                    address, state.locked, state.balance
                )));
            }
            sum = sum.checked_add(state.balance).ok_or_else(|| {
                LedgerError::InvariantViolation("sum of balances overflows u128".into())
            })?;
        }
        if sum != self.metadata.total_supply {
            return Err(LedgerError::InvariantViolation(format!(
                "balances sum to {} but total supply is {}",
                sum, self.metadata.total_supply
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Holder operations
    // -----------------------------------------------------------------------

    /// Moves `amount` from `caller` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientUnlockedBalance`] if `amount`
    /// exceeds the caller's unlocked balance. Locked units never count.
    pub fn transfer(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.stage("transfer", |changes| changes.transfer(caller, to, amount))?;
        debug!(caller = %caller, to = %to, amount = %amount, "transfer committed");
        Ok(())
    }

    /// Sets the amount `spender` may move out of `caller` via
    /// [`transfer_from`](Self::transfer_from). Overwrites any prior value;
    /// approving zero revokes.
    pub fn approve(
        &mut self,
        caller: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.set_allowance(caller, spender, amount);
        debug!(owner = %caller, spender = %spender, amount = %amount, "allowance set");
        Ok(())
    }

    /// Moves `amount` from `from` to `to` on behalf of `from`, spending the
    /// caller's allowance.
    ///
    /// The unlocked-balance rule applies exactly as for [`transfer`](Self::transfer):
    /// an allowance never grants access to locked units. An allowance of
    /// `Amount::MAX` is treated as unlimited and is not decremented.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientAllowance`] or
    /// [`LedgerError::InsufficientUnlockedBalance`].
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let allowance = self.allowance(from, caller);
        if amount > allowance {
            let err = LedgerError::InsufficientAllowance {
                owner: from.clone(),
                spender: caller.clone(),
                allowance,
                requested: amount,
            };
            debug!(op = "transfer_from", error = %err, "operation rejected");
            return Err(err);
        }

        self.stage("transfer_from", |changes| changes.transfer(from, to, amount))?;
        if allowance != Amount::MAX {
            self.set_allowance(from, caller, allowance - amount);
        }
        debug!(
            spender = %caller,
            from = %from,
            to = %to,
            amount = %amount,
            "transfer_from committed"
        );
        Ok(())
    }

    /// Applies `transfer(caller, recipients[i], amounts[i])` in order, all or
    /// nothing.
    ///
    /// Each step is admitted against the caller's unlocked balance as left
    /// by the previous steps, including steps that send back to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::LengthMismatch`] if the slices differ in
    /// length, otherwise the error of the first failing step. Nothing is
    /// committed on error.
    pub fn batch_transfer(
        &mut self,
        caller: &Address,
        recipients: &[Address],
        amounts: &[Amount],
    ) -> Result<(), LedgerError> {
        ensure_same_length(recipients, amounts)?;
        self.stage("batch_transfer", |changes| {
            for (index, (to, &amount)) in recipients.iter().zip(amounts).enumerate() {
                changes
                    .transfer(caller, to, amount)
                    .map_err(|err| abort_batch("batch_transfer", index, err))?;
            }
            Ok(())
        })?;
        debug!(caller = %caller, steps = recipients.len(), "batch_transfer committed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Controller operations
    // -----------------------------------------------------------------------

    /// Locks `amount` more of `account`'s balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] unless `caller` is the
    /// controller, and [`LedgerError::LockExceedsBalance`] if the account's
    /// locked amount would exceed its balance.
    pub fn lock_tokens(
        &mut self,
        caller: &Address,
        account: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.ensure_controller("lock_tokens", caller)?;
        self.stage("lock_tokens", |changes| changes.lock(account, amount))?;
        debug!(account = %account, amount = %amount, "tokens locked");
        Ok(())
    }

    /// Releases `amount` of `account`'s locked units.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] or
    /// [`LedgerError::UnlockExceedsLocked`].
    pub fn unlock_tokens(
        &mut self,
        caller: &Address,
        account: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.ensure_controller("unlock_tokens", caller)?;
        self.stage("unlock_tokens", |changes| changes.unlock(account, amount))?;
        debug!(account = %account, amount = %amount, "tokens unlocked");
        Ok(())
    }

    /// Claws back `amount` of `account`'s locked units to the controller.
    ///
    /// Net effect: `balance[account] -= amount`, `locked[account] -= amount`,
    /// `balance[controller] += amount`. The holder's unlocked funds are not
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] or
    /// [`LedgerError::UnlockExceedsLocked`] if `amount` exceeds the locked
    /// amount.
    pub fn recall_locked_tokens(
        &mut self,
        caller: &Address,
        account: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.ensure_controller("recall_locked_tokens", caller)?;
        let controller = self.metadata.controller.clone();
        self.stage("recall_locked_tokens", |changes| {
            changes.recall(account, &controller, amount)
        })?;
        debug!(account = %account, amount = %amount, "locked tokens recalled");
        Ok(())
    }

    /// Sends `amount` from the controller to `to` and locks all of it, as a
    /// single admission decision.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] or
    /// [`LedgerError::InsufficientUnlockedBalance`] if the controller's own
    /// unlocked balance does not cover `amount`.
    pub fn transfer_and_lock(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.ensure_controller("transfer_and_lock", caller)?;
        self.stage("transfer_and_lock", |changes| {
            changes.transfer_and_lock(caller, to, amount)
        })?;
        debug!(to = %to, amount = %amount, "transfer_and_lock committed");
        Ok(())
    }

    /// Applies [`transfer_and_lock`](Self::transfer_and_lock) for each
    /// pair, in order, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`], [`LedgerError::LengthMismatch`],
    /// or the error of the first failing step. Nothing is committed on error.
    pub fn batch_transfer_and_lock(
        &mut self,
        caller: &Address,
        recipients: &[Address],
        amounts: &[Amount],
    ) -> Result<(), LedgerError> {
        self.ensure_controller("batch_transfer_and_lock", caller)?;
        ensure_same_length(recipients, amounts)?;
        self.stage("batch_transfer_and_lock", |changes| {
            for (index, (to, &amount)) in recipients.iter().zip(amounts).enumerate() {
                changes
                    .transfer_and_lock(caller, to, amount)
                    .map_err(|err| abort_batch("batch_transfer_and_lock", index, err))?;
            }
            Ok(())
        })?;
        debug!(steps = recipients.len(), "batch_transfer_and_lock committed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_controller(&self, op: &'static str, caller: &Address) -> Result<(), LedgerError> {
        if caller == &self.metadata.controller {
            return Ok(());
        }
        let err = LedgerError::Unauthorized {
            caller: caller.clone(),
        };
        debug!(op, error = %err, "operation rejected");
        Err(err)
    }

    /// Zero allowances are not stored.
    fn set_allowance(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        let key = (owner.clone(), spender.clone());
        if amount == 0 {
            self.allowances.remove(&key);
        } else {
            self.allowances.insert(key, amount);
        }
    }

    /// Runs `apply` against a fresh changeset and commits it on success.
    fn stage<F>(&mut self, op: &'static str, apply: F) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut Changeset<'_>) -> Result<(), LedgerError>,
    {
        let mut changes = Changeset::new(&self.accounts);
        if let Err(err) = apply(&mut changes) {
            debug!(op, error = %err, "operation rejected");
            return Err(err);
        }
        let staged = changes.into_staged();
        self.commit(op, staged)
    }

    /// Writes staged accounts back, after checking each one.
    fn commit(
        &mut self,
        op: &'static str,
        staged: HashMap<Address, AccountState>,
    ) -> Result<(), LedgerError> {
        if let Some((address, state)) = staged.iter().find(|(_, state)| !state.is_consistent()) {
            let err = LedgerError::InvariantViolation(format!(
                "{} would leave {} with {} locked of {} balance",
                op, address, state.locked, state.balance
            ));
            warn!(op, error = %err, "commit refused");
            return Err(err);
        }
        for (address, state) in staged {
            // Entries read but left untouched are not written, so a no-op
            // never materializes an account. Changed entries persist, even
            // once drained to zero.
            if self.account(&address) != state {
                self.accounts.insert(address, state);
            }
        }
        Ok(())
    }
}

fn ensure_same_length(recipients: &[Address], amounts: &[Amount]) -> Result<(), LedgerError> {
    if recipients.len() != amounts.len() {
        let err = LedgerError::LengthMismatch {
            recipients: recipients.len(),
            amounts: amounts.len(),
        };
        debug!(error = %err, "batch rejected");
        return Err(err);
    }
    Ok(())
}

fn abort_batch(op: &'static str, index: usize, err: LedgerError) -> LedgerError {
    warn!(op, index, error = %err, "batch aborted, no steps applied");
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    fn ledger() -> Ledger {
        Ledger::new("RenewToken", "RWT", 1000, 0, "owner").unwrap()
    }

    #[test]
    fn deploy_credits_owner_and_sets_controller() {
        let l = ledger();
        assert_eq!(l.balance_of(&addr("owner")), 1000);
        assert_eq!(l.total_supply(), 1000);
        assert_eq!(l.controller(), &addr("owner"));
        assert_eq!(l.name(), "RenewToken");
        assert_eq!(l.symbol(), "RWT");
        assert_eq!(l.decimals(), 0);
        l.check_invariants().unwrap();
    }

    #[test]
    fn unknown_accounts_read_as_zero() {
        let l = ledger();
        assert_eq!(l.balance_of(&addr("ghost")), 0);
        assert_eq!(l.locked_of(&addr("ghost")), 0);
        assert_eq!(l.unlocked_of(&addr("ghost")), 0);
        assert_eq!(l.allowance(&addr("ghost"), &addr("owner")), 0);
    }

    #[test]
    fn rejected_transfer_leaves_no_entry_behind() {
        let mut l = ledger();
        assert!(l.transfer(&addr("ghost"), &addr("alice"), 1).is_err());
        assert_eq!(l.accounts().count(), 1);
    }

    #[test]
    fn zero_transfer_from_empty_account_succeeds() {
        let mut l = ledger();
        l.transfer(&addr("ghost"), &addr("alice"), 0).unwrap();
        assert_eq!(l.balance_of(&addr("alice")), 0);
        assert_eq!(l.accounts().count(), 1);
        l.check_invariants().unwrap();
    }

    #[test]
    fn controller_ops_reject_other_callers() {
        let mut l = ledger();
        l.transfer(&addr("owner"), &addr("alice"), 100).unwrap();
        let before = l.snapshot();

        let unauthorized = LedgerError::Unauthorized {
            caller: addr("alice"),
        };
        assert_eq!(
            l.lock_tokens(&addr("alice"), &addr("alice"), 1),
            Err(unauthorized.clone())
        );
        assert_eq!(
            l.unlock_tokens(&addr("alice"), &addr("alice"), 0),
            Err(unauthorized.clone())
        );
        assert_eq!(
            l.recall_locked_tokens(&addr("alice"), &addr("alice"), 0),
            Err(unauthorized.clone())
        );
        assert_eq!(
            l.transfer_and_lock(&addr("alice"), &addr("bob"), 1),
            Err(unauthorized.clone())
        );
        assert_eq!(
            l.batch_transfer_and_lock(&addr("alice"), &[addr("bob")], &[1]),
            Err(unauthorized)
        );
        assert_eq!(l.snapshot(), before);
    }

    #[test]
    fn transfer_to_self_keeps_balance() {
        let mut l = ledger();
        l.transfer(&addr("owner"), &addr("owner"), 400).unwrap();
        assert_eq!(l.balance_of(&addr("owner")), 1000);
    }

    #[test]
    fn approve_and_transfer_from_spend_allowance() {
        let mut l = ledger();
        l.approve(&addr("owner"), &addr("spender"), 300).unwrap();
        l.transfer_from(&addr("spender"), &addr("owner"), &addr("bob"), 120)
            .unwrap();

        assert_eq!(l.balance_of(&addr("bob")), 120);
        assert_eq!(l.allowance(&addr("owner"), &addr("spender")), 180);

        let err = l
            .transfer_from(&addr("spender"), &addr("owner"), &addr("bob"), 181)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAllowance { allowance: 180, .. }));
    }

    #[test]
    fn transfer_from_cannot_reach_locked_units() {
        let mut l = ledger();
        l.transfer(&addr("owner"), &addr("alice"), 100).unwrap();
        l.lock_tokens(&addr("owner"), &addr("alice"), 90).unwrap();
        l.approve(&addr("alice"), &addr("spender"), 100).unwrap();

        let err = l
            .transfer_from(&addr("spender"), &addr("alice"), &addr("bob"), 11)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientUnlockedBalance { unlocked: 10, .. }));
        // Rejected call keeps the allowance intact.
        assert_eq!(l.allowance(&addr("alice"), &addr("spender")), 100);
    }

    #[test]
    fn unlimited_allowance_is_not_decremented() {
        let mut l = ledger();
        l.approve(&addr("owner"), &addr("spender"), Amount::MAX).unwrap();
        l.transfer_from(&addr("spender"), &addr("owner"), &addr("bob"), 10)
            .unwrap();
        assert_eq!(l.allowance(&addr("owner"), &addr("spender")), Amount::MAX);
    }

    #[test]
    fn commit_refuses_inconsistent_state() {
        let mut l = ledger();
        let mut staged = HashMap::new();
        staged.insert(
            addr("alice"),
            AccountState {
                balance: 1,
                locked: 2,
            },
        );
        let err = l.commit("test", staged).unwrap_err();
        assert!(matches!(err, LedgerError::InvariantViolation(_)));
        assert_eq!(l.locked_of(&addr("alice")), 0);
    }

    #[test]
    fn snapshot_is_sorted_and_serializable() {
        let mut l = ledger();
        l.transfer(&addr("owner"), &addr("zed"), 1).unwrap();
        l.transfer(&addr("owner"), &addr("amy"), 1).unwrap();

        let snap = l.snapshot();
        let order: Vec<&str> = snap.accounts.keys().map(Address::as_str).collect();
        assert_eq!(order, vec!["amy", "owner", "zed"]);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["accounts"]["owner"]["balance"], 998);
        assert_eq!(json["metadata"]["symbol"], "RWT");
    }

    #[test]
    fn snapshot_includes_allowances_by_owner() {
        let mut l = ledger();
        l.transfer(&addr("owner"), &addr("amy"), 50).unwrap();
        l.approve(&addr("owner"), &addr("zed"), 30).unwrap();
        l.approve(&addr("owner"), &addr("bob"), 20).unwrap();
        l.approve(&addr("amy"), &addr("bob"), 5).unwrap();

        let snap = l.snapshot();
        let spenders: Vec<&str> = snap.allowances[&addr("owner")]
            .keys()
            .map(Address::as_str)
            .collect();
        assert_eq!(spenders, vec!["bob", "zed"]);
        assert_eq!(snap.allowances[&addr("amy")][&addr("bob")], 5);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["allowances"]["owner"]["zed"], 30);
    }

    #[test]
    fn zero_allowances_are_not_kept() {
        let mut l = ledger();
        l.approve(&addr("owner"), &addr("spender"), 40).unwrap();
        l.approve(&addr("owner"), &addr("other"), 10).unwrap();
        l.approve(&addr("owner"), &addr("other"), 0).unwrap();
        l.transfer_from(&addr("spender"), &addr("owner"), &addr("bob"), 40)
            .unwrap();

        assert_eq!(l.allowance(&addr("owner"), &addr("spender")), 0);
        assert_eq!(l.allowance(&addr("owner"), &addr("other")), 0);
        assert!(l.snapshot().allowances.is_empty());
    }

    #[test]
    fn drained_account_stays_materialized() {
        let mut l = ledger();
        l.transfer(&addr("owner"), &addr("alice"), 10).unwrap();
        l.transfer(&addr("alice"), &addr("owner"), 10).unwrap();

        let snap = l.snapshot();
        assert_eq!(snap.accounts.get(&addr("alice")), Some(&AccountState::default()));
        assert_eq!(l.accounts().count(), 2);
        l.check_invariants().unwrap();
    }
}
