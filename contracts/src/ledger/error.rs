//! Ledger rejection reasons.
//!
//! Every variant describes a rejected state transition. The ledger never
//! mutates state before returning one of these, so callers can keep using
//! it after any error.

use thiserror::Error;

use super::account::{Address, Amount};

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A controller-only operation was invoked by someone else.
    #[error("unauthorized: {caller} is not the controller")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
    },

    /// A transfer would move more than the sender's unlocked balance.
    #[error(
        "Transfer exceeds unlocked: {account} has {unlocked} unlocked, tried to move {requested}"
    )]
    InsufficientUnlockedBalance {
        /// The sending account.
        account: Address,
        /// `balance - locked` at admission time.
        unlocked: Amount,
        /// Amount the caller tried to move.
        requested: Amount,
    },

    /// A lock would leave more locked than the account owns.
    #[error(
        "lock exceeds balance: {account} has {balance} with {locked} locked, tried to lock {requested}"
    )]
    LockExceedsBalance {
        /// The account being locked.
        account: Address,
        /// Current balance of the account.
        balance: Amount,
        /// Amount already locked.
        locked: Amount,
        /// Additional amount the caller tried to lock.
        requested: Amount,
    },

    /// An unlock or recall asked for more than is currently locked.
    #[error("unlock exceeds locked: {account} has {locked} locked, requested {requested}")]
    UnlockExceedsLocked {
        /// The account being unlocked or recalled from.
        account: Address,
        /// Amount currently locked.
        locked: Amount,
        /// Amount the caller asked for.
        requested: Amount,
    },

    /// Batch recipient and amount lists differ in length.
    #[error("length mismatch: {recipients} recipients, {amounts} amounts")]
    LengthMismatch {
        /// Number of recipients supplied.
        recipients: usize,
        /// Number of amounts supplied.
        amounts: usize,
    },

    /// A malformed amount was supplied at the boundary.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A delegated transfer exceeds the spender's allowance.
    #[error(
        "insufficient allowance: {spender} may move {allowance} from {owner}, requested {requested}"
    )]
    InsufficientAllowance {
        /// The account whose funds are being spent.
        owner: Address,
        /// The delegated spender.
        spender: Address,
        /// Current allowance.
        allowance: Amount,
        /// Amount the spender tried to move.
        requested: Amount,
    },

    /// Scaling the initial supply by `10^decimals` overflows `u128`.
    #[error("supply overflow: {initial_supply} * 10^{decimals} does not fit in u128")]
    SupplyOverflow {
        /// Initial supply in whole tokens.
        initial_supply: Amount,
        /// Decimal precision.
        decimals: u8,
    },

    /// Crediting an account would overflow its balance.
    #[error("balance overflow crediting {amount} to {account}")]
    BalanceOverflow {
        /// The account being credited.
        account: Address,
        /// The credit that overflowed.
        amount: Amount,
    },

    /// The ledger's bookkeeping no longer satisfies its invariants.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A construction parameter is missing or malformed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
