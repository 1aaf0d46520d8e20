//! # Lockable Token Ledger
//!
//! A fungible-token ledger in which a single privileged identity, the
//! **controller**, can lock part of any account's balance. Locked units stay
//! in the holder's balance but cannot leave it through the holder's own
//! transfers; only the controller can release them (`unlock_tokens`) or
//! claw them back (`recall_locked_tokens`).
//!
//! ## Invariants
//!
//! - `locked <= balance` for every account, checked on every commit.
//! - The sum of all balances equals the total supply fixed at deployment.
//! - A rejected operation mutates nothing. Batches are all or nothing.
//!
//! ## Admission
//!
//! | Operation | Caller | Checked against |
//! |-----------|--------|-----------------|
//! | `transfer`, `batch_transfer` | anyone | sender's unlocked balance |
//! | `transfer_from` | spender | allowance, then owner's unlocked balance |
//! | `lock_tokens` | controller | target's balance |
//! | `unlock_tokens`, `recall_locked_tokens` | controller | target's locked amount |
//! | `transfer_and_lock`, `batch_transfer_and_lock` | controller | controller's unlocked balance |

mod account;
mod changeset;
mod engine;
mod error;
mod operation;
mod shared;

pub use account::{AccountState, Address, Amount};
pub use engine::{Ledger, LedgerSnapshot, TokenMetadata};
pub use error::LedgerError;
pub use operation::Operation;
pub use shared::SharedLedger;
