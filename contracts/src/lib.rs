// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # RENEW Contracts
//!
//! The RENEW token: an ERC-20 style ledger with controller-managed locking.
//! The issuing authority can restrict part of any holder's balance (vesting,
//! compliance holds) without taking custody of it, and later release or
//! recall it.
//!
//! - **ledger**: The state machine: balances, locks, allowances, batches.
//! - **config**: Deployment parameters and their defaults.
//! - **units**: Decimal string <-> base unit conversion.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow. Amounts are `u128` base
//!    units and never wrap.
//! 2. Every operation is admitted in full before anything is written. No
//!    partial state is ever observable.
//! 3. Authorization is a plain identity check against the controller fixed
//!    at deployment.
//! 4. Every public data type is serializable (serde) so snapshots and
//!    configs can leave the process.

pub mod config;
pub mod ledger;
pub mod units;

pub use config::TokenConfig;
pub use ledger::{Address, Amount, Ledger, LedgerError, Operation, SharedLedger};
