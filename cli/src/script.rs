//! # Call Scripts
//!
//! A script is a JSON array of calls replayed in order against a freshly
//! deployed ledger:
//!
//! ```json
//! [
//!   { "caller": "owner", "op": "transfer", "to": "alice", "amount": "100" },
//!   { "caller": "owner", "op": "lock_tokens", "account": "alice", "amount": "40" },
//!   { "caller": "owner", "op": "batch_transfer", "recipients": ["a", "b"], "amounts": ["20", "30"] }
//! ]
//! ```
//!
//! Amounts are decimal strings in whole tokens and are scaled by the
//! ledger's precision, so `"0.5"` is half a token whatever `decimals` is.

use std::convert::Infallible;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use renew_contracts::ledger::{Address, Amount, Ledger, LedgerError, Operation};
use renew_contracts::units::parse_units;

// ---------------------------------------------------------------------------
// Script format
// ---------------------------------------------------------------------------

/// One scripted call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptStep {
    /// Identity the call is made as.
    pub caller: Address,
    /// What to do.
    #[serde(flatten)]
    pub call: ScriptCall,
}

/// The operation of a [`ScriptStep`], with human-readable amounts.
///
/// The `op` tag uses the same names as [`Operation::name`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptCall {
    /// [`Operation::Transfer`].
    Transfer { to: Address, amount: String },
    /// [`Operation::Approve`].
    Approve { spender: Address, amount: String },
    /// [`Operation::TransferFrom`].
    TransferFrom {
        from: Address,
        to: Address,
        amount: String,
    },
    /// [`Operation::BatchTransfer`].
    BatchTransfer {
        recipients: Vec<Address>,
        amounts: Vec<String>,
    },
    /// [`Operation::LockTokens`].
    LockTokens { account: Address, amount: String },
    /// [`Operation::UnlockTokens`].
    UnlockTokens { account: Address, amount: String },
    /// [`Operation::RecallLockedTokens`].
    RecallLockedTokens { account: Address, amount: String },
    /// [`Operation::TransferAndLock`].
    TransferAndLock { to: Address, amount: String },
    /// [`Operation::BatchTransferAndLock`].
    BatchTransferAndLock {
        recipients: Vec<Address>,
        amounts: Vec<String>,
    },
}

impl ScriptCall {
    /// Scales every amount by `decimals` and builds the ledger operation.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] for any malformed amount.
    pub fn to_operation(&self, decimals: u8) -> Result<Operation, LedgerError> {
        self.build(|amount| parse_units(amount, decimals))
    }

    /// Name of the operation this call maps to, even when its amounts are
    /// malformed.
    pub fn name(&self) -> &'static str {
        match self.build(|_| Ok::<Amount, Infallible>(0)) {
            Ok(op) => op.name(),
            Err(never) => match never {},
        }
    }

    /// Builds the [`Operation`], converting each amount with `amount_of`.
    fn build<E, F>(&self, mut amount_of: F) -> Result<Operation, E>
    where
        F: FnMut(&str) -> Result<Amount, E>,
    {
        Ok(match self {
            ScriptCall::Transfer { to, amount } => Operation::Transfer {
                to: to.clone(),
                amount: amount_of(amount)?,
            },
            ScriptCall::Approve { spender, amount } => Operation::Approve {
                spender: spender.clone(),
                amount: amount_of(amount)?,
            },
            ScriptCall::TransferFrom { from, to, amount } => Operation::TransferFrom {
                from: from.clone(),
                to: to.clone(),
                amount: amount_of(amount)?,
            },
            ScriptCall::BatchTransfer {
                recipients,
                amounts,
            } => Operation::BatchTransfer {
                recipients: recipients.clone(),
                amounts: convert_all(amounts, &mut amount_of)?,
            },
            ScriptCall::LockTokens { account, amount } => Operation::LockTokens {
                account: account.clone(),
                amount: amount_of(amount)?,
            },
            ScriptCall::UnlockTokens { account, amount } => Operation::UnlockTokens {
                account: account.clone(),
                amount: amount_of(amount)?,
            },
            ScriptCall::RecallLockedTokens { account, amount } => Operation::RecallLockedTokens {
                account: account.clone(),
                amount: amount_of(amount)?,
            },
            ScriptCall::TransferAndLock { to, amount } => Operation::TransferAndLock {
                to: to.clone(),
                amount: amount_of(amount)?,
            },
            ScriptCall::BatchTransferAndLock {
                recipients,
                amounts,
            } => Operation::BatchTransferAndLock {
                recipients: recipients.clone(),
                amounts: convert_all(amounts, &mut amount_of)?,
            },
        })
    }
}

fn convert_all<E, F>(amounts: &[String], amount_of: &mut F) -> Result<Vec<Amount>, E>
where
    F: FnMut(&str) -> Result<Amount, E>,
{
    amounts.iter().map(|amount| amount_of(amount)).collect()
}

/// Parses a script from JSON text.
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>> {
    serde_json::from_str(text).context("malformed script")
}

/// Reads and parses a script file.
pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    parse_script(&text).with_context(|| format!("in script {}", path.display()))
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// A call the ledger refused.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    /// Zero-based position in the script.
    pub step: usize,
    /// Operation name.
    pub op: String,
    /// Rendered [`LedgerError`].
    pub error: String,
}

/// Outcome of a replay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    /// Calls committed.
    pub applied: usize,
    /// Calls rejected, in script order.
    pub rejected: Vec<Rejection>,
}

/// Applies `steps` to `ledger` in order.
///
/// Stops after the first rejection unless `keep_going` is set. A malformed
/// amount counts as a rejection of that step.
pub fn replay(ledger: &mut Ledger, steps: &[ScriptStep], keep_going: bool) -> ReplayReport {
    let decimals = ledger.decimals();
    let mut report = ReplayReport::default();

    for (step, entry) in steps.iter().enumerate() {
        let outcome = entry
            .call
            .to_operation(decimals)
            .and_then(|op| ledger.execute(&entry.caller, &op).map(|()| op));

        match outcome {
            Ok(op) => {
                info!(step, caller = %entry.caller, op = op.name(), "call applied");
                report.applied += 1;
            }
            Err(err) => {
                let op = entry.call.name();
                warn!(step, caller = %entry.caller, op, error = %err, "call rejected");
                report.rejected.push(Rejection {
                    step,
                    op: op.to_string(),
                    error: err.to_string(),
                });
                if !keep_going {
                    break;
                }
            }
        }
    }

    report
}
