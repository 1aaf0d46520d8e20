//! Mutating calls as data.
//!
//! [`Operation`] names every state transition the ledger accepts, so a
//! caller that receives calls from elsewhere (a script, a queue, another
//! thread) can hand them over without matching on method names itself.

use super::account::{Address, Amount};
use super::engine::Ledger;
use super::error::LedgerError;

/// A single mutating call. The caller identity travels alongside, not
/// inside, so the same operation can be replayed for different callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// [`Ledger::transfer`].
    Transfer { to: Address, amount: Amount },
    /// [`Ledger::approve`].
    Approve { spender: Address, amount: Amount },
    /// [`Ledger::transfer_from`].
    TransferFrom {
        from: Address,
        to: Address,
        amount: Amount,
    },
    /// [`Ledger::batch_transfer`].
    BatchTransfer {
        recipients: Vec<Address>,
        amounts: Vec<Amount>,
    },
    /// [`Ledger::lock_tokens`].
    LockTokens { account: Address, amount: Amount },
    /// [`Ledger::unlock_tokens`].
    UnlockTokens { account: Address, amount: Amount },
    /// [`Ledger::recall_locked_tokens`].
    RecallLockedTokens { account: Address, amount: Amount },
    /// [`Ledger::transfer_and_lock`].
    TransferAndLock { to: Address, amount: Amount },
    /// [`Ledger::batch_transfer_and_lock`].
    BatchTransferAndLock {
        recipients: Vec<Address>,
        amounts: Vec<Amount>,
    },
}

impl Operation {
    /// Stable snake_case name, used in logs and scripts.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Transfer { .. } => "transfer",
            Operation::Approve { .. } => "approve",
            Operation::TransferFrom { .. } => "transfer_from",
            Operation::BatchTransfer { .. } => "batch_transfer",
            Operation::LockTokens { .. } => "lock_tokens",
            Operation::UnlockTokens { .. } => "unlock_tokens",
            Operation::RecallLockedTokens { .. } => "recall_locked_tokens",
            Operation::TransferAndLock { .. } => "transfer_and_lock",
            Operation::BatchTransferAndLock { .. } => "batch_transfer_and_lock",
        }
    }

    /// Whether only the controller may submit this operation.
    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            Operation::LockTokens { .. }
                | Operation::UnlockTokens { .. }
                | Operation::RecallLockedTokens { .. }
                | Operation::TransferAndLock { .. }
                | Operation::BatchTransferAndLock { .. }
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Ledger {
    /// Dispatches `op` on behalf of `caller`.
    pub fn execute(&mut self, caller: &Address, op: &Operation) -> Result<(), LedgerError> {
        match op {
            Operation::Transfer { to, amount } => self.transfer(caller, to, *amount),
            Operation::Approve { spender, amount } => self.approve(caller, spender, *amount),
            Operation::TransferFrom { from, to, amount } => {
                self.transfer_from(caller, from, to, *amount)
            }
            Operation::BatchTransfer {
                recipients,
                amounts,
            } => self.batch_transfer(caller, recipients, amounts),
            Operation::LockTokens { account, amount } => {
                self.lock_tokens(caller, account, *amount)
            }
            Operation::UnlockTokens { account, amount } => {
                self.unlock_tokens(caller, account, *amount)
            }
            Operation::RecallLockedTokens { account, amount } => {
                self.recall_locked_tokens(caller, account, *amount)
            }
            Operation::TransferAndLock { to, amount } => {
                self.transfer_and_lock(caller, to, *amount)
            }
            Operation::BatchTransferAndLock {
                recipients,
                amounts,
            } => self.batch_transfer_and_lock(caller, recipients, amounts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_dispatches_to_the_matching_method() {
        let owner = Address::from("owner");
        let alice = Address::from("alice");
        let mut ledger = Ledger::new("T", "TOK", 500, 0, owner.clone()).unwrap();

        ledger
            .execute(
                &owner,
                &Operation::TransferAndLock {
                    to: alice.clone(),
                    amount: 100,
                },
            )
            .unwrap();
        ledger
            .execute(
                &owner,
                &Operation::UnlockTokens {
                    account: alice.clone(),
                    amount: 30,
                },
            )
            .unwrap();

        assert_eq!(ledger.balance_of(&alice), 100);
        assert_eq!(ledger.locked_of(&alice), 70);
        assert_eq!(ledger.balance_of(&owner), 400);
    }

    #[test]
    fn privileged_flag_matches_controller_checks() {
        let owner = Address::from("owner");
        let mallory = Address::from("mallory");
        let ops = [
            Operation::Transfer {
                to: owner.clone(),
                amount: 0,
            },
            Operation::Approve {
                spender: owner.clone(),
                amount: 0,
            },
            Operation::BatchTransfer {
                recipients: vec![],
                amounts: vec![],
            },
            Operation::LockTokens {
                account: owner.clone(),
                amount: 0,
            },
            Operation::UnlockTokens {
                account: owner.clone(),
                amount: 0,
            },
            Operation::RecallLockedTokens {
                account: owner.clone(),
                amount: 0,
            },
            Operation::TransferAndLock {
                to: owner.clone(),
                amount: 0,
            },
            Operation::BatchTransferAndLock {
                recipients: vec![],
                amounts: vec![],
            },
        ];

        for op in &ops {
            let mut ledger = Ledger::new("T", "TOK", 10, 0, owner.clone()).unwrap();
            let result = ledger.execute(&mallory, op);
            assert_eq!(
                matches!(result, Err(LedgerError::Unauthorized { .. })),
                op.is_privileged(),
                "{op}"
            );
        }
    }
}
