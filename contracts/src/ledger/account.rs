//! Account identity and per-account bookkeeping.

use serde::{Deserialize, Serialize};

/// Token amounts in base units (after decimal scaling).
///
/// `u128` because an 18-decimal token with a billion-unit supply already
/// needs ~90 bits.
pub type Amount = u128;

/// Opaque account identifier.
///
/// The ledger never inspects the contents; any non-empty string works
/// (hex addresses, DIDs, test names like `"alice"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wraps a raw identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Balance and lock figures for a single account.
///
/// Absent accounts read as `AccountState::default()`, so a zero/zero entry
/// and a never-seen address are indistinguishable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Total units owned.
    pub balance: Amount,
    /// Units the owner cannot move through a standard transfer.
    pub locked: Amount,
}

impl AccountState {
    /// Creates an account holding `balance` with nothing locked.
    pub fn with_balance(balance: Amount) -> Self {
        Self { balance, locked: 0 }
    }

    /// Units the owner may transfer: `balance - locked`.
    ///
    /// Saturates so a corrupted entry reads as zero rather than wrapping;
    /// [`is_consistent`](Self::is_consistent) is what flags the corruption.
    pub fn unlocked(&self) -> Amount {
        self.balance.saturating_sub(self.locked)
    }

    /// `locked <= balance`.
    pub fn is_consistent(&self) -> bool {
        self.locked <= self.balance
    }

    /// Returns `true` if both figures are zero.
    pub fn is_empty(&self) -> bool {
        self.balance == 0 && self.locked == 0
    }
}
