//! User account and membership tier types.
//!
//! The account record is owned by the account subsystem; the quota ledger
//! only reads and mutates the three quota fields (`remaining_units`,
//! `units_reset_at`, and -- indirectly via allotment lookup --
//! `membership_tier`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Membership level of a user account.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (membership_tier IN ('free', 'basic', 'premium'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    Free,
    Basic,
    Premium,
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipTier::Free => write!(f, "free"),
            MembershipTier::Basic => write!(f, "basic"),
            MembershipTier::Premium => write!(f, "premium"),
        }
    }
}

impl FromStr for MembershipTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(MembershipTier::Free),
            "basic" => Ok(MembershipTier::Basic),
            "premium" => Ok(MembershipTier::Premium),
            other => Err(format!("invalid membership tier: '{other}'")),
        }
    }
}

impl Default for MembershipTier {
    fn default() -> Self {
        MembershipTier::Free
    }
}

/// A user account with its quota fields.
///
/// `remaining_units` is monotonically non-increasing between reset events
/// and never driven below zero by a successful deduct. `units_reset_at`
/// of `None` means a reset is immediately due.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub membership_tier: MembershipTier,
    pub remaining_units: i64,
    pub units_reset_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Whether the monthly reset is due at `now`.
    pub fn reset_due(&self, now: DateTime<Utc>) -> bool {
        match self.units_reset_at {
            None => true,
            Some(reset_at) => reset_at < now,
        }
    }
}

/// The authenticated caller identity resolved before any core operation.
#[derive(Debug, Clone, Copy)]
pub struct UserIdentity {
    pub id: Uuid,
    pub tier: MembershipTier,
}
