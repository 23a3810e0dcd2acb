//! Usage accounting types.
//!
//! Usage events are an append-only audit trail, recorded once per completed
//! generation and kept independent of turn persistence so accounting
//! survives changes to message storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::MembershipTier;

/// One recorded generation's token spend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub model: String,
    pub tokens_used: u32,
    pub created_at: DateTime<Utc>,
}

/// A user's current quota standing, as exposed by the usage endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub membership_tier: MembershipTier,
    pub remaining_units: i64,
    /// The monthly allotment for the user's tier.
    pub allotment: i64,
    pub units_reset_at: Option<DateTime<Utc>>,
    /// Tokens recorded in usage events since the start of the current month.
    pub tokens_this_period: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_status_serialize() {
        let status = QuotaStatus {
            membership_tier: MembershipTier::Basic,
            remaining_units: 899_000,
            allotment: 900_000,
            units_reset_at: Some(Utc::now()),
            tokens_this_period: 1_000,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["membership_tier"], "basic");
        assert_eq!(json["allotment"], 900_000);
    }
}
