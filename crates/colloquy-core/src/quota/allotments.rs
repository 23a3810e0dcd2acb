//! Tier-to-allotment mapping.
//!
//! An explicit value injected into the ledger at construction, not ambient
//! global state.

use colloquy_types::account::MembershipTier;
use colloquy_types::config::QuotaConfig;

/// Monthly unit allotments per membership tier.
#[derive(Debug, Clone, Copy)]
pub struct TierAllotments {
    pub free: i64,
    pub basic: i64,
    pub premium: i64,
}

impl TierAllotments {
    /// The allotment for a tier.
    pub fn for_tier(&self, tier: MembershipTier) -> i64 {
        match tier {
            MembershipTier::Free => self.free,
            MembershipTier::Basic => self.basic,
            MembershipTier::Premium => self.premium,
        }
    }
}

impl Default for TierAllotments {
    fn default() -> Self {
        Self {
            free: 1_000,
            basic: 900_000,
            premium: 1_800_000,
        }
    }
}

impl From<&QuotaConfig> for TierAllotments {
    fn from(config: &QuotaConfig) -> Self {
        Self {
            free: config.free_units,
            basic: config.basic_units,
            premium: config.premium_units,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allotments() {
        let allotments = TierAllotments::default();
        assert_eq!(allotments.for_tier(MembershipTier::Free), 1_000);
        assert_eq!(allotments.for_tier(MembershipTier::Basic), 900_000);
        assert_eq!(allotments.for_tier(MembershipTier::Premium), 1_800_000);
    }

    #[test]
    fn test_from_quota_config() {
        let config = QuotaConfig {
            free_units: 10,
            basic_units: 20,
            premium_units: 30,
        };
        let allotments = TierAllotments::from(&config);
        assert_eq!(allotments.for_tier(MembershipTier::Basic), 20);
    }
}
