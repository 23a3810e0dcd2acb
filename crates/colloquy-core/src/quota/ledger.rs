//! Quota ledger: admission checks, monthly resets, and conditional deducts.

use chrono::{DateTime, Months, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use colloquy_types::account::UserAccount;
use colloquy_types::error::ChatError;

use crate::quota::allotments::TierAllotments;
use crate::quota::repository::QuotaRepository;

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The user may spend tokens this period.
    Allowed { remaining: i64 },
    /// The balance is spent; no generation may start.
    Exhausted {
        reset_at: Option<DateTime<Utc>>,
    },
}

/// Per-user spend accounting against membership-tiered monthly allotments.
///
/// Generic over [`QuotaRepository`]; the allotment table is injected at
/// construction.
pub struct QuotaLedger<R: QuotaRepository> {
    repo: R,
    allotments: TierAllotments,
}

impl<R: QuotaRepository> QuotaLedger<R> {
    pub fn new(repo: R, allotments: TierAllotments) -> Self {
        Self { repo, allotments }
    }

    /// Check whether the user may spend more tokens this period, applying
    /// the monthly reset first when it is due.
    ///
    /// The reset is a conditional update guarded by the same due-ness
    /// predicate as the check, so a reset and a check never observe stale
    /// data relative to each other; concurrent resets collapse to one.
    pub async fn check_and_reset(
        &self,
        user_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<Admission, ChatError> {
        let account = self
            .repo
            .find_account(user_id)
            .await?
            .ok_or(ChatError::Forbidden)?;
        let allotment = self.allotments.for_tier(account.membership_tier);

        let (remaining, reset_at) = if account.reset_due(now) {
            let next_reset = next_reset_at(now);
            if self.repo.apply_reset(user_id, allotment, next_reset, now).await? {
                info!(
                    user_id = %user_id,
                    tier = %account.membership_tier,
                    units = allotment,
                    "quota reset applied"
                );
                (allotment, Some(next_reset))
            } else {
                // A concurrent request won the reset; observe its result.
                let refreshed = self
                    .repo
                    .find_account(user_id)
                    .await?
                    .ok_or(ChatError::Forbidden)?;
                (refreshed.remaining_units, refreshed.units_reset_at)
            }
        } else {
            (account.remaining_units, account.units_reset_at)
        };

        if remaining <= 0 {
            debug!(user_id = %user_id, "admission denied: quota exhausted");
            Ok(Admission::Exhausted { reset_at })
        } else {
            Ok(Admission::Allowed { remaining })
        }
    }

    /// Attempt to deduct `tokens` from the user's balance.
    ///
    /// A single conditional update: applies only if the current balance
    /// covers the deduction. Returns whether it applied. A `false` after a
    /// completed generation means a concurrently racing request consumed
    /// the balance in the check-then-generate window; the caller records
    /// it as an accounting anomaly.
    pub async fn deduct(&self, user_id: &Uuid, tokens: u32) -> Result<bool, ChatError> {
        Ok(self.repo.deduct_if_available(user_id, tokens as i64).await?)
    }

    /// The account and its tier allotment, for quota status reporting.
    pub async fn status(&self, user_id: &Uuid) -> Result<(UserAccount, i64), ChatError> {
        let account = self
            .repo
            .find_account(user_id)
            .await?
            .ok_or(ChatError::Forbidden)?;
        let allotment = self.allotments.for_tier(account.membership_tier);
        Ok((account, allotment))
    }
}

/// One calendar month from `now`; falls back to 30 days at month-arithmetic
/// edge cases chrono cannot represent.
fn next_reset_at(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_add_months(Months::new(1))
        .unwrap_or_else(|| now + chrono::Duration::days(30))
}
