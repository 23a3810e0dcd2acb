//! Quota accounting: per-user spend balances and monthly reset cycles.
//!
//! The ledger separates quota *enforcement* (admission against a possibly
//! stale balance, before generation) from quota *accounting* (a conditional
//! deduct once the real cost is known). The gap between the two is a
//! deliberate eventual-consistency choice: holding a lock across a
//! variable-duration streaming generation is the wrong tradeoff.

pub mod allotments;
pub mod ledger;
pub mod repository;

pub use allotments::TierAllotments;
pub use ledger::{Admission, QuotaLedger};
pub use repository::QuotaRepository;
