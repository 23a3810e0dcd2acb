//! Turn-level counters.
//!
//! Accounting anomalies (a deduct that failed after generation because a
//! racing request consumed the balance) represent unmetered spend and must
//! be observable, not just logged. The counters here are exposed through
//! the stats endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for completed, failed, and anomalous turns.
#[derive(Debug, Default)]
pub struct TurnMetrics {
    turns_completed: AtomicU64,
    turns_failed: AtomicU64,
    accounting_anomalies: AtomicU64,
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub turns_completed: u64,
    pub turns_failed: u64,
    pub accounting_anomalies: u64,
}

impl TurnMetrics {
    pub fn turn_completed(&self) {
        self.turns_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn turn_failed(&self) {
        self.turns_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accounting_anomaly(&self) {
        self.accounting_anomalies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            turns_completed: self.turns_completed.load(Ordering::Relaxed),
            turns_failed: self.turns_failed.load(Ordering::Relaxed),
            accounting_anomalies: self.accounting_anomalies.load(Ordering::Relaxed),
        }
    }
}
