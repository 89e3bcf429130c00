//! Scheduler lifecycle counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters covering every thread lifecycle transition.
///
/// Counters only ever increase; read them through [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct SchedulerStats {
    pub(crate) threads_started: AtomicU64,
    pub(crate) threads_completed: AtomicU64,
    pub(crate) threads_failed: AtomicU64,
    pub(crate) threads_cancelled: AtomicU64,
    pub(crate) resumes_delivered: AtomicU64,
    pub(crate) faults_injected: AtomicU64,
    pub(crate) triggers_queued: AtomicU64,
    pub(crate) triggers_ignored: AtomicU64,
}

impl SchedulerStats {
    pub(crate) fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// A point-in-time copy of every counter.
    pub fn snapshot(&self) -> SchedulerStatsSnapshot {
        SchedulerStatsSnapshot {
            threads_started: self.threads_started.load(Ordering::Relaxed),
            threads_completed: self.threads_completed.load(Ordering::Relaxed),
            threads_failed: self.threads_failed.load(Ordering::Relaxed),
            threads_cancelled: self.threads_cancelled.load(Ordering::Relaxed),
            resumes_delivered: self.resumes_delivered.load(Ordering::Relaxed),
            faults_injected: self.faults_injected.load(Ordering::Relaxed),
            triggers_queued: self.triggers_queued.load(Ordering::Relaxed),
            triggers_ignored: self.triggers_ignored.load(Ordering::Relaxed),
        }
    }
}

/// A snapshot of [`SchedulerStats`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SchedulerStatsSnapshot {
    /// Threads whose first advance ran (including those that completed or
    /// failed immediately).
    pub threads_started: u64,
    /// Threads that ran to normal completion.
    pub threads_completed: u64,
    /// Threads removed because a fault escaped the routine.
    pub threads_failed: u64,
    /// Threads discarded by [`OnConflict::CancelPrevious`](crate::OnConflict::CancelPrevious).
    pub threads_cancelled: u64,
    /// Successful `continue_thread` deliveries.
    pub resumes_delivered: u64,
    /// Successful `error_thread` deliveries (caught or not).
    pub faults_injected: u64,
    /// Triggers held back by [`OnConflict::Queue`](crate::OnConflict::Queue).
    pub triggers_queued: u64,
    /// Triggers dropped by [`OnConflict::Ignore`](crate::OnConflict::Ignore).
    pub triggers_ignored: u64,
}
