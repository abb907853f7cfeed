//! Process-wide pipeline counters.
//!
//! The engine bumps a [`Counter`] at each state change. The binary calls
//! [`Metrics::flush`] on exit to log one summary event.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

pub static METRICS: Metrics = Metrics::new();

/// What is being counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    ProjectsCreated,
    PhasesCompleted,
    PhasesRejected,
    MessagesSent,
    FailuresReported,
}

impl Counter {
    pub const ALL: [Counter; 5] = [
        Counter::ProjectsCreated,
        Counter::PhasesCompleted,
        Counter::PhasesRejected,
        Counter::MessagesSent,
        Counter::FailuresReported,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Counter::ProjectsCreated => "projects_created",
            Counter::PhasesCompleted => "phases_completed",
            Counter::PhasesRejected => "phases_rejected",
            Counter::MessagesSent => "messages_sent",
            Counter::FailuresReported => "failures_reported",
        }
    }
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub projects_created: u64,
    pub phases_completed: u64,
    pub phases_rejected: u64,
    pub messages_sent: u64,
    pub failures_reported: u64,
}

pub struct Metrics {
    counts: [AtomicU64; Counter::ALL.len()],
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            counts: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
        }
    }

    pub fn inc(&self, counter: Counter) {
        self.counts[counter.slot()].fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = counter.name(), "counter incremented");
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.counts[counter.slot()].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            projects_created: self.get(Counter::ProjectsCreated),
            phases_completed: self.get(Counter::PhasesCompleted),
            phases_rejected: self.get(Counter::PhasesRejected),
            messages_sent: self.get(Counter::MessagesSent),
            failures_reported: self.get(Counter::FailuresReported),
        }
    }

    /// Log the current snapshot as one `info` event.
    pub fn flush(&self) {
        let s = self.snapshot();
        tracing::info!(
            event = "metrics.flush",
            projects_created = s.projects_created,
            phases_completed = s.phases_completed,
            phases_rejected = s.phases_rejected,
            messages_sent = s.messages_sent,
            failures_reported = s.failures_reported,
        );
    }

    pub fn reset(&self) {
        for count in &self.counts {
            count.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_independent() {
        let m = Metrics::new();
        m.inc(Counter::PhasesCompleted);
        m.inc(Counter::PhasesCompleted);
        m.inc(Counter::FailuresReported);
        let snap = m.snapshot();
        assert_eq!(snap.phases_completed, 2);
        assert_eq!(snap.failures_reported, 1);
        assert_eq!(snap.projects_created, 0);
        assert_eq!(m.get(Counter::PhasesRejected), 0);
    }

    #[test]
    fn test_reset_zeroes_every_slot() {
        let m = Metrics::new();
        for counter in Counter::ALL {
            m.inc(counter);
        }
        m.reset();
        assert_eq!(m.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_slots_follow_declaration_order() {
        for (i, counter) in Counter::ALL.iter().enumerate() {
            assert_eq!(counter.slot(), i);
        }
    }
}
