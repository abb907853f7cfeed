//! Per-gate phase state and the gate-indexed arena that holds it.

use std::ops::{Index, IndexMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::gate::PhaseGate;

/// Status of a single phase.
///
/// `Pending → Coding → {Completed | Rejected | BuildFail}`. `Rejected` and
/// `BuildFail` may be retried; `Completed` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseStatus {
    Pending,
    Coding,
    Completed,
    Rejected,
    BuildFail,
}

impl PhaseStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PhaseStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseStatus::Pending => "PENDING",
            PhaseStatus::Coding => "CODING",
            PhaseStatus::Completed => "COMPLETED",
            PhaseStatus::Rejected => "REJECTED",
            PhaseStatus::BuildFail => "BUILD_FAIL",
        }
    }
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric quality metrics recorded against a phase.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PhaseMetrics {
    /// Test coverage percentage (0–100).
    pub test_coverage: f64,
    /// Build success rate percentage (0–100).
    pub build_success_rate: f64,
    /// Number of open security findings.
    pub security_issues: u32,
    /// Wall-clock time between `started_at` and `completed_at`.
    pub execution_time_ms: u64,
}

impl PhaseMetrics {
    /// Merge the fields present in `update`; absent fields keep their value.
    pub fn merge(&mut self, update: &PhaseMetricsUpdate) {
        if let Some(v) = update.test_coverage {
            self.test_coverage = v;
        }
        if let Some(v) = update.build_success_rate {
            self.build_success_rate = v;
        }
        if let Some(v) = update.security_issues {
            self.security_issues = v;
        }
        if let Some(v) = update.execution_time_ms {
            self.execution_time_ms = v;
        }
    }
}

/// Partial metrics update. `None` fields are left untouched by [`PhaseMetrics::merge`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PhaseMetricsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_coverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_success_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_issues: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl PhaseMetricsUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn test_coverage(mut self, v: f64) -> Self {
        self.test_coverage = Some(v);
        self
    }

    pub fn build_success_rate(mut self, v: f64) -> Self {
        self.build_success_rate = Some(v);
        self
    }

    pub fn security_issues(mut self, v: u32) -> Self {
        self.security_issues = Some(v);
        self
    }

    pub fn execution_time_ms(mut self, v: u64) -> Self {
        self.execution_time_ms = Some(v);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// State of one gate within one project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseState {
    pub gate: PhaseGate,
    pub status: PhaseStatus,
    pub metrics: PhaseMetrics,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Append-only error log.
    pub errors: Vec<String>,
    /// Append-only artifact paths.
    pub artifacts: Vec<String>,
}

impl PhaseState {
    /// A fresh `Pending` phase with zeroed metrics.
    pub fn pending(gate: PhaseGate) -> Self {
        Self {
            gate,
            status: PhaseStatus::Pending,
            metrics: PhaseMetrics::default(),
            started_at: None,
            completed_at: None,
            errors: Vec::new(),
            artifacts: Vec::new(),
        }
    }
}

/// Arena of phase states indexed by gate ordinal.
///
/// Every gate always has a state, so lookups cannot fail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Phases([PhaseState; PhaseGate::COUNT]);

impl Phases {
    /// All ten phases in `Pending`.
    pub fn new() -> Self {
        Self(PhaseGate::ALL.map(PhaseState::pending))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhaseState> {
        self.0.iter()
    }

    /// Number of phases in `Completed` status.
    pub fn completed_count(&self) -> usize {
        self.0
            .iter()
            .filter(|p| p.status == PhaseStatus::Completed)
            .count()
    }
}

impl Default for Phases {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<PhaseGate> for Phases {
    type Output = PhaseState;

    fn index(&self, gate: PhaseGate) -> &PhaseState {
        &self.0[gate.ordinal()]
    }
}

impl IndexMut<PhaseGate> for Phases {
    fn index_mut(&mut self, gate: PhaseGate) -> &mut PhaseState {
        &mut self.0[gate.ordinal()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_arena_is_all_pending_with_zero_metrics() {
        let phases = Phases::new();
        for gate in PhaseGate::ALL {
            let p = &phases[gate];
            assert_eq!(p.gate, gate);
            assert_eq!(p.status, PhaseStatus::Pending);
            assert_eq!(p.metrics, PhaseMetrics::default());
            assert!(p.started_at.is_none());
            assert!(p.errors.is_empty());
        }
        assert_eq!(phases.completed_count(), 0);
    }

    #[test]
    fn test_merge_keeps_unspecified_fields() {
        let mut m = PhaseMetrics {
            test_coverage: 80.0,
            build_success_rate: 50.0,
            security_issues: 3,
            execution_time_ms: 10,
        };
        m.merge(&PhaseMetricsUpdate::new().build_success_rate(100.0));
        assert_eq!(m.build_success_rate, 100.0);
        assert_eq!(m.test_coverage, 80.0);
        assert_eq!(m.security_issues, 3);
        assert_eq!(m.execution_time_ms, 10);
    }

    #[test]
    fn test_metrics_update_deserializes_partial_json() {
        let update: PhaseMetricsUpdate =
            serde_json::from_str(r#"{"security_issues": 2}"#).unwrap();
        assert_eq!(update.security_issues, Some(2));
        assert!(update.test_coverage.is_none());
        assert!(!update.is_empty());
        assert!(PhaseMetricsUpdate::new().is_empty());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&PhaseStatus::BuildFail).unwrap(),
            "\"BUILD_FAIL\""
        );
        assert_eq!(PhaseStatus::Coding.to_string(), "CODING");
        assert!(PhaseStatus::Completed.is_terminal());
        assert!(!PhaseStatus::Rejected.is_terminal());
    }
}
