//! Quality gate rules engine.
//!
//! Each gate carries at most one rule. [`rule_for`] is the rule table;
//! [`evaluate_phase`] checks a [`PhaseState`]'s metrics against it and
//! produces a [`GateVerdict`]. Gates without a rule always pass.

use serde::{Deserialize, Serialize};

use crate::domain::{PhaseGate, PhaseMetrics, PhaseState};

/// Build success rate required on the build-checked gates.
pub const REQUIRED_BUILD_SUCCESS_RATE: f64 = 100.0;

/// Minimum test coverage for the unit-test gate.
pub const MIN_TEST_COVERAGE: f64 = 95.0;

/// Maximum open security issues for the security-scan gate.
pub const MAX_SECURITY_ISSUES: u32 = 0;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// A single quality rule that can block a phase from closing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QualityRule {
    /// `build_success_rate` must be 100.
    FullBuildSuccess,
    /// `test_coverage` must be at least [`MIN_TEST_COVERAGE`].
    MinTestCoverage,
    /// `security_issues` must be zero.
    NoSecurityIssues,
}

impl QualityRule {
    /// Short description for gate tables and reports.
    pub fn describe(self) -> String {
        match self {
            QualityRule::FullBuildSuccess => {
                format!("build success rate == {REQUIRED_BUILD_SUCCESS_RATE}%")
            }
            QualityRule::MinTestCoverage => format!("test coverage >= {MIN_TEST_COVERAGE}%"),
            QualityRule::NoSecurityIssues => {
                format!("security issues == {MAX_SECURITY_ISSUES}")
            }
        }
    }

    fn check(self, metrics: &PhaseMetrics) -> Option<String> {
        match self {
            QualityRule::FullBuildSuccess => {
                // Exact match: rates above 100 or NaN are not a clean build.
                if metrics.build_success_rate != REQUIRED_BUILD_SUCCESS_RATE {
                    Some(format!(
                        "build success rate {:.2}% != required {:.2}%",
                        metrics.build_success_rate, REQUIRED_BUILD_SUCCESS_RATE,
                    ))
                } else {
                    None
                }
            }
            QualityRule::MinTestCoverage => {
                if metrics.test_coverage.is_nan() || metrics.test_coverage < MIN_TEST_COVERAGE {
                    Some(format!(
                        "test coverage {:.3}% < required {:.2}%",
                        metrics.test_coverage, MIN_TEST_COVERAGE,
                    ))
                } else {
                    None
                }
            }
            QualityRule::NoSecurityIssues => {
                if metrics.security_issues > MAX_SECURITY_ISSUES {
                    Some(format!(
                        "{} open security issue(s); {} allowed",
                        metrics.security_issues, MAX_SECURITY_ISSUES,
                    ))
                } else {
                    None
                }
            }
        }
    }
}

/// The rule attached to `gate`, if any.
///
/// Build success on the four construction gates, coverage on unit tests,
/// security on the scan gate. Docs, deployment, build optimization and
/// handover carry no rule.
pub fn rule_for(gate: PhaseGate) -> Option<QualityRule> {
    match gate {
        PhaseGate::G1CoreLogic
        | PhaseGate::G2Api
        | PhaseGate::G3Ui
        | PhaseGate::G4Integration => Some(QualityRule::FullBuildSuccess),
        PhaseGate::G5UnitTests => Some(QualityRule::MinTestCoverage),
        PhaseGate::G6SecurityScan => Some(QualityRule::NoSecurityIssues),
        PhaseGate::G7Docs
        | PhaseGate::G8Deployment
        | PhaseGate::G9BuildOptimization
        | PhaseGate::G10Handover => None,
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Outcome of checking one phase against its gate rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateVerdict {
    pub gate: PhaseGate,
    /// The rule that was applied (`None` for rule-free gates).
    pub rule: Option<QualityRule>,
    /// Why the rule failed; `None` when passed.
    pub violation: Option<String>,
}

impl GateVerdict {
    pub fn passed(&self) -> bool {
        self.violation.is_none()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Evaluate a phase's metrics against its gate's rule.
pub fn evaluate_phase(phase: &PhaseState) -> GateVerdict {
    let rule = rule_for(phase.gate);
    let violation = rule.and_then(|r| r.check(&phase.metrics));
    GateVerdict {
        gate: phase.gate,
        rule,
        violation,
    }
}

/// Whether `phase` satisfies the rule of its gate.
pub fn can_progress_to_next_phase(phase: &PhaseState) -> bool {
    evaluate_phase(phase).passed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase_with(gate: PhaseGate, metrics: PhaseMetrics) -> PhaseState {
        let mut p = PhaseState::pending(gate);
        p.metrics = metrics;
        p
    }

    #[test]
    fn test_build_gates_require_full_build_success() {
        for gate in [
            PhaseGate::G1CoreLogic,
            PhaseGate::G2Api,
            PhaseGate::G3Ui,
            PhaseGate::G4Integration,
        ] {
            let failing = phase_with(
                gate,
                PhaseMetrics {
                    build_success_rate: 99.9,
                    test_coverage: 100.0,
                    ..Default::default()
                },
            );
            assert!(!can_progress_to_next_phase(&failing), "{gate}");

            let passing = phase_with(
                gate,
                PhaseMetrics {
                    build_success_rate: 100.0,
                    test_coverage: 0.0,
                    security_issues: 12,
                    ..Default::default()
                },
            );
            assert!(can_progress_to_next_phase(&passing), "{gate}");
        }
    }

    #[test]
    fn test_build_rule_requires_exactly_full_success() {
        for rate in [150.0, 100.5, f64::NAN, f64::INFINITY] {
            let p = phase_with(
                PhaseGate::G1CoreLogic,
                PhaseMetrics {
                    build_success_rate: rate,
                    ..Default::default()
                },
            );
            let verdict = evaluate_phase(&p);
            assert!(!verdict.passed(), "rate {rate} should fail");
            assert_eq!(verdict.rule, Some(QualityRule::FullBuildSuccess));
        }
    }

    #[test]
    fn test_nan_coverage_fails_unit_test_gate() {
        let p = phase_with(
            PhaseGate::G5UnitTests,
            PhaseMetrics {
                test_coverage: f64::NAN,
                ..Default::default()
            },
        );
        assert!(!can_progress_to_next_phase(&p));

        let over = phase_with(
            PhaseGate::G5UnitTests,
            PhaseMetrics {
                test_coverage: 100.0,
                ..Default::default()
            },
        );
        assert!(can_progress_to_next_phase(&over));
    }

    #[test]
    fn test_coverage_boundary_on_unit_test_gate() {
        let at = phase_with(
            PhaseGate::G5UnitTests,
            PhaseMetrics {
                test_coverage: 95.0,
                ..Default::default()
            },
        );
        assert!(can_progress_to_next_phase(&at));

        let below = phase_with(
            PhaseGate::G5UnitTests,
            PhaseMetrics {
                test_coverage: 94.999,
                build_success_rate: 100.0,
                ..Default::default()
            },
        );
        let verdict = evaluate_phase(&below);
        assert!(!verdict.passed());
        assert_eq!(verdict.rule, Some(QualityRule::MinTestCoverage));
        assert!(verdict.violation.unwrap().contains("94.999"));
    }

    #[test]
    fn test_security_gate_counts_issues() {
        let clean = phase_with(PhaseGate::G6SecurityScan, PhaseMetrics::default());
        assert!(can_progress_to_next_phase(&clean));

        let one = phase_with(
            PhaseGate::G6SecurityScan,
            PhaseMetrics {
                security_issues: 1,
                build_success_rate: 100.0,
                test_coverage: 100.0,
                ..Default::default()
            },
        );
        assert!(!can_progress_to_next_phase(&one));
    }

    #[test]
    fn test_rule_free_gates_always_pass() {
        for gate in [
            PhaseGate::G7Docs,
            PhaseGate::G8Deployment,
            PhaseGate::G9BuildOptimization,
            PhaseGate::G10Handover,
        ] {
            let p = phase_with(
                gate,
                PhaseMetrics {
                    security_issues: 99,
                    ..Default::default()
                },
            );
            let verdict = evaluate_phase(&p);
            assert!(verdict.passed());
            assert!(verdict.rule.is_none());
        }
    }

    #[test]
    fn test_rule_table_has_one_rule_per_checked_gate() {
        let checked = PhaseGate::ALL
            .iter()
            .filter(|g| rule_for(**g).is_some())
            .count();
        assert_eq!(checked, 6);
        assert!(QualityRule::MinTestCoverage.describe().contains("95"));
    }
}
