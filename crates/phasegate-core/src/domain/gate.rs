//! The ten fixed, totally ordered phase gates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::GateParseError;

/// One of the ten gates a project passes through, in traversal order.
///
/// Ordering (`Ord`) follows the declaration order, so `G1CoreLogic` is the
/// smallest and `G10Handover` the largest gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PhaseGate {
    #[serde(rename = "G1_CORE_LOGIC")]
    G1CoreLogic,
    #[serde(rename = "G2_API")]
    G2Api,
    #[serde(rename = "G3_UI")]
    G3Ui,
    #[serde(rename = "G4_INTEGRATION")]
    G4Integration,
    #[serde(rename = "G5_UNIT_TESTS")]
    G5UnitTests,
    #[serde(rename = "G6_SECURITY_SCAN")]
    G6SecurityScan,
    #[serde(rename = "G7_DOCS")]
    G7Docs,
    #[serde(rename = "G8_DEPLOYMENT")]
    G8Deployment,
    #[serde(rename = "G9_BUILD_OPTIMIZATION")]
    G9BuildOptimization,
    #[serde(rename = "G10_HANDOVER")]
    G10Handover,
}

impl PhaseGate {
    /// Number of gates in the pipeline.
    pub const COUNT: usize = 10;

    /// All gates in traversal order.
    pub const ALL: [PhaseGate; Self::COUNT] = [
        PhaseGate::G1CoreLogic,
        PhaseGate::G2Api,
        PhaseGate::G3Ui,
        PhaseGate::G4Integration,
        PhaseGate::G5UnitTests,
        PhaseGate::G6SecurityScan,
        PhaseGate::G7Docs,
        PhaseGate::G8Deployment,
        PhaseGate::G9BuildOptimization,
        PhaseGate::G10Handover,
    ];

    /// The first gate of every pipeline.
    pub const FIRST: PhaseGate = PhaseGate::G1CoreLogic;

    /// The gate whose completion completes the project.
    pub const LAST: PhaseGate = PhaseGate::G10Handover;

    /// Zero-based position in the traversal order.
    pub fn ordinal(self) -> usize {
        match self {
            PhaseGate::G1CoreLogic => 0,
            PhaseGate::G2Api => 1,
            PhaseGate::G3Ui => 2,
            PhaseGate::G4Integration => 3,
            PhaseGate::G5UnitTests => 4,
            PhaseGate::G6SecurityScan => 5,
            PhaseGate::G7Docs => 6,
            PhaseGate::G8Deployment => 7,
            PhaseGate::G9BuildOptimization => 8,
            PhaseGate::G10Handover => 9,
        }
    }

    /// The gate that follows this one, or `None` for the last gate.
    pub fn next(self) -> Option<PhaseGate> {
        Self::ALL.get(self.ordinal() + 1).copied()
    }

    pub fn is_last(self) -> bool {
        self == Self::LAST
    }

    /// Wire name, e.g. `G1_CORE_LOGIC`.
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseGate::G1CoreLogic => "G1_CORE_LOGIC",
            PhaseGate::G2Api => "G2_API",
            PhaseGate::G3Ui => "G3_UI",
            PhaseGate::G4Integration => "G4_INTEGRATION",
            PhaseGate::G5UnitTests => "G5_UNIT_TESTS",
            PhaseGate::G6SecurityScan => "G6_SECURITY_SCAN",
            PhaseGate::G7Docs => "G7_DOCS",
            PhaseGate::G8Deployment => "G8_DEPLOYMENT",
            PhaseGate::G9BuildOptimization => "G9_BUILD_OPTIMIZATION",
            PhaseGate::G10Handover => "G10_HANDOVER",
        }
    }

    /// Human-readable label used in logs and reports.
    pub fn label(self) -> &'static str {
        match self {
            PhaseGate::G1CoreLogic => "Core Logic",
            PhaseGate::G2Api => "API Layer",
            PhaseGate::G3Ui => "User Interface",
            PhaseGate::G4Integration => "Integration",
            PhaseGate::G5UnitTests => "Unit Tests",
            PhaseGate::G6SecurityScan => "Security Scan",
            PhaseGate::G7Docs => "Documentation",
            PhaseGate::G8Deployment => "Deployment",
            PhaseGate::G9BuildOptimization => "Build Optimization",
            PhaseGate::G10Handover => "Handover",
        }
    }
}

impl fmt::Display for PhaseGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseGate {
    type Err = GateParseError;

    /// Accepts the wire name case-insensitively (`g5_unit_tests` works).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GateParseError::UnknownGate(s.to_string()))
    }
}
