//! Typed message payloads.
//!
//! Each variant of [`MessagePayload`] is one message type and carries its
//! own strongly-typed body. The `serde(tag = "type")` discriminant is the
//! wire-level message type.

use serde::{Deserialize, Serialize};

use crate::debugger::DebugSuggestion;
use crate::domain::PhaseGate;
use crate::executor::{BuildResult, TestRunResult};

/// Message type discriminant, derived from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    TaskAssignment,
    CodeSubmission,
    TestResult,
    BuildResult,
    DeployResult,
    ErrorReport,
    StatusUpdate,
}

/// Body of an agent message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePayload {
    TaskAssignment {
        gate: PhaseGate,
        description: String,
    },
    CodeSubmission {
        gate: PhaseGate,
        language: String,
        files: Vec<String>,
    },
    TestResult {
        gate: PhaseGate,
        result: TestRunResult,
    },
    BuildResult {
        gate: PhaseGate,
        result: BuildResult,
    },
    DeployResult {
        environment: String,
        success: bool,
        url: Option<String>,
    },
    ErrorReport {
        gate: PhaseGate,
        error: String,
        suggestions: Vec<DebugSuggestion>,
    },
    StatusUpdate {
        message: String,
    },
}

impl MessagePayload {
    pub fn message_type(&self) -> MessageType {
        match self {
            MessagePayload::TaskAssignment { .. } => MessageType::TaskAssignment,
            MessagePayload::CodeSubmission { .. } => MessageType::CodeSubmission,
            MessagePayload::TestResult { .. } => MessageType::TestResult,
            MessagePayload::BuildResult { .. } => MessageType::BuildResult,
            MessagePayload::DeployResult { .. } => MessageType::DeployResult,
            MessagePayload::ErrorReport { .. } => MessageType::ErrorReport,
            MessagePayload::StatusUpdate { .. } => MessageType::StatusUpdate,
        }
    }

    /// The gate this payload concerns, when it names one.
    pub fn gate(&self) -> Option<PhaseGate> {
        match self {
            MessagePayload::TaskAssignment { gate, .. }
            | MessagePayload::CodeSubmission { gate, .. }
            | MessagePayload::TestResult { gate, .. }
            | MessagePayload::BuildResult { gate, .. }
            | MessagePayload::ErrorReport { gate, .. } => Some(*gate),
            MessagePayload::DeployResult { .. } | MessagePayload::StatusUpdate { .. } => None,
        }
    }
}
