//! Domain-level error taxonomy.
//!
//! Gate rejections are not errors: they surface as `REJECTED` phase status.
//! These types cover boundary failures only.

use crate::domain::gate::PhaseGate;

/// Errors produced when parsing gate identifiers at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateParseError {
    #[error("unknown phase gate: {0}")]
    UnknownGate(String),
}

/// Errors produced by the pipeline engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("project {0} is cancelled")]
    ProjectCancelled(String),

    #[error("project {project_id} is paused; cannot {operation} {gate}")]
    ProjectPaused {
        project_id: String,
        operation: &'static str,
        gate: PhaseGate,
    },

    #[error("gate error: {0}")]
    Gate(#[from] GateParseError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::ProjectNotFound("p-42".to_string());
        assert!(err.to_string().contains("project not found"));
        assert!(err.to_string().contains("p-42"));

        let err = EngineError::ProjectCancelled("p-1".to_string());
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn test_paused_error_names_operation_and_gate() {
        let err = EngineError::ProjectPaused {
            project_id: "p-7".to_string(),
            operation: "start",
            gate: PhaseGate::G3Ui,
        };
        let msg = err.to_string();
        assert!(msg.contains("p-7"));
        assert!(msg.contains("start"));
        assert!(msg.contains("G3_UI"));
    }

    #[test]
    fn test_gate_parse_error_converts() {
        let err: EngineError = GateParseError::UnknownGate("nope".into()).into();
        assert!(err.to_string().contains("unknown phase gate"));
    }
}
