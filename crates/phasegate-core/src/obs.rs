//! Structured observability hooks for pipeline lifecycle events.
//!
//! This module provides:
//! - Project-scoped tracing spans via the `ProjectSpan` RAII guard
//! - Emission functions for phase transitions, messaging, and project control
//!
//! Events are emitted at `info!` level unless noted. Filter with `RUST_LOG`.

use tracing::{info, warn};

use crate::domain::PhaseGate;
use crate::messaging::{AgentRole, MessageType};

/// Span carrying `project_id` for everything run inside it.
///
/// Async callers attach it with `tracing::Instrument`:
///
/// ```ignore
/// engine.complete_phase(&id, gate).instrument(project_span(&id)).await?;
/// ```
pub fn project_span(project_id: &str) -> tracing::Span {
    tracing::info_span!("phasegate.project", project_id = %project_id)
}

/// RAII guard that enters [`project_span`] for synchronous code.
pub struct ProjectSpan {
    _span: tracing::span::EnteredSpan,
}

impl ProjectSpan {
    pub fn enter(project_id: &str) -> Self {
        Self {
            _span: project_span(project_id).entered(),
        }
    }
}

pub fn emit_project_created(project_id: &str, project_name: &str) {
    info!(event = "project.created", project_id = %project_id, project_name = %project_name);
}

pub fn emit_phase_started(project_id: &str, gate: PhaseGate) {
    info!(event = "phase.started", project_id = %project_id, gate = %gate);
}

/// Emit event: a gate passed and the pipeline advanced (or finished).
pub fn emit_phase_completed(project_id: &str, gate: PhaseGate, advanced_to: Option<PhaseGate>) {
    let next = advanced_to.map_or("none", PhaseGate::as_str);
    info!(
        event = "phase.completed",
        project_id = %project_id,
        gate = %gate,
        advanced_to = next,
    );
}

/// Emit event: a gate rule failed (warning level).
pub fn emit_phase_rejected(project_id: &str, gate: PhaseGate, violation: &str) {
    warn!(
        event = "phase.rejected",
        project_id = %project_id,
        gate = %gate,
        violation = %violation,
    );
}

pub fn emit_phase_error(project_id: &str, gate: PhaseGate, error: &str) {
    warn!(event = "phase.error", project_id = %project_id, gate = %gate, error = %error);
}

pub fn emit_message_sent(project_id: &str, from: AgentRole, to: AgentRole, kind: MessageType) {
    info!(
        event = "message.sent",
        project_id = %project_id,
        from = %from,
        to = %to,
        kind = ?kind,
    );
}

/// Emit event: pause, resume, or cancel.
pub fn emit_project_control(project_id: &str, action: &str) {
    info!(event = "project.control", project_id = %project_id, action = %action);
}

/// Emit event: the engine refused an operation (warning level).
pub fn emit_operation_refused(project_id: &str, operation: &str, reason: &dyn std::fmt::Display) {
    warn!(
        event = "operation.refused",
        project_id = %project_id,
        operation = %operation,
        reason = %reason,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_span_create() {
        let _span = ProjectSpan::enter("test-project");
        emit_phase_completed("test-project", PhaseGate::G10Handover, None);
    }
}
