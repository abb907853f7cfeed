//! End-to-end behaviour of a single project's state machine.

use phasegate_core::{
    can_progress_to_next_phase, PhaseGate, PhaseMetrics, PhaseMetricsUpdate, PhaseOutcome,
    PhaseState, PhaseStatus, PipelineStateManager,
};

fn passing() -> PhaseMetricsUpdate {
    PhaseMetricsUpdate::new()
        .build_success_rate(100.0)
        .test_coverage(95.0)
        .security_issues(0)
}

fn drive(manager: &mut PipelineStateManager, gate: PhaseGate) -> PhaseOutcome {
    manager.start_phase(gate);
    manager.update_phase_metrics(gate, &passing());
    manager.complete_phase(gate)
}

#[test]
fn todo_app_first_gate_passes_and_second_is_rejected() {
    let mut todo = PipelineStateManager::create("todo-1", "Todo App", "a simple todo list");

    todo.start_phase(PhaseGate::G1CoreLogic);
    todo.update_phase_metrics(PhaseGate::G1CoreLogic, &passing());
    let outcome = todo.complete_phase(PhaseGate::G1CoreLogic);
    assert!(outcome.passed());
    assert_eq!(todo.current_phase(), PhaseGate::G2Api);
    assert_eq!(todo.project_progress(), 10);

    todo.start_phase(PhaseGate::G2Api);
    todo.update_phase_metrics(
        PhaseGate::G2Api,
        &PhaseMetricsUpdate::new().build_success_rate(80.0),
    );
    let outcome = todo.complete_phase(PhaseGate::G2Api);
    assert!(!outcome.passed());
    match outcome {
        PhaseOutcome::Rejected { verdict } => {
            assert!(verdict.violation.is_some());
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(todo.phase(PhaseGate::G2Api).status, PhaseStatus::Rejected);
    assert_eq!(todo.current_phase(), PhaseGate::G2Api);
    assert_eq!(todo.project_progress(), 10);
}

#[test]
fn progress_tracks_gates_driven_in_order() {
    let mut manager = PipelineStateManager::create("p", "Progress", "count gates");
    for (n, gate) in PhaseGate::ALL.into_iter().enumerate() {
        assert!(!manager.is_project_completed());
        assert!(drive(&mut manager, gate).passed(), "{gate} should pass");
        assert_eq!(usize::from(manager.project_progress()), (n + 1) * 10);
    }
    assert!(manager.is_project_completed());
    assert_eq!(manager.current_phase(), PhaseGate::LAST);
}

#[test]
fn build_gates_ignore_other_metrics() {
    for gate in [
        PhaseGate::G1CoreLogic,
        PhaseGate::G2Api,
        PhaseGate::G3Ui,
        PhaseGate::G4Integration,
    ] {
        let mut manager = PipelineStateManager::create("p", "Build", "rule check");
        manager.update_phase_metrics(
            gate,
            &PhaseMetricsUpdate::new()
                .build_success_rate(100.0)
                .test_coverage(0.0)
                .security_issues(12),
        );
        assert!(manager.complete_phase(gate).passed(), "{gate}");

        let mut manager = PipelineStateManager::create("p", "Build", "rule check");
        manager.update_phase_metrics(
            gate,
            &PhaseMetricsUpdate::new()
                .build_success_rate(99.9)
                .test_coverage(100.0),
        );
        assert!(!manager.complete_phase(gate).passed(), "{gate}");
        assert_eq!(manager.phase(gate).status, PhaseStatus::Rejected);
    }
}

#[test]
fn coverage_boundary_on_unit_test_gate() {
    let phase = |coverage: f64| PhaseState {
        metrics: PhaseMetrics {
            test_coverage: coverage,
            ..PhaseMetrics::default()
        },
        ..PhaseState::pending(PhaseGate::G5UnitTests)
    };
    assert!(can_progress_to_next_phase(&phase(95.0)));
    assert!(can_progress_to_next_phase(&phase(100.0)));
    assert!(!can_progress_to_next_phase(&phase(94.999)));
}

#[test]
fn security_boundary_on_scan_gate() {
    let mut manager = PipelineStateManager::create("p", "Sec", "scan");
    manager.update_phase_metrics(
        PhaseGate::G6SecurityScan,
        &PhaseMetricsUpdate::new().security_issues(1),
    );
    assert!(!manager.complete_phase(PhaseGate::G6SecurityScan).passed());

    manager.update_phase_metrics(
        PhaseGate::G6SecurityScan,
        &PhaseMetricsUpdate::new().security_issues(0),
    );
    assert!(manager.complete_phase(PhaseGate::G6SecurityScan).passed());
}

#[test]
fn documentation_gate_always_passes() {
    let mut manager = PipelineStateManager::create("p", "Docs", "write docs");
    manager.update_phase_metrics(
        PhaseGate::G7Docs,
        &PhaseMetricsUpdate::new()
            .build_success_rate(0.0)
            .security_issues(99),
    );
    assert!(manager.complete_phase(PhaseGate::G7Docs).passed());
}

#[test]
fn cancel_then_resume_stays_cancelled() {
    let mut manager = PipelineStateManager::create("p", "Cancel", "stop");
    manager.cancel_project();
    manager.resume_project();
    assert!(manager.is_project_cancelled());
}

#[test]
fn upgrade_completion_is_idempotent() {
    let mut manager = PipelineStateManager::create("todo-1", "Todo App", "a simple todo list");
    let id = manager.add_upgrade("add payments", vec![]);
    assert!(manager.complete_upgrade(id));
    let first = manager.upgrades()[0].completed_at;
    assert!(first.is_some());

    assert!(manager.complete_upgrade(id));
    assert_eq!(manager.upgrades()[0].completed_at, first);
}
