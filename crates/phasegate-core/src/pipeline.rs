//! Per-project pipeline state machine.
//!
//! [`PipelineStateManager`] owns one [`ProjectState`] and is the only thing
//! that mutates it. It does not lock, log, or enforce pause/cancel policy;
//! the engine layers those on top.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    PhaseGate, PhaseMetricsUpdate, PhaseState, PhaseStatus, Phases, ProjectState,
    ProjectUpgrade, ReferenceDocument,
};
use crate::quality_gate::{evaluate_phase, GateVerdict};

/// Result of [`PipelineStateManager::complete_phase`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// The gate rule held; the phase is `Completed`.
    Completed {
        verdict: GateVerdict,
        /// The new current phase, or `None` when the pointer did not move
        /// (last gate closed, or the pointer was already further along).
        advanced_to: Option<PhaseGate>,
    },
    /// The gate rule failed; the phase is `Rejected`.
    Rejected { verdict: GateVerdict },
    /// The gate was already `Completed`; nothing changed.
    AlreadyCompleted { gate: PhaseGate },
}

impl PhaseOutcome {
    /// `true` only for a fresh, successful completion.
    pub fn passed(&self) -> bool {
        matches!(self, PhaseOutcome::Completed { .. })
    }

    pub fn gate(&self) -> PhaseGate {
        match self {
            PhaseOutcome::Completed { verdict, .. } | PhaseOutcome::Rejected { verdict } => {
                verdict.gate
            }
            PhaseOutcome::AlreadyCompleted { gate } => *gate,
        }
    }
}

/// Owner of one project's lifecycle.
#[derive(Debug, Clone)]
pub struct PipelineStateManager {
    state: ProjectState,
}

impl PipelineStateManager {
    /// Create a project with all ten phases `Pending` and `G1` current.
    pub fn create(
        project_id: impl Into<String>,
        project_name: impl Into<String>,
        user_idea: impl Into<String>,
    ) -> Self {
        Self {
            state: ProjectState::new(project_id, project_name, user_idea),
        }
    }

    /// Rehydrate a manager from a previously captured state.
    pub fn from_state(state: ProjectState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    pub fn project_id(&self) -> &str {
        &self.state.project_id
    }

    pub fn current_phase(&self) -> PhaseGate {
        self.state.current_phase
    }

    pub fn phase(&self, gate: PhaseGate) -> &PhaseState {
        &self.state.phases[gate]
    }

    pub fn phases(&self) -> &Phases {
        &self.state.phases
    }

    fn touch(&mut self) {
        self.state.updated_at = Utc::now();
    }

    pub fn set_tech_stack(&mut self, tech_stack: Vec<String>) {
        self.state.tech_stack = tech_stack;
        self.touch();
    }

    // -----------------------------------------------------------------------
    // Phase transitions
    // -----------------------------------------------------------------------

    /// Move `gate` to `Coding` and make it current.
    ///
    /// Callers are trusted to request gates in order; no ordering check here.
    /// A `Completed` gate is never reopened: the call changes nothing and
    /// returns `false`.
    pub fn start_phase(&mut self, gate: PhaseGate) -> bool {
        let phase = &mut self.state.phases[gate];
        if phase.status.is_terminal() {
            return false;
        }
        phase.status = PhaseStatus::Coding;
        phase.started_at = Some(Utc::now());
        self.state.current_phase = gate;
        self.touch();
        true
    }

    pub fn update_phase_metrics(&mut self, gate: PhaseGate, update: &PhaseMetricsUpdate) {
        self.state.phases[gate].metrics.merge(update);
        self.touch();
    }

    /// Append to the gate's error log and force `BuildFail`.
    ///
    /// Returns `false` and leaves the phase alone when it is `Completed`.
    pub fn add_phase_error(&mut self, gate: PhaseGate, message: impl Into<String>) -> bool {
        let phase = &mut self.state.phases[gate];
        if phase.status.is_terminal() {
            return false;
        }
        phase.errors.push(message.into());
        phase.status = PhaseStatus::BuildFail;
        self.touch();
        true
    }

    pub fn add_phase_artifact(&mut self, gate: PhaseGate, path: impl Into<String>) {
        self.state.phases[gate].artifacts.push(path.into());
        self.touch();
    }

    /// Close `gate` if its quality rule holds.
    ///
    /// On success the phase becomes `Completed`, `execution_time_ms` is
    /// derived from the start/completion stamps, and `current_phase` moves
    /// to the following gate if that gate lies ahead of it; it never moves
    /// backward. On failure the phase becomes `Rejected` and `current_phase`
    /// stays put. A gate that is already `Completed` is left untouched.
    pub fn complete_phase(&mut self, gate: PhaseGate) -> PhaseOutcome {
        if self.state.phases[gate].status == PhaseStatus::Completed {
            return PhaseOutcome::AlreadyCompleted { gate };
        }

        let verdict = evaluate_phase(&self.state.phases[gate]);
        let phase = &mut self.state.phases[gate];

        if !verdict.passed() {
            phase.status = PhaseStatus::Rejected;
            self.touch();
            return PhaseOutcome::Rejected { verdict };
        }

        let completed_at = Utc::now();
        phase.status = PhaseStatus::Completed;
        phase.completed_at = Some(completed_at);
        phase.metrics.execution_time_ms = phase
            .started_at
            .map(|started| (completed_at - started).num_milliseconds().max(0) as u64)
            .unwrap_or(0);

        let advanced_to = gate
            .next()
            .filter(|next| *next > self.state.current_phase);
        if let Some(next) = advanced_to {
            self.state.current_phase = next;
        }
        self.touch();

        PhaseOutcome::Completed {
            verdict,
            advanced_to,
        }
    }

    /// Percentage of gates in `Completed` status (multiples of 10).
    pub fn project_progress(&self) -> u8 {
        (self.state.phases.completed_count() * 100 / PhaseGate::COUNT) as u8
    }

    pub fn is_project_completed(&self) -> bool {
        self.state.phases[PhaseGate::LAST].status == PhaseStatus::Completed
    }

    // -----------------------------------------------------------------------
    // Pause / cancel
    // -----------------------------------------------------------------------

    /// Does not check cancellation; callers must consult
    /// [`is_project_cancelled`](Self::is_project_cancelled) first.
    pub fn pause_project(&mut self) {
        self.state.is_paused = true;
        self.touch();
    }

    /// Does not check cancellation; a cancelled project stays cancelled.
    pub fn resume_project(&mut self) {
        self.state.is_paused = false;
        self.touch();
    }

    /// Terminal: sets both cancelled and paused. Idempotent.
    pub fn cancel_project(&mut self) {
        self.state.is_cancelled = true;
        self.state.is_paused = true;
        self.touch();
    }

    pub fn is_project_paused(&self) -> bool {
        self.state.is_paused
    }

    pub fn is_project_cancelled(&self) -> bool {
        self.state.is_cancelled
    }

    // -----------------------------------------------------------------------
    // References & upgrades
    // -----------------------------------------------------------------------

    pub fn add_reference(&mut self, doc: ReferenceDocument) {
        self.state.references.push(doc);
        self.touch();
    }

    pub fn references(&self) -> &[ReferenceDocument] {
        &self.state.references
    }

    /// Record a pending upgrade and return its id.
    pub fn add_upgrade(
        &mut self,
        instruction: impl Into<String>,
        references: Vec<ReferenceDocument>,
    ) -> Uuid {
        let upgrade = ProjectUpgrade::new(instruction, references);
        let id = upgrade.id;
        self.state.upgrades.push(upgrade);
        self.touch();
        id
    }

    pub fn upgrades(&self) -> &[ProjectUpgrade] {
        &self.state.upgrades
    }

    /// Stamp the upgrade's completion time once.
    ///
    /// Returns `false` when the id is unknown. Completing twice keeps the
    /// first timestamp and still returns `true`.
    pub fn complete_upgrade(&mut self, upgrade_id: Uuid) -> bool {
        let Some(upgrade) = self.state.upgrades.iter_mut().find(|u| u.id == upgrade_id) else {
            return false;
        };
        if upgrade.completed_at.is_none() {
            upgrade.completed_at = Some(Utc::now());
            self.touch();
        }
        true
    }
}
