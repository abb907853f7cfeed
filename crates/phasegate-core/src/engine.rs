//! Shared pipeline engine.
//!
//! [`PipelineEngine`] is the boundary callers talk to. It owns every
//! project behind its own async lock, plus the message queue, the event
//! log, the executor and the debugger. Pause/cancel policy is enforced here,
//! not in [`PipelineStateManager`].
//!
//! Lock order is always project, then queue, then log. The executor runs
//! without any project lock held.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::debugger::AutoDebugger;
use crate::domain::{
    EngineError, PhaseGate, PhaseMetricsUpdate, PhaseState, ProjectState, ProjectUpgrade,
    ReferenceDocument, Result,
};
use crate::event_log::{BuildEventLog, LogEntry, LogFilter, LogLevel};
use crate::executor::{BuildExecutor, BuildResult, ExecutionResult, Language, TestRunResult};
use crate::messaging::{AgentMessage, AgentRole, MessagePayload, MessageQueue, OutgoingMessage};
use crate::metrics::{Counter, METRICS};
use crate::obs;
use crate::pipeline::{PhaseOutcome, PipelineStateManager};
use crate::reporting::ProjectReport;

/// `source` recorded on log entries the engine writes itself.
pub const ENGINE_LOG_SOURCE: &str = "engine";

type ProjectHandle = Arc<Mutex<PipelineStateManager>>;

pub struct PipelineEngine {
    projects: RwLock<HashMap<String, ProjectHandle>>,
    queue: Mutex<MessageQueue>,
    log: Mutex<BuildEventLog>,
    executor: BuildExecutor,
    debugger: AutoDebugger,
}

impl Default for PipelineEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl PipelineEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_executor(
            BuildExecutor::new(config.executor.clone()),
            config.log_capacity,
        )
    }

    pub fn with_executor(executor: BuildExecutor, log_capacity: usize) -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            queue: Mutex::new(MessageQueue::new()),
            log: Mutex::new(BuildEventLog::with_capacity(log_capacity)),
            executor,
            debugger: AutoDebugger::new(),
        }
    }

    pub fn executor(&self) -> &BuildExecutor {
        &self.executor
    }

    pub fn debugger(&self) -> &AutoDebugger {
        &self.debugger
    }

    async fn project(&self, project_id: &str) -> Result<ProjectHandle> {
        self.projects
            .read()
            .await
            .get(project_id)
            .cloned()
            .ok_or_else(|| EngineError::ProjectNotFound(project_id.to_string()))
    }

    async fn record(
        &self,
        level: LogLevel,
        phase: Option<PhaseGate>,
        message: &str,
        metadata: Option<serde_json::Value>,
    ) {
        self.log
            .lock()
            .await
            .log(level, ENGINE_LOG_SOURCE, phase, message, metadata);
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Create a project under a fresh UUID v4 and return its initial state.
    pub async fn create_project(&self, project_name: &str, user_idea: &str) -> ProjectState {
        let project_id = Uuid::new_v4().to_string();
        let manager = PipelineStateManager::create(project_id.clone(), project_name, user_idea);
        let snapshot = manager.state().clone();

        self.projects
            .write()
            .await
            .insert(project_id.clone(), Arc::new(Mutex::new(manager)));

        METRICS.inc(Counter::ProjectsCreated);
        obs::emit_project_created(&project_id, project_name);
        self.record(
            LogLevel::Info,
            None,
            &format!("project '{project_name}' created"),
            Some(json!({ "project_id": project_id })),
        )
        .await;
        snapshot
    }

    pub async fn get_project(&self, project_id: &str) -> Result<ProjectState> {
        let handle = self.project(project_id).await?;
        let manager = handle.lock().await;
        Ok(manager.state().clone())
    }

    /// All projects, oldest first.
    pub async fn list_projects(&self) -> Vec<ProjectState> {
        let handles: Vec<ProjectHandle> = self.projects.read().await.values().cloned().collect();
        let mut states = Vec::with_capacity(handles.len());
        for handle in handles {
            states.push(handle.lock().await.state().clone());
        }
        states.sort_by_key(|s| s.created_at);
        states
    }

    pub async fn list_phases(&self, project_id: &str) -> Result<Vec<PhaseState>> {
        let handle = self.project(project_id).await?;
        let manager = handle.lock().await;
        Ok(manager.phases().iter().cloned().collect())
    }

    pub async fn set_tech_stack(&self, project_id: &str, tech_stack: Vec<String>) -> Result<()> {
        let handle = self.project(project_id).await?;
        handle.lock().await.set_tech_stack(tech_stack);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    #[instrument(skip(self), fields(gate = %gate))]
    pub async fn start_phase(&self, project_id: &str, gate: PhaseGate) -> Result<PhaseState> {
        let handle = self.project(project_id).await?;
        let mut manager = handle.lock().await;
        ensure_active(&manager, "start", gate)?;

        if manager.start_phase(gate) {
            obs::emit_phase_started(project_id, gate);
            self.record(
                LogLevel::Info,
                Some(gate),
                &format!("{} phase started", gate.label()),
                None,
            )
            .await;
        } else {
            self.record(
                LogLevel::Debug,
                Some(gate),
                &format!("{} phase already completed; not restarted", gate.label()),
                None,
            )
            .await;
        }
        Ok(manager.phase(gate).clone())
    }

    /// Run the quality gate for `gate`.
    ///
    /// Racing calls on one project are serialized by the project lock, so a
    /// gate advances `current_phase` at most once.
    #[instrument(skip(self), fields(gate = %gate))]
    pub async fn complete_phase(&self, project_id: &str, gate: PhaseGate) -> Result<PhaseOutcome> {
        let handle = self.project(project_id).await?;
        let mut manager = handle.lock().await;
        ensure_active(&manager, "complete", gate)?;

        let outcome = manager.complete_phase(gate);
        match &outcome {
            PhaseOutcome::Completed { advanced_to, .. } => {
                METRICS.inc(Counter::PhasesCompleted);
                obs::emit_phase_completed(project_id, gate, *advanced_to);
                self.record(
                    LogLevel::Success,
                    Some(gate),
                    &format!("{} phase passed its quality gate", gate.label()),
                    Some(json!({ "progress": manager.project_progress() })),
                )
                .await;
                if manager.is_project_completed() {
                    self.record(LogLevel::Success, None, "all phases completed", None)
                        .await;
                }
            }
            PhaseOutcome::Rejected { verdict } => {
                let violation = verdict.violation.as_deref().unwrap_or("quality gate failed");
                METRICS.inc(Counter::PhasesRejected);
                obs::emit_phase_rejected(project_id, gate, violation);
                self.record(
                    LogLevel::Warn,
                    Some(gate),
                    &format!("{} phase rejected: {violation}", gate.label()),
                    None,
                )
                .await;
            }
            PhaseOutcome::AlreadyCompleted { .. } => {
                self.record(
                    LogLevel::Debug,
                    Some(gate),
                    &format!("{} phase already completed", gate.label()),
                    None,
                )
                .await;
            }
        }
        Ok(outcome)
    }

    pub async fn update_phase_metrics(
        &self,
        project_id: &str,
        gate: PhaseGate,
        update: &PhaseMetricsUpdate,
    ) -> Result<PhaseState> {
        let handle = self.project(project_id).await?;
        let mut manager = handle.lock().await;
        manager.update_phase_metrics(gate, update);
        Ok(manager.phase(gate).clone())
    }

    pub async fn add_phase_error(
        &self,
        project_id: &str,
        gate: PhaseGate,
        message: &str,
    ) -> Result<()> {
        let handle = self.project(project_id).await?;
        let mut manager = handle.lock().await;
        if manager.add_phase_error(gate, message) {
            obs::emit_phase_error(project_id, gate, message);
            self.record(LogLevel::Error, Some(gate), message, None).await;
        } else {
            self.record(
                LogLevel::Debug,
                Some(gate),
                &format!("{} phase already completed; error not recorded", gate.label()),
                None,
            )
            .await;
        }
        Ok(())
    }

    pub async fn add_phase_artifact(
        &self,
        project_id: &str,
        gate: PhaseGate,
        path: &str,
    ) -> Result<()> {
        let handle = self.project(project_id).await?;
        handle.lock().await.add_phase_artifact(gate, path);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Executor results
    // -----------------------------------------------------------------------

    /// Fold a build result into `gate`.
    ///
    /// Success sets the build rate to 100 and records output files as
    /// artifacts. Failure sets it to 0, records each error, and sends the
    /// developer an error report with debugger suggestions.
    pub async fn record_build_result(
        &self,
        project_id: &str,
        gate: PhaseGate,
        result: &BuildResult,
    ) -> Result<PhaseState> {
        let handle = self.project(project_id).await?;
        let mut manager = handle.lock().await;

        self.dispatch(OutgoingMessage::new(
            AgentRole::Operations,
            AgentRole::TechLead,
            project_id,
            MessagePayload::BuildResult {
                gate,
                result: result.clone(),
            },
        ))
        .await;

        if result.success {
            manager.update_phase_metrics(gate, &PhaseMetricsUpdate::new().build_success_rate(100.0));
            for file in &result.output_files {
                manager.add_phase_artifact(gate, file.as_str());
            }
            self.record(
                LogLevel::Success,
                Some(gate),
                "build succeeded",
                Some(json!({
                    "output_files": result.output_files.len(),
                    "build_time_ms": result.build_time_ms,
                })),
            )
            .await;
        } else {
            manager.update_phase_metrics(gate, &PhaseMetricsUpdate::new().build_success_rate(0.0));
            for error in &result.errors {
                if manager.add_phase_error(gate, error.as_str()) {
                    obs::emit_phase_error(project_id, gate, error);
                }
            }
            let text = result.errors.join("\n");
            self.report_failure(project_id, gate, AgentRole::Operations, &text)
                .await;
            self.record(LogLevel::Error, Some(gate), &format!("build failed: {text}"), None)
                .await;
        }
        Ok(manager.phase(gate).clone())
    }

    /// Fold a test run into `gate`: coverage always, plus an error and a
    /// developer error report when any test failed.
    pub async fn record_test_result(
        &self,
        project_id: &str,
        gate: PhaseGate,
        result: &TestRunResult,
    ) -> Result<PhaseState> {
        let handle = self.project(project_id).await?;
        let mut manager = handle.lock().await;

        self.dispatch(OutgoingMessage::new(
            AgentRole::Qa,
            AgentRole::TechLead,
            project_id,
            MessagePayload::TestResult {
                gate,
                result: result.clone(),
            },
        ))
        .await;

        manager.update_phase_metrics(gate, &PhaseMetricsUpdate::new().test_coverage(result.coverage));
        let metadata = json!({
            "total": result.total,
            "passed": result.passed,
            "failed": result.failed,
            "coverage": result.coverage,
        });

        if result.all_passed() {
            self.record(LogLevel::Success, Some(gate), "all tests passed", Some(metadata))
                .await;
        } else {
            let error = format!("{} of {} tests failed", result.failed, result.total);
            if manager.add_phase_error(gate, error.as_str()) {
                obs::emit_phase_error(project_id, gate, &error);
            }
            self.report_failure(project_id, gate, AgentRole::Qa, &error)
                .await;
            self.record(LogLevel::Warn, Some(gate), &error, Some(metadata))
                .await;
        }
        Ok(manager.phase(gate).clone())
    }

    /// Build `source_files` with the executor and record the result.
    pub async fn run_build(
        &self,
        project_id: &str,
        gate: PhaseGate,
        source_files: &[String],
    ) -> Result<BuildResult> {
        self.project(project_id).await?;
        let result = self.executor.build_project(source_files).await;
        self.record_build_result(project_id, gate, &result).await?;
        Ok(result)
    }

    /// Run `test_code` with the executor and record the result.
    pub async fn run_tests(
        &self,
        project_id: &str,
        gate: PhaseGate,
        test_code: &str,
        source_code: &str,
    ) -> Result<TestRunResult> {
        self.project(project_id).await?;
        let result = self.executor.run_tests(test_code, source_code).await;
        self.record_test_result(project_id, gate, &result).await?;
        Ok(result)
    }

    /// Execute a code submission; failures become phase errors and an
    /// error report to the developer.
    pub async fn run_code(
        &self,
        project_id: &str,
        gate: PhaseGate,
        code: &str,
        language: &Language,
    ) -> Result<ExecutionResult> {
        let handle = self.project(project_id).await?;
        let result = self.executor.execute_code(code, language).await;

        if !result.success {
            let mut manager = handle.lock().await;
            for error in &result.errors {
                if manager.add_phase_error(gate, error.as_str()) {
                    obs::emit_phase_error(project_id, gate, error);
                }
            }
            self.report_failure(project_id, gate, AgentRole::Qa, &result.errors.join("\n"))
                .await;
            self.record(
                LogLevel::Error,
                Some(gate),
                &format!("{language} execution failed"),
                Some(json!({ "errors": result.errors })),
            )
            .await;
        }
        Ok(result)
    }

    async fn report_failure(&self, project_id: &str, gate: PhaseGate, from: AgentRole, error: &str) {
        let suggestions = self.debugger.analyze_error(error);
        METRICS.inc(Counter::FailuresReported);
        self.dispatch(OutgoingMessage::new(
            from,
            AgentRole::Developer,
            project_id,
            MessagePayload::ErrorReport {
                gate,
                error: error.to_string(),
                suggestions,
            },
        ))
        .await;
    }

    // -----------------------------------------------------------------------
    // Messaging
    // -----------------------------------------------------------------------

    async fn dispatch(&self, outgoing: OutgoingMessage) -> AgentMessage {
        let message = self.queue.lock().await.send(outgoing);
        METRICS.inc(Counter::MessagesSent);
        obs::emit_message_sent(
            &message.project_id,
            message.from,
            message.to,
            message.message_type(),
        );
        message
    }

    /// Send a message about an existing project.
    pub async fn send_message(&self, outgoing: OutgoingMessage) -> Result<AgentMessage> {
        self.project(&outgoing.project_id).await?;
        Ok(self.dispatch(outgoing).await)
    }

    pub async fn receive_messages(&self, role: AgentRole) -> Vec<AgentMessage> {
        self.queue.lock().await.receive(role)
    }

    pub async fn receive_project_messages(
        &self,
        project_id: &str,
        role: AgentRole,
    ) -> Vec<AgentMessage> {
        self.queue.lock().await.receive_for(project_id, role)
    }

    pub async fn messages_by_project(&self, project_id: &str) -> Vec<AgentMessage> {
        self.queue.lock().await.messages_by_project(project_id)
    }

    pub async fn acknowledge_message(&self, message_id: Uuid) -> bool {
        self.queue.lock().await.acknowledge(message_id)
    }

    pub async fn clear_messages(&self) {
        self.queue.lock().await.clear();
    }

    // -----------------------------------------------------------------------
    // Event log
    // -----------------------------------------------------------------------

    pub async fn append_log(
        &self,
        level: LogLevel,
        source: &str,
        phase: Option<PhaseGate>,
        message: &str,
        metadata: Option<serde_json::Value>,
    ) -> LogEntry {
        self.log
            .lock()
            .await
            .log(level, source, phase, message, metadata)
    }

    pub async fn get_logs(&self, filter: &LogFilter) -> Vec<LogEntry> {
        self.log.lock().await.get_logs(filter)
    }

    pub async fn recent_logs(&self, n: usize) -> Vec<LogEntry> {
        self.log.lock().await.recent(n)
    }

    pub async fn export_logs(&self) -> String {
        self.log.lock().await.export()
    }

    pub async fn clear_logs(&self) {
        self.log.lock().await.clear();
    }

    // -----------------------------------------------------------------------
    // Pause / resume / cancel
    // -----------------------------------------------------------------------

    pub async fn pause_project(&self, project_id: &str) -> Result<()> {
        let handle = self.project(project_id).await?;
        let mut manager = handle.lock().await;
        ensure_not_cancelled(&manager, "pause")?;
        manager.pause_project();
        obs::emit_project_control(project_id, "pause");
        self.record(LogLevel::Warn, None, "project paused", None).await;
        Ok(())
    }

    pub async fn resume_project(&self, project_id: &str) -> Result<()> {
        let handle = self.project(project_id).await?;
        let mut manager = handle.lock().await;
        ensure_not_cancelled(&manager, "resume")?;
        manager.resume_project();
        obs::emit_project_control(project_id, "resume");
        self.record(LogLevel::Info, None, "project resumed", None).await;
        Ok(())
    }

    /// Terminal. Cancelling twice is a no-op.
    pub async fn cancel_project(&self, project_id: &str) -> Result<()> {
        let handle = self.project(project_id).await?;
        let mut manager = handle.lock().await;
        if manager.is_project_cancelled() {
            return Ok(());
        }
        manager.cancel_project();
        obs::emit_project_control(project_id, "cancel");
        self.record(LogLevel::Warn, None, "project cancelled", None).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // References & upgrades
    // -----------------------------------------------------------------------

    pub async fn add_reference(&self, project_id: &str, doc: ReferenceDocument) -> Result<()> {
        let handle = self.project(project_id).await?;
        handle.lock().await.add_reference(doc);
        Ok(())
    }

    pub async fn references(&self, project_id: &str) -> Result<Vec<ReferenceDocument>> {
        let handle = self.project(project_id).await?;
        let manager = handle.lock().await;
        Ok(manager.references().to_vec())
    }

    pub async fn add_upgrade(
        &self,
        project_id: &str,
        instruction: &str,
        references: Vec<ReferenceDocument>,
    ) -> Result<Uuid> {
        let handle = self.project(project_id).await?;
        let id = handle.lock().await.add_upgrade(instruction, references);
        self.record(
            LogLevel::Info,
            None,
            &format!("upgrade requested: {instruction}"),
            Some(json!({ "upgrade_id": id })),
        )
        .await;
        Ok(id)
    }

    /// `false` when `upgrade_id` is unknown for this project.
    pub async fn complete_upgrade(&self, project_id: &str, upgrade_id: Uuid) -> Result<bool> {
        let handle = self.project(project_id).await?;
        let found = handle.lock().await.complete_upgrade(upgrade_id);
        Ok(found)
    }

    pub async fn upgrades(&self, project_id: &str) -> Result<Vec<ProjectUpgrade>> {
        let handle = self.project(project_id).await?;
        let manager = handle.lock().await;
        Ok(manager.upgrades().to_vec())
    }

    // -----------------------------------------------------------------------
    // Reporting
    // -----------------------------------------------------------------------

    pub async fn export_report(&self, project_id: &str) -> Result<ProjectReport> {
        let handle = self.project(project_id).await?;
        let manager = handle.lock().await;
        Ok(ProjectReport::from_manager(&manager))
    }
}

/// Phase operations require a project that is neither paused nor cancelled.
fn ensure_active(
    manager: &PipelineStateManager,
    operation: &'static str,
    gate: PhaseGate,
) -> Result<()> {
    let project_id = manager.project_id();
    let refusal = if manager.is_project_cancelled() {
        EngineError::ProjectCancelled(project_id.to_string())
    } else if manager.is_project_paused() {
        EngineError::ProjectPaused {
            project_id: project_id.to_string(),
            operation,
            gate,
        }
    } else {
        return Ok(());
    };
    obs::emit_operation_refused(project_id, operation, &refusal);
    Err(refusal)
}

fn ensure_not_cancelled(manager: &PipelineStateManager, operation: &str) -> Result<()> {
    if !manager.is_project_cancelled() {
        return Ok(());
    }
    let refusal = EngineError::ProjectCancelled(manager.project_id().to_string());
    obs::emit_operation_refused(manager.project_id(), operation, &refusal);
    Err(refusal)
}
