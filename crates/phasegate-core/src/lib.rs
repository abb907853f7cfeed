//! Phasegate Core Library
//!
//! A ten-gate delivery pipeline: per-project state machines, numeric
//! quality gates, an agent message queue, a rule-based build/test
//! executor, an error classifier and a bounded build event log, tied
//! together by [`PipelineEngine`].

pub mod config;
pub mod debugger;
pub mod domain;
pub mod engine;
pub mod event_log;
pub mod executor;
pub mod messaging;
pub mod metrics;
pub mod obs;
pub mod pipeline;
pub mod quality_gate;
pub mod reporting;
pub mod telemetry;

pub use config::{ConfigError, EngineConfig, LoggingConfig};
pub use debugger::{AutoDebugger, DebugSuggestion, ErrorCategory, Priority};
pub use domain::{
    EngineError, GateParseError, PhaseGate, PhaseMetrics, PhaseMetricsUpdate, PhaseState,
    PhaseStatus, Phases, ProjectState, ProjectUpgrade, ReferenceDocument, ReferenceKind, Result,
};
pub use engine::PipelineEngine;
pub use event_log::{BuildEventLog, LogEntry, LogFilter, LogLevel, DEFAULT_LOG_CAPACITY};
pub use executor::{
    BuildExecutor, BuildResult, Delay, ExecutionResult, ExecutorConfig, Language, NoDelay,
    TestRunResult, TokioDelay,
};
pub use messaging::{
    AgentMessage, AgentRole, MessagePayload, MessageQueue, MessageType, OutgoingMessage,
};
pub use pipeline::{PhaseOutcome, PipelineStateManager};
pub use quality_gate::{
    can_progress_to_next_phase, evaluate_phase, rule_for, GateVerdict, QualityRule,
};
pub use reporting::{
    render_project_report_md, write_project_report_json, write_project_report_md, PhaseSummary,
    ProjectReport,
};

pub use metrics::{Counter, MetricsSnapshot, METRICS};
pub use obs::{project_span, ProjectSpan};
pub use telemetry::init_tracing;

/// Phasegate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
