//! Domain models for the phase-gated pipeline.
//!
//! - `PhaseGate`: the ten fixed, ordered gates
//! - `PhaseState`/`Phases`: per-gate status and metrics, stored in an arena
//! - `ProjectState`: one project's lifecycle, references and upgrades

pub mod error;
pub mod gate;
pub mod phase;
pub mod project;

pub use error::{EngineError, GateParseError, Result};
pub use gate::PhaseGate;
pub use phase::{PhaseMetrics, PhaseMetricsUpdate, PhaseState, PhaseStatus, Phases};
pub use project::{ProjectState, ProjectUpgrade, ReferenceDocument, ReferenceKind};
