use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::{PhaseGate, PhaseMetrics, PhaseStatus};
use crate::pipeline::PipelineStateManager;

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// One row of the per-phase table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseSummary {
    pub gate: PhaseGate,
    pub label: String,
    pub status: PhaseStatus,
    pub metrics: PhaseMetrics,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_count: usize,
    pub artifact_count: usize,
}

/// Snapshot of one project written for humans and tooling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectReport {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub project_id: String,
    pub project_name: String,
    pub user_idea: String,
    pub tech_stack: Vec<String>,
    pub progress: u8,
    pub current_phase: PhaseGate,
    pub completed: bool,
    pub paused: bool,
    pub cancelled: bool,
    pub reference_count: usize,
    pub upgrades_total: usize,
    pub upgrades_pending: usize,
    pub phases: Vec<PhaseSummary>,
}

impl ProjectReport {
    pub fn from_manager(manager: &PipelineStateManager) -> Self {
        let state = manager.state();
        let phases = state
            .phases
            .iter()
            .map(|p| PhaseSummary {
                gate: p.gate,
                label: p.gate.label().to_string(),
                status: p.status,
                metrics: p.metrics,
                started_at: p.started_at,
                completed_at: p.completed_at,
                error_count: p.errors.len(),
                artifact_count: p.artifacts.len(),
            })
            .collect();

        Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            project_id: state.project_id.clone(),
            project_name: state.project_name.clone(),
            user_idea: state.user_idea.clone(),
            tech_stack: state.tech_stack.clone(),
            progress: manager.project_progress(),
            current_phase: state.current_phase,
            completed: manager.is_project_completed(),
            paused: state.is_paused,
            cancelled: state.is_cancelled,
            reference_count: state.references.len(),
            upgrades_total: state.upgrades.len(),
            upgrades_pending: state.upgrades.iter().filter(|u| u.is_pending()).count(),
            phases,
        }
    }

    fn status_line(&self) -> &'static str {
        if self.cancelled {
            "cancelled"
        } else if self.completed {
            "completed"
        } else if self.paused {
            "paused"
        } else {
            "in progress"
        }
    }
}

/// Write the report as pretty JSON.
pub fn write_project_report_json(path: &Path, report: &ProjectReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize project report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render a markdown summary.
pub fn render_project_report_md(report: &ProjectReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", report.project_name));
    out.push_str(&format!("> {}\n\n", report.user_idea));
    out.push_str(&format!(
        "- status: {}\n- progress: {}%\n- current phase: {} ({})\n",
        report.status_line(),
        report.progress,
        report.current_phase,
        report.current_phase.label()
    ));
    if !report.tech_stack.is_empty() {
        out.push_str(&format!("- tech stack: {}\n", report.tech_stack.join(", ")));
    }
    out.push_str(&format!(
        "- references: {}\n- upgrades: {} ({} pending)\n\n",
        report.reference_count, report.upgrades_total, report.upgrades_pending
    ));

    out.push_str("## Phases\n\n");
    out.push_str("| Gate | Phase | Status | Build % | Coverage % | Security | Errors | Artifacts |\n");
    out.push_str("|---|---|---|---|---|---|---|---|\n");
    for p in &report.phases {
        out.push_str(&format!(
            "| {} | {} | {} | {:.1} | {:.1} | {} | {} | {} |\n",
            p.gate,
            p.label,
            p.status,
            p.metrics.build_success_rate,
            p.metrics.test_coverage,
            p.metrics.security_issues,
            p.error_count,
            p.artifact_count
        ));
    }
    out
}

/// Write the markdown summary.
pub fn write_project_report_md(path: &Path, report: &ProjectReport) -> Result<()> {
    let md = render_project_report_md(report);
    std::fs::write(path, md).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PhaseMetricsUpdate;

    fn sample() -> ProjectReport {
        let mut m = PipelineStateManager::create("p-1", "Todo App", "track my chores");
        m.set_tech_stack(vec!["TypeScript".to_string(), "React".to_string()]);
        m.start_phase(PhaseGate::G1CoreLogic);
        m.update_phase_metrics(
            PhaseGate::G1CoreLogic,
            &PhaseMetricsUpdate::new().build_success_rate(100.0),
        );
        m.add_phase_artifact(PhaseGate::G1CoreLogic, "dist/index.js");
        m.complete_phase(PhaseGate::G1CoreLogic);
        m.add_upgrade("add dark mode", vec![]);
        ProjectReport::from_manager(&m)
    }

    #[test]
    fn report_reflects_project_state() {
        let report = sample();
        assert_eq!(report.progress, 10);
        assert_eq!(report.current_phase, PhaseGate::G2Api);
        assert!(!report.completed);
        assert_eq!(report.phases.len(), 10);
        assert_eq!(report.phases[0].status, PhaseStatus::Completed);
        assert_eq!(report.phases[0].artifact_count, 1);
        assert_eq!(report.upgrades_pending, 1);
    }

    #[test]
    fn report_json_has_expected_keys() {
        let raw = serde_json::to_value(sample()).unwrap();
        let obj = raw.as_object().unwrap();
        for key in [
            "schema_version",
            "generated_at",
            "project_id",
            "progress",
            "current_phase",
            "phases",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(raw["current_phase"], "G2_API");
        assert_eq!(raw["phases"][0]["status"], "COMPLETED");
    }

    #[test]
    fn markdown_lists_every_phase() {
        let md = render_project_report_md(&sample());
        assert!(md.starts_with("# Todo App\n"));
        assert!(md.contains("- status: in progress\n- progress: 10%\n"));
        assert!(md.contains("- current phase: G2_API (API Layer)\n"));
        assert!(md.contains("- tech stack: TypeScript, React\n"));
        assert!(md.contains("| G1_CORE_LOGIC | Core Logic | COMPLETED | 100.0 | 0.0 | 0 | 0 | 1 |"));
        let rows = md
            .lines()
            .filter(|l| l.starts_with("| G") && l.contains('_'))
            .count();
        assert_eq!(rows, 10);
    }

    #[test]
    fn json_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = sample();
        write_project_report_json(&path, &report).unwrap();
        let back: ProjectReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, report);
    }
}
