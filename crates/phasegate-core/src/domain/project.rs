//! Project state, reference documents and upgrade requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::gate::PhaseGate;
use crate::domain::phase::Phases;

/// Kind of an attached reference document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Url,
    File,
    Image,
}

/// An externally supplied document attached to a project as input context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceDocument {
    pub id: Uuid,
    pub kind: ReferenceKind,
    pub url: Option<String>,
    pub filename: Option<String>,
    /// Size in bytes, when known.
    pub size: Option<u64>,
    pub content: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl ReferenceDocument {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ReferenceKind::Url,
            url: Some(url.into()),
            filename: None,
            size: None,
            content: None,
            uploaded_at: Utc::now(),
        }
    }

    /// A text file; `size` is derived from the content length.
    pub fn file(filename: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: Uuid::new_v4(),
            kind: ReferenceKind::File,
            url: None,
            filename: Some(filename.into()),
            size: Some(content.len() as u64),
            content: Some(content),
            uploaded_at: Utc::now(),
        }
    }

    pub fn image(filename: impl Into<String>, size: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ReferenceKind::Image,
            url: None,
            filename: Some(filename.into()),
            size: Some(size),
            content: None,
            uploaded_at: Utc::now(),
        }
    }
}

/// A post-hoc change request against an existing project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectUpgrade {
    pub id: Uuid,
    pub instruction: String,
    pub references: Vec<ReferenceDocument>,
    pub requested_at: DateTime<Utc>,
    /// Set once when the upgrade is completed; never cleared.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProjectUpgrade {
    pub fn new(instruction: impl Into<String>, references: Vec<ReferenceDocument>) -> Self {
        Self {
            id: Uuid::new_v4(),
            instruction: instruction.into(),
            references,
            requested_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.completed_at.is_none()
    }
}

/// Full lifecycle state of one project.
///
/// # Invariants
///
/// - `current_phase` always names exactly one gate; its state lives in `phases`.
/// - Once `is_cancelled` is true it never reverts, and `is_paused` is true too.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectState {
    pub project_id: String,
    pub project_name: String,
    pub user_idea: String,
    pub tech_stack: Vec<String>,
    pub current_phase: PhaseGate,
    pub phases: Phases,
    pub references: Vec<ReferenceDocument>,
    pub is_paused: bool,
    pub is_cancelled: bool,
    pub upgrades: Vec<ProjectUpgrade>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectState {
    pub fn new(
        project_id: impl Into<String>,
        project_name: impl Into<String>,
        user_idea: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            project_id: project_id.into(),
            project_name: project_name.into(),
            user_idea: user_idea.into(),
            tech_stack: Vec::new(),
            current_phase: PhaseGate::FIRST,
            phases: Phases::new(),
            references: Vec::new(),
            is_paused: false,
            is_cancelled: false,
            upgrades: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_reference_records_size() {
        let doc = ReferenceDocument::file("notes.md", "hello");
        assert_eq!(doc.kind, ReferenceKind::File);
        assert_eq!(doc.size, Some(5));
        assert_eq!(doc.filename.as_deref(), Some("notes.md"));
        assert!(doc.url.is_none());
    }

    #[test]
    fn test_reference_kind_serde() {
        let json = serde_json::to_string(&ReferenceKind::Image).unwrap();
        assert_eq!(json, "\"image\"");
    }

    #[test]
    fn test_new_upgrade_is_pending() {
        let up = ProjectUpgrade::new("add payments", vec![]);
        assert!(up.is_pending());
        assert_eq!(up.instruction, "add payments");
    }

    #[test]
    fn test_project_state_serde_roundtrip() {
        let mut state = ProjectState::new("p-1", "Todo App", "track todos");
        state.tech_stack = vec!["rust".to_string()];
        state.references.push(ReferenceDocument::url("https://example.com"));

        let json = serde_json::to_string(&state).expect("serialize");
        let back: ProjectState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(state, back);
    }
}
