//! In-memory agent message queue.
//!
//! Delivery is pull-based: `receive` never removes anything, only
//! `acknowledge` (or `clear`) does. Messages keep insertion order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::payload::{MessagePayload, MessageType};
use super::roles::AgentRole;

/// A message before the queue assigns it an id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutgoingMessage {
    pub from: AgentRole,
    pub to: AgentRole,
    pub project_id: String,
    pub payload: MessagePayload,
}

impl OutgoingMessage {
    pub fn new(
        from: AgentRole,
        to: AgentRole,
        project_id: impl Into<String>,
        payload: MessagePayload,
    ) -> Self {
        Self {
            from,
            to,
            project_id: project_id.into(),
            payload,
        }
    }
}

/// A stored message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentMessage {
    pub id: Uuid,
    pub from: AgentRole,
    pub to: AgentRole,
    pub project_id: String,
    pub payload: MessagePayload,
    pub timestamp: DateTime<Utc>,
}

impl AgentMessage {
    pub fn message_type(&self) -> MessageType {
        self.payload.message_type()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageQueue {
    messages: Vec<AgentMessage>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp and store `outgoing`, returning the stored copy.
    pub fn send(&mut self, outgoing: OutgoingMessage) -> AgentMessage {
        let message = AgentMessage {
            id: Uuid::new_v4(),
            from: outgoing.from,
            to: outgoing.to,
            project_id: outgoing.project_id,
            payload: outgoing.payload,
            timestamp: Utc::now(),
        };
        self.messages.push(message.clone());
        message
    }

    /// Messages addressed to `role`, across all projects.
    pub fn receive(&self, role: AgentRole) -> Vec<AgentMessage> {
        self.messages
            .iter()
            .filter(|m| m.to == role)
            .cloned()
            .collect()
    }

    /// Messages addressed to `role` within one project.
    pub fn receive_for(&self, project_id: &str, role: AgentRole) -> Vec<AgentMessage> {
        self.messages
            .iter()
            .filter(|m| m.to == role && m.project_id == project_id)
            .cloned()
            .collect()
    }

    /// Remove the message with `id`. Returns whether it was present.
    pub fn acknowledge(&mut self, id: Uuid) -> bool {
        match self.messages.iter().position(|m| m.id == id) {
            Some(idx) => {
                self.messages.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn messages_by_project(&self, project_id: &str) -> Vec<AgentMessage> {
        self.messages
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PhaseGate;

    fn status(project: &str, to: AgentRole, text: &str) -> OutgoingMessage {
        OutgoingMessage::new(
            AgentRole::TechLead,
            to,
            project,
            MessagePayload::StatusUpdate {
                message: text.to_string(),
            },
        )
    }

    #[test]
    fn test_send_stamps_id_and_time() {
        let mut q = MessageQueue::new();
        let before = Utc::now();
        let a = q.send(status("p1", AgentRole::Developer, "a"));
        let b = q.send(status("p1", AgentRole::Developer, "b"));
        assert_ne!(a.id, b.id);
        assert!(a.timestamp >= before);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_receive_is_non_destructive_and_ordered() {
        let mut q = MessageQueue::new();
        q.send(status("p1", AgentRole::Developer, "first"));
        q.send(status("p1", AgentRole::Qa, "other"));
        q.send(status("p1", AgentRole::Developer, "second"));

        let got = q.receive(AgentRole::Developer);
        assert_eq!(got.len(), 2);
        assert_eq!(
            got[0].payload,
            MessagePayload::StatusUpdate {
                message: "first".to_string()
            }
        );
        assert_eq!(q.receive(AgentRole::Developer).len(), 2);
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn test_acknowledge_removes_exactly_one() {
        let mut q = MessageQueue::new();
        let a = q.send(status("p1", AgentRole::Developer, "a"));
        let b = q.send(status("p1", AgentRole::Developer, "b"));

        assert!(q.acknowledge(a.id));
        assert!(!q.acknowledge(a.id));
        let left = q.receive(AgentRole::Developer);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, b.id);
    }

    #[test]
    fn test_project_filters() {
        let mut q = MessageQueue::new();
        q.send(status("p1", AgentRole::Qa, "x"));
        q.send(status("p2", AgentRole::Qa, "y"));
        q.send(OutgoingMessage::new(
            AgentRole::TechLead,
            AgentRole::Developer,
            "p2",
            MessagePayload::TaskAssignment {
                gate: PhaseGate::G1CoreLogic,
                description: "core".to_string(),
            },
        ));

        assert_eq!(q.messages_by_project("p2").len(), 2);
        assert_eq!(q.receive_for("p2", AgentRole::Qa).len(), 1);
        assert!(q.receive_for("p3", AgentRole::Qa).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut q = MessageQueue::new();
        q.send(status("p1", AgentRole::Qa, "x"));
        q.clear();
        assert!(q.is_empty());
        assert!(q.receive(AgentRole::Qa).is_empty());
    }
}
