use phasegate_core::{AgentRole, MessagePayload, MessageQueue, OutgoingMessage, PhaseGate};

fn assignment(project: &str) -> OutgoingMessage {
    OutgoingMessage::new(
        AgentRole::TechLead,
        AgentRole::Developer,
        project,
        MessagePayload::TaskAssignment {
            gate: PhaseGate::G1CoreLogic,
            description: "implement the todo model".to_string(),
        },
    )
}

#[test]
fn send_then_receive_returns_stamped_message() {
    let mut queue = MessageQueue::new();
    let sent = queue.send(assignment("todo-1"));

    let inbox = queue.receive(AgentRole::Developer);
    assert_eq!(inbox.len(), 1);
    let got = &inbox[0];
    assert_eq!(got.id, sent.id);
    assert_eq!(got.timestamp, sent.timestamp);
    assert_eq!(got.from, AgentRole::TechLead);
    assert_eq!(got.to, AgentRole::Developer);
    assert_eq!(got.project_id, "todo-1");
    assert_eq!(got.payload, assignment("todo-1").payload);
    assert!(queue.receive(AgentRole::Qa).is_empty());
}

#[test]
fn acknowledge_empties_the_inbox() {
    let mut queue = MessageQueue::new();
    let sent = queue.send(assignment("todo-1"));
    assert!(queue.acknowledge(sent.id));
    assert!(queue.receive(AgentRole::Developer).is_empty());
}

#[test]
fn project_filter_excludes_other_projects() {
    let mut queue = MessageQueue::new();
    queue.send(assignment("todo-1"));
    queue.send(assignment("todo-2"));

    let only_first = queue.messages_by_project("todo-1");
    assert_eq!(only_first.len(), 1);
    assert!(only_first.iter().all(|m| m.project_id == "todo-1"));
}

#[test]
fn stored_message_serializes_with_type_tag() {
    let mut queue = MessageQueue::new();
    let sent = queue.send(assignment("todo-1"));
    let json = serde_json::to_value(&sent).unwrap();
    assert_eq!(json["from"], "tech_lead");
    assert_eq!(json["payload"]["type"], "task_assignment");
    assert_eq!(json["payload"]["gate"], "G1_CORE_LOGIC");
}
