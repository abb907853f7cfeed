//! Agent messaging: roles, typed payloads, and the pull-based queue.
//!
//! # Modules
//!
//! - [`roles`]: `AgentRole`
//! - [`payload`]: `MessagePayload` tagged union and `MessageType`
//! - [`queue`]: `MessageQueue`, `AgentMessage`, `OutgoingMessage`

pub mod payload;
pub mod queue;
pub mod roles;

pub use payload::{MessagePayload, MessageType};
pub use queue::{AgentMessage, MessageQueue, OutgoingMessage};
pub use roles::AgentRole;
