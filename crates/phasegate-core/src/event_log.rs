//! Capacity-bounded build event log.
//!
//! Entries live in a ring buffer; once `capacity` is reached the oldest
//! entry is evicted for each new one. Every entry is also mirrored to
//! `tracing` at the matching level.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::PhaseGate;

pub const DEFAULT_LOG_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Success,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Success => "SUCCESS",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub source: String,
    pub phase: Option<PhaseGate>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl LogEntry {
    pub fn new(
        level: LogLevel,
        source: impl Into<String>,
        phase: Option<PhaseGate>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            source: source.into(),
            phase,
            message: message.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// One export line: `[ts] LEVEL [source] [phase] message {metadata}`.
    pub fn export_line(&self) -> String {
        let phase = self.phase.map_or("-", PhaseGate::as_str);
        let mut line = format!(
            "[{}] {} [{}] [{}] {}",
            self.timestamp.to_rfc3339(),
            self.level,
            self.source,
            phase,
            self.message
        );
        if let Some(meta) = &self.metadata {
            // Value's Display is compact JSON.
            line.push(' ');
            line.push_str(&meta.to_string());
        }
        line
    }
}

/// Conjunctive filter; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFilter {
    pub level: Option<LogLevel>,
    pub source: Option<String>,
    pub phase: Option<PhaseGate>,
    /// Inclusive lower bound on `timestamp`.
    pub since: Option<DateTime<Utc>>,
}

impl LogFilter {
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn phase(mut self, phase: PhaseGate) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    fn matches(&self, entry: &LogEntry) -> bool {
        self.level.map_or(true, |l| entry.level == l)
            && self.source.as_deref().map_or(true, |s| entry.source == s)
            && self.phase.map_or(true, |p| entry.phase == Some(p))
            && self.since.map_or(true, |t| entry.timestamp >= t)
    }
}

#[derive(Debug, Clone)]
pub struct BuildEventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for BuildEventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl BuildEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Build an entry from parts and append it.
    pub fn log(
        &mut self,
        level: LogLevel,
        source: &str,
        phase: Option<PhaseGate>,
        message: &str,
        metadata: Option<Value>,
    ) -> LogEntry {
        let mut entry = LogEntry::new(level, source, phase, message);
        entry.metadata = metadata;
        self.push(entry.clone());
        entry
    }

    /// Append a prepared entry, evicting the oldest when full.
    pub fn push(&mut self, entry: LogEntry) {
        mirror(&entry);
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Matching entries, oldest first.
    pub fn get_logs(&self, filter: &LogFilter) -> Vec<LogEntry> {
        self.entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    /// The newest `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<LogEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn export(&self) -> String {
        self.entries
            .iter()
            .map(LogEntry::export_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn mirror(entry: &LogEntry) {
    let phase = entry.phase.map_or("-", PhaseGate::as_str);
    let source = entry.source.as_str();
    let message = entry.message.as_str();
    match entry.level {
        LogLevel::Debug => debug!(event = "build_log", source, phase, "{message}"),
        LogLevel::Info => info!(event = "build_log", source, phase, "{message}"),
        LogLevel::Success => {
            info!(event = "build_log", source, phase, success = true, "{message}")
        }
        LogLevel::Warn => warn!(event = "build_log", source, phase, "{message}"),
        LogLevel::Error => error!(event = "build_log", source, phase, "{message}"),
    }
}
