//! Bounded event logs.
//!
//! The gateway surfaces its activity through small newest-first logs
//! (system log, threat log, OmniCore log). Each is a capped ring: pushing
//! past capacity silently drops the oldest entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Severity/category of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Error,
    System,
    Warning,
    Critical,
    Ritual,
}

/// A single timestamped log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub level: LogLevel,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, level: LogLevel) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            message: message.into(),
            level,
        }
    }
}

/// A bounded, newest-first event log.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl EventLog {
    /// Creates an empty log that keeps at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Records a message at the given level, evicting the oldest entry
    /// once the log is full.
    pub fn push(&mut self, message: impl Into<String>, level: LogLevel) {
        self.entries.push_front(LogEntry::new(message, level));
        self.entries.truncate(self.capacity);
    }

    /// Returns entries newest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Returns the most recent entry, if any.
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keeps only entries matching the predicate, then truncates to
    /// `keep` entries. Used by the purge cycle to collapse the threat log.
    pub fn retain_and_truncate(&mut self, keep: usize, predicate: impl FnMut(&LogEntry) -> bool) {
        self.entries.retain(predicate);
        self.entries.truncate(keep);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
