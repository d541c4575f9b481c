//! Log records and the bounded accumulator that collects them.

use super::LogLevel;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A single structured log record produced by a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Name of the operation that logged.
    pub op: String,
    /// Id of the context that produced the record.
    pub context_id: String,
    /// Positional arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<serde_json::Value>,
    /// Logging metadata of the context at the time of the record.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    /// When the record was created.
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        level: LogLevel,
        op: impl Into<String>,
        context_id: impl Into<String>,
        args: Vec<serde_json::Value>,
    ) -> Self {
        Self {
            level,
            op: op.into(),
            context_id: context_id.into(),
            args,
            metadata: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attaches logging metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Collects log records for later inspection.
///
/// An accumulator is shared by reference between a context and everything
/// forked from it. Once `limit` records are held, further records are
/// counted as dropped instead of stored.
#[derive(Debug)]
pub struct Accumulator {
    records: Mutex<Vec<LogRecord>>,
    limit: Option<usize>,
    dropped: AtomicU64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl Accumulator {
    /// Creates an accumulator holding at most `limit` records.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            limit: Some(limit),
            dropped: AtomicU64::new(0),
        }
    }

    /// Creates an accumulator without a size limit.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            limit: None,
            dropped: AtomicU64::new(0),
        }
    }

    /// Adds a record, returning false if it was dropped.
    pub fn add(&self, record: LogRecord) -> bool {
        let mut records = self.records.lock();
        if self.limit.is_some_and(|limit| records.len() >= limit) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        records.push(record);
        true
    }

    /// Returns a copy of the collected records.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Removes and returns the collected records.
    pub fn drain(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Number of records rejected because the limit was reached.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// The configured limit, if any.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}
