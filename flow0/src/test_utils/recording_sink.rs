//! RecordingSink: keeps every entry it is fed.

use crate::error::SinkError;
use crate::trace::{TraceEntry, TraceSink};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A sink that stores entries in memory, or fails on demand.
pub struct RecordingSink {
    entries: Mutex<Vec<TraceEntry>>,
    flushes: AtomicUsize,
    fail: bool,
}

impl RecordingSink {
    /// A sink that accepts everything.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            flushes: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// A sink whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Entries received so far.
    pub fn entries(&self) -> Vec<TraceEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Number of flush calls.
    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TraceSink for RecordingSink {
    async fn accept(&self, entry: &TraceEntry) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Serialization("recording sink set to fail".into()));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<(), SinkError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SinkError::Serialization("recording sink set to fail".into()));
        }
        Ok(())
    }
}
