#![deny(missing_docs)]
//! Filesystem trace output for conductor runs.
//!
//! Two shapes are supported:
//!
//! - **JSON Lines**, streamed while the run is in progress by
//!   [`JsonlSink`]: one [`TraceEntry`] per line, appended as each attempt
//!   is recorded. A crashed run still leaves every entry recorded so far.
//! - **Whole-run JSON**, written after the run by [`write_trace_json`]: the
//!   [`Trace`] as one pretty-printed JSON array.
//!
//! Parent directories are created lazily on first write.

use async_trait::async_trait;
use flow0::error::SinkError;
use flow0::trace::{Trace, TraceEntry, TraceSink};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Errors reading or writing trace files.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TraceFileError {
    /// The file could not be read or written.
    #[error("trace file {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file contents are not a valid trace.
    #[error("trace file {path}: invalid trace JSON at line {line}: {message}")]
    Parse {
        /// The file involved.
        path: PathBuf,
        /// 1-based line of the failure.
        line: usize,
        /// Parser message.
        message: String,
    },

    /// The trace could not be serialized.
    #[error("trace serialization failed: {0}")]
    Serialization(String),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TraceFileError + '_ {
    move |source| TraceFileError::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => tokio::fs::create_dir_all(dir).await,
        _ => Ok(()),
    }
}

/// A [`TraceSink`] appending one JSON line per entry.
///
/// The file is opened in append mode on the first entry, so one file can
/// collect several runs; entries carry their `run_id` to tell them apart.
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl JsonlSink {
    /// Create a sink writing to `path`. Nothing touches the filesystem
    /// until the first entry arrives.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    /// The file this sink appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> std::io::Result<File> {
        ensure_parent(&self.path).await?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
    }
}

#[async_trait]
impl TraceSink for JsonlSink {
    async fn accept(&self, entry: &TraceEntry) -> Result<(), SinkError> {
        let mut line =
            serde_json::to_vec(entry).map_err(|e| SinkError::Serialization(e.to_string()))?;
        line.push(b'\n');

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            *guard = Some(self.open().await?);
            tracing::debug!(path = %self.path.display(), "conductor.trace.jsonl_open");
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(&line).await?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), SinkError> {
        let mut guard = self.file.lock().await;
        if let Some(file) = guard.as_mut() {
            file.flush().await?;
            file.sync_data().await?;
        }
        Ok(())
    }
}

/// Write a whole trace to `path` as a pretty-printed JSON array,
/// replacing any existing file.
pub async fn write_trace_json(path: &Path, trace: &Trace) -> Result<(), TraceFileError> {
    let contents = serde_json::to_string_pretty(trace)
        .map_err(|e| TraceFileError::Serialization(e.to_string()))?;
    ensure_parent(path).await.map_err(io_error(path))?;
    tokio::fs::write(path, contents)
        .await
        .map_err(io_error(path))?;
    tracing::debug!(path = %path.display(), entries = trace.len(), "conductor.trace.exported");
    Ok(())
}

/// Read a trace written by [`write_trace_json`].
pub async fn read_trace_json(path: &Path) -> Result<Trace, TraceFileError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(io_error(path))?;
    serde_json::from_str(&contents).map_err(|e| TraceFileError::Parse {
        path: path.to_path_buf(),
        line: e.line(),
        message: e.to_string(),
    })
}

/// Read every entry of a file written by [`JsonlSink`], in file order.
///
/// Blank lines are skipped.
pub async fn read_trace_jsonl(path: &Path) -> Result<Vec<TraceEntry>, TraceFileError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(io_error(path))?;
    let mut entries = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(line).map_err(|e| TraceFileError::Parse {
            path: path.to_path_buf(),
            line: i + 1,
            message: e.to_string(),
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("run.jsonl");
        let sink = JsonlSink::new(&path);
        assert_eq!(sink.path(), path.as_path());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_trace_json(&dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, TraceFileError::Io { .. }));
    }

    #[tokio::test]
    async fn jsonl_parse_errors_name_the_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        tokio::fs::write(&path, "\nnot json\n").await.unwrap();
        let err = read_trace_jsonl(&path).await.unwrap_err();
        assert!(matches!(err, TraceFileError::Parse { line: 2, .. }), "{err}");
    }
}
