//! A single serialized log stream of pipeline progress, guarded by an async
//! mutex per spec.md §5. Suitable for replay analysis: each line is one
//! `(timestamp_millis, stage, bug_id, phase)` record.

use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Done,
}

impl Phase {
    fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Done => "done",
        }
    }
}

struct Inner {
    buffer: String,
    file: Option<tokio::fs::File>,
}

/// Ordered log of `(timestamp, stage, bug_id, phase)` records, one writer at
/// a time via the internal mutex. `tracing` gets the same events for live
/// observability; this sink is the durable, order-preserving replay record.
pub struct LogSink {
    inner: Mutex<Inner>,
}

impl LogSink {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner { buffer: String::new(), file: None }) }
    }

    pub async fn with_file(path: &std::path::Path) -> std::io::Result<Self> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Self { inner: Mutex::new(Inner { buffer: String::new(), file: Some(file) }) })
    }

    pub async fn record(&self, stage: &str, bug_id: &str, phase: Phase) {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
        let line = format!("{{\"ts\":{},\"stage\":\"{}\",\"bug_id\":\"{}\",\"phase\":\"{}\"}}\n", timestamp, stage, bug_id, phase.as_str());

        match phase {
            Phase::Start => tracing::debug!(stage, bug_id, "stage start"),
            Phase::Done => tracing::debug!(stage, bug_id, "stage done"),
        }

        let mut guard = self.inner.lock().await;
        if let Some(file) = guard.file.as_mut() {
            let _ = file.write_all(line.as_bytes()).await;
        } else {
            guard.buffer.push_str(&line);
        }
    }

    /// Log a per-bug failure: `[ERROR] bug=<id> stage=<s> kind=<k>`, per
    /// spec.md §7's required error-line format.
    pub async fn record_error(&self, stage: &str, bug_id: &str, kind: &str) {
        tracing::error!(stage, bug_id, kind, "[ERROR] bug={} stage={} kind={}", bug_id, stage, kind);
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
        let line = format!(
            "{{\"ts\":{},\"stage\":\"{}\",\"bug_id\":\"{}\",\"phase\":\"error\",\"kind\":\"{}\"}}\n",
            timestamp, stage, bug_id, kind
        );
        let mut guard = self.inner.lock().await;
        if let Some(file) = guard.file.as_mut() {
            let _ = file.write_all(line.as_bytes()).await;
        } else {
            guard.buffer.push_str(&line);
        }
    }

    /// In-memory replay buffer contents, for tests and for runs without a file sink.
    pub async fn buffer(&self) -> String {
        self.inner.lock().await.buffer.clone()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_start_and_done_for_a_bug() {
        let sink = LogSink::new();
        sink.record("read", "bug1", Phase::Start).await;
        sink.record("read", "bug1", Phase::Done).await;

        let buffer = sink.buffer().await;
        assert!(buffer.contains("\"phase\":\"start\""));
        assert!(buffer.contains("\"phase\":\"done\""));
        assert!(buffer.contains("\"bug_id\":\"bug1\""));
    }

    #[tokio::test]
    async fn record_error_matches_required_format() {
        let sink = LogSink::new();
        sink.record_error("localize", "bug7", "EmbedderFailed").await;
        let buffer = sink.buffer().await;
        assert!(buffer.contains("\"phase\":\"error\""));
        assert!(buffer.contains("\"kind\":\"EmbedderFailed\""));
    }
}
