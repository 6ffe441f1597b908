//! Incremental log file follower.
//!
//! # Responsibilities
//! - Yield complete, newline-terminated lines appended after startup
//! - Reopen the path when the file is rotated (identity change) or truncated
//! - Retry with backoff while the file is missing
//! - Stop yielding as soon as shutdown is signalled
//!
//! # Design Decisions
//! - Polling, not inotify: works on every filesystem the proxy may log to
//! - The first successful open at startup seeks to EOF; every later open
//!   (after rotation, or when the file appeared after startup) reads from
//!   the beginning because those lines are new
//! - A partial line left behind by a rotation is discarded

use std::collections::VecDeque;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::Stream;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::config::TailConfig;
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;

const READ_CHUNK: usize = 64 * 1024;

/// Lines longer than this are dropped rather than buffered forever.
const MAX_PENDING_BYTES: usize = 1024 * 1024;

/// Identity of the file behind a path, used to detect rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

#[cfg(unix)]
fn identity(meta: &std::fs::Metadata) -> Option<FileIdentity> {
    use std::os::unix::fs::MetadataExt;
    Some(FileIdentity {
        dev: meta.dev(),
        ino: meta.ino(),
    })
}

#[cfg(not(unix))]
fn identity(_meta: &std::fs::Metadata) -> Option<FileIdentity> {
    None
}

struct OpenFile {
    file: File,
    identity: Option<FileIdentity>,
    offset: u64,
}

/// Follows a growing log file.
pub struct Tailer {
    path: PathBuf,
    poll_interval: Duration,
    reopen_backoff: Backoff,
    shutdown: broadcast::Receiver<()>,
    current: Option<OpenFile>,
    start_at_end: bool,
    open_failures: u32,
    chunk: Vec<u8>,
    pending: Vec<u8>,
    ready: VecDeque<String>,
    stopped: bool,
}

impl Tailer {
    pub fn new(config: &TailConfig, shutdown: broadcast::Receiver<()>) -> Self {
        let poll_ms = config.poll_interval_ms.max(1);
        Self {
            path: PathBuf::from(&config.log_path),
            poll_interval: Duration::from_millis(poll_ms),
            reopen_backoff: Backoff::new(poll_ms, config.reopen_max_delay_ms.max(poll_ms)),
            shutdown,
            current: None,
            start_at_end: true,
            open_failures: 0,
            chunk: vec![0u8; READ_CHUNK],
            pending: Vec::new(),
            ready: VecDeque::new(),
            stopped: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next complete line, or `None` once shutdown has been signalled.
    pub async fn next_line(&mut self) -> Option<String> {
        loop {
            if self.stopped || self.shutdown_requested() {
                self.stopped = true;
                return None;
            }

            if let Some(line) = self.ready.pop_front() {
                return Some(line);
            }

            if self.current.is_none() {
                if let Err(e) = self.open().await {
                    self.open_failures += 1;
                    // A file that appears later holds only new lines.
                    self.start_at_end = false;
                    if self.open_failures == 1 {
                        tracing::warn!(path = %self.path.display(), error = %e, "Log file unavailable, retrying");
                    } else {
                        tracing::debug!(path = %self.path.display(), attempt = self.open_failures, error = %e, "Log file still unavailable");
                    }
                    let delay = self.reopen_backoff.delay(self.open_failures);
                    if !self.pause(delay).await {
                        self.stopped = true;
                        return None;
                    }
                    continue;
                }
            }

            match self.read_available().await {
                Ok(true) => continue,
                Ok(false) => {
                    self.check_rotation().await;
                    if self.current.is_none() {
                        continue;
                    }
                    if !self.pause(self.poll_interval).await {
                        self.stopped = true;
                        return None;
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "Read failed; reopening log file");
                    // Same file: resume at EOF rather than replaying it.
                    self.close(false);
                    self.start_at_end = true;
                }
            }
        }
    }

    /// Turn the tailer into a lazy stream of lines.
    pub fn into_stream(self) -> impl Stream<Item = String> {
        futures_util::stream::unfold(self, |mut tailer| async move {
            tailer.next_line().await.map(|line| (line, tailer))
        })
    }

    async fn open(&mut self) -> std::io::Result<()> {
        let mut file = File::open(&self.path).await?;
        let meta = file.metadata().await?;
        let offset = if self.start_at_end {
            file.seek(SeekFrom::End(0)).await?
        } else {
            0
        };

        tracing::info!(path = %self.path.display(), offset, "Tailing log file");
        self.current = Some(OpenFile {
            file,
            identity: identity(&meta),
            offset,
        });
        self.start_at_end = false;
        self.open_failures = 0;
        Ok(())
    }

    fn close(&mut self, rotated: bool) {
        self.current = None;
        if !self.pending.is_empty() {
            tracing::debug!(bytes = self.pending.len(), "Discarding partial line from previous file");
            self.pending.clear();
        }
        if rotated {
            metrics::record_log_reopen("rotated");
        }
    }

    /// Read one chunk. Returns whether any bytes were read.
    async fn read_available(&mut self) -> std::io::Result<bool> {
        let Some(current) = self.current.as_mut() else {
            return Ok(false);
        };

        let n = current.file.read(&mut self.chunk).await?;
        if n == 0 {
            return Ok(false);
        }
        current.offset += n as u64;
        self.pending.extend_from_slice(&self.chunk[..n]);
        self.split_lines();
        Ok(true)
    }

    fn split_lines(&mut self) {
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            self.ready.push_back(String::from_utf8_lossy(&line).into_owned());
        }

        if self.pending.len() > MAX_PENDING_BYTES {
            tracing::warn!(bytes = self.pending.len(), "Dropping oversized unterminated line");
            self.pending.clear();
        }
    }

    async fn check_rotation(&mut self) {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "Log file removed; waiting for it to reappear");
                self.close(true);
                return;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to stat log file");
                return;
            }
        };

        let Some(current) = self.current.as_mut() else {
            return;
        };

        let new_identity = identity(&meta);
        if current.identity.is_some() && new_identity.is_some() && current.identity != new_identity {
            tracing::info!(path = %self.path.display(), "Log rotation detected; reopening file");
            self.close(true);
            return;
        }

        if meta.len() < current.offset {
            tracing::info!(
                path = %self.path.display(),
                offset = current.offset,
                size = meta.len(),
                "Log truncation detected; rewinding"
            );
            match current.file.seek(SeekFrom::Start(0)).await {
                Ok(_) => {
                    current.offset = 0;
                    self.pending.clear();
                    metrics::record_log_reopen("truncated");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to rewind truncated log; reopening");
                    self.close(true);
                }
            }
        }
    }

    fn shutdown_requested(&mut self) -> bool {
        match self.shutdown.try_recv() {
            Err(TryRecvError::Empty) => false,
            Ok(()) | Err(TryRecvError::Closed) | Err(TryRecvError::Lagged(_)) => true,
        }
    }

    /// Sleep for `delay` unless shutdown arrives first. Returns false on shutdown.
    async fn pause(&mut self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = self.shutdown.recv() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn config(path: &Path) -> TailConfig {
        TailConfig {
            log_path: path.to_string_lossy().to_string(),
            poll_interval_ms: 20,
            reopen_max_delay_ms: 100,
        }
    }

    fn append(path: &Path, text: &str) {
        let mut file = OpenOptions::new().create(true).append(true).open(path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    fn spawn_collector(tailer: Tailer) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut tailer = tailer;
            while let Some(line) = tailer.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        rx
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for line")
            .expect("tailer stopped")
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(150)).await;
    }

    #[tokio::test]
    async fn test_skips_history_and_follows_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.log");
        append(&path, "old-1\nold-2\n");

        let shutdown = Shutdown::new();
        let mut rx = spawn_collector(Tailer::new(&config(&path), shutdown.subscribe()));
        settle().await;

        append(&path, "new-1\nnew-2\n");
        assert_eq!(next(&mut rx).await, "new-1");
        assert_eq!(next(&mut rx).await, "new-2");
        shutdown.trigger();
    }

    #[tokio::test]
    async fn test_buffers_partial_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.log");
        append(&path, "");

        let shutdown = Shutdown::new();
        let mut rx = spawn_collector(Tailer::new(&config(&path), shutdown.subscribe()));
        settle().await;

        append(&path, "{\"status\":");
        settle().await;
        assert!(rx.try_recv().is_err());

        append(&path, "200}\r\n");
        assert_eq!(next(&mut rx).await, "{\"status\":200}");
        shutdown.trigger();
    }

    #[tokio::test]
    async fn test_recovers_from_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.log");
        append(&path, "");

        let shutdown = Shutdown::new();
        let mut rx = spawn_collector(Tailer::new(&config(&path), shutdown.subscribe()));
        settle().await;

        append(&path, "a fairly long line before truncation\n");
        assert_eq!(next(&mut rx).await, "a fairly long line before truncation");

        OpenOptions::new().write(true).open(&path).unwrap().set_len(0).unwrap();
        settle().await;
        append(&path, "after\n");
        assert_eq!(next(&mut rx).await, "after");
        shutdown.trigger();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_follows_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.log");
        append(&path, "");

        let shutdown = Shutdown::new();
        let mut rx = spawn_collector(Tailer::new(&config(&path), shutdown.subscribe()));
        settle().await;

        append(&path, "before\n");
        assert_eq!(next(&mut rx).await, "before");

        std::fs::rename(&path, dir.path().join("access.log.1")).unwrap();
        append(&path, "fresh-1\nfresh-2\n");
        assert_eq!(next(&mut rx).await, "fresh-1");
        assert_eq!(next(&mut rx).await, "fresh-2");
        shutdown.trigger();
    }

    #[tokio::test]
    async fn test_waits_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.log");

        let shutdown = Shutdown::new();
        let mut rx = spawn_collector(Tailer::new(&config(&path), shutdown.subscribe()));
        settle().await;

        append(&path, "first\n");
        assert_eq!(next(&mut rx).await, "first");
        shutdown.trigger();
    }

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.log");
        append(&path, "");

        let shutdown = Shutdown::new();
        let mut tailer = Tailer::new(&config(&path), shutdown.subscribe());

        let pending = tokio::spawn(async move { tailer.next_line().await });
        settle().await;
        shutdown.trigger();

        let line = timeout(Duration::from_secs(2), pending).await.unwrap().unwrap();
        assert!(line.is_none());
    }
}
