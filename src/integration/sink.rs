//! Fire-and-forget persistence of crossing events.
//!
//! The counting path only hands events to a [`SinkHandle`]; a dedicated
//! [`SinkWriter`] thread performs the actual writes. Write failures are
//! counted and published on an error channel, they never reach the counters.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use thiserror::Error;

use crate::counting::CrossingEvent;

const ERROR_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("sink rejected event: {0}")]
    Rejected(String),

    #[error("sink writer is no longer running")]
    Closed,

    #[error("sink writer thread panicked")]
    WriterPanicked,
}

/// Append-only destination for crossing events.
pub trait EventSink: Send + 'static {
    fn append(&mut self, event: &CrossingEvent) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// A write that did not make it to the sink.
#[derive(Debug)]
pub struct SinkFailure {
    pub event: CrossingEvent,
    pub error: SinkError,
}

#[derive(Debug, Default)]
pub struct SinkStats {
    written: AtomicU64,
    failed: AtomicU64,
}

impl SinkStats {
    /// Events that reached the sink.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Events the sink rejected or that arrived after shutdown.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
enum SinkCommand {
    Write(CrossingEvent),
    Shutdown,
}

/// Cheap, cloneable sender side used by the counting session.
#[derive(Clone)]
pub struct SinkHandle {
    tx: Sender<SinkCommand>,
    stats: Arc<SinkStats>,
}

impl SinkHandle {
    /// Queue an event for writing. Never blocks.
    pub fn dispatch(&self, event: CrossingEvent) {
        if self.tx.send(SinkCommand::Write(event)).is_err() {
            self.stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %SinkError::Closed, "dropping crossing event");
        }
    }

    pub fn stats(&self) -> &SinkStats {
        &self.stats
    }
}

impl std::fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkHandle").field("stats", &self.stats).finish()
    }
}

/// Owns the writer thread for an [`EventSink`].
pub struct SinkWriter<S: EventSink> {
    tx: Sender<SinkCommand>,
    errors: Receiver<SinkFailure>,
    stats: Arc<SinkStats>,
    thread: Option<JoinHandle<S>>,
}

impl<S: EventSink> SinkWriter<S> {
    pub fn spawn(sink: S) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (err_tx, errors) = crossbeam_channel::bounded(ERROR_CHANNEL_CAPACITY);
        let stats = Arc::new(SinkStats::default());
        let thread_stats = Arc::clone(&stats);
        let thread = thread::spawn(move || writer_loop(sink, rx, err_tx, thread_stats));

        Self {
            tx,
            errors,
            stats,
            thread: Some(thread),
        }
    }

    /// A cloneable handle that enqueues events for this writer.
    pub fn handle(&self) -> SinkHandle {
        SinkHandle {
            tx: self.tx.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Failures not yet consumed. Oldest failures are kept when the channel is full.
    pub fn errors(&self) -> &Receiver<SinkFailure> {
        &self.errors
    }

    /// Counters shared with every handle.
    pub fn stats(&self) -> &SinkStats {
        &self.stats
    }

    /// Write everything queued so far, stop the thread and hand the sink back.
    pub fn shutdown(mut self) -> Result<S, SinkError> {
        self.stop().ok_or(SinkError::Closed)?
    }

    fn stop(&mut self) -> Option<Result<S, SinkError>> {
        let thread = self.thread.take()?;
        let _ = self.tx.send(SinkCommand::Shutdown);
        Some(thread.join().map_err(|_| SinkError::WriterPanicked))
    }
}

impl<S: EventSink> Drop for SinkWriter<S> {
    fn drop(&mut self) {
        if let Some(Err(e)) = self.stop() {
            tracing::warn!(error = %e, "sink writer did not shut down cleanly");
        }
    }
}

fn writer_loop<S: EventSink>(
    mut sink: S,
    rx: Receiver<SinkCommand>,
    errors: Sender<SinkFailure>,
    stats: Arc<SinkStats>,
) -> S {
    while let Ok(SinkCommand::Write(event)) = rx.recv() {
        match sink.append(&event) {
            Ok(()) => {
                stats.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => record_failure(&stats, &errors, event, error),
        }
    }

    // Writes queued by live handles after the shutdown command.
    for command in rx.try_iter() {
        if let SinkCommand::Write(event) = command {
            record_failure(&stats, &errors, event, SinkError::Closed);
        }
    }

    if let Err(e) = sink.flush() {
        tracing::warn!(error = %e, "failed to flush event sink");
    }
    sink
}

fn record_failure(
    stats: &SinkStats,
    errors: &Sender<SinkFailure>,
    event: CrossingEvent,
    error: SinkError,
) {
    stats.failed.fetch_add(1, Ordering::Relaxed);
    tracing::warn!(
        track = %event.track_id,
        direction = %event.direction,
        error = %error,
        "failed to persist crossing event"
    );
    if let Err(TrySendError::Full(_)) = errors.try_send(SinkFailure { event, error }) {
        tracing::debug!("sink error channel full");
    }
}

/// In-memory sink, shared between clones. Handy for tests and live reports.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<CrossingEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored event, ordered by timestamp (arrival order on ties).
    pub fn history(&self) -> Vec<CrossingEvent> {
        let mut events = self.events.lock().clone();
        events.sort_by_key(|e| e.timestamp);
        events
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// True before the first event is stored.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn append(&mut self, event: &CrossingEvent) -> Result<(), SinkError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Appends one JSON object per line to a file, flushing after every event.
pub struct JsonLinesSink {
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Read back a history file, ordered by timestamp. Unparseable lines are skipped.
    pub fn read_history(path: impl AsRef<Path>) -> Result<Vec<CrossingEvent>, SinkError> {
        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CrossingEvent>(&line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!(line = lineno + 1, error = %e, "skipping corrupt history line")
                }
            }
        }
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}

impl EventSink for JsonLinesSink {
    fn append(&mut self, event: &CrossingEvent) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        // An event only counts as written once it has reached the file.
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}
