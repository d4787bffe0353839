//! Per-stream counting state and the frame processing path.

use chrono::{DateTime, Utc};

use crate::config::CounterConfig;
use crate::counting::{CounterState, CrossingCounter, CrossingEvent};
use crate::integration::normalizer::{DetectionNormalizer, RawFrame};
use crate::integration::sink::SinkHandle;
use crate::tracker::{CentroidTracker, DetectionBox, TrackId};

/// A canonical box with the identity it resolved to, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedDetection {
    pub detection: DetectionBox,
    pub track_id: Option<TrackId>,
}

/// Read-only view of one processed frame, for renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub frame_id: u64,
    pub timestamp: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    pub midline: f32,
    pub detections: Vec<TrackedDetection>,
    pub counts: CounterState,
    /// Crossings emitted by this frame.
    pub events: Vec<CrossingEvent>,
}

impl FrameSnapshot {
    fn empty(midline: f32) -> Self {
        Self {
            frame_id: 0,
            timestamp: DateTime::<Utc>::default(),
            width: 0,
            height: 0,
            midline,
            detections: Vec::new(),
            counts: CounterState::default(),
            events: Vec::new(),
        }
    }

    /// Midline position in pixels.
    pub fn midline_px(&self) -> f32 {
        self.midline * self.height as f32
    }
}

/// Everything that lives for one stream: track pool, counters and sink.
///
/// Created at stream start, dropped at stream stop. Not shared; wrap it in a
/// [`FrameScheduler`](crate::integration::FrameScheduler) to accept frames
/// from other threads.
#[derive(Debug)]
pub struct CountingSession {
    normalizer: DetectionNormalizer,
    tracker: CentroidTracker,
    counter: CrossingCounter,
    sink: Option<SinkHandle>,
    last: FrameSnapshot,
}

impl CountingSession {
    pub fn new(config: &CounterConfig) -> Self {
        Self {
            normalizer: DetectionNormalizer::from_config(config),
            tracker: CentroidTracker::new(config.match_threshold),
            counter: CrossingCounter::new(config.midline),
            sink: None,
            last: FrameSnapshot::empty(config.midline),
        }
    }

    /// Persist crossing events through `sink`.
    pub fn with_sink(mut self, sink: SinkHandle) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Normalize, track and count one frame.
    pub fn process_frame(&mut self, frame: &RawFrame) -> FrameSnapshot {
        let boxes = self
            .normalizer
            .normalize(&frame.detections, frame.width, frame.height);
        let updates = self
            .tracker
            .update(&boxes, frame.width as f32, frame.height as f32);
        let frame_id = self.tracker.frame_id();
        let events = self
            .counter
            .evaluate_frame(&updates, frame.timestamp, frame_id);

        if let Some(sink) = &self.sink {
            for event in &events {
                sink.dispatch(event.clone());
            }
        }

        let detections = boxes
            .into_iter()
            .zip(&updates)
            .map(|(detection, u)| TrackedDetection {
                detection,
                track_id: Some(u.track_id),
            })
            .collect();

        self.last = FrameSnapshot {
            frame_id,
            timestamp: frame.timestamp,
            width: frame.width,
            height: frame.height,
            midline: self.counter.midline(),
            detections,
            counts: self.counter.state(),
            events,
        };
        self.last.clone()
    }

    /// Most recent frame, or an empty snapshot before the first one.
    pub fn snapshot(&self) -> &FrameSnapshot {
        &self.last
    }

    /// Running enter/exit totals.
    pub fn counts(&self) -> CounterState {
        self.counter.state()
    }

    /// The underlying tracker, for inspecting live tracks.
    pub fn tracker(&self) -> &CentroidTracker {
        &self.tracker
    }
}

impl Default for CountingSession {
    fn default() -> Self {
        Self::new(&CounterConfig::default())
    }
}
