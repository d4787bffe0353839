//! Directional line-crossing counter.
//!
//! Raw per-frame detections are normalized into canonical boxes, associated
//! across frames by nearest-centroid matching, and every track whose center
//! crosses the horizontal midline bumps the matching counter exactly once.

pub mod config;
pub mod counting;
pub mod integration;
pub mod tracker;

pub use config::{ConfigError, CounterConfig};
pub use counting::{CounterState, CrossingCounter, CrossingEvent, Direction};
pub use integration::{
    Admission, CountingSession, DetectionNormalizer, DetectionSource, EventSink, FrameScheduler,
    FrameSnapshot, MemorySink, PipelineError, RawDetection, RawDetectionBuilder, RawFrame,
    SinkError, SinkHandle, SinkWriter, TrackedDetection, TrackerPipeline,
};
pub use tracker::{CentroidTracker, DetectionBox, Rect, Track, TrackId};
