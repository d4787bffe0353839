//! Integration layer around the tracking core.
//!
//! Connects inference backends, the frame scheduler, event persistence and
//! report export to the normalizer, tracker and crossing counter.

mod builder;
mod detector;
mod normalizer;
mod pipeline;
pub mod report;
mod scheduler;
mod session;
mod sink;

pub use builder::RawDetectionBuilder;
pub use detector::DetectionSource;
pub use normalizer::{DetectionError, DetectionNormalizer, RawDetection, RawFrame};
pub use pipeline::{PipelineError, TrackerPipeline};
pub use scheduler::{Admission, FrameScheduler, SchedulerStats};
pub use session::{CountingSession, FrameSnapshot, TrackedDetection};
pub use sink::{
    EventSink, JsonLinesSink, MemorySink, SinkError, SinkFailure, SinkHandle, SinkStats, SinkWriter,
};
