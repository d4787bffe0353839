//! Single-flight frame admission.
//!
//! At most one frame is inside the counting pipeline at any instant. A frame
//! arriving while another is in flight is dropped, never queued, so latency
//! stays bounded under load at the cost of coverage.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::integration::detector::DetectionSource;
use crate::integration::normalizer::RawFrame;
use crate::integration::pipeline::{PipelineError, TrackerPipeline};
use crate::integration::session::{CountingSession, FrameSnapshot};

/// Outcome of offering a frame to the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission<R> {
    /// The frame ran to completion (or failure) with this result.
    Accepted(R),
    /// Another frame was in flight; this one was discarded untouched.
    Dropped,
}

impl<R> Admission<R> {
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped)
    }

    pub fn accepted(self) -> Option<R> {
        match self {
            Self::Accepted(r) => Some(r),
            Self::Dropped => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub accepted: u64,
    pub dropped: u64,
}

/// Owns the per-stream state and gates access to it.
///
/// The lock is only ever taken with `try_lock`, so it acts as a capacity-one
/// admission gate rather than a wait queue. It is released when the work
/// closure returns or unwinds.
#[derive(Debug)]
pub struct FrameScheduler<T> {
    state: Mutex<T>,
    accepted: AtomicU64,
    dropped: AtomicU64,
}

impl<T> FrameScheduler<T> {
    pub fn new(state: T) -> Self {
        Self {
            state: Mutex::new(state),
            accepted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Run `work` on the state if no other frame is in flight.
    pub fn try_run<R>(&self, work: impl FnOnce(&mut T) -> R) -> Admission<R> {
        match self.state.try_lock() {
            Some(mut guard) => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
                Admission::Accepted(work(&mut guard))
            }
            None => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::debug!(dropped, "frame dropped, pipeline busy");
                Admission::Dropped
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_locked()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    /// Exclusive access once no producer can reach the scheduler.
    pub fn get_mut(&mut self) -> &mut T {
        self.state.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.state.into_inner()
    }
}

impl FrameScheduler<CountingSession> {
    /// Offer a frame of already-detected boxes.
    pub fn submit(&self, frame: &RawFrame) -> Admission<FrameSnapshot> {
        self.try_run(|session| session.process_frame(frame))
    }
}

impl<D: DetectionSource> FrameScheduler<TrackerPipeline<D>> {
    /// Offer a raw image; detection runs inside the admitted slot.
    pub fn submit_image(
        &self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Admission<Result<FrameSnapshot, PipelineError<D::Error>>> {
        self.try_run(|pipeline| pipeline.process_image(input, width, height))
    }
}
