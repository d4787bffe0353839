//! Single tracked subject.

use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Track identity. Monotonic within a tracker and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    /// Center in normalized frame coordinates, both axes in `[0, 1]`.
    pub last_center: Point2<f32>,
    /// Frame index the track was created on
    pub start_frame: u64,
    pub last_seen_frame: u64,
}

impl Track {
    pub fn new(id: TrackId, center: Point2<f32>, frame_id: u64) -> Self {
        Self {
            id,
            last_center: center,
            start_frame: frame_id,
            last_seen_frame: frame_id,
        }
    }

    /// Move the track to `center`, returning where it was before.
    pub fn update(&mut self, center: Point2<f32>, frame_id: u64) -> Point2<f32> {
        self.last_seen_frame = frame_id;
        std::mem::replace(&mut self.last_center, center)
    }

    /// Number of consecutive frames this track has been seen.
    pub fn age(&self) -> u64 {
        self.last_seen_frame - self.start_frame + 1
    }
}
