mod centroid_tracker;
mod matching;
mod rect;
mod track;

pub use centroid_tracker::{CentroidTracker, TrackUpdate};
pub use matching::{AssignmentResult, DetectionBox, centroid_distance, greedy_assignment};
pub use rect::Rect;
pub use track::{Track, TrackId};
