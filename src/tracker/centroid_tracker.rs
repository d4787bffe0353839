//! Nearest-centroid multi-object tracker.
//!
//! Greedy first-come matching in normalized frame space with a fixed distance
//! threshold. No motion model, no occlusion handling and no re-identification:
//! a track that misses a single frame is gone for good.

use std::collections::BTreeMap;

use nalgebra::Point2;

use crate::tracker::matching::{self, AssignmentResult, DetectionBox};
use crate::tracker::track::{Track, TrackId};

/// Association outcome for one detection of the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackUpdate {
    pub track_id: TrackId,
    /// Normalized center in the previous frame; `None` for a track born this frame.
    pub previous: Option<Point2<f32>>,
    pub current: Point2<f32>,
}

#[derive(Debug, Clone)]
pub struct CentroidTracker {
    tracks: BTreeMap<TrackId, Track>,
    next_id: u64,
    frame_id: u64,
    match_thresh: f32,
}

impl CentroidTracker {
    pub fn new(match_thresh: f32) -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 1,
            frame_id: 0,
            match_thresh,
        }
    }

    /// Associate this frame's boxes with live tracks.
    ///
    /// Returns one [`TrackUpdate`] per input box, in input order. Afterwards the
    /// live pool holds exactly the tracks seen this frame. Frame dimensions must
    /// be positive; the normalizer guarantees this for every box it emits.
    pub fn update(
        &mut self,
        detections: &[DetectionBox],
        width: f32,
        height: f32,
    ) -> Vec<TrackUpdate> {
        self.frame_id += 1;

        let det_centers: Vec<Point2<f32>> = detections
            .iter()
            .map(|d| d.bbox.normalized_center(width, height))
            .collect();

        // BTreeMap order keeps ties deterministic: lowest id wins.
        let mut pool: Vec<Track> = std::mem::take(&mut self.tracks).into_values().collect();
        let pool_centers: Vec<Point2<f32>> = pool.iter().map(|t| t.last_center).collect();

        let dists = matching::centroid_distance(&pool_centers, &det_centers);
        let AssignmentResult {
            matches,
            unmatched_tracks,
            ..
        } = matching::greedy_assignment(&dists, self.match_thresh);

        let mut assigned: Vec<Option<usize>> = vec![None; detections.len()];
        for (itrack, idet) in matches {
            assigned[idet] = Some(itrack);
        }

        for &idx in &unmatched_tracks {
            tracing::debug!(track = %pool[idx].id, frame = self.frame_id, "track lost");
        }

        let mut updates = Vec::with_capacity(detections.len());
        for (idet, center) in det_centers.into_iter().enumerate() {
            let update = match assigned[idet] {
                Some(itrack) => {
                    let track = &mut pool[itrack];
                    let previous = track.update(center, self.frame_id);
                    self.tracks.insert(track.id, track.clone());
                    TrackUpdate {
                        track_id: track.id,
                        previous: Some(previous),
                        current: center,
                    }
                }
                None => {
                    let id = self.mint_id();
                    tracing::debug!(
                        track = %id,
                        frame = self.frame_id,
                        x = center.x,
                        y = center.y,
                        "new track"
                    );
                    self.tracks.insert(id, Track::new(id, center, self.frame_id));
                    TrackUpdate {
                        track_id: id,
                        previous: None,
                        current: center,
                    }
                }
            };
            updates.push(update);
        }

        updates
    }

    fn mint_id(&mut self) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Live tracks, ordered by id.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Live track with the given id, if it was seen in the last frame.
    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Number of live tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// True when no track survived the last frame.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Number of frames processed so far.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Maximum normalized centroid distance for a match.
    pub fn match_thresh(&self) -> f32 {
        self.match_thresh
    }
}

impl Default for CentroidTracker {
    fn default() -> Self {
        Self::new(0.12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::rect::Rect;

    const W: f32 = 1000.0;
    const H: f32 = 1000.0;

    /// 20x20 px box centered at normalized (x, y) in a 1000x1000 frame.
    fn det_at(x: f32, y: f32) -> DetectionBox {
        DetectionBox::new(Rect::from_xywh(x * W, y * H, 20.0, 20.0), 0.9, "person")
    }

    #[test]
    fn test_new_detections_get_distinct_ids() {
        let mut tracker = CentroidTracker::default();
        let updates = tracker.update(&[det_at(0.2, 0.2), det_at(0.8, 0.8)], W, H);
        assert_eq!(updates.len(), 2);
        assert_ne!(updates[0].track_id, updates[1].track_id);
        assert!(updates.iter().all(|u| u.previous.is_none()));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_small_motion_keeps_identity() {
        let mut tracker = CentroidTracker::default();
        let first = tracker.update(&[det_at(0.5, 0.45)], W, H)[0];
        let second = tracker.update(&[det_at(0.5, 0.55)], W, H)[0];
        assert_eq!(first.track_id, second.track_id);
        let prev = second.previous.unwrap();
        assert!((prev.y - 0.45).abs() < 1e-5);
    }

    #[test]
    fn test_jump_beyond_threshold_spawns_new_identity() {
        let mut tracker = CentroidTracker::default();
        let first = tracker.update(&[det_at(0.5, 0.3)], W, H)[0];
        let second = tracker.update(&[det_at(0.5, 0.6)], W, H)[0];
        assert_ne!(first.track_id, second.track_id);
        assert!(second.previous.is_none());
        assert!(tracker.get(first.track_id).is_none());
    }

    #[test]
    fn test_second_claimant_spawns_new_identity() {
        let mut tracker = CentroidTracker::default();
        let original = tracker.update(&[det_at(0.5, 0.5)], W, H)[0].track_id;
        let updates = tracker.update(&[det_at(0.52, 0.5), det_at(0.48, 0.5)], W, H);
        assert_eq!(updates[0].track_id, original);
        assert_ne!(updates[1].track_id, original);
        assert!(updates[1].previous.is_none());
    }

    #[test]
    fn test_empty_frame_clears_pool() {
        let mut tracker = CentroidTracker::default();
        let id = tracker.update(&[det_at(0.5, 0.5)], W, H)[0].track_id;
        assert!(tracker.update(&[], W, H).is_empty());
        assert!(tracker.is_empty());

        let back = tracker.update(&[det_at(0.5, 0.5)], W, H)[0];
        assert_ne!(back.track_id, id);
        assert!(back.previous.is_none());
    }

    #[test]
    fn test_unmatched_track_dropped_others_kept() {
        let mut tracker = CentroidTracker::default();
        let ids: Vec<TrackId> = tracker
            .update(&[det_at(0.2, 0.2), det_at(0.8, 0.8)], W, H)
            .iter()
            .map(|u| u.track_id)
            .collect();
        let updates = tracker.update(&[det_at(0.81, 0.8)], W, H);
        assert_eq!(updates[0].track_id, ids[1]);
        assert!(tracker.get(ids[0]).is_none());
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.get(ids[1]).unwrap().last_seen_frame, 2);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut tracker = CentroidTracker::default();
        let mut seen = std::collections::HashSet::new();
        for i in 0..10 {
            // Alternate far-apart positions so nothing ever matches.
            let y = if i % 2 == 0 { 0.1 } else { 0.9 };
            for u in tracker.update(&[det_at(0.5, y)], W, H) {
                assert!(seen.insert(u.track_id));
            }
        }
        assert_eq!(seen.len(), 10);
    }
}
