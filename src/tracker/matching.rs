//! Matching utilities for centroid tracking.

use nalgebra::Point2;
use ndarray::Array2;

use crate::tracker::rect::Rect;

/// Canonical detection: a box inside the frame, its confidence and class label.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionBox {
    pub bbox: Rect,
    pub confidence: f32,
    pub class_label: String,
}

impl DetectionBox {
    pub fn new(bbox: Rect, confidence: f32, class_label: impl Into<String>) -> Self {
        Self {
            bbox,
            confidence,
            class_label: class_label.into(),
        }
    }
}

/// Euclidean distance matrix between track centers (rows) and detection centers (columns).
pub fn centroid_distance(
    track_centers: &[Point2<f32>],
    det_centers: &[Point2<f32>],
) -> Array2<f32> {
    let mut dists = Array2::zeros((track_centers.len(), det_centers.len()));
    for (i, t) in track_centers.iter().enumerate() {
        for (j, d) in det_centers.iter().enumerate() {
            dists[[i, j]] = nalgebra::distance(t, d);
        }
    }
    dists
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    /// `(track_index, detection_index)` pairs, in detection order.
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// First-come greedy assignment.
///
/// Detections (columns) are visited in order; each takes the closest track
/// (row) not yet claimed in this pass, lowest row index on ties. A detection
/// whose closest free track is farther than `thresh` stays unmatched.
/// Cost is O(rows * cols).
pub fn greedy_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();
    let mut claimed = vec![false; num_rows];
    let mut result = AssignmentResult::default();

    for col in 0..num_cols {
        let mut best: Option<(usize, f32)> = None;
        for (row, taken) in claimed.iter().enumerate() {
            if *taken {
                continue;
            }
            let cost = cost_matrix[[row, col]];
            if best.is_none_or(|(_, best_cost)| cost < best_cost) {
                best = Some((row, cost));
            }
        }

        match best {
            Some((row, cost)) if cost <= thresh => {
                claimed[row] = true;
                result.matches.push((row, col));
            }
            _ => result.unmatched_detections.push(col),
        }
    }

    result.unmatched_tracks = claimed
        .iter()
        .enumerate()
        .filter_map(|(i, &c)| if c { None } else { Some(i) })
        .collect();
    result
}
