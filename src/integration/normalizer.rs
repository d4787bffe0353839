//! Raw detector output and its normalization into canonical boxes.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::CounterConfig;
use crate::tracker::{DetectionBox, Rect};

/// Why a single raw detection was discarded. Never aborts the frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    #[error("label `{0}` is not the subject of interest")]
    LabelMismatch(String),

    #[error("box has {0} values, need at least 4")]
    ShortBox(usize),

    #[error("box value {index} is not a finite number")]
    NonFinite { index: usize },

    #[error("confidence {0} below threshold")]
    LowConfidence(f32),

    #[error("box collapsed after clamping to frame bounds")]
    Collapsed,
}

/// One detection as emitted by the inference backend.
///
/// `bbox` is `[x1, y1, x2, y2]` in pixels, optionally followed by a fifth
/// confidence value. Non-numeric coordinates should be passed as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub label: String,
    pub bbox: Vec<f32>,
}

impl RawDetection {
    pub fn new(label: impl Into<String>, bbox: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            bbox,
        }
    }

    /// Validate and clamp this record into a canonical box.
    ///
    /// `subject` must already be lowercase.
    fn to_box(
        &self,
        subject: &str,
        min_confidence: f32,
        width: f32,
        height: f32,
    ) -> Result<DetectionBox, DetectionError> {
        if !self.label.to_lowercase().contains(subject) {
            return Err(DetectionError::LabelMismatch(self.label.clone()));
        }
        if self.bbox.len() < 4 {
            return Err(DetectionError::ShortBox(self.bbox.len()));
        }
        let used = self.bbox.len().min(5);
        if let Some(index) = self.bbox[..used].iter().position(|v| !v.is_finite()) {
            return Err(DetectionError::NonFinite { index });
        }

        let confidence = self.bbox.get(4).copied().unwrap_or(1.0);
        if confidence < min_confidence {
            return Err(DetectionError::LowConfidence(confidence));
        }

        let rect = Rect::from_tlbr(self.bbox[0], self.bbox[1], self.bbox[2], self.bbox[3])
            .clamp_to(width, height);
        if !rect.is_proper() {
            return Err(DetectionError::Collapsed);
        }

        Ok(DetectionBox::new(rect, confidence, self.label.clone()))
    }
}

/// Everything the frame source pushes for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub detections: Vec<RawDetection>,
    pub width: u32,
    pub height: u32,
    pub timestamp: DateTime<Utc>,
}

impl RawFrame {
    /// Frame stamped with the current wall-clock time.
    pub fn new(detections: Vec<RawDetection>, width: u32, height: u32) -> Self {
        Self::with_timestamp(detections, width, height, Utc::now())
    }

    pub fn with_timestamp(
        detections: Vec<RawDetection>,
        width: u32,
        height: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            detections,
            width,
            height,
            timestamp,
        }
    }
}

/// Filters raw detections down to in-bounds boxes of the subject class.
#[derive(Debug, Clone)]
pub struct DetectionNormalizer {
    subject: String,
    min_confidence: f32,
}

impl DetectionNormalizer {
    pub fn new(subject_label: &str, min_confidence: f32) -> Self {
        Self {
            subject: subject_label.to_lowercase(),
            min_confidence,
        }
    }

    pub fn from_config(config: &CounterConfig) -> Self {
        Self::new(&config.subject_label, config.min_confidence)
    }

    /// Produce canonical boxes for one frame. Pure; malformed records are skipped.
    pub fn normalize(&self, raw: &[RawDetection], width: u32, height: u32) -> Vec<DetectionBox> {
        if width == 0 || height == 0 {
            tracing::debug!(width, height, "degenerate frame, ignoring detections");
            return Vec::new();
        }
        let (w, h) = (width as f32, height as f32);

        raw.iter()
            .filter_map(|det| match det.to_box(&self.subject, self.min_confidence, w, h) {
                Ok(b) => Some(b),
                Err(e) => {
                    tracing::trace!(label = %det.label, error = %e, "discarding detection");
                    None
                }
            })
            .collect()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl Default for DetectionNormalizer {
    fn default() -> Self {
        Self::from_config(&CounterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(bbox: &[f32]) -> RawDetection {
        RawDetection::new("person", bbox.to_vec())
    }

    #[test]
    fn test_in_bounds_box_passes_unchanged() {
        let n = DetectionNormalizer::default();
        let out = n.normalize(&[person(&[10.0, 20.0, 50.0, 80.0, 0.8])], 640, 480);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bbox.to_tlbr(), [10.0, 20.0, 50.0, 80.0]);
        assert_eq!(out[0].confidence, 0.8);
        assert_eq!(out[0].class_label, "person");
    }

    #[test]
    fn test_missing_confidence_defaults_to_one() {
        let n = DetectionNormalizer::default();
        let out = n.normalize(&[person(&[10.0, 20.0, 50.0, 80.0])], 640, 480);
        assert_eq!(out[0].confidence, 1.0);
    }

    #[test]
    fn test_label_match_is_case_insensitive_substring() {
        let n = DetectionNormalizer::default();
        let raw = vec![
            RawDetection::new("Person", vec![0.0, 0.0, 10.0, 10.0]),
            RawDetection::new("walking_PERSON", vec![0.0, 0.0, 10.0, 10.0]),
            RawDetection::new("car", vec![0.0, 0.0, 10.0, 10.0]),
        ];
        let out = n.normalize(&raw, 640, 480);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|d| d.class_label.to_lowercase().contains("person")));
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let n = DetectionNormalizer::default();
        let raw = vec![
            person(&[1.0, 2.0, 3.0]),
            person(&[f32::NAN, 0.0, 10.0, 10.0]),
            person(&[0.0, 0.0, f32::INFINITY, 10.0]),
            person(&[5.0, 5.0, 25.0, 25.0]),
        ];
        let out = n.normalize(&raw, 640, 480);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bbox.to_tlbr(), [5.0, 5.0, 25.0, 25.0]);
    }

    #[test]
    fn test_boxes_are_clamped() {
        let n = DetectionNormalizer::default();
        let out = n.normalize(&[person(&[-20.0, -5.0, 100.0, 500.0])], 640, 480);
        assert_eq!(out[0].bbox.to_tlbr(), [0.0, 0.0, 100.0, 480.0]);
    }

    #[test]
    fn test_collapsed_boxes_are_dropped() {
        let n = DetectionNormalizer::default();
        let raw = vec![
            person(&[700.0, 10.0, 800.0, 50.0]),
            person(&[50.0, 10.0, 20.0, 50.0]),
            person(&[10.0, 10.0, 10.0, 50.0]),
        ];
        assert!(n.normalize(&raw, 640, 480).is_empty());
    }

    #[test]
    fn test_zero_sized_frame_yields_nothing() {
        let n = DetectionNormalizer::default();
        let raw = vec![person(&[0.0, 0.0, 10.0, 10.0])];
        assert!(n.normalize(&raw, 0, 480).is_empty());
        assert!(n.normalize(&raw, 640, 0).is_empty());
    }

    #[test]
    fn test_min_confidence_filter() {
        let n = DetectionNormalizer::new("person", 0.5);
        let raw = vec![person(&[0.0, 0.0, 10.0, 10.0, 0.3]), person(&[0.0, 0.0, 10.0, 10.0, 0.7])];
        let out = n.normalize(&raw, 640, 480);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].confidence, 0.7);
    }

    #[test]
    fn test_rejection_reasons() {
        let subject = "person";
        assert_eq!(
            RawDetection::new("dog", vec![0.0, 0.0, 1.0, 1.0]).to_box(subject, 0.0, 10.0, 10.0),
            Err(DetectionError::LabelMismatch("dog".to_string()))
        );
        assert_eq!(
            person(&[0.0, 0.0]).to_box(subject, 0.0, 10.0, 10.0),
            Err(DetectionError::ShortBox(2))
        );
        assert_eq!(
            person(&[0.0, f32::NAN, 1.0, 1.0]).to_box(subject, 0.0, 10.0, 10.0),
            Err(DetectionError::NonFinite { index: 1 })
        );
    }
}
