//! Builder for creating RawDetection objects from various box formats.

use crate::integration::normalizer::RawDetection;
use crate::tracker::Rect;

/// Builder for creating `RawDetection` objects from various input formats.
#[derive(Debug, Clone)]
pub struct RawDetectionBuilder {
    label: String,
    rect: Rect,
    confidence: Option<f32>,
}

impl Default for RawDetectionBuilder {
    fn default() -> Self {
        Self {
            label: "person".to_string(),
            rect: Rect::default(),
            confidence: None,
        }
    }
}

impl RawDetectionBuilder {
    /// Create a new builder labelled `person`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.rect = Rect::from_tlbr(x1, y1, x2, y2);
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.rect = Rect::from_xywh(cx, cy, w, h);
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, l: f32, t: f32, w: f32, h: f32) -> Self {
        self.rect = Rect::from_tlwh(l, t, w, h);
        self
    }

    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Build the final `RawDetection`.
    pub fn build(self) -> RawDetection {
        let mut bbox = self.rect.to_tlbr().to_vec();
        if let Some(c) = self.confidence {
            bbox.push(c);
        }
        RawDetection::new(self.label, bbox)
    }
}
