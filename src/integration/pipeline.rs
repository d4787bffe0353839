//! TrackerPipeline for combining detection with counting.

use chrono::Utc;
use thiserror::Error;

use crate::config::CounterConfig;
use crate::integration::detector::DetectionSource;
use crate::integration::normalizer::RawFrame;
use crate::integration::session::{CountingSession, FrameSnapshot};

#[derive(Debug, Error)]
pub enum PipelineError<E: std::error::Error + 'static> {
    /// The detector failed; the frame was abandoned without touching any state.
    #[error("inference failed: {0}")]
    Inference(#[source] E),
}

/// Bundles a `DetectionSource` with a `CountingSession`.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    session: CountingSession,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    pub fn new(detector: D, session: CountingSession) -> Self {
        Self { detector, session }
    }

    pub fn with_config(detector: D, config: &CounterConfig) -> Self {
        Self::new(detector, CountingSession::new(config))
    }

    /// Run detection on one image and feed the result through the session.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    pub fn process_image(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<FrameSnapshot, PipelineError<D::Error>> {
        let timestamp = Utc::now();
        let detections = self.detector.detect(input, width, height).map_err(|e| {
            tracing::warn!(error = %e, "inference failed, frame abandoned");
            PipelineError::Inference(e)
        })?;
        let frame = RawFrame::with_timestamp(detections, width, height, timestamp);
        Ok(self.session.process_frame(&frame))
    }

    /// The wrapped inference backend.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Mutable access to the backend, e.g. to swap models between frames.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Tracking and counting state fed by this pipeline.
    pub fn session(&self) -> &CountingSession {
        &self.session
    }

    /// Mutable access to the counting session.
    pub fn session_mut(&mut self) -> &mut CountingSession {
        &mut self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::{RawDetection, RawDetectionBuilder};

    #[derive(Debug, Error)]
    #[error("camera unplugged")]
    struct CameraGone;

    /// Replays scripted results, one per call.
    struct ScriptedDetector {
        script: Vec<Result<Vec<RawDetection>, CameraGone>>,
    }

    impl DetectionSource for ScriptedDetector {
        type Error = CameraGone;

        fn detect(
            &mut self,
            _input: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<RawDetection>, Self::Error> {
            self.script.remove(0)
        }
    }

    fn person_at_y(y: f32) -> Vec<RawDetection> {
        vec![RawDetectionBuilder::new().xywh(320.0, y, 40.0, 40.0).build()]
    }

    #[test]
    fn test_tracker_pipeline() {
        let detector = ScriptedDetector {
            script: vec![Ok(person_at_y(220.0)), Ok(person_at_y(250.0))],
        };
        let mut pipeline = TrackerPipeline::with_config(detector, &CounterConfig::default());

        let first = pipeline.process_image(&[], 640, 480).unwrap();
        assert!(first.events.is_empty());
        let second = pipeline.process_image(&[], 640, 480).unwrap();
        assert_eq!(second.events.len(), 1);
        assert_eq!(pipeline.session().counts().entered, 1);
    }

    #[test]
    fn test_inference_failure_leaves_state_untouched() {
        let detector = ScriptedDetector {
            script: vec![Ok(person_at_y(220.0)), Err(CameraGone), Ok(person_at_y(250.0))],
        };
        let mut pipeline = TrackerPipeline::with_config(detector, &CounterConfig::default());

        pipeline.process_image(&[], 640, 480).unwrap();
        let err = pipeline.process_image(&[], 640, 480).unwrap_err();
        assert!(matches!(err, PipelineError::Inference(CameraGone)));
        assert_eq!(pipeline.session().tracker().len(), 1);
        assert_eq!(pipeline.session().snapshot().frame_id, 1);

        // The abandoned frame did not break continuity.
        let snap = pipeline.process_image(&[], 640, 480).unwrap();
        assert_eq!(snap.events.len(), 1);
    }
}
