//! Trait for object detection inference backends.

use crate::integration::normalizer::RawDetection;

/// Object detection inference backend feeding the counter.
///
/// Implementations wrap whatever engine produces per-frame boxes. Errors are
/// caught at the frame boundary: a failing frame is abandoned and leaves the
/// tracking state untouched.
///
/// # Example
///
/// ```ignore
/// use linecount_rs::{DetectionSource, RawDetection};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(
///         &mut self,
///         input: &[u8],
///         width: u32,
///         height: u32,
///     ) -> Result<Vec<RawDetection>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    type Error: std::error::Error + 'static;

    /// Run inference on raw image data.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes (format depends on implementation)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<RawDetection>, Self::Error>;
}
