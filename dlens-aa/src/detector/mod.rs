//! Lesion detection boundary
//!
//! The detection model is an external capability behind the [`LesionDetector`]
//! trait: given an image path and thresholds, return located lesion
//! predictions or a typed error. The production implementation is the ONNX
//! adapter in [`onnx`]; tests substitute scripted detectors.
//!
//! Services receive the capability as a [`DetectorHandle`] at construction
//! time. A handle is either `Ready` or `Unavailable` with a reason; callers
//! match on the variant instead of checking for a missing global model.

pub mod onnx;

pub use onnx::OnnxLesionDetector;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// One located lesion prediction
///
/// Geometry is carried for diagnostics and image overlays; the analysis
/// pipeline only consumes `class_id` and `confidence`.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Model class index
    pub class_id: u32,
    /// Prediction confidence in [0, 1]
    pub confidence: f32,
    /// Bounding box in original image coordinates (x1, y1, x2, y2)
    pub bbox: [f32; 4],
}

/// Detection thresholds
#[derive(Debug, Clone, Copy)]
pub struct DetectorOptions {
    /// Minimum confidence for a prediction to be reported
    pub confidence_threshold: f32,
    /// IoU threshold for overlap suppression
    pub iou_threshold: f32,
}

impl Default for DetectorOptions {
    /// The fixed thresholds used by the region pipeline
    fn default() -> Self {
        Self {
            confidence_threshold: 0.15,
            iou_threshold: 0.4,
        }
    }
}

/// Detector errors
#[derive(Debug, Error)]
pub enum DetectorError {
    /// Model file missing at the configured path
    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    /// Model exists but could not be loaded into a session
    #[error("Failed to load detection model: {0}")]
    ModelLoad(String),

    /// Input image could not be read or decoded
    #[error("Failed to read image {0}: {1}")]
    ImageRead(PathBuf, String),

    /// Inference call failed
    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Black-box detection capability
///
/// Implementations are blocking and synchronous; callers that must not block
/// an async runtime wrap the call in `spawn_blocking`.
pub trait LesionDetector: Send + Sync {
    /// Detect lesions in the image at `image_path`
    fn detect(
        &self,
        image_path: &Path,
        options: &DetectorOptions,
    ) -> Result<Vec<Detection>, DetectorError>;
}

/// Injected detection dependency
///
/// `Unavailable` replaces the nullable-global-model pattern: the service
/// starts and serves degraded results when the model cannot be loaded, and
/// the reason travels with the handle.
#[derive(Clone)]
pub enum DetectorHandle {
    /// Model loaded and ready for inference
    Ready(Arc<dyn LesionDetector>),
    /// Model could not be loaded; all analyses degrade with this reason
    Unavailable { reason: String },
}

impl DetectorHandle {
    /// Wrap a loaded detector
    pub fn ready<D: LesionDetector + 'static>(detector: D) -> Self {
        Self::Ready(Arc::new(detector))
    }

    /// Record a failed model load
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// True when inference is possible
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Unavailability reason, if any
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}

impl std::fmt::Debug for DetectorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("DetectorHandle::Ready"),
            Self::Unavailable { reason } => {
                write!(f, "DetectorHandle::Unavailable({reason})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_pipeline_thresholds() {
        let options = DetectorOptions::default();
        assert_eq!(options.confidence_threshold, 0.15);
        assert_eq!(options.iou_threshold, 0.4);
    }

    #[test]
    fn unavailable_handle_reports_reason() {
        let handle = DetectorHandle::unavailable("model file missing");
        assert!(!handle.is_ready());
        assert_eq!(handle.unavailable_reason(), Some("model file missing"));
    }
}
