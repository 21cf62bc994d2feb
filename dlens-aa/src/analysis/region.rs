//! Single-region analysis pipeline
//!
//! Runs detection, aggregation, and severity grading for one facial region.
//! The detector is injected at construction. `analyze` never panics and
//! never surfaces a raw fault: a missing model or a failed inference degrades
//! that region to an error-carrying outcome so the rest of the batch keeps
//! its data.

use crate::analysis::aggregate::{aggregate, LesionTally};
use crate::analysis::severity::SeverityGrade;
use crate::detector::{DetectorHandle, DetectorOptions};
use crate::models::Confidence;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of analyzing one region image
#[derive(Debug, Clone)]
pub struct RegionAnalysis {
    /// Severity grade label, or an error description for degraded outcomes
    pub severity: String,
    /// Top detection confidence across the region
    pub confidence: Confidence,
    /// Total lesion count
    pub acne_count: u32,
    /// Per-type aggregates
    pub acne_types: LesionTally,
}

impl RegionAnalysis {
    /// Degraded outcome carrying an error description in the severity field
    fn degraded(description: String) -> Self {
        Self {
            severity: description,
            confidence: Confidence::NotAvailable,
            acne_count: 0,
            acne_types: LesionTally::new(),
        }
    }
}

/// Detection → aggregation → grading for one region
#[derive(Clone)]
pub struct RegionPipeline {
    detector: DetectorHandle,
    options: DetectorOptions,
}

impl RegionPipeline {
    /// Build a pipeline around an injected detector, using the fixed
    /// confidence (0.15) and overlap (0.4) thresholds
    pub fn new(detector: DetectorHandle) -> Self {
        Self {
            detector,
            options: DetectorOptions::default(),
        }
    }

    /// Analyze the image at `image_path`
    pub fn analyze(&self, image_path: &Path) -> RegionAnalysis {
        let detector = match &self.detector {
            DetectorHandle::Ready(detector) => detector,
            DetectorHandle::Unavailable { reason } => {
                warn!(reason = %reason, "Detection model unavailable, degrading region");
                return RegionAnalysis::degraded(format!(
                    "Acne detection model not available: {reason}"
                ));
            }
        };

        let detections = match detector.detect(image_path, &self.options) {
            Ok(detections) => detections,
            Err(e) => {
                warn!(
                    path = %image_path.display(),
                    error = %e,
                    "Detection failed, degrading region"
                );
                return RegionAnalysis::degraded(format!("Error during acne detection: {e}"));
            }
        };

        // No boxes at all: Grade I by definition, but with the "N/A"
        // confidence sentinel rather than a score.
        if detections.is_empty() {
            return RegionAnalysis {
                severity: SeverityGrade::I.label().to_string(),
                confidence: Confidence::NotAvailable,
                acne_count: 0,
                acne_types: LesionTally::new(),
            };
        }

        let acne_types = aggregate(&detections);
        let total = acne_types.total_count();
        let grade = SeverityGrade::from_total_count(total);
        let confidence = acne_types
            .top_confidence()
            .map(Confidence::Score)
            .unwrap_or(Confidence::NotAvailable);

        for (name, stats) in acne_types.iter() {
            debug!(
                lesion_type = name,
                count = stats.count,
                max_conf = stats.max_conf,
                "Lesion type aggregated"
            );
        }

        RegionAnalysis {
            severity: grade.label().to_string(),
            confidence,
            acne_count: total,
            acne_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{Detection, DetectorError, LesionDetector};
    use std::path::PathBuf;

    /// Detector returning a fixed script regardless of input
    struct ScriptedDetector {
        result: Result<Vec<Detection>, ()>,
    }

    impl LesionDetector for ScriptedDetector {
        fn detect(
            &self,
            image_path: &Path,
            _options: &DetectorOptions,
        ) -> Result<Vec<Detection>, DetectorError> {
            match &self.result {
                Ok(detections) => Ok(detections.clone()),
                Err(()) => Err(DetectorError::ImageRead(
                    image_path.to_path_buf(),
                    "scripted failure".to_string(),
                )),
            }
        }
    }

    fn detection(class_id: u32, confidence: f32) -> Detection {
        Detection {
            class_id,
            confidence,
            bbox: [0.0, 0.0, 1.0, 1.0],
        }
    }

    fn pipeline_with(result: Result<Vec<Detection>, ()>) -> RegionPipeline {
        RegionPipeline::new(DetectorHandle::ready(ScriptedDetector { result }))
    }

    #[test]
    fn grades_detections_and_reports_top_confidence() {
        let pipeline = pipeline_with(Ok(vec![
            detection(0, 0.5),
            detection(0, 0.9),
            detection(1, 0.3),
        ]));
        let analysis = pipeline.analyze(&PathBuf::from("left.jpg"));

        assert_eq!(analysis.severity, SeverityGrade::I.label());
        assert_eq!(analysis.acne_count, 3);
        assert_eq!(analysis.confidence, Confidence::Score(0.9));
        assert_eq!(analysis.acne_types.len(), 2);
    }

    #[test]
    fn no_boxes_is_grade_one_with_sentinel_confidence() {
        let pipeline = pipeline_with(Ok(Vec::new()));
        let analysis = pipeline.analyze(&PathBuf::from("left.jpg"));

        assert_eq!(analysis.severity, SeverityGrade::I.label());
        assert_eq!(analysis.confidence, Confidence::NotAvailable);
        assert_eq!(analysis.acne_count, 0);
        assert!(analysis.acne_types.is_empty());
    }

    #[test]
    fn detector_fault_degrades_with_error_description() {
        let pipeline = pipeline_with(Err(()));
        let analysis = pipeline.analyze(&PathBuf::from("left.jpg"));

        assert!(analysis.severity.starts_with("Error during acne detection:"));
        assert_eq!(analysis.confidence, Confidence::NotAvailable);
        assert_eq!(analysis.acne_count, 0);
        assert!(analysis.acne_types.is_empty());
    }

    #[test]
    fn unavailable_model_degrades_with_reason() {
        let pipeline = RegionPipeline::new(DetectorHandle::unavailable("model file missing"));
        let analysis = pipeline.analyze(&PathBuf::from("left.jpg"));

        assert!(analysis
            .severity
            .contains("Acne detection model not available"));
        assert!(analysis.severity.contains("model file missing"));
        assert_eq!(analysis.confidence, Confidence::NotAvailable);
    }

    #[test]
    fn forty_detections_is_grade_three() {
        let detections: Vec<Detection> = (0..40).map(|i| detection(i % 3, 0.5)).collect();
        let pipeline = pipeline_with(Ok(detections));
        let analysis = pipeline.analyze(&PathBuf::from("middle.jpg"));
        assert_eq!(analysis.severity, SeverityGrade::III.label());
        assert_eq!(analysis.acne_count, 40);
    }
}
