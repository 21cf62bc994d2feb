//! ONNX lesion detection adapter
//!
//! Wraps an exported acne-detection model (YOLO-style single-stage detector)
//! in an ort session. Input images are letterboxed to the model's square
//! input, the raw `[1, 4 + classes, anchors]` output is decoded, and
//! overlapping predictions are suppressed per class.

use super::{Detection, DetectorError, DetectorOptions, LesionDetector};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Model input tensor name (YOLO export convention)
const INPUT_NAME: &str = "images";

/// Model output tensor name (YOLO export convention)
const OUTPUT_NAME: &str = "output0";

/// Square model input size in pixels
const INPUT_SIZE: u32 = 640;

/// Letterbox padding intensity
const PAD_COLOR: f32 = 114.0 / 255.0;

/// ONNX-backed lesion detector
///
/// Inference is a blocking call; the session is guarded by a mutex, so
/// concurrent requests serialize on the model.
pub struct OnnxLesionDetector {
    session: Mutex<Session>,
}

impl OnnxLesionDetector {
    /// Load the model from an ONNX file
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.is_file() {
            return Err(DetectorError::ModelNotFound(model_path.to_path_buf()));
        }

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(2))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| DetectorError::ModelLoad(e.to_string()))?;

        debug!(path = %model_path.display(), "Detection model loaded");

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl LesionDetector for OnnxLesionDetector {
    fn detect(
        &self,
        image_path: &Path,
        options: &DetectorOptions,
    ) -> Result<Vec<Detection>, DetectorError> {
        let image = image::open(image_path)
            .map_err(|e| DetectorError::ImageRead(image_path.to_path_buf(), e.to_string()))?;
        let (orig_w, orig_h) = image.dimensions();

        let boxed = letterbox(&image, INPUT_SIZE);
        let input = Tensor::from_array((
            [1usize, 3, INPUT_SIZE as usize, INPUT_SIZE as usize],
            boxed.data.clone(),
        ))
        .map_err(|e| DetectorError::Inference(e.to_string()))?;
        let inputs = ort::inputs![INPUT_NAME => input]
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectorError::Inference("detector session lock poisoned".to_string()))?;
        let outputs = session
            .run(inputs)
            .map_err(|e| DetectorError::Inference(e.to_string()))?;
        let (shape, data) = outputs[OUTPUT_NAME]
            .try_extract_raw_tensor::<f32>()
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        let detections = decode_output(
            &shape,
            data,
            options,
            &boxed,
            orig_w as f32,
            orig_h as f32,
        )?;

        debug!(
            path = %image_path.display(),
            count = detections.len(),
            "Detection complete"
        );

        Ok(detections)
    }
}

/// Letterboxed model input with the mapping back to source coordinates
struct Letterbox {
    /// CHW float tensor data, normalized to [0, 1]
    data: Vec<f32>,
    /// Source-to-model scale factor
    scale: f32,
    /// Horizontal padding in model pixels
    pad_x: f32,
    /// Vertical padding in model pixels
    pad_y: f32,
}

/// Resize preserving aspect ratio and pad to a square model input
fn letterbox(image: &DynamicImage, size: u32) -> Letterbox {
    let (width, height) = image.dimensions();
    let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
    let new_w = ((width as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((height as f32 * scale).round() as u32).clamp(1, size);

    let resized = image
        .resize_exact(new_w, new_h, FilterType::Triangle)
        .to_rgb8();

    let left = (size - new_w) / 2;
    let top = (size - new_h) / 2;
    let plane = (size * size) as usize;
    let mut data = vec![PAD_COLOR; 3 * plane];

    for (x, y, pixel) in resized.enumerate_pixels() {
        let tx = (x + left) as usize;
        let ty = (y + top) as usize;
        for c in 0..3 {
            data[c * plane + ty * size as usize + tx] = pixel[c] as f32 / 255.0;
        }
    }

    Letterbox {
        data,
        scale,
        pad_x: left as f32,
        pad_y: top as f32,
    }
}

/// Decode the raw `[1, 4 + classes, anchors]` output tensor
fn decode_output(
    shape: &[i64],
    data: &[f32],
    options: &DetectorOptions,
    boxed: &Letterbox,
    orig_w: f32,
    orig_h: f32,
) -> Result<Vec<Detection>, DetectorError> {
    if shape.len() != 3 || shape[0] != 1 || shape[1] <= 4 {
        return Err(DetectorError::Inference(format!(
            "unexpected model output shape {shape:?}"
        )));
    }
    let rows = shape[1] as usize;
    let cols = shape[2] as usize;
    if data.len() < rows * cols {
        return Err(DetectorError::Inference(format!(
            "model output has {} values, expected {}",
            data.len(),
            rows * cols
        )));
    }
    let num_classes = rows - 4;

    let mut candidates = Vec::new();
    for j in 0..cols {
        let mut best_class = 0usize;
        let mut best_score = 0.0f32;
        for c in 0..num_classes {
            let score = data[(4 + c) * cols + j];
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }
        if best_score < options.confidence_threshold {
            continue;
        }

        let cx = data[j];
        let cy = data[cols + j];
        let w = data[2 * cols + j];
        let h = data[3 * cols + j];

        let x1 = ((cx - w / 2.0 - boxed.pad_x) / boxed.scale).clamp(0.0, orig_w);
        let y1 = ((cy - h / 2.0 - boxed.pad_y) / boxed.scale).clamp(0.0, orig_h);
        let x2 = ((cx + w / 2.0 - boxed.pad_x) / boxed.scale).clamp(0.0, orig_w);
        let y2 = ((cy + h / 2.0 - boxed.pad_y) / boxed.scale).clamp(0.0, orig_h);

        candidates.push(Detection {
            class_id: best_class as u32,
            confidence: best_score,
            bbox: [x1, y1, x2, y2],
        });
    }

    Ok(non_max_suppress(candidates, options.iou_threshold))
}

/// Class-aware greedy non-maximum suppression
fn non_max_suppress(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    'candidates: for candidate in candidates {
        for existing in &kept {
            if existing.class_id == candidate.class_id
                && iou(&existing.bbox, &candidate.bbox) > iou_threshold
            {
                continue 'candidates;
            }
        }
        kept.push(candidate);
    }
    kept
}

/// Intersection-over-union of two (x1, y1, x2, y2) boxes
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let intersection = ix * iy;
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(class_id: u32, confidence: f32, bbox: [f32; 4]) -> Detection {
        Detection {
            class_id,
            confidence,
            bbox,
        }
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let b = [0.0, 0.0, 10.0, 10.0];
        assert!((iou(&b, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [20.0, 20.0, 30.0, 30.0];
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn nms_suppresses_same_class_overlap() {
        let candidates = vec![
            detection(0, 0.9, [0.0, 0.0, 10.0, 10.0]),
            detection(0, 0.5, [1.0, 1.0, 11.0, 11.0]),
        ];
        let kept = non_max_suppress(candidates, 0.4);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn nms_keeps_cross_class_overlap() {
        let candidates = vec![
            detection(0, 0.9, [0.0, 0.0, 10.0, 10.0]),
            detection(1, 0.5, [1.0, 1.0, 11.0, 11.0]),
        ];
        let kept = non_max_suppress(candidates, 0.4);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn decode_filters_below_confidence_threshold() {
        // Two anchors, two classes: rows = [cx, cy, w, h, class0, class1]
        let shape = [1i64, 6, 2];
        #[rustfmt::skip]
        let data = [
            320.0, 320.0, // cx
            320.0, 320.0, // cy
            20.0, 20.0,   // w
            20.0, 20.0,   // h
            0.8, 0.05,    // class 0 scores
            0.1, 0.05,    // class 1 scores
        ];
        let boxed = Letterbox {
            data: Vec::new(),
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
        };
        let detections = decode_output(
            &shape,
            &data,
            &DetectorOptions::default(),
            &boxed,
            640.0,
            640.0,
        )
        .unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 0);
        assert_eq!(detections[0].confidence, 0.8);
        assert_eq!(detections[0].bbox, [310.0, 310.0, 330.0, 330.0]);
    }

    #[test]
    fn decode_maps_letterbox_back_to_source_coordinates() {
        // One anchor centered in the model frame of a 1280x640 source:
        // scale 0.5, vertical padding 160.
        let shape = [1i64, 5, 1];
        let data = [320.0, 320.0, 100.0, 100.0, 0.9];
        let boxed = Letterbox {
            data: Vec::new(),
            scale: 0.5,
            pad_x: 0.0,
            pad_y: 160.0,
        };
        let detections = decode_output(
            &shape,
            &data,
            &DetectorOptions::default(),
            &boxed,
            1280.0,
            640.0,
        )
        .unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].bbox, [540.0, 220.0, 740.0, 420.0]);
    }

    #[test]
    fn decode_rejects_malformed_shape() {
        let result = decode_output(
            &[1, 2],
            &[],
            &DetectorOptions::default(),
            &Letterbox {
                data: Vec::new(),
                scale: 1.0,
                pad_x: 0.0,
                pad_y: 0.0,
            },
            640.0,
            640.0,
        );
        assert!(result.is_err());
    }
}
