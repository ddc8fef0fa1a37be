//! SCRFD face detector via ONNX Runtime.
//!
//! Runs the SCRFD anchor-free detector on RGB24 frames: letterbox resize
//! to the model input, 3-stride decode, NMS, and coordinate de-mapping
//! back to the source frame.

use crate::types::BoundingBox;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const SCRFD_INPUT_SIZE: usize = 640;
const SCRFD_MEAN: f32 = 127.5;
const SCRFD_STD: f32 = 128.0;
const SCRFD_CONFIDENCE_THRESHOLD: f32 = 0.5;
const SCRFD_NMS_THRESHOLD: f32 = 0.4;
const SCRFD_STRIDES: [usize; 3] = [8, 16, 32];
const SCRFD_ANCHORS_PER_CELL: usize = 2;
const RGB_CHANNELS: usize = 3;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} — download from insightface and place in the model dir")]
    ModelNotFound(String),
    #[error("frame buffer too small: expected {expected} bytes, got {actual}")]
    BadFrame { expected: usize, actual: usize },
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Letterbox metadata for mapping model-space coordinates back to the frame.
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

/// Output tensor indices for one stride: (score_idx, bbox_idx, kps_idx).
type StrideOutputIndices = (usize, usize, usize);

/// SCRFD-based face detector.
pub struct FaceDetector {
    session: Session,
    input_size: usize,
    /// Per-stride output indices [(score, bbox, kps)] for strides [8, 16, 32].
    /// Discovered by name at load time; falls back to positional ordering.
    stride_indices: [StrideOutputIndices; 3],
}

impl FaceDetector {
    /// Load the SCRFD ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, DetectorError> {
        if !Path::new(model_path).exists() {
            return Err(DetectorError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> =
            session.outputs().iter().map(|o| o.name().to_string()).collect();

        tracing::info!(
            path = model_path,
            outputs = ?output_names,
            "loaded SCRFD model"
        );

        if output_names.len() < 9 {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model requires 9 outputs (3 strides × score/bbox/kps), got {}",
                output_names.len()
            )));
        }

        let stride_indices = discover_output_indices(&output_names);
        tracing::debug!(?stride_indices, "SCRFD output tensor mapping");

        Ok(Self {
            session,
            input_size: SCRFD_INPUT_SIZE,
            stride_indices,
        })
    }

    /// Detect faces in an RGB24 frame, returning boxes sorted by confidence.
    pub fn detect(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<BoundingBox>, DetectorError> {
        let expected = width as usize * height as usize * RGB_CHANNELS;
        if rgb.len() < expected {
            return Err(DetectorError::BadFrame {
                expected,
                actual: rgb.len(),
            });
        }

        let (input, letterbox) = self.preprocess(rgb, width as usize, height as usize);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut all_detections = Vec::new();

        for (stride_pos, &stride) in SCRFD_STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx, kps_idx) = self.stride_indices[stride_pos];

            let (_, scores) = outputs[score_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("scores stride {stride}: {e}")))?;
            let (_, bboxes) = outputs[bbox_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("bboxes stride {stride}: {e}")))?;
            let (_, kps) = outputs[kps_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("kps stride {stride}: {e}")))?;

            all_detections.extend(decode_stride(
                scores,
                bboxes,
                kps,
                stride,
                self.input_size,
                &letterbox,
                SCRFD_CONFIDENCE_THRESHOLD,
            ));
        }

        let mut result = nms(all_detections, SCRFD_NMS_THRESHOLD);
        result.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(result)
    }

    /// Letterbox an RGB24 frame into a normalized NCHW float tensor.
    fn preprocess(&self, rgb: &[u8], width: usize, height: usize) -> (Array4<f32>, Letterbox) {
        let side = self.input_size;
        let scale = (side as f32 / width as f32).min(side as f32 / height as f32);

        let new_w = (width as f32 * scale).round() as usize;
        let new_h = (height as f32 * scale).round() as usize;
        let pad_x = (side - new_w) as f32 / 2.0;
        let pad_y = (side - new_h) as f32 / 2.0;
        let pad_x_start = pad_x.floor() as usize;
        let pad_y_start = pad_y.floor() as usize;

        // SCRFD_MEAN pad value normalizes to 0.0.
        let mut tensor = Array4::<f32>::from_elem((1, RGB_CHANNELS, side, side), 0.0);

        let inv_scale = 1.0 / scale;
        for y in 0..side {
            for x in 0..side {
                let inside = y >= pad_y_start
                    && y < pad_y_start + new_h
                    && x >= pad_x_start
                    && x < pad_x_start + new_w;

                let pixel = if inside {
                    sample_bilinear_rgb(
                        rgb,
                        width,
                        height,
                        ((x - pad_x_start) as f32 + 0.5) * inv_scale - 0.5,
                        ((y - pad_y_start) as f32 + 0.5) * inv_scale - 0.5,
                    )
                } else {
                    [SCRFD_MEAN; 3]
                };

                for c in 0..RGB_CHANNELS {
                    tensor[[0, c, y, x]] = (pixel[c] - SCRFD_MEAN) / SCRFD_STD;
                }
            }
        }

        (tensor, Letterbox { scale, pad_x, pad_y })
    }
}

/// Sample an RGB24 buffer at fractional coordinates with bilinear weights.
fn sample_bilinear_rgb(rgb: &[u8], width: usize, height: usize, sx: f32, sy: f32) -> [f32; 3] {
    let x0 = (sx.floor() as i32).clamp(0, width as i32 - 1) as usize;
    let y0 = (sy.floor() as i32).clamp(0, height as i32 - 1) as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = (sx - sx.floor()).clamp(0.0, 1.0);
    let fy = (sy - sy.floor()).clamp(0.0, 1.0);

    let mut out = [0.0f32; 3];
    for (c, v) in out.iter_mut().enumerate() {
        let tl = rgb[(y0 * width + x0) * RGB_CHANNELS + c] as f32;
        let tr = rgb[(y0 * width + x1) * RGB_CHANNELS + c] as f32;
        let bl = rgb[(y1 * width + x0) * RGB_CHANNELS + c] as f32;
        let br = rgb[(y1 * width + x1) * RGB_CHANNELS + c] as f32;
        *v = tl * (1.0 - fx) * (1.0 - fy)
            + tr * fx * (1.0 - fy)
            + bl * (1.0 - fx) * fy
            + br * fx * fy;
    }
    out
}

/// Discover output tensor ordering by name.
///
/// SCRFD exports may name tensors "score_8"/"bbox_16"/"kps_32" or use
/// generic numeric names; in the latter case fall back to the standard
/// positional ordering [0-2]=scores, [3-5]=bboxes, [6-8]=kps.
fn discover_output_indices(names: &[String]) -> [StrideOutputIndices; 3] {
    let find = |prefix: &str, stride: usize| -> Option<usize> {
        let target = format!("{prefix}_{stride}");
        names.iter().position(|n| n == &target)
    };

    let named = SCRFD_STRIDES.iter().all(|&stride| {
        find("score", stride).is_some()
            && find("bbox", stride).is_some()
            && find("kps", stride).is_some()
    });

    if named {
        tracing::info!("SCRFD: using name-based output tensor mapping");
        std::array::from_fn(|i| {
            let stride = SCRFD_STRIDES[i];
            (
                find("score", stride).unwrap(),
                find("bbox", stride).unwrap(),
                find("kps", stride).unwrap(),
            )
        })
    } else {
        tracing::info!(
            ?names,
            "SCRFD: output names not recognized, using positional mapping"
        );
        [(0, 3, 6), (1, 4, 7), (2, 5, 8)]
    }
}

/// Decode detections for a single stride level.
fn decode_stride(
    scores: &[f32],
    bboxes: &[f32],
    kps: &[f32],
    stride: usize,
    input_size: usize,
    letterbox: &Letterbox,
    threshold: f32,
) -> Vec<BoundingBox> {
    let grid = input_size / stride;
    let num_anchors = grid * grid * SCRFD_ANCHORS_PER_CELL;

    let unmap = |v: f32, pad: f32| (v - pad) / letterbox.scale;

    let mut detections = Vec::new();

    for idx in 0..num_anchors {
        let score = scores.get(idx).copied().unwrap_or(0.0);
        if score <= threshold {
            continue;
        }

        let anchor_idx = idx / SCRFD_ANCHORS_PER_CELL;
        let anchor_cx = (anchor_idx % grid) as f32 * stride as f32;
        let anchor_cy = (anchor_idx / grid) as f32 * stride as f32;

        let off = idx * 4;
        if off + 3 >= bboxes.len() {
            continue;
        }
        let x1 = unmap(anchor_cx - bboxes[off] * stride as f32, letterbox.pad_x);
        let y1 = unmap(anchor_cy - bboxes[off + 1] * stride as f32, letterbox.pad_y);
        let x2 = unmap(anchor_cx + bboxes[off + 2] * stride as f32, letterbox.pad_x);
        let y2 = unmap(anchor_cy + bboxes[off + 3] * stride as f32, letterbox.pad_y);

        let kps_off = idx * 10;
        let landmarks = if kps_off + 9 < kps.len() {
            let mut lms = [(0.0f32, 0.0f32); 5];
            for (i, lm) in lms.iter_mut().enumerate() {
                *lm = (
                    unmap(anchor_cx + kps[kps_off + i * 2] * stride as f32, letterbox.pad_x),
                    unmap(anchor_cy + kps[kps_off + i * 2 + 1] * stride as f32, letterbox.pad_y),
                );
            }
            Some(lms)
        } else {
            None
        };

        detections.push(BoundingBox {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            confidence: score,
            landmarks,
        });
    }

    detections
}

/// Non-Maximum Suppression: remove overlapping detections.
fn nms(mut detections: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(detections[i].clone());

        for j in (i + 1)..detections.len() {
            if !suppressed[j] && iou(&detections[i], &detections[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Intersection-over-Union between two bounding boxes.
fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width * a.height + b.width * b.height - inter;

    if union > 0.0 { inter / union } else { 0.0 }
}
