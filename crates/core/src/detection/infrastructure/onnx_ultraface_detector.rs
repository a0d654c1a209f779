use std::cmp::Ordering;
use std::path::Path;

use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::shared::frame::{Frame, PixelFormat};
use crate::shared::region::FaceRegion;

/// Model input resolution (width x height).
const INPUT_WIDTH: u32 = 320;
const INPUT_HEIGHT: u32 = 240;

/// Default confidence threshold.
pub const DEFAULT_CONFIDENCE: f32 = 0.7;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f32 = 0.4;

/// UltraFace (version-RFB-320) face detector backed by an ONNX Runtime
/// session.
///
/// Consumes the luma plane of an NV12 frame: the single-channel image is
/// replicated across the model's three input channels, which holds up
/// well at webcam distances.
pub struct OnnxUltrafaceDetector {
    session: ort::session::Session,
    confidence: f32,
}

impl OnnxUltrafaceDetector {
    pub fn new(model_path: &Path, confidence: f32) -> Result<Self, DetectionError> {
        let session = ort::session::Session::builder()
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| DetectionError::ModelLoad(e.to_string()))?;
        Ok(Self {
            session,
            confidence,
        })
    }
}

impl FaceDetector for OnnxUltrafaceDetector {
    fn supports_format(&self, format: PixelFormat) -> bool {
        format == PixelFormat::Nv12
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, DetectionError> {
        let luma = frame.luma_plane().ok_or_else(|| {
            DetectionError::Inference(format!("cannot read luma plane of {} frame", frame.format()))
        })?;

        let tensor = preprocess(luma, frame.width(), frame.height());
        let input = ort::value::Tensor::from_array(tensor)
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        // The model yields two tensors: scores [1, N, 2] and corner-form
        // boxes [1, N, 4] in normalized coordinates.
        if outputs.len() < 2 {
            return Err(DetectionError::MalformedOutput(format!(
                "expected 2 outputs, got {}",
                outputs.len()
            )));
        }
        let scores = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectionError::MalformedOutput(e.to_string()))?;
        let boxes = outputs[1]
            .try_extract_array::<f32>()
            .map_err(|e| DetectionError::MalformedOutput(e.to_string()))?;
        let scores = scores
            .as_slice()
            .ok_or_else(|| DetectionError::MalformedOutput("non-contiguous score tensor".into()))?;
        let boxes = boxes
            .as_slice()
            .ok_or_else(|| DetectionError::MalformedOutput("non-contiguous box tensor".into()))?;

        let candidates = decode(scores, boxes, self.confidence)?;
        let kept = nms(candidates, NMS_IOU_THRESH);

        let fw = frame.width();
        let fh = frame.height();
        Ok(kept
            .iter()
            .filter_map(|c| {
                FaceRegion::from_corners(
                    c.x1 * fw as f32,
                    c.y1 * fh as f32,
                    c.x2 * fw as f32,
                    c.y2 * fh as f32,
                    fw,
                    fh,
                )
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Samples the luma plane down/up to the model input size, replicates it
/// across three channels, and normalizes to the model's expected range.
fn preprocess(luma: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;
    let (w, h) = (INPUT_WIDTH as usize, INPUT_HEIGHT as usize);

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, h, w));
    for y in 0..h {
        let sy = (y * src_h / h).min(src_h - 1);
        for x in 0..w {
            let sx = (x * src_w / w).min(src_w - 1);
            let value = (luma[sy * src_w + sx] as f32 - 127.0) / 128.0;
            for c in 0..3 {
                tensor[[0, c, y, x]] = value;
            }
        }
    }
    tensor
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// One above-threshold detection in normalized corner coordinates.
#[derive(Clone, Debug)]
struct Candidate {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
}

/// Filters raw model output by face confidence (scores are
/// `[background, face]` pairs).
fn decode(scores: &[f32], boxes: &[f32], confidence: f32) -> Result<Vec<Candidate>, DetectionError> {
    if scores.len() % 2 != 0 || boxes.len() % 4 != 0 || scores.len() / 2 != boxes.len() / 4 {
        return Err(DetectionError::MalformedOutput(format!(
            "score/box element counts do not agree: {} vs {}",
            scores.len(),
            boxes.len()
        )));
    }

    let mut out = Vec::new();
    for i in 0..scores.len() / 2 {
        let score = scores[i * 2 + 1];
        if score < confidence {
            continue;
        }
        let b = &boxes[i * 4..i * 4 + 4];
        out.push(Candidate {
            x1: b[0],
            y1: b[1],
            x2: b[2],
            y2: b[3],
            score,
        });
    }
    Ok(out)
}

/// Greedy non-maximum suppression: keeps a candidate only if its IoU with
/// every previously-kept candidate is at or below the threshold.
fn nms(mut candidates: Vec<Candidate>, iou_thresh: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut kept: Vec<Candidate> = Vec::new();
    for c in candidates {
        if kept.iter().all(|k| iou(k, &c) <= iou_thresh) {
            kept.push(c);
        }
    }
    kept
}

fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    inter / (area_a + area_b - inter)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
