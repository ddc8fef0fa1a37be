//! The detection/embedding seam consumed by the roster encoder and the
//! frame processor.
//!
//! `FaceEngine` is the only interface the rest of the system sees; the
//! production implementation composes the SCRFD detector and the ArcFace
//! recognizer. Implementations may be stateful, hence `&mut self`.

use crate::detector::{DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::{DetectedFace, Embedding};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("detector: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// Face detection + embedding extraction over RGB24 buffers.
pub trait FaceEngine {
    /// Detect every face in the frame and compute one embedding per face.
    ///
    /// Faces are returned in detector order (confidence-descending after
    /// NMS), which fixes what "first face" means for roster images.
    fn detect_and_embed(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<DetectedFace>, EngineError>;

    /// Embed the first detected face in a still image, if any.
    fn embed_only(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<Embedding>, EngineError>;
}

/// SCRFD + ArcFace engine backed by ONNX Runtime sessions.
pub struct OnnxFaceEngine {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxFaceEngine {
    pub fn load(detector_path: &str, recognizer_path: &str) -> Result<Self, EngineError> {
        let detector = FaceDetector::load(detector_path)?;
        let recognizer = FaceRecognizer::load(recognizer_path)?;
        Ok(Self { detector, recognizer })
    }
}

impl FaceEngine for OnnxFaceEngine {
    fn detect_and_embed(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<DetectedFace>, EngineError> {
        let boxes = self.detector.detect(rgb, width, height)?;
        let mut faces = Vec::with_capacity(boxes.len());

        for bbox in boxes {
            match self.recognizer.extract(rgb, width, height, &bbox) {
                Ok(embedding) => faces.push(DetectedFace { bbox, embedding }),
                // A face the recognizer cannot embed (e.g. missing
                // landmarks) is dropped; the rest of the frame still counts.
                Err(err) => {
                    tracing::warn!(error = %err, "skipping face: embedding extraction failed");
                }
            }
        }

        Ok(faces)
    }

    fn embed_only(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<Embedding>, EngineError> {
        let boxes = self.detector.detect(rgb, width, height)?;
        let Some(first) = boxes.first() else {
            return Ok(None);
        };
        Ok(Some(self.recognizer.extract(rgb, width, height, first)?))
    }
}
