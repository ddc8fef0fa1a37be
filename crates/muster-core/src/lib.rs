//! muster-core — Face detection, recognition and roster matching.
//!
//! Uses SCRFD for face detection and ArcFace for embedding extraction,
//! both running via ONNX Runtime for CPU inference. The roster matcher
//! compares probe embeddings against the known-identity roster built at
//! startup from a directory of reference images.

pub mod alignment;
pub mod detector;
pub mod engine;
pub mod matching;
pub mod recognizer;
pub mod roster;
pub mod types;

pub use engine::{EngineError, FaceEngine, OnnxFaceEngine};
pub use matching::{Identity, Roster, RosterMatch};
pub use types::{BoundingBox, DetectedFace, Embedding};
