use std::path::PathBuf;

/// Runtime configuration, loaded from environment variables and optionally
/// overridden by CLI flags.
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// Directory of reference images, one identity per file.
    pub roster_dir: PathBuf,
    /// Directory the per-day attendance ledgers are written to.
    pub ledger_dir: PathBuf,
    /// Cosine similarity threshold for accepting a roster match.
    pub accept_threshold: f32,
    /// Integer downscale factor applied to frames before detection.
    pub detect_downscale: u32,
}

impl Config {
    /// Load configuration from `MUSTER_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            camera_device: std::env::var("MUSTER_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            model_dir: std::env::var("MUSTER_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models")),
            roster_dir: std::env::var("MUSTER_ROSTER_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("roster")),
            ledger_dir: std::env::var("MUSTER_LEDGER_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            accept_threshold: env_f32("MUSTER_ACCEPT_THRESHOLD", 0.40),
            detect_downscale: env_u32("MUSTER_DETECT_DOWNSCALE", 4),
        }
    }

    /// Path to the SCRFD detection model.
    pub fn scrfd_model_path(&self) -> String {
        self.model_dir
            .join("det_10g.onnx")
            .to_string_lossy()
            .into_owned()
    }

    /// Path to the ArcFace recognition model.
    pub fn arcface_model_path(&self) -> String {
        self.model_dir
            .join("w600k_r50.onnx")
            .to_string_lossy()
            .into_owned()
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
