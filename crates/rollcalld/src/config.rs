use std::path::PathBuf;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Directory for stored enrollment image artifacts.
    pub faces_dir: PathBuf,
    /// Maximum Euclidean distance still considered the same person.
    pub match_threshold: f64,
    /// Timeout in seconds for one recognition attempt.
    pub recognize_timeout_secs: u64,
    /// Number of warmup frames to discard at startup (camera AGC/AE stabilization).
    pub warmup_frames: usize,
}

impl Config {
    /// Load configuration from `ROLLCALL_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("rollcall");

        let model_dir = std::env::var("ROLLCALL_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("models"));

        let db_path = std::env::var("ROLLCALL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("rollcall.db"));

        let faces_dir = std::env::var("ROLLCALL_FACES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("face_data"));

        Self {
            camera_device: std::env::var("ROLLCALL_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            model_dir,
            db_path,
            faces_dir,
            match_threshold: env_f64("ROLLCALL_MATCH_THRESHOLD", 0.6),
            recognize_timeout_secs: env_u64("ROLLCALL_RECOGNIZE_TIMEOUT_SECS", 10),
            warmup_frames: env_usize("ROLLCALL_WARMUP_FRAMES", 4),
        }
    }

    /// Path to the face detection + landmark model.
    pub fn detector_model_path(&self) -> String {
        self.model_dir
            .join("face_det_68.onnx")
            .to_string_lossy()
            .into_owned()
    }

    /// Path to the signature embedding model.
    pub fn embedder_model_path(&self) -> String {
        self.model_dir
            .join("face_embed_128.onnx")
            .to_string_lossy()
            .into_owned()
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
