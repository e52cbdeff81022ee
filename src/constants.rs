//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change a default artifact location, only edit this file.

use std::path::PathBuf;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name, also the data directory name
pub const APP_NAME: &str = "mdds";

/// Model family tag for tabular heart-disease predictions
pub const MODEL_TYPE_HEART: &str = "heart_disease";

/// Model family tag for the 4-class brain MRI classifier
pub const MODEL_TYPE_BRAIN: &str = "brain_tumor_multiclass";

/// Input size (height, width) the brain CNN was trained on
pub const BRAIN_IMG_SIZE: (u32, u32) = (128, 128);

/// Default bundle file name for the heart model
const HEART_BUNDLE_FILE: &str = "heart_model.json";

/// Default weights file name for the brain model
const BRAIN_MODEL_FILE: &str = "brain_tumor_cnn_multiclass.onnx";

/// Default database file name
const DB_FILE: &str = "app.db";

/// Base data directory (`<platform local data dir>/mdds`)
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Heart model bundle path from environment or default
pub fn heart_model_path() -> PathBuf {
    std::env::var("MDDS_HEART_MODEL")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir().join("saved_models").join(HEART_BUNDLE_FILE))
}

/// Brain model weights path from environment or default
pub fn brain_model_path() -> PathBuf {
    std::env::var("MDDS_BRAIN_MODEL")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir().join("saved_models").join(BRAIN_MODEL_FILE))
}

/// SQLite database path from environment or default
pub fn db_path() -> PathBuf {
    std::env::var("MDDS_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir().join(DB_FILE))
}
