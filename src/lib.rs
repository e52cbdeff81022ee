//! Multi-Disease Detection Core - Model Lifecycle & Prediction Orchestration
//!
//! Serves on-demand disease-risk predictions from two heterogeneous models
//! (a tabular heart-disease classifier and a 4-class brain MRI CNN) behind a
//! uniform interface, logs every prediction and derives human-readable
//! interpretations from raw model output.

pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use db::DatabaseManager;
pub use error::{ModelError, PredictionError};
pub use models::ModelManager;
pub use service::PredictionService;

/// Initialize logging for binaries embedding this crate.
///
/// Honors `RUST_LOG`, defaulting to `info`. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
