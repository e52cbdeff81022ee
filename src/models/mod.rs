//! Disease prediction models
//!
//! Two heterogeneous model families behind a shared lifecycle trait, plus
//! the manager that owns their process-lifetime singletons.

pub mod brain;
pub mod heart;
pub mod manager;

pub use brain::{BrainTumorModel, TumorPrediction};
pub use heart::{HeartDiseaseModel, RiskLabel};
pub use manager::{ManagerStatus, ModelManager, ModelSlot};

use crate::error::ModelError;

/// Shared lifecycle contract for disease prediction models.
///
/// Prediction input and output shapes differ per family, so `predict` lives
/// on the concrete types; this trait is the uniform surface used wherever
/// only lifecycle handling matters (warm-up, status reporting). A model may
/// defer its real load to the first `predict` call, as long as failures
/// surface the same way through both paths.
pub trait DiseaseModel: Send + Sync {
    /// Load the underlying model into memory. Idempotent once loaded.
    fn load(&self) -> Result<(), ModelError>;

    /// Whether a successful load has completed
    fn is_loaded(&self) -> bool;

    /// Short stable name used for logging and status
    fn name(&self) -> &'static str;
}
