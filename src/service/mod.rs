//! Prediction orchestration
//!
//! Request-scoped flow that ties feature engineering, model acquisition,
//! best-effort logging and result interpretation together, plus the
//! medical-context summarizer consumed by the conversational assistant.

mod context;
mod features;
mod prediction;
mod suggestion;

pub use context::build_user_medical_context;
pub use features::{engineer_heart_features, parse_float, HeartFeatures, DEFAULT_BMI};
pub use prediction::{BrainPrediction, HeartPrediction, PredictionService};
pub use suggestion::{brain_suggestion, heart_suggestion};
