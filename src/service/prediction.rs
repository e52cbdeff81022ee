//! Prediction Orchestrator
//!
//! One entry point per disease family, sharing a common failure-handling
//! shape: engineer input, acquire the model through the manager, predict,
//! log best-effort, interpret. A logging failure never fails the overall
//! prediction; the record is simply skipped and `log_id` stays `None`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::features::engineer_heart_features;
use super::suggestion::{brain_suggestion, heart_suggestion};
use crate::constants::{MODEL_TYPE_BRAIN, MODEL_TYPE_HEART};
use crate::db::DatabaseManager;
use crate::error::{ModelError, PredictionError};
use crate::models::brain::is_tumor_class;
use crate::models::heart::RiskLabel;
use crate::models::ModelManager;

/// Composed tabular prediction returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct HeartPrediction {
    pub risk_label: RiskLabel,
    pub probability: f64,
    pub features: HashMap<String, f64>,
    pub input_summary: String,
    pub suggestion: String,
    pub log_id: Option<i64>,
}

/// Composed image prediction returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct BrainPrediction {
    pub predicted_class: String,
    pub probability: f64,
    pub probabilities: BTreeMap<String, f64>,
    pub is_tumor: bool,
    pub input_summary: String,
    pub suggestion: String,
    pub log_id: Option<i64>,
}

/// Handles prediction logic for heart disease and brain tumor requests
pub struct PredictionService {
    db: Arc<DatabaseManager>,
    models: Arc<ModelManager>,
}

impl PredictionService {
    pub fn new(db: Arc<DatabaseManager>, models: Arc<ModelManager>) -> Self {
        Self { db, models }
    }

    fn now_iso() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Best-effort log insert; failures are logged and swallowed
    fn log_prediction(
        &self,
        user_id: Option<i64>,
        model_type: &str,
        input_summary: &str,
        prediction_result: &str,
        probability: f64,
    ) -> Option<i64> {
        let user_id = user_id?;
        match self.db.insert_prediction_log(
            user_id,
            model_type,
            input_summary,
            prediction_result,
            probability,
            &Self::now_iso(),
        ) {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!(
                    "PredictionService: failed to log {} prediction for user {}: {}",
                    model_type,
                    user_id,
                    e
                );
                None
            }
        }
    }

    /// Raw form data -> engineered features -> heart model -> log -> result
    pub fn predict_heart_disease(
        &self,
        form: &HashMap<String, String>,
        user_id: Option<i64>,
    ) -> Result<HeartPrediction, PredictionError> {
        let engineered = engineer_heart_features(form);

        let model = self.models.heart_model().map_err(|e| {
            log::error!("PredictionService: heart model unavailable: {}", e);
            PredictionError::ModelUnavailable(
                "Heart disease model is unavailable. Please ensure the model is trained and saved."
                    .to_string(),
            )
        })?;

        let (risk_label, probability) =
            model.predict(&engineered.features).map_err(|e| match e {
                ModelError::Inference(detail) => {
                    log::error!("PredictionService: heart prediction failed: {}", detail);
                    PredictionError::Failed(
                        "Heart disease prediction failed. Please try again later.".to_string(),
                    )
                }
                // Load conditions after a successful acquisition should not occur
                other => {
                    log::error!("PredictionService: unexpected heart model error: {}", other);
                    PredictionError::Internal(
                        "An unexpected error occurred during heart disease prediction. Please try again."
                            .to_string(),
                    )
                }
            })?;

        let input_summary = format!(
            "Age:{}, H:{}, W:{}, BP:{}/{}, Smoke:{}, Active:{}",
            engineered.age_years,
            engineered.height,
            engineered.weight,
            engineered.ap_hi,
            engineered.ap_lo,
            engineered.smoke,
            engineered.active,
        );

        let log_id = self.log_prediction(
            user_id,
            MODEL_TYPE_HEART,
            &input_summary,
            risk_label.as_str(),
            probability,
        );

        Ok(HeartPrediction {
            risk_label,
            probability,
            features: engineered.features,
            input_summary,
            suggestion: heart_suggestion(risk_label).to_string(),
            log_id,
        })
    }

    /// MRI image path -> brain model -> log -> result
    pub fn predict_brain_tumor(
        &self,
        image_path: &Path,
        user_id: Option<i64>,
    ) -> Result<BrainPrediction, PredictionError> {
        let model = self.models.brain_model().map_err(|e| {
            log::error!("PredictionService: brain model unavailable: {}", e);
            PredictionError::ModelUnavailable(
                "Brain tumor model is unavailable. Please ensure the model is trained and saved."
                    .to_string(),
            )
        })?;

        let result = model.predict(image_path).map_err(|e| match e {
            ModelError::NotFound(detail) => {
                log::error!("PredictionService: image file not found: {}", detail);
                PredictionError::Failed(
                    "Image file not found. Please ensure the file was uploaded correctly."
                        .to_string(),
                )
            }
            ModelError::Validation(detail) => {
                log::error!("PredictionService: image preprocessing error: {}", detail);
                PredictionError::Failed(
                    "Error processing image. Please ensure you are uploading a valid image file."
                        .to_string(),
                )
            }
            ModelError::Inference(detail) => {
                log::error!("PredictionService: brain prediction failed: {}", detail);
                PredictionError::Failed(
                    "Brain tumor prediction failed. Please try again later.".to_string(),
                )
            }
        })?;

        let is_tumor = is_tumor_class(&result.predicted_class);

        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| image_path.display().to_string());
        let input_summary = format!("image_path={}", file_name);

        let log_id = self.log_prediction(
            user_id,
            MODEL_TYPE_BRAIN,
            &input_summary,
            &result.predicted_class,
            result.probability,
        );

        let suggestion = brain_suggestion(&result.predicted_class, result.probability);

        Ok(BrainPrediction {
            predicted_class: result.predicted_class,
            probability: result.probability,
            probabilities: result.probabilities,
            is_tumor,
            input_summary,
            suggestion,
            log_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with_missing_models(dir: &tempfile::TempDir) -> PredictionService {
        let db = Arc::new(DatabaseManager::new(dir.path().join("test.db")));
        db.init_db().unwrap();
        let models = Arc::new(ModelManager::with_paths(
            "/nonexistent/heart_model.json",
            "/nonexistent/brain.onnx",
        ));
        PredictionService::new(db, models)
    }

    #[test]
    fn test_heart_flow_surfaces_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_missing_models(&dir);

        let err = service
            .predict_heart_disease(&HashMap::new(), Some(1))
            .unwrap_err();
        match err {
            PredictionError::ModelUnavailable(msg) => {
                // Short user-facing message, no filesystem detail
                assert!(msg.contains("Heart disease model is unavailable"));
                assert!(!msg.contains("/nonexistent"));
            }
            other => panic!("expected ModelUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_brain_flow_surfaces_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_missing_models(&dir);

        let err = service
            .predict_brain_tumor(Path::new("scan.png"), Some(1))
            .unwrap_err();
        match err {
            PredictionError::ModelUnavailable(msg) => {
                assert!(msg.contains("Brain tumor model is unavailable"));
                assert!(!msg.contains("/nonexistent"));
            }
            other => panic!("expected ModelUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_unavailable_model_is_memoized_across_requests() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_missing_models(&dir);

        let first = service
            .predict_heart_disease(&HashMap::new(), Some(1))
            .unwrap_err();
        let second = service
            .predict_heart_disease(&HashMap::new(), Some(1))
            .unwrap_err();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_prediction_logs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_missing_models(&dir);

        let _ = service.predict_heart_disease(&HashMap::new(), Some(9));
        assert!(service.db.predictions_for_user(9).unwrap().is_empty());
    }

    #[test]
    fn test_log_prediction_swallows_insert_failure() {
        // A database without its schema makes every insert fail
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(DatabaseManager::new(dir.path().join("no_schema.db")));
        let models = Arc::new(ModelManager::with_paths(
            "/nonexistent/heart_model.json",
            "/nonexistent/brain.onnx",
        ));
        let service = PredictionService::new(db, models);

        let log_id = service.log_prediction(Some(1), MODEL_TYPE_HEART, "Age:50", "Low", 0.2);
        assert_eq!(log_id, None);
    }

    #[test]
    fn test_log_prediction_skipped_without_user() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_missing_models(&dir);

        let log_id = service.log_prediction(None, MODEL_TYPE_HEART, "Age:50", "Low", 0.2);
        assert_eq!(log_id, None);
        // Nothing was written for any user
        assert!(service.db.predictions_for_user(0).unwrap().is_empty());
    }

    #[test]
    fn test_log_prediction_returns_row_id() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_missing_models(&dir);

        let log_id = service
            .log_prediction(Some(3), MODEL_TYPE_BRAIN, "image_path=scan.png", "no_tumor", 0.8)
            .unwrap();
        let row = service
            .db
            .latest_prediction(3, MODEL_TYPE_BRAIN)
            .unwrap()
            .unwrap();
        assert_eq!(row.id, log_id);
        assert_eq!(row.prediction_result, "no_tumor");
        // RFC 3339, second precision, UTC
        assert!(row.created_at.ends_with('Z'));
        assert_eq!(row.created_at.len(), "2026-01-01T10:00:00Z".len());
    }
}
