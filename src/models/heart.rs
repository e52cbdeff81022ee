//! Heart disease risk model (tabular ONNX classifier)
//!
//! Wraps an ONNX export of the trained ensemble classifier together with
//! the ordered feature-name list established at training time. Input is a
//! name -> value mapping; output is a three-tier risk label plus the
//! probability of the disease class.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::DiseaseModel;
use crate::error::ModelError;

/// Probability at or above which the risk tier is High
pub const HIGH_RISK_THRESHOLD: f64 = 0.70;

/// Probability at or above which the risk tier is Medium
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.40;

/// Three-tier risk output derived from the disease-class probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    Low,
    Medium,
    High,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Low => "Low",
            RiskLabel::Medium => "Medium",
            RiskLabel::High => "High",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map the disease-class probability to a risk tier.
///
/// Boundaries are inclusive-low: 0.70 is High, 0.40 is Medium.
pub fn risk_label_for(prob_disease: f64) -> RiskLabel {
    if prob_disease >= HIGH_RISK_THRESHOLD {
        RiskLabel::High
    } else if prob_disease >= MEDIUM_RISK_THRESHOLD {
        RiskLabel::Medium
    } else {
        RiskLabel::Low
    }
}

/// Build the fixed-order feature vector for one sample.
///
/// Missing keys default to 0.0; non-finite values are also coerced to 0.0
/// rather than failing the prediction.
pub fn build_feature_row(feature_names: &[String], features: &HashMap<String, f64>) -> Vec<f32> {
    feature_names
        .iter()
        .map(|name| {
            let value = features.get(name).copied().unwrap_or(0.0);
            if value.is_finite() {
                value as f32
            } else {
                0.0
            }
        })
        .collect()
}

/// Index of the "disease" class in the probability vector.
///
/// Class label 1 is taken as disease when present. When it is absent the
/// last class is assumed to be disease; that mirrors the training-side
/// convention but can mislabel a differently-trained classifier, so callers
/// must not rely on label 1 always existing.
pub fn positive_class_index(classes: &[i64], n_outputs: usize) -> usize {
    if let Some(idx) = classes.iter().position(|&c| c == 1) {
        return idx;
    }
    if !classes.is_empty() {
        return classes.len() - 1;
    }
    n_outputs.saturating_sub(1)
}

/// Metadata bundle saved next to the ONNX export at training time
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HeartModelBundle {
    /// ONNX weights file, relative to the bundle unless absolute
    model_file: String,
    /// Feature order the classifier was trained with
    feature_names: Vec<String>,
    /// Class labels in the classifier's output order
    classes: Vec<i64>,
}

#[derive(Debug)]
struct LoadedHeart {
    session: Session,
    feature_names: Vec<String>,
    classes: Vec<i64>,
}

/// Wrapper for the heart disease prediction model
#[derive(Debug)]
pub struct HeartDiseaseModel {
    bundle_path: PathBuf,
    state: Mutex<Option<LoadedHeart>>,
}

impl HeartDiseaseModel {
    pub fn new(bundle_path: impl Into<PathBuf>) -> Self {
        Self {
            bundle_path: bundle_path.into(),
            state: Mutex::new(None),
        }
    }

    /// Feature order declared by the loaded bundle (empty before load)
    pub fn feature_names(&self) -> Vec<String> {
        self.state
            .lock()
            .as_ref()
            .map(|s| s.feature_names.clone())
            .unwrap_or_default()
    }

    fn ensure_loaded(&self) -> Result<(), ModelError> {
        let mut state = self.state.lock();
        if state.is_some() {
            return Ok(());
        }

        if !self.bundle_path.exists() {
            return Err(ModelError::NotFound(format!(
                "heart model bundle not found at {}; run the training export first",
                self.bundle_path.display()
            )));
        }

        let raw = fs::read(&self.bundle_path).map_err(|e| {
            ModelError::Validation(format!(
                "failed to read heart bundle {}: {}",
                self.bundle_path.display(),
                e
            ))
        })?;
        let bundle: HeartModelBundle = serde_json::from_slice(&raw).map_err(|e| {
            ModelError::Validation(format!(
                "failed to parse heart bundle {}: {}",
                self.bundle_path.display(),
                e
            ))
        })?;

        if bundle.feature_names.is_empty() {
            return Err(ModelError::Validation(
                "heart model bundle has an empty feature_names list".to_string(),
            ));
        }

        let model_path = self.resolve_model_file(&bundle.model_file);
        if !model_path.exists() {
            return Err(ModelError::NotFound(format!(
                "heart model weights not found at {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| ModelError::Validation(format!("failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Validation(format!("failed to set optimization: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| ModelError::Validation(format!("failed to load heart model: {}", e)))?;

        log::info!(
            "Heart model loaded from {} ({} features)",
            model_path.display(),
            bundle.feature_names.len()
        );

        *state = Some(LoadedHeart {
            session,
            feature_names: bundle.feature_names,
            classes: bundle.classes,
        });
        Ok(())
    }

    fn resolve_model_file(&self, model_file: &str) -> PathBuf {
        let path = Path::new(model_file);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.bundle_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(path)
    }

    /// Predict `(risk_label, probability_of_disease)` for one feature mapping
    pub fn predict(&self, features: &HashMap<String, f64>) -> Result<(RiskLabel, f64), ModelError> {
        self.ensure_loaded()?;

        let mut state = self.state.lock();
        let loaded = state
            .as_mut()
            .ok_or_else(|| ModelError::Inference("heart model not loaded".to_string()))?;

        let row = build_feature_row(&loaded.feature_names, features);
        let n_features = row.len();

        let input = Array2::<f32>::from_shape_vec((1, n_features), row)
            .map_err(|e| ModelError::Inference(format!("feature array error: {}", e)))?;

        let proba = run_probabilities(&mut loaded.session, input)?;

        let idx_disease = positive_class_index(&loaded.classes, proba.len());
        let prob_disease = f64::from(proba.get(idx_disease).copied().unwrap_or(0.0));

        Ok((risk_label_for(prob_disease), prob_disease))
    }
}

impl DiseaseModel for HeartDiseaseModel {
    fn load(&self) -> Result<(), ModelError> {
        self.ensure_loaded()
    }

    fn is_loaded(&self) -> bool {
        self.state.lock().is_some()
    }

    fn name(&self) -> &'static str {
        crate::constants::MODEL_TYPE_HEART
    }
}

/// Run one forward pass and extract the class-probability vector.
///
/// sklearn-style ONNX exports expose a float `probabilities` output next to
/// the integer label output; fall back to the last declared output when the
/// name differs.
fn run_probabilities(session: &mut Session, input: Array2<f32>) -> Result<Vec<f32>, ModelError> {
    let output_name = session
        .outputs
        .iter()
        .find(|o| o.name == "probabilities")
        .or_else(|| session.outputs.last())
        .map(|o| o.name.clone())
        .ok_or_else(|| ModelError::Inference("no output defined".to_string()))?;

    let input_tensor = Value::from_array(input)
        .map_err(|e| ModelError::Inference(format!("tensor error: {}", e)))?;

    let outputs = session
        .run(ort::inputs![input_tensor])
        .map_err(|e| ModelError::Inference(format!("inference failed: {}", e)))?;

    let output = outputs
        .get(&output_name)
        .ok_or_else(|| ModelError::Inference("missing probabilities output".to_string()))?;

    let (_, data) = output
        .try_extract_tensor::<f32>()
        .map_err(|e| ModelError::Inference(format!("extract error: {}", e)))?;

    Ok(data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_risk_label_tiers() {
        assert_eq!(risk_label_for(0.95), RiskLabel::High);
        assert_eq!(risk_label_for(0.70), RiskLabel::High); // inclusive-low
        assert_eq!(risk_label_for(0.699), RiskLabel::Medium);
        assert_eq!(risk_label_for(0.40), RiskLabel::Medium); // inclusive-low
        assert_eq!(risk_label_for(0.399), RiskLabel::Low);
        assert_eq!(risk_label_for(0.0), RiskLabel::Low);
    }

    #[test]
    fn test_feature_row_order_and_defaults() {
        let feature_names = names(&["age", "gender", "bmi"]);
        let mut features = HashMap::new();
        features.insert("bmi".to_string(), 24.2);
        features.insert("age".to_string(), 18250.0);
        // "gender" deliberately missing

        let row = build_feature_row(&feature_names, &features);
        assert_eq!(row, vec![18250.0, 0.0, 24.2]);
    }

    #[test]
    fn test_feature_row_coerces_non_finite() {
        let feature_names = names(&["a", "b"]);
        let mut features = HashMap::new();
        features.insert("a".to_string(), f64::NAN);
        features.insert("b".to_string(), f64::INFINITY);

        assert_eq!(build_feature_row(&feature_names, &features), vec![0.0, 0.0]);
    }

    #[test]
    fn test_positive_class_index_prefers_label_one() {
        assert_eq!(positive_class_index(&[0, 1], 2), 1);
        assert_eq!(positive_class_index(&[1, 0], 2), 0);
    }

    #[test]
    fn test_positive_class_index_falls_back_to_last() {
        // Label 1 absent: assume the last class is disease
        assert_eq!(positive_class_index(&[0, 2, 3], 3), 2);
        assert_eq!(positive_class_index(&[], 4), 3);
    }

    #[test]
    fn test_missing_bundle_is_not_found() {
        let model = HeartDiseaseModel::new("/nonexistent/heart_model.json");
        match model.load() {
            Err(ModelError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(!model.is_loaded());
    }

    #[test]
    fn test_empty_feature_names_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let bundle_path = dir.path().join("heart_model.json");
        std::fs::write(
            &bundle_path,
            r#"{"model_file":"heart_model.onnx","feature_names":[],"classes":[0,1]}"#,
        )
        .unwrap();

        let model = HeartDiseaseModel::new(&bundle_path);
        match model.load() {
            Err(ModelError::Validation(msg)) => assert!(msg.contains("feature_names")),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_weights_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let bundle_path = dir.path().join("heart_model.json");
        std::fs::write(
            &bundle_path,
            r#"{"model_file":"heart_model.onnx","feature_names":["age"],"classes":[0,1]}"#,
        )
        .unwrap();

        let model = HeartDiseaseModel::new(&bundle_path);
        match model.load() {
            Err(ModelError::NotFound(msg)) => assert!(msg.contains("weights")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
