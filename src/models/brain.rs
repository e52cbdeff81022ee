//! Brain tumor classifier (4-class CNN, ONNX)
//!
//! Owns the whole image pipeline: decode, resize to the training input
//! size, force RGB, keep the native [0, 255] pixel range (the network has a
//! built-in rescaling layer, so normalizing here would double-normalize),
//! then one forward pass and an arg-max over the class probabilities.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::DiseaseModel;
use crate::constants::BRAIN_IMG_SIZE;
use crate::error::ModelError;

/// Class order the CNN was trained with
pub const CLASS_NAMES: [&str; 4] = ["glioma", "meningioma", "no_tumor", "pituitary"];

/// Classes read as a tumor finding
pub const TUMOR_CLASSES: [&str; 3] = ["glioma", "meningioma", "pituitary"];

/// Whether a predicted class counts as a tumor finding
pub fn is_tumor_class(class: &str) -> bool {
    TUMOR_CLASSES.contains(&class)
}

/// Name for output index `i`, with a synthetic fallback past the known list
pub fn class_name(i: usize) -> String {
    CLASS_NAMES
        .get(i)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("class_{}", i))
}

/// Full prediction output for one MRI image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TumorPrediction {
    pub predicted_class: String,
    pub predicted_index: usize,
    /// Probability of the winning class
    pub probability: f64,
    /// Per-class probability mapping, index-aligned with the class list
    pub probabilities: BTreeMap<String, f64>,
}

/// Interpret a raw class-probability vector positionally against the class
/// list: arg-max winner plus the full per-class mapping.
pub fn interpret_probabilities(preds: &[f32]) -> Result<TumorPrediction, ModelError> {
    if preds.is_empty() {
        return Err(ModelError::Inference(
            "model returned an empty probability vector".to_string(),
        ));
    }

    let mut pred_index = 0;
    for (i, &p) in preds.iter().enumerate() {
        if p > preds[pred_index] {
            pred_index = i;
        }
    }
    let probability = f64::from(preds[pred_index]);

    let mut probabilities = BTreeMap::new();
    for (i, &p) in preds.iter().enumerate() {
        probabilities.insert(class_name(i), f64::from(p));
    }

    Ok(TumorPrediction {
        predicted_class: class_name(pred_index),
        predicted_index: pred_index,
        probability,
        probabilities,
    })
}

/// Validate a batched CNN input: shape exactly (1, H, W, 3) and pixel
/// values inside [0, 255]
pub fn validate_input_batch(batch: &Array4<f32>, img_size: (u32, u32)) -> Result<(), ModelError> {
    let expected = [1, img_size.0 as usize, img_size.1 as usize, 3];
    if batch.shape() != &expected[..] {
        return Err(ModelError::Validation(format!(
            "unexpected image shape: {:?}, expected {:?}",
            batch.shape(),
            expected
        )));
    }

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in batch.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    if min < 0.0 || max > 255.0 {
        return Err(ModelError::Validation(format!(
            "image pixel values out of range [0, 255]: min={}, max={}",
            min, max
        )));
    }

    Ok(())
}

/// Wrapper around the trained 4-class CNN for brain tumor detection
#[derive(Debug)]
pub struct BrainTumorModel {
    model_path: PathBuf,
    img_size: (u32, u32),
    session: Mutex<Option<Session>>,
}

impl BrainTumorModel {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self::with_img_size(model_path, BRAIN_IMG_SIZE)
    }

    pub fn with_img_size(model_path: impl Into<PathBuf>, img_size: (u32, u32)) -> Self {
        Self {
            model_path: model_path.into(),
            img_size,
            session: Mutex::new(None),
        }
    }

    fn ensure_loaded(&self) -> Result<(), ModelError> {
        let mut session = self.session.lock();
        if session.is_some() {
            return Ok(());
        }

        if !self.model_path.exists() {
            return Err(ModelError::NotFound(format!(
                "brain tumor model not found at {}; train and export the 4-class model first",
                self.model_path.display()
            )));
        }

        let loaded = Session::builder()
            .map_err(|e| ModelError::Validation(format!("failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Validation(format!("failed to set optimization: {}", e)))?
            .commit_from_file(&self.model_path)
            .map_err(|e| ModelError::Validation(format!("failed to load brain model: {}", e)))?;

        log::info!("Brain tumor model loaded from {}", self.model_path.display());

        *session = Some(loaded);
        Ok(())
    }

    /// Decode, resize and batch one image into a (1, H, W, 3) tensor
    fn preprocess_image(&self, image_path: &Path) -> Result<Array4<f32>, ModelError> {
        if !image_path.exists() {
            return Err(ModelError::NotFound(format!(
                "image not found at {}",
                image_path.display()
            )));
        }

        let img = image::open(image_path).map_err(|e| {
            ModelError::Validation(format!(
                "failed to load image from {}: {}",
                image_path.display(),
                e
            ))
        })?;

        let (height, width) = self.img_size;
        // resize_exact takes (width, height); RGB conversion drops any alpha
        let rgb = img.resize_exact(width, height, FilterType::Triangle).to_rgb8();

        let mut batch = Array4::<f32>::zeros((1, height as usize, width as usize, 3));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for c in 0..3 {
                batch[[0, y as usize, x as usize, c]] = f32::from(pixel[c]);
            }
        }

        validate_input_batch(&batch, self.img_size)?;
        Ok(batch)
    }

    /// Classify one MRI image; loads the model on first use
    pub fn predict(&self, image_path: &Path) -> Result<TumorPrediction, ModelError> {
        self.ensure_loaded()?;

        let batch = self.preprocess_image(image_path)?;

        let mut guard = self.session.lock();
        let session = guard
            .as_mut()
            .ok_or_else(|| ModelError::Inference("brain model not loaded".to_string()))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ModelError::Inference("no output defined".to_string()))?;

        let input_tensor = Value::from_array(batch)
            .map_err(|e| ModelError::Inference(format!("tensor error: {}", e)))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ModelError::Inference(format!("inference failed: {}", e)))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| ModelError::Inference("no output".to_string()))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(format!("extract error: {}", e)))?;

        interpret_probabilities(data)
    }
}

impl DiseaseModel for BrainTumorModel {
    fn load(&self) -> Result<(), ModelError> {
        self.ensure_loaded()
    }

    fn is_loaded(&self) -> bool {
        self.session.lock().is_some()
    }

    fn name(&self) -> &'static str {
        crate::constants::MODEL_TYPE_BRAIN
    }
}
