//! Model Manager - lazy singleton owner for both disease models
//!
//! Per-slot state machine: Unloaded -> Loading -> {Ready | Failed}.
//! Failed is terminal for the process lifetime: the original load error is
//! memoized and handed back on every later acquisition without retrying,
//! which avoids repeated expensive deserialization and repeated failure
//! logging for an artifact known to be broken.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::brain::BrainTumorModel;
use super::heart::HeartDiseaseModel;
use super::DiseaseModel;
use crate::error::ModelError;

enum SlotState<M> {
    Unloaded,
    Ready(Arc<M>),
    Failed(ModelError),
}

/// One lazily-initialized model slot.
///
/// The mutex is held across the load attempt, so concurrent first
/// acquisitions serialize: exactly one caller runs the load while the rest
/// wait and then observe the cached outcome, success or failure.
pub struct ModelSlot<M> {
    state: Mutex<SlotState<M>>,
}

impl<M> ModelSlot<M> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Unloaded),
        }
    }

    /// Acquire the slot, running `init` at most once per process.
    ///
    /// Ready returns the same `Arc` every time; Failed re-returns the
    /// memoized error without calling `init` again.
    pub fn acquire<F>(&self, init: F) -> Result<Arc<M>, ModelError>
    where
        F: FnOnce() -> Result<M, ModelError>,
    {
        let mut state = self.state.lock();
        match &*state {
            SlotState::Ready(model) => Ok(Arc::clone(model)),
            SlotState::Failed(err) => Err(err.clone()),
            SlotState::Unloaded => match init() {
                Ok(model) => {
                    let model = Arc::new(model);
                    *state = SlotState::Ready(Arc::clone(&model));
                    Ok(model)
                }
                Err(err) => {
                    *state = SlotState::Failed(err.clone());
                    Err(err)
                }
            },
        }
    }

    /// Whether a successful acquisition has completed
    pub fn is_ready(&self) -> bool {
        matches!(&*self.state.lock(), SlotState::Ready(_))
    }

    /// The memoized load failure, if any
    pub fn failure(&self) -> Option<ModelError> {
        match &*self.state.lock() {
            SlotState::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }
}

impl<M> Default for ModelSlot<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Slot status snapshot for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ManagerStatus {
    pub heart_ready: bool,
    pub heart_error: Option<String>,
    pub brain_ready: bool,
    pub brain_error: Option<String>,
}

/// Owns the process-lifetime singleton instances of both disease models
pub struct ModelManager {
    heart_path: PathBuf,
    brain_path: PathBuf,
    heart: ModelSlot<HeartDiseaseModel>,
    brain: ModelSlot<BrainTumorModel>,
}

impl ModelManager {
    /// Manager over the default artifact locations
    pub fn new() -> Self {
        Self::with_paths(
            crate::constants::heart_model_path(),
            crate::constants::brain_model_path(),
        )
    }

    pub fn with_paths(heart_path: impl Into<PathBuf>, brain_path: impl Into<PathBuf>) -> Self {
        Self {
            heart_path: heart_path.into(),
            brain_path: brain_path.into(),
            heart: ModelSlot::new(),
            brain: ModelSlot::new(),
        }
    }

    /// A loaded heart model, or the memoized load failure
    pub fn heart_model(&self) -> Result<Arc<HeartDiseaseModel>, ModelError> {
        let path = self.heart_path.clone();
        self.heart.acquire(|| {
            let model = HeartDiseaseModel::new(path);
            if let Err(e) = model.load() {
                log::error!("ModelManager: heart model load failed: {}", e);
                return Err(e);
            }
            Ok(model)
        })
    }

    /// A loaded brain tumor model, or the memoized load failure
    pub fn brain_model(&self) -> Result<Arc<BrainTumorModel>, ModelError> {
        let path = self.brain_path.clone();
        self.brain.acquire(|| {
            let model = BrainTumorModel::new(path);
            if let Err(e) = model.load() {
                log::error!("ModelManager: brain model load failed: {}", e);
                return Err(e);
            }
            Ok(model)
        })
    }

    /// Current slot states, without triggering any load
    pub fn status(&self) -> ManagerStatus {
        ManagerStatus {
            heart_ready: self.heart.is_ready(),
            heart_error: self.heart.failure().map(|e| e.to_string()),
            brain_ready: self.brain.is_ready(),
            brain_error: self.brain.failure().map(|e| e.to_string()),
        }
    }
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_slot_loads_exactly_once() {
        let slot: ModelSlot<u32> = ModelSlot::new();
        let attempts = AtomicUsize::new(0);

        let first = slot
            .acquire(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            })
            .unwrap();
        let second = slot
            .acquire(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok(43)
            })
            .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, 42);
        assert!(slot.is_ready());
    }

    #[test]
    fn test_slot_memoizes_failure() {
        let slot: ModelSlot<u32> = ModelSlot::new();
        let attempts = AtomicUsize::new(0);

        let load = || {
            let err = slot.acquire(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(ModelError::NotFound("weights missing".to_string()))
            });
            err.unwrap_err()
        };

        let first = load();
        let second = load();

        // One real attempt, identical cached error afterwards
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(slot.failure(), Some(first));
        assert!(!slot.is_ready());
    }

    #[test]
    fn test_slot_failure_is_terminal() {
        let slot: ModelSlot<u32> = ModelSlot::new();
        slot.acquire(|| Err(ModelError::Validation("bad bundle".to_string())))
            .unwrap_err();

        // Even an init that would now succeed is never consulted
        let result = slot.acquire(|| Ok(1));
        match result {
            Err(ModelError::Validation(msg)) => assert_eq!(msg, "bad bundle"),
            other => panic!("expected memoized Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_concurrent_first_acquisition_runs_one_load() {
        let slot: Arc<ModelSlot<u32>> = Arc::new(ModelSlot::new());
        let attempts = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let slot = Arc::clone(&slot);
                let attempts = Arc::clone(&attempts);
                std::thread::spawn(move || {
                    slot.acquire(|| {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        // Widen the race window
                        std::thread::sleep(std::time::Duration::from_millis(10));
                        Ok(7)
                    })
                    .map(|v| *v)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 7);
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_artifacts_fail_once_and_stay_failed() {
        let manager = ModelManager::with_paths("/nonexistent/heart.json", "/nonexistent/brain.onnx");

        let first = manager.heart_model().unwrap_err();
        assert!(matches!(first, ModelError::NotFound(_)));

        // Second acquisition returns the same cached failure
        let second = manager.heart_model().unwrap_err();
        assert_eq!(first, second);

        let brain_err = manager.brain_model().unwrap_err();
        assert!(matches!(brain_err, ModelError::NotFound(_)));

        let status = manager.status();
        assert!(!status.heart_ready);
        assert!(!status.brain_ready);
        assert!(status.heart_error.is_some());
        assert!(status.brain_error.is_some());
    }

    #[test]
    fn test_models_are_substitutable_through_the_trait() {
        let heart = HeartDiseaseModel::new("/nonexistent/heart.json");
        let brain = BrainTumorModel::new("/nonexistent/brain.onnx");
        let models: Vec<&dyn DiseaseModel> = vec![&heart, &brain];

        for model in models {
            assert!(!model.is_loaded());
            assert!(model.load().is_err());
            assert!(!model.name().is_empty());
        }
    }
}
