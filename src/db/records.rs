//! Persisted record types

use serde::{Deserialize, Serialize};

/// One completed prediction, as stored in `prediction_logs`.
///
/// Inserted once by the orchestrator right after a successful model call and
/// never mutated; removed only by bulk history clearing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionLog {
    pub id: i64,
    pub user_id: i64,
    /// `heart_disease` or `brain_tumor_multiclass`
    pub model_type: String,
    /// Short human-readable input summary
    pub input_summary: Option<String>,
    /// Risk label for tabular predictions, class name for image predictions
    pub prediction_result: String,
    /// Winning probability in [0, 1]
    pub probability: Option<f64>,
    /// RFC 3339, second precision, UTC
    pub created_at: String,
}

impl PredictionLog {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            model_type: row.get("model_type")?,
            input_summary: row.get("input_summary")?,
            prediction_result: row.get("prediction_result")?,
            probability: row.get("probability")?,
            created_at: row.get("created_at")?,
        })
    }
}
