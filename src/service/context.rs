//! Medical-context summarizer for the conversational assistant
//!
//! Formats the user's latest heart and brain prediction rows into the fixed
//! text block the assistant receives as grounding context. Explicit
//! "no prior analysis" lines keep the assistant from inventing history.

use crate::constants::{MODEL_TYPE_BRAIN, MODEL_TYPE_HEART};
use crate::db::{DatabaseManager, PredictionLog};

fn latest(db: &DatabaseManager, user_id: i64, model_type: &str) -> Option<PredictionLog> {
    match db.latest_prediction(user_id, model_type) {
        Ok(row) => row,
        Err(e) => {
            log::warn!(
                "failed to fetch latest {} prediction for user {}: {}",
                model_type,
                user_id,
                e
            );
            None
        }
    }
}

fn probability_text(row: &PredictionLog) -> String {
    row.probability
        .map(|p| format!("{:.2}", p))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Build the assistant's medical context for one user.
///
/// Returns the fixed no-session text when no user id is available.
pub fn build_user_medical_context(db: &DatabaseManager, user_id: Option<i64>) -> String {
    let Some(user_id) = user_id else {
        return "No user_id is available in the session. Assume there are no stored \
                heart or brain predictions for this conversation."
            .to_string();
    };

    let heart = latest(db, user_id, MODEL_TYPE_HEART);
    let brain = latest(db, user_id, MODEL_TYPE_BRAIN);

    let mut parts: Vec<String> = Vec::new();

    match &heart {
        Some(row) => parts.push(format!(
            "=== LATEST HEART DISEASE RISK ASSESSMENT ===\n\
             Result: {}\n\
             Risk Probability: {}\n\
             Clinical Parameters: {}\n\
             Date: {}\n\
             This assessment should be considered when the patient asks about chest pain, \
             heart-related symptoms, cardiovascular health, or related medications.",
            row.prediction_result,
            probability_text(row),
            row.input_summary.as_deref().unwrap_or("N/A"),
            row.created_at,
        )),
        None => parts.push(
            "Heart Disease Assessment: No previous heart analysis found for this patient."
                .to_string(),
        ),
    }

    match &brain {
        Some(row) => parts.push(format!(
            "\n=== LATEST BRAIN MRI SCAN ANALYSIS ===\n\
             Predicted Classification: {}\n\
             Confidence: {}\n\
             Date: {}\n\
             This scan should be considered when the patient asks about headaches, \
             neurological symptoms, brain-related concerns, dizziness, vision problems, \
             or neurological medications.",
            row.prediction_result,
            probability_text(row),
            row.created_at,
        )),
        None => parts.push(
            "\nBrain MRI Analysis: No previous brain scan analysis found for this patient."
                .to_string(),
        ),
    }

    parts.push(
        "\nNOTE: These analysis results are AI-generated assessments and should be used as \
         supplementary information. They are NOT a substitute for professional medical \
         diagnosis, but they provide valuable context for understanding the patient's \
         health status."
            .to_string(),
    );

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db(dir: &tempfile::TempDir) -> DatabaseManager {
        let db = DatabaseManager::new(dir.path().join("test.db"));
        db.init_db().unwrap();
        db
    }

    #[test]
    fn test_no_session_text() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let context = build_user_medical_context(&db, None);
        assert!(context.starts_with("No user_id is available"));
    }

    #[test]
    fn test_no_prior_analysis_lines() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let context = build_user_medical_context(&db, Some(1));
        assert!(context.contains("No previous heart analysis found"));
        assert!(context.contains("No previous brain scan analysis found"));
        assert!(context.contains("NOT a substitute for professional medical diagnosis"));
    }

    #[test]
    fn test_both_blocks_present_with_history() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);

        db.insert_prediction_log(
            1,
            MODEL_TYPE_HEART,
            "Age:50, H:170, W:70, BP:120/80, Smoke:0, Active:1",
            "Medium",
            0.55,
            "2026-02-01T09:00:00Z",
        )
        .unwrap();
        db.insert_prediction_log(
            1,
            MODEL_TYPE_BRAIN,
            "image_path=scan.png",
            "glioma",
            0.91,
            "2026-02-02T09:00:00Z",
        )
        .unwrap();

        let context = build_user_medical_context(&db, Some(1));
        assert!(context.contains("=== LATEST HEART DISEASE RISK ASSESSMENT ==="));
        assert!(context.contains("Result: Medium"));
        assert!(context.contains("Risk Probability: 0.55"));
        assert!(context.contains("Clinical Parameters: Age:50"));
        assert!(context.contains("=== LATEST BRAIN MRI SCAN ANALYSIS ==="));
        assert!(context.contains("Predicted Classification: glioma"));
        assert!(context.contains("Confidence: 0.91"));
    }

    #[test]
    fn test_only_most_recent_rows_are_used() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);

        db.insert_prediction_log(1, MODEL_TYPE_HEART, "a", "Low", 0.2, "2026-01-01T09:00:00Z")
            .unwrap();
        db.insert_prediction_log(1, MODEL_TYPE_HEART, "b", "High", 0.9, "2026-01-05T09:00:00Z")
            .unwrap();

        let context = build_user_medical_context(&db, Some(1));
        assert!(context.contains("Result: High"));
        assert!(!context.contains("Result: Low"));
    }
}
