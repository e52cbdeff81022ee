//! Suggestion text derived from model output
//!
//! Fixed message templates: one per risk tier for the heart model, and a
//! confidence-parameterized pair for the brain model. None of this is a
//! clinical diagnosis and the wording says so.

use crate::models::heart::RiskLabel;

/// Treatment suggestion keyed purely off the risk tier
pub fn heart_suggestion(risk_label: RiskLabel) -> &'static str {
    match risk_label {
        RiskLabel::High => {
            "HIGH RISK INDICATED\n\
             Recommended Actions:\n\
             1. Consult a cardiologist immediately for a full evaluation.\n\
             2. Monitor your blood pressure daily.\n\
             3. Adhere to a strict low-sodium, low-saturated fat diet.\n\
             4. Avoid strenuous physical activity until cleared by a doctor.\n\
             5. If you smoke or drink, stop immediately."
        }
        RiskLabel::Medium => {
            "MODERATE RISK - LIFESTYLE CHANGES REQUIRED\n\
             Suggested Plan:\n\
             1. Schedule a check-up with your doctor within the next month.\n\
             2. Adopt the DASH or Mediterranean diet (more veggies, less processed food).\n\
             3. Aim for 30 minutes of moderate exercise (like walking) 5 days a week.\n\
             4. Reduce stress through sleep (7-8 hours) and mindfulness."
        }
        RiskLabel::Low => {
            "LOW RISK - MAINTENANCE MODE\n\
             Keep up the good work:\n\
             1. Continue your balanced diet and active lifestyle.\n\
             2. Get an annual physical check-up to track changes.\n\
             3. Stay hydrated and ensure consistent sleep quality.\n\
             4. Avoid smoking to keep your risk low."
        }
    }
}

/// Interpretation text for one brain MRI classification.
///
/// Tumor classes get a finding statement plus a mandatory specialist
/// referral; `no_tumor` gets reassurance with an explicit caveat.
pub fn brain_suggestion(predicted_class: &str, probability: f64) -> String {
    let prob_pct = (probability * 100.0).round() as i64;

    if predicted_class == "no_tumor" {
        return format!(
            "The model's highest confidence class is 'no_tumor' with an estimated \
             probability of about {}%. This does not guarantee that no abnormality \
             exists. If you have any symptoms or concerns, please consult a \
             neurologist or radiologist.",
            prob_pct
        );
    }

    let finding = format!(
        "The model suggests the MRI is most consistent with '{}' with an estimated \
         probability of about {}%. This is NOT a clinical diagnosis.",
        predicted_class, prob_pct
    );
    let referral = "You should promptly consult a qualified neurologist or neurosurgeon, \
                    and have this MRI evaluated by a radiologist for a professional \
                    interpretation.";

    format!("{} {}", finding, referral)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_template_per_risk_tier() {
        assert!(heart_suggestion(RiskLabel::High).starts_with("HIGH RISK"));
        assert!(heart_suggestion(RiskLabel::Medium).starts_with("MODERATE RISK"));
        assert!(heart_suggestion(RiskLabel::Low).starts_with("LOW RISK"));
    }

    #[test]
    fn test_no_tumor_message_has_caveat_and_rounded_confidence() {
        let text = brain_suggestion("no_tumor", 0.807);
        assert!(text.contains("'no_tumor'"));
        assert!(text.contains("about 81%"));
        assert!(text.contains("does not guarantee"));
    }

    #[test]
    fn test_tumor_message_includes_referral() {
        let text = brain_suggestion("glioma", 0.92);
        assert!(text.contains("'glioma'"));
        assert!(text.contains("about 92%"));
        assert!(text.contains("NOT a clinical diagnosis"));
        assert!(text.contains("neurologist or neurosurgeon"));
    }
}
