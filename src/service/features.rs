//! Heart-disease feature engineering
//!
//! Maps raw string form input onto the conventions of the training dataset:
//! age in days, the dataset's 1/2 gender coding, derived BMI.

use std::collections::HashMap;

/// Fallback BMI when height is missing or non-positive
pub const DEFAULT_BMI: f64 = 25.0;

/// Days per year used by the dataset's age encoding
const DAYS_PER_YEAR: f64 = 365.0;

/// Safely parse a string to f64, falling back to `default` on failure
pub fn parse_float(value: Option<&String>, default: f64) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

/// Engineered feature mapping plus the raw values the input summary needs
#[derive(Debug, Clone)]
pub struct HeartFeatures {
    pub features: HashMap<String, f64>,
    pub age_years: f64,
    pub height: f64,
    pub weight: f64,
    pub ap_hi: f64,
    pub ap_lo: f64,
    pub smoke: f64,
    pub active: f64,
}

/// Build the full feature mapping from raw form input.
///
/// Age arrives in years and the dataset is coded in days. The form sends
/// "1" for male and "0" for female while the dataset codes male as 2 and
/// female as 1. BMI is derived from height and weight, with a fixed
/// fallback when height is non-positive.
pub fn engineer_heart_features(form: &HashMap<String, String>) -> HeartFeatures {
    let age_years = parse_float(form.get("age"), 0.0);
    let age_days = age_years * DAYS_PER_YEAR;

    // Missing sex defaults to male, matching the form default
    let gender = match form.get("sex").map(String::as_str) {
        Some("1") | None => 2.0,
        Some(_) => 1.0,
    };

    let height = parse_float(form.get("height"), 0.0); // cm
    let weight = parse_float(form.get("weight"), 0.0); // kg
    let ap_hi = parse_float(form.get("ap_hi"), 0.0); // systolic
    let ap_lo = parse_float(form.get("ap_lo"), 0.0); // diastolic

    // Categoricals: 1 = normal, 2 = above normal, 3 = well above normal
    let cholesterol = parse_float(form.get("cholesterol"), 1.0);
    let gluc = parse_float(form.get("gluc"), 1.0);

    // Binary flags
    let smoke = parse_float(form.get("smoke"), 0.0);
    let alco = parse_float(form.get("alco"), 0.0);
    let active = parse_float(form.get("active"), 0.0);

    let bmi = if height > 0.0 {
        weight / ((height / 100.0) * (height / 100.0))
    } else {
        DEFAULT_BMI
    };

    // Keys must match the feature names saved at training time
    let mut features = HashMap::new();
    features.insert("age".to_string(), age_days);
    features.insert("gender".to_string(), gender);
    features.insert("height".to_string(), height);
    features.insert("weight".to_string(), weight);
    features.insert("ap_hi".to_string(), ap_hi);
    features.insert("ap_lo".to_string(), ap_lo);
    features.insert("cholesterol".to_string(), cholesterol);
    features.insert("gluc".to_string(), gluc);
    features.insert("smoke".to_string(), smoke);
    features.insert("alco".to_string(), alco);
    features.insert("active".to_string(), active);
    features.insert("bmi".to_string(), bmi);

    HeartFeatures {
        features,
        age_years,
        height,
        weight,
        ap_hi,
        ap_lo,
        smoke,
        active,
    }
}
