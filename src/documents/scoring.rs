// src/documents/scoring.rs
//! Deterministic post-processing of LLM review output.
//!
//! The model returns per-area sub-scores with weights it rarely gets
//! arithmetically right. The overall score is therefore recomputed here:
//! scores clamped to 0-100, weights normalized to sum 1.0, and garbage
//! weights replaced with an equal split.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct SubScore {
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub weight: f64,
}

/// Weighted overall score from a set of sub-scores.
///
/// Negative, NaN, and infinite weights count as zero. When no usable
/// weight remains, every sub-score weighs equally. An empty slice
/// scores zero.
pub fn overall_score(sub_scores: &[SubScore]) -> f64 {
    if sub_scores.is_empty() {
        return 0.0;
    }

    let clamped: Vec<f64> = sub_scores
        .iter()
        .map(|s| {
            if s.score.is_finite() {
                s.score.clamp(0.0, 100.0)
            } else {
                0.0
            }
        })
        .collect();

    let weights: Vec<f64> = sub_scores
        .iter()
        .map(|s| {
            if s.weight.is_finite() && s.weight > 0.0 {
                s.weight
            } else {
                0.0
            }
        })
        .collect();

    let total: f64 = weights.iter().sum();

    let score = if total > 0.0 {
        clamped
            .iter()
            .zip(&weights)
            .map(|(score, weight)| score * weight / total)
            .sum()
    } else {
        clamped.iter().sum::<f64>() / clamped.len() as f64
    };

    (score * 10.0).round() / 10.0
}

/// Inject the recomputed `overall_score` into a raw review JSON object.
/// Malformed or missing `sub_scores` entries are skipped rather than
/// failing the review.
pub fn apply_overall_score(review: &mut Value) {
    let sub_scores: Vec<SubScore> = review
        .get("sub_scores")
        .and_then(|v| v.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    let score = overall_score(&sub_scores);

    if let Some(obj) = review.as_object_mut() {
        obj.insert("overall_score".to_string(), serde_json::json!(score));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(score: f64, weight: f64) -> SubScore {
        SubScore {
            area: String::new(),
            score,
            weight,
        }
    }

    #[test]
    fn weighted_average_with_normalized_weights() {
        // Weights sum to 1.0 already
        let scores = [sub(80.0, 0.4), sub(60.0, 0.4), sub(100.0, 0.2)];
        assert_eq!(overall_score(&scores), 76.0);
    }

    #[test]
    fn weights_are_renormalized() {
        // Same ratios, scaled by 10: result must not change
        let scores = [sub(80.0, 4.0), sub(60.0, 4.0), sub(100.0, 2.0)];
        assert_eq!(overall_score(&scores), 76.0);
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        let scores = [sub(150.0, 0.5), sub(-20.0, 0.5)];
        assert_eq!(overall_score(&scores), 50.0);
    }

    #[test]
    fn zero_weights_fall_back_to_equal_split() {
        let scores = [sub(40.0, 0.0), sub(80.0, -1.0)];
        assert_eq!(overall_score(&scores), 60.0);
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(overall_score(&[]), 0.0);
    }

    #[test]
    fn nan_weight_counts_as_zero() {
        let scores = [sub(90.0, f64::NAN), sub(50.0, 1.0)];
        assert_eq!(overall_score(&scores), 50.0);
    }

    #[test]
    fn apply_injects_overall_score() {
        let mut review = serde_json::json!({
            "summary": "solid",
            "sub_scores": [
                {"area": "skills match", "score": 70, "weight": 0.5},
                {"area": "experience match", "score": 90, "weight": 0.5}
            ]
        });

        apply_overall_score(&mut review);
        assert_eq!(review["overall_score"], serde_json::json!(80.0));
    }

    #[test]
    fn apply_tolerates_missing_sub_scores() {
        let mut review = serde_json::json!({"summary": "no scores"});
        apply_overall_score(&mut review);
        assert_eq!(review["overall_score"], serde_json::json!(0.0));
    }

    #[test]
    fn apply_skips_malformed_entries() {
        let mut review = serde_json::json!({
            "sub_scores": [
                {"area": "skills match", "score": 100, "weight": 1.0},
                "not an object"
            ]
        });

        apply_overall_score(&mut review);
        assert_eq!(review["overall_score"], serde_json::json!(100.0));
    }
}
