//! Decision policy: threshold, rank, pick one.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// An intent that cleared the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedIntent {
    /// Position in the intent table (and in the model output).
    pub index: usize,
    pub intent: String,
    pub probability: f32,
}

/// All intents whose probability strictly exceeds `threshold`, most probable
/// first. Equal probabilities keep intent-table order.
pub fn rank(
    probabilities: &[f32],
    intent_table: &[String],
    threshold: f32,
) -> Result<Vec<RankedIntent>, AppError> {
    if probabilities.len() != intent_table.len() {
        return Err(AppError::Classification(format!(
            "{} probabilities for {} intents",
            probabilities.len(),
            intent_table.len()
        )));
    }

    let mut survivors: Vec<RankedIntent> = probabilities
        .iter()
        .zip(intent_table)
        .enumerate()
        .filter(|(_, (probability, _))| **probability > threshold)
        .map(|(index, (probability, intent))| RankedIntent {
            index,
            intent: intent.clone(),
            probability: *probability,
        })
        .collect();

    // Stable sort: ties stay in ascending index order
    survivors.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    Ok(survivors)
}

/// The top-ranked intent, or `None` if nothing clears the threshold.
pub fn decide(
    probabilities: &[f32],
    intent_table: &[String],
    threshold: f32,
) -> Result<Option<String>, AppError> {
    Ok(rank(probabilities, intent_table, threshold)?
        .into_iter()
        .next()
        .map(|ranked| ranked.intent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_threshold_is_strict() {
        let intents = table(&["greeting", "weather"]);

        let at = decide(&[0.5, 0.2], &intents, 0.5).unwrap();
        assert_eq!(at, None);

        let above = decide(&[0.5 + f32::EPSILON, 0.2], &intents, 0.5).unwrap();
        assert_eq!(above.as_deref(), Some("greeting"));
    }

    #[test]
    fn test_highest_probability_wins() {
        let intents = table(&["greeting", "weather", "help"]);
        let decided = decide(&[0.6, 0.1, 0.8], &intents, 0.5).unwrap();
        assert_eq!(decided.as_deref(), Some("help"));
    }

    #[test]
    fn test_ties_go_to_lower_index() {
        let intents = table(&["greeting", "weather", "help"]);
        for _ in 0..10 {
            let decided = decide(&[0.3, 0.7, 0.7], &intents, 0.5).unwrap();
            assert_eq!(decided.as_deref(), Some("weather"));
        }
    }

    #[test]
    fn test_nothing_above_threshold() {
        let intents = table(&["greeting", "weather"]);
        assert_eq!(decide(&[0.1, 0.2], &intents, 0.5).unwrap(), None);
        assert_eq!(decide(&[0.0, 0.0], &intents, 0.0).unwrap(), None);
    }

    #[test]
    fn test_rank_orders_all_survivors() {
        let intents = table(&["a", "b", "c", "d"]);
        let ranking = rank(&[0.55, 0.9, 0.2, 0.55], &intents, 0.5).unwrap();

        let order: Vec<(usize, &str)> = ranking
            .iter()
            .map(|r| (r.index, r.intent.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "b"), (0, "a"), (3, "d")]);
    }

    #[test]
    fn test_length_mismatch() {
        let intents = table(&["greeting"]);
        let result = decide(&[0.9, 0.1], &intents, 0.5);
        assert!(matches!(result, Err(AppError::Classification(_))));
    }
}
