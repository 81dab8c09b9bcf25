//! Typo correction against the model vocabulary.
//!
//! Each token is replaced by the closest vocabulary entry under the normalized
//! Damerau–Levenshtein distance (optimal string alignment variant), unless even
//! the closest entry is further away than [`MAX_TYPO_RATE`].

use crate::error::AppError;

/// Maximum normalized distance at which a token is still corrected.
pub const MAX_TYPO_RATE: f64 = 0.45;

/// Edit distance with adjacent transpositions, counted in chars.
#[allow(clippy::needless_range_loop)]
pub fn damerau_levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let (len1, len2) = (a.len(), b.len());

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut matrix = vec![vec![0usize; len2 + 1]; len1 + 1];
    for i in 0..=len1 {
        matrix[i][0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = usize::from(a[i - 1] != b[j - 1]);

            let mut best = (matrix[i - 1][j] + 1) // deletion
                .min(matrix[i][j - 1] + 1) // insertion
                .min(matrix[i - 1][j - 1] + cost); // substitution

            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(matrix[i - 2][j - 2] + 1); // transposition
            }
            matrix[i][j] = best;
        }
    }

    matrix[len1][len2]
}

/// Distance divided by the length of the longer string, in `[0, 1]`.
pub fn normalized_distance(s1: &str, s2: &str) -> f64 {
    let longest = s1.chars().count().max(s2.chars().count());
    if longest == 0 {
        return 0.0;
    }
    damerau_levenshtein_distance(s1, s2) as f64 / longest as f64
}

/// Return the vocabulary entry closest to `token`, or `token` itself when no
/// entry is within [`MAX_TYPO_RATE`]. Ties go to the earliest entry.
pub fn correct(token: &str, vocabulary: &[String]) -> Result<String, AppError> {
    if vocabulary.is_empty() {
        return Err(AppError::Vectorization(
            "Cannot correct typos against an empty vocabulary".to_string(),
        ));
    }

    let mut best_word = &vocabulary[0];
    let mut best_rate = normalized_distance(token, best_word);

    for word in &vocabulary[1..] {
        if best_rate == 0.0 {
            break;
        }
        let rate = normalized_distance(token, word);
        if rate < best_rate {
            best_rate = rate;
            best_word = word;
        }
    }

    if best_rate > MAX_TYPO_RATE {
        Ok(token.to_string())
    } else {
        Ok(best_word.clone())
    }
}

/// Correct every token independently.
pub fn correct_tokens(tokens: &[String], vocabulary: &[String]) -> Result<Vec<String>, AppError> {
    tokens.iter().map(|t| correct(t, vocabulary)).collect()
}
