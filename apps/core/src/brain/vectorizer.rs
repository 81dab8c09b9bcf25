//! Bag-of-words encoding over the model vocabulary.

use std::collections::HashSet;

/// Encode tokens as a presence vector: position `i` is `1.0` when
/// `vocabulary[i]` occurs among the tokens, `0.0` otherwise.
pub fn vectorize(tokens: &[String], vocabulary: &[String]) -> Vec<f32> {
    let present: HashSet<&str> = tokens.iter().map(String::as_str).collect();

    vocabulary
        .iter()
        .map(|word| if present.contains(word.as_str()) { 1.0 } else { 0.0 })
        .collect()
}
