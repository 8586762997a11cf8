//! Answer frequency ranking.

use crate::models::FrequencyEntry;

/// Number of answers shown per historical field.
pub const DEFAULT_TOP_ANSWERS: usize = 4;

/// Get the `n` most frequent answers, highest count first.
///
/// Ties keep their input order. The input slice is left untouched.
pub fn top_n(answers: &[FrequencyEntry], n: usize) -> Vec<FrequencyEntry> {
    let mut ranked = answers.to_vec();
    // sort_by_key is stable
    ranked.sort_by_key(|entry| std::cmp::Reverse(entry.count));
    ranked.truncate(n);
    ranked
}
