// src/core/suggest.rs

use crate::models::{Suggestion, SuggestionResult};
use std::collections::BTreeSet;

/// Minimum number of edits always tolerated, however short the requested name.
const MIN_THRESHOLD: usize = 2;

/// Ranks `known` names by closeness to `requested`.
///
/// Candidates farther away than [`acceptance_threshold`] are dropped. Ties on
/// distance go to the shorter name, then to lexicographic order.
pub fn suggest<S: AsRef<str>>(requested: &str, known: &[S]) -> SuggestionResult {
    let threshold = acceptance_threshold(requested);
    let unique: BTreeSet<&str> = known.iter().map(AsRef::as_ref).collect();

    let mut candidates: Vec<Suggestion> = unique
        .into_iter()
        .map(|name| Suggestion {
            name: name.to_string(),
            distance: edit_distance(requested, name),
        })
        .filter(|s| s.distance <= threshold)
        .collect();

    candidates.sort_by(|a, b| {
        a.distance
            .cmp(&b.distance)
            .then_with(|| a.name.chars().count().cmp(&b.name.chars().count()))
            .then_with(|| a.name.cmp(&b.name))
    });

    log::debug!(
        "Suggestions for '{}' (threshold {}): {:?}",
        requested,
        threshold,
        candidates
    );

    SuggestionResult {
        requested_name: requested.to_string(),
        candidates,
    }
}

/// The largest distance still worth suggesting: `max(2, chars / 3)`.
pub fn acceptance_threshold(requested: &str) -> usize {
    MIN_THRESHOLD.max(requested.chars().count() / 3)
}

/// Levenshtein distance over chars, keeping only two rows of the table.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current: Vec<usize> = Vec::with_capacity(previous.len());

    for (i, a_char) in a.chars().enumerate() {
        current.clear();
        current.push(i + 1);
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != *b_char);
            let substitution = previous.get(j).map_or(usize::MAX, |d| d + cost);
            let deletion = previous.get(j + 1).map_or(usize::MAX, |d| d + 1);
            let insertion = current.last().map_or(usize::MAX, |d| d + 1);
            current.push(substitution.min(deletion).min(insertion));
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous.last().copied().unwrap_or(0)
}
