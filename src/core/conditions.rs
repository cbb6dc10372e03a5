//! Label and modifier predicates.

use std::collections::HashSet;

/// Whether a widget with these visibility labels is shown for the active label set.
///
/// An empty list always passes. A listed label that is active passes at once;
/// otherwise every entry must be a negation (`!label`) of an inactive label.
pub fn visible(conditions: &[String], active: &HashSet<String>) -> bool {
    if conditions.is_empty() {
        return true;
    }
    let mut all_negations_hold = true;
    for cond in conditions {
        match cond.strip_prefix('!') {
            Some(label) => {
                if active.contains(label) {
                    all_negations_hold = false;
                }
            }
            None => {
                if active.contains(cond.as_str()) {
                    return true;
                }
                all_negations_hold = false;
            }
        }
    }
    all_negations_hold
}

/// Every listed modifier is held and every `!`-prefixed one is not.
pub fn modifiers_match(required: &[String], held: &[String]) -> bool {
    required.iter().all(|m| match m.strip_prefix('!') {
        Some(forbidden) => !held.iter().any(|h| h == forbidden),
        None => held.iter().any(|h| h == m),
    })
}
