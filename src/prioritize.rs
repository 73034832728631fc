//! Suggestion ordering.
//!
//! Urgency beats optimization: suggestions are ordered by priority tier, then
//! by kind weight, both descending. The sort is stable, so suggestions equal
//! on both keys keep the order the engine produced them in.

use std::cmp::Reverse;

use crate::suggest::Suggestion;

/// Sort key for a suggestion; larger sorts first.
pub fn priority_key(s: &Suggestion) -> (u8, u8) {
    (s.priority.rank(), s.kind.weight())
}

/// Order `suggestions` in place.
pub fn prioritize(suggestions: &mut [Suggestion]) {
    suggestions.sort_by_key(|s| Reverse(priority_key(s)));
}

/// Consume and return the ordered list.
pub fn prioritized(mut suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
    prioritize(&mut suggestions);
    suggestions
}
