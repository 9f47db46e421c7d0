//! Title-based card deduplication

use std::collections::HashSet;

use crate::models::Card;

/// Drop every candidate whose title was already used, either by one of
/// `existing_cards` or by an earlier candidate in the same batch. Survivors
/// keep their arrival order; titles compare by exact equality.
///
/// No recency filtering happens here. The caller decides which existing
/// cards still count (for generation that is the last month of stored
/// cards) and passes exactly that set.
pub fn deduplicate_cards(new_cards: Vec<Card>, existing_cards: &[Card]) -> Vec<Card> {
    let mut seen: HashSet<String> = existing_cards.iter().map(|c| c.title.clone()).collect();
    let mut unique = Vec::with_capacity(new_cards.len());

    for card in new_cards {
        if seen.insert(card.title.clone()) {
            unique.push(card);
        }
    }

    unique
}
