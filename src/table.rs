//! Table - the shared grid of card slots plus the per-player token rows.
//!
//! Invariant: `slot_to_card[s] == Some(c)` iff `card_to_slot[c] == Some(s)`.
//! Both maps are only ever updated together, inside `place_card` and
//! `remove_card`, so the invariant cannot be broken by any call sequence.
//!
//! The table performs no locking of its own; it is shared as
//! `Arc<RwLock<Table>>`. The dealer is the only caller of card mutation.
//! Players call token operations on their own row and occupancy reads, and
//! re-check occupancy under the same lock before trusting it.

use crate::display::GameDisplay;
use crate::{CardId, PlayerId, SlotId};
use std::sync::Arc;
use tracing::info;

/// Result of flipping a player's token on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenToggle {
    /// Token placed; carries the player's resulting token count.
    Placed(usize),
    /// Token removed; carries the player's resulting token count.
    Removed(usize),
    /// Player already has a full selection and the slot was untokened.
    AtLimit,
}

pub struct Table {
    slot_to_card: Vec<Option<CardId>>,
    card_to_slot: Vec<Option<SlotId>>,
    /// Token rows, player x slot. Owned here so toggle/count/clear logic
    /// lives in one place instead of being re-derived at each call site.
    tokens: Vec<Vec<bool>>,
    display: Arc<dyn GameDisplay>,
}

impl Table {
    pub fn new(
        slot_count: usize,
        deck_size: usize,
        player_count: usize,
        display: Arc<dyn GameDisplay>,
    ) -> Self {
        Self {
            slot_to_card: vec![None; slot_count],
            card_to_slot: vec![None; deck_size],
            tokens: vec![vec![false; slot_count]; player_count],
            display,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slot_to_card.len()
    }

    /// Place a card into an empty slot. Dealer-only.
    pub fn place_card(&mut self, card: CardId, slot: SlotId) {
        debug_assert!(self.slot_to_card[slot].is_none(), "slot {slot} occupied");
        debug_assert!(self.card_to_slot[card].is_none(), "card {card} already placed");
        self.card_to_slot[card] = Some(slot);
        self.slot_to_card[slot] = Some(card);
        self.display.place_card(card, slot);
    }

    /// Remove the card in a slot, if any. Dealer-only.
    pub fn remove_card(&mut self, slot: SlotId) -> Option<CardId> {
        let card = self.slot_to_card[slot].take()?;
        self.card_to_slot[card] = None;
        self.display.remove_card(slot);
        Some(card)
    }

    pub fn card_at(&self, slot: SlotId) -> Option<CardId> {
        self.slot_to_card[slot]
    }

    pub fn slot_of(&self, card: CardId) -> Option<SlotId> {
        self.card_to_slot[card]
    }

    pub fn count_cards(&self) -> usize {
        self.slot_to_card.iter().filter(|c| c.is_some()).count()
    }

    pub fn first_empty_slot(&self) -> Option<SlotId> {
        self.slot_to_card.iter().position(|c| c.is_none())
    }

    /// Cards currently on the table, in slot order.
    pub fn cards_on_table(&self) -> Vec<CardId> {
        self.slot_to_card.iter().filter_map(|&c| c).collect()
    }

    /// Flip `player`'s token on `slot`. Placing past `limit` tokens is
    /// refused; removing is always allowed.
    pub fn toggle_token(&mut self, player: PlayerId, slot: SlotId, limit: usize) -> TokenToggle {
        if self.tokens[player][slot] {
            self.tokens[player][slot] = false;
            self.display.remove_token(player, slot);
            TokenToggle::Removed(self.token_count(player))
        } else if self.token_count(player) < limit {
            self.tokens[player][slot] = true;
            self.display.place_token(player, slot);
            TokenToggle::Placed(self.token_count(player))
        } else {
            TokenToggle::AtLimit
        }
    }

    pub fn has_token(&self, player: PlayerId, slot: SlotId) -> bool {
        self.tokens[player][slot]
    }

    pub fn token_count(&self, player: PlayerId) -> usize {
        self.tokens[player].iter().filter(|&&t| t).count()
    }

    /// Slots currently tokened by `player`, in slot order.
    pub fn tokened_slots(&self, player: PlayerId) -> Vec<SlotId> {
        self.tokens[player]
            .iter()
            .enumerate()
            .filter_map(|(slot, &t)| t.then_some(slot))
            .collect()
    }

    /// Strip every player's token from a slot whose card was just consumed.
    pub fn clear_tokens_at_slot(&mut self, slot: SlotId) {
        for player in 0..self.tokens.len() {
            if self.tokens[player][slot] {
                self.tokens[player][slot] = false;
                self.display.remove_token(player, slot);
            }
        }
    }

    pub fn clear_player_tokens(&mut self, player: PlayerId) {
        for slot in 0..self.tokens[player].len() {
            if self.tokens[player][slot] {
                self.tokens[player][slot] = false;
                self.display.remove_token(player, slot);
            }
        }
    }

    pub fn clear_all_tokens(&mut self) {
        for row in &mut self.tokens {
            row.fill(false);
        }
        self.display.remove_all_tokens();
    }

    /// Log every valid group currently on the table.
    pub fn hints(&self, validator: &dyn crate::validator::SetValidator) {
        for group in validator.find_groups(&self.cards_on_table(), usize::MAX) {
            let mut slots: Vec<SlotId> =
                group.iter().filter_map(|&c| self.slot_of(c)).collect();
            slots.sort_unstable();
            info!(?slots, cards = ?group, "hint: valid group on table");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NullDisplay;
    use rand::Rng;

    fn table(slots: usize, players: usize) -> Table {
        Table::new(slots, 81, players, Arc::new(NullDisplay))
    }

    fn assert_bijection(t: &Table) {
        for (slot, &card) in t.slot_to_card.iter().enumerate() {
            if let Some(card) = card {
                assert_eq!(t.card_to_slot[card], Some(slot));
            }
        }
        for (card, &slot) in t.card_to_slot.iter().enumerate() {
            if let Some(slot) = slot {
                assert_eq!(t.slot_to_card[slot], Some(card));
            }
        }
    }

    #[test]
    fn test_place_and_remove_keep_maps_inverse() {
        let mut t = table(12, 1);
        t.place_card(5, 0);
        t.place_card(7, 3);
        assert_bijection(&t);
        assert_eq!(t.card_at(0), Some(5));
        assert_eq!(t.slot_of(7), Some(3));
        assert_eq!(t.count_cards(), 2);

        assert_eq!(t.remove_card(0), Some(5));
        assert_eq!(t.remove_card(0), None);
        assert_bijection(&t);
        assert_eq!(t.slot_of(5), None);
        assert_eq!(t.count_cards(), 1);
    }

    #[test]
    fn test_bijection_under_randomized_interleaving() {
        let mut t = table(12, 2);
        let mut rng = rand::thread_rng();
        let mut next_card = 0usize;
        for _ in 0..500 {
            let slot = rng.gen_range(0..12);
            match rng.gen_range(0..3) {
                0 => {
                    if t.card_at(slot).is_none() && next_card < 81 {
                        t.place_card(next_card, slot);
                        next_card += 1;
                    }
                }
                1 => {
                    t.remove_card(slot);
                }
                _ => {
                    t.toggle_token(rng.gen_range(0..2), slot, 3);
                }
            }
            assert_bijection(&t);
        }
    }

    #[test]
    fn test_toggle_token_respects_limit() {
        let mut t = table(4, 1);
        assert_eq!(t.toggle_token(0, 0, 3), TokenToggle::Placed(1));
        assert_eq!(t.toggle_token(0, 1, 3), TokenToggle::Placed(2));
        assert_eq!(t.toggle_token(0, 2, 3), TokenToggle::Placed(3));
        // Fourth placement refused, removal still allowed
        assert_eq!(t.toggle_token(0, 3, 3), TokenToggle::AtLimit);
        assert_eq!(t.toggle_token(0, 2, 3), TokenToggle::Removed(2));
        assert_eq!(t.toggle_token(0, 3, 3), TokenToggle::Placed(3));
    }

    #[test]
    fn test_toggle_on_then_off_leaves_slot_untokened() {
        let mut t = table(4, 1);
        t.toggle_token(0, 1, 3);
        assert!(t.has_token(0, 1));
        t.toggle_token(0, 1, 3);
        assert!(!t.has_token(0, 1));
        assert_eq!(t.token_count(0), 0);
    }

    #[test]
    fn test_clear_tokens_at_slot_strips_every_player() {
        let mut t = table(4, 3);
        t.toggle_token(0, 2, 3);
        t.toggle_token(1, 2, 3);
        t.toggle_token(2, 1, 3);

        t.clear_tokens_at_slot(2);
        assert_eq!(t.token_count(0), 0);
        assert_eq!(t.token_count(1), 0);
        // Player 2's token on another slot survives
        assert_eq!(t.token_count(2), 1);
    }

    #[test]
    fn test_tokened_slots_in_slot_order() {
        let mut t = table(6, 1);
        t.toggle_token(0, 4, 3);
        t.toggle_token(0, 1, 3);
        t.toggle_token(0, 3, 3);
        assert_eq!(t.tokened_slots(0), vec![1, 3, 4]);
    }
}
