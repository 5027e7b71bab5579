//! Deck - the pool of cards not currently on the table.
//!
//! Owned exclusively by the dealer. An empty deck is not an error; it is one
//! half of the end-of-game condition.

use crate::CardId;
use rand::Rng;

pub struct Deck {
    cards: Vec<CardId>,
}

impl Deck {
    /// Full deck holding every card id in `0..size` exactly once.
    pub fn new(size: usize) -> Self {
        Self {
            cards: (0..size).collect(),
        }
    }

    /// Draw a uniformly-random remaining card, or `None` when empty.
    /// Swap-remove keeps the draw O(1) without biasing the distribution.
    pub fn draw(&mut self) -> Option<CardId> {
        if self.cards.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..self.cards.len());
        Some(self.cards.swap_remove(index))
    }

    /// Return a card swept off the table during a reshuffle.
    pub fn return_card(&mut self, card: CardId) {
        self.cards.push(card);
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
