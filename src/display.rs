//! GameDisplay - the one-way interface to whatever renders the game.
//!
//! Every call is fire-and-forget: the engine never waits on the display and
//! never observes a display failure. Rendering itself (terminal, GUI) is an
//! external collaborator; this crate ships a tracing-backed implementation
//! for the binary and a null one for tests.

use crate::{CardId, PlayerId, SlotId};
use tracing::{debug, info};

/// One-way sink for everything the game wants shown.
pub trait GameDisplay: Send + Sync {
    fn place_card(&self, card: CardId, slot: SlotId);
    fn remove_card(&self, slot: SlotId);
    fn place_token(&self, player: PlayerId, slot: SlotId);
    fn remove_token(&self, player: PlayerId, slot: SlotId);
    fn remove_all_tokens(&self);
    fn set_score(&self, player: PlayerId, score: u32);
    /// Remaining freeze time for a player, coarse countdown; 0 clears it.
    fn set_freeze(&self, player: PlayerId, remaining_ms: u64);
    /// Remaining round time; `urgent` inside the configured warning window.
    fn set_countdown(&self, remaining_ms: u64, urgent: bool);
    fn announce_winners(&self, players: &[PlayerId]);
}

/// Display that logs every update through `tracing`.
pub struct TracingDisplay;

impl GameDisplay for TracingDisplay {
    fn place_card(&self, card: CardId, slot: SlotId) {
        debug!(card, slot, "card placed");
    }

    fn remove_card(&self, slot: SlotId) {
        debug!(slot, "card removed");
    }

    fn place_token(&self, player: PlayerId, slot: SlotId) {
        debug!(player, slot, "token placed");
    }

    fn remove_token(&self, player: PlayerId, slot: SlotId) {
        debug!(player, slot, "token removed");
    }

    fn remove_all_tokens(&self) {
        debug!("all tokens removed");
    }

    fn set_score(&self, player: PlayerId, score: u32) {
        info!(player, score, "score updated");
    }

    fn set_freeze(&self, player: PlayerId, remaining_ms: u64) {
        debug!(player, remaining_ms, "freeze countdown");
    }

    fn set_countdown(&self, remaining_ms: u64, urgent: bool) {
        if urgent {
            debug!(remaining_ms, "round countdown (urgent)");
        }
    }

    fn announce_winners(&self, players: &[PlayerId]) {
        info!(winners = ?players, "winners announced");
    }
}

/// Display that drops everything. Used in tests and headless runs.
pub struct NullDisplay;

impl GameDisplay for NullDisplay {
    fn place_card(&self, _card: CardId, _slot: SlotId) {}
    fn remove_card(&self, _slot: SlotId) {}
    fn place_token(&self, _player: PlayerId, _slot: SlotId) {}
    fn remove_token(&self, _player: PlayerId, _slot: SlotId) {}
    fn remove_all_tokens(&self) {}
    fn set_score(&self, _player: PlayerId, _score: u32) {}
    fn set_freeze(&self, _player: PlayerId, _remaining_ms: u64) {}
    fn set_countdown(&self, _remaining_ms: u64, _urgent: bool) {}
    fn announce_winners(&self, _players: &[PlayerId]) {}
}
