//! The dealer's state machine.
//!
//! One task, sole writer of table cards and sole consumer of the submission
//! queue. Phases: deal (fill the grid, players paused) -> active round
//! (countdown + FIFO resolution of completed selections) -> sweep (cards
//! back to the deck, tokens cleared) -> next round, until the deck is empty
//! and no valid group remains on the table, or shutdown is requested. Then
//! winners are announced and every player is joined, highest id first.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::deck::Deck;
use crate::display::GameDisplay;
use crate::player::PlayerHandle;
use crate::shutdown::ShutdownToken;
use crate::table::Table;
use crate::validator::SetValidator;
use crate::{CardId, PlayerId};

use super::submission::{GameEvent, Submission, Verdict};

/// Bounded wait between drains, so the countdown display stays responsive
/// even with no submissions.
const DISPLAY_TICK: Duration = Duration::from_millis(10);

/// Final standings, reported once the dealer's loop exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    /// Every player whose score equals the maximum (ties preserved).
    pub winners: Vec<PlayerId>,
    /// Final score per player, indexed by player id.
    pub scores: Vec<u32>,
}

pub struct Dealer {
    cfg: GameConfig,
    table: Arc<RwLock<Table>>,
    deck: Deck,
    players: Vec<PlayerHandle>,
    submissions: mpsc::Receiver<Submission>,
    events: broadcast::Sender<GameEvent>,
    display: Arc<dyn GameDisplay>,
    validator: Arc<dyn SetValidator>,
    shutdown: ShutdownToken,
    reshuffle_deadline: Instant,
}

impl Dealer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cfg: GameConfig,
        table: Arc<RwLock<Table>>,
        deck: Deck,
        players: Vec<PlayerHandle>,
        submissions: mpsc::Receiver<Submission>,
        events: broadcast::Sender<GameEvent>,
        display: Arc<dyn GameDisplay>,
        validator: Arc<dyn SetValidator>,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            cfg,
            table,
            deck,
            players,
            submissions,
            events,
            display,
            validator,
            shutdown,
            reshuffle_deadline: Instant::now(),
        }
    }

    /// Run the game to completion. Returns the final standings after every
    /// player task has been joined.
    pub async fn run(mut self) -> GameOutcome {
        info!("dealer starting");
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            self.deal().await;
            self.round_loop().await;
            if self.shutdown.is_cancelled() || self.game_over().await {
                break;
            }
            self.sweep().await;
        }
        self.finish().await
    }

    /// SETUP: players paused, every empty slot filled from the deck.
    async fn deal(&mut self) {
        debug!(deck_remaining = self.deck.remaining(), "dealing");
        self.set_players_input(false);
        self.refill().await;
        self.set_players_input(true);
        let _ = self.events.send(GameEvent::Refresh);
    }

    /// Fill empty slots from the deck until the grid is full or the deck
    /// runs out, honoring the per-card delay. Hints cover the fresh layout,
    /// mid-round refills included.
    async fn refill(&mut self) {
        loop {
            let slot = self.table.read().await.first_empty_slot();
            let Some(slot) = slot else { break };
            let Some(card) = self.deck.draw() else { break };
            self.table_delay().await;
            self.table.write().await.place_card(card, slot);
        }
        if self.cfg.hints {
            self.table.read().await.hints(self.validator.as_ref());
        }
    }

    /// ROUND_ACTIVE: bounded waits between complete drains of the
    /// submission queue, until the deadline elapses or shutdown.
    async fn round_loop(&mut self) {
        self.reshuffle_deadline = Instant::now() + self.cfg.turn_timeout();
        self.update_countdown();
        loop {
            if self.shutdown.is_cancelled() {
                return;
            }
            let now = Instant::now();
            if now >= self.reshuffle_deadline {
                return;
            }
            let tick = DISPLAY_TICK.min(self.reshuffle_deadline - now);
            tokio::select! {
                _ = self.shutdown.cancelled() => return,
                submission = self.submissions.recv() => match submission {
                    Some(submission) => self.resolve_batch(submission).await,
                    None => return,
                },
                _ = tokio::time::sleep(tick) => {}
            }
            self.update_countdown();
        }
    }

    /// Drain the queue completely, resolving in FIFO completion order, then
    /// refill and wake everyone once.
    async fn resolve_batch(&mut self, first: Submission) {
        self.resolve(first).await;
        while let Ok(next) = self.submissions.try_recv() {
            self.resolve(next).await;
        }
        self.refill().await;
        let _ = self.events.send(GameEvent::Refresh);
    }

    /// Resolve one submitted selection and deliver its verdict.
    async fn resolve(&mut self, submission: Submission) {
        let Submission {
            player,
            slots,
            cards,
            verdict_tx,
        } = submission;

        // Every named card must still sit in its named slot. A slot consumed
        // by an earlier resolution, or re-dealt since the selection
        // completed, invalidates it without consulting the validator.
        let intact = slots.len() == cards.len() && {
            let table = self.table.read().await;
            slots
                .iter()
                .zip(&cards)
                .all(|(&slot, &card)| table.card_at(slot) == Some(card))
        };

        let verdict = if !intact {
            Verdict::Rejected
        } else if self.validator.is_valid_group(&cards) {
            for &slot in &slots {
                self.table_delay().await;
                let mut table = self.table.write().await;
                table.remove_card(slot);
                // Any other player's token on the consumed slot is now a
                // stale selection fragment; strip it.
                table.clear_tokens_at_slot(slot);
            }
            self.table.write().await.clear_player_tokens(player);
            Verdict::Accepted
        } else {
            Verdict::Rejected
        };

        debug!(player, ?verdict, "selection resolved");
        if verdict_tx.send(verdict).is_err() {
            warn!(player, "player gone before verdict delivery");
        }
    }

    /// ROUND_ENDING: leftover submissions resolved, all cards swept back to
    /// the deck, all tokens cleared.
    async fn sweep(&mut self) {
        debug!("sweeping table for reshuffle");
        self.set_players_input(false);
        while let Ok(next) = self.submissions.try_recv() {
            self.resolve(next).await;
        }
        let slot_count = self.table.read().await.slot_count();
        for slot in 0..slot_count {
            if self.table.read().await.card_at(slot).is_none() {
                continue;
            }
            self.table_delay().await;
            if let Some(card) = self.table.write().await.remove_card(slot) {
                self.deck.return_card(card);
            }
        }
        self.table.write().await.clear_all_tokens();
        // A selection completed during the sweep now names emptied slots;
        // resolve it here so it cannot carry into the next round and be
        // judged against freshly dealt cards.
        while let Ok(next) = self.submissions.try_recv() {
            self.resolve(next).await;
        }
        self.set_players_input(true);
        let _ = self.events.send(GameEvent::RoundEnd);
    }

    /// End condition: deck exhausted and no valid group left on the table.
    async fn game_over(&mut self) -> bool {
        if !self.deck.is_empty() {
            return false;
        }
        let cards: Vec<CardId> = self.table.read().await.cards_on_table();
        self.validator.find_groups(&cards, 1).is_empty()
    }

    /// GAME_OVER: announce the winner set, then terminate every player in
    /// reverse registration order, joining each before signalling the next.
    async fn finish(mut self) -> GameOutcome {
        let scores: Vec<u32> = self.players.iter().map(|p| p.score()).collect();
        let max = scores.iter().copied().max().unwrap_or(0);
        let winners: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.score() == max)
            .map(|p| p.id())
            .collect();
        self.display.announce_winners(&winners);
        info!(?winners, max_score = max, "game over");

        for handle in self.players.iter_mut().rev() {
            handle.terminate().await;
        }
        self.display.remove_all_tokens();

        GameOutcome { winners, scores }
    }

    fn set_players_input(&self, enabled: bool) {
        for player in &self.players {
            player.set_input_enabled(enabled);
        }
    }

    fn update_countdown(&self) {
        let remaining = self
            .reshuffle_deadline
            .saturating_duration_since(Instant::now());
        let remaining_ms = remaining.as_millis() as u64;
        self.display
            .set_countdown(remaining_ms, remaining_ms <= self.cfg.countdown_warn_ms);
    }

    async fn table_delay(&self) {
        let delay = self.cfg.table_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NullDisplay;
    use crate::shutdown::ShutdownController;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    struct AcceptAll;

    impl SetValidator for AcceptAll {
        fn is_valid_group(&self, cards: &[CardId]) -> bool {
            !cards.is_empty()
        }

        fn find_groups(&self, _cards: &[CardId], _limit: usize) -> Vec<Vec<CardId>> {
            Vec::new()
        }
    }

    /// Counts `find_groups` calls so hint emission is observable.
    struct CountingValidator {
        finds: AtomicUsize,
    }

    impl SetValidator for CountingValidator {
        fn is_valid_group(&self, _cards: &[CardId]) -> bool {
            true
        }

        fn find_groups(&self, _cards: &[CardId], _limit: usize) -> Vec<Vec<CardId>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        }
    }

    fn test_cfg(hints: bool) -> GameConfig {
        GameConfig {
            rows: 1,
            columns: 3,
            selection_size: 3,
            deck_size: 81,
            table_delay_ms: 0,
            hints,
            ..GameConfig::default()
        }
    }

    fn build_dealer(
        cfg: GameConfig,
        table: Table,
        deck: Deck,
        validator: Arc<dyn SetValidator>,
    ) -> (Dealer, ShutdownController) {
        let controller = ShutdownController::new();
        let (_submit_tx, submit_rx) = mpsc::channel(1);
        let (events, _) = broadcast::channel(4);
        let dealer = Dealer::new(
            cfg,
            Arc::new(RwLock::new(table)),
            deck,
            Vec::new(),
            submit_rx,
            events,
            Arc::new(NullDisplay),
            validator,
            controller.token(),
        );
        (dealer, controller)
    }

    fn filled_table() -> Table {
        let mut table = Table::new(3, 81, 1, Arc::new(NullDisplay));
        table.place_card(0, 0);
        table.place_card(1, 1);
        table.place_card(2, 2);
        table
    }

    fn submission(slots: Vec<usize>, cards: Vec<CardId>) -> (Submission, oneshot::Receiver<Verdict>) {
        let (verdict_tx, verdict_rx) = oneshot::channel();
        (
            Submission {
                player: 0,
                slots,
                cards,
                verdict_tx,
            },
            verdict_rx,
        )
    }

    #[tokio::test]
    async fn test_resolve_accepts_intact_selection_and_consumes_slots() {
        let (mut dealer, _controller) =
            build_dealer(test_cfg(false), filled_table(), Deck::new(0), Arc::new(AcceptAll));

        let (sub, verdict_rx) = submission(vec![0, 1, 2], vec![0, 1, 2]);
        dealer.resolve(sub).await;

        assert_eq!(verdict_rx.await.unwrap(), Verdict::Accepted);
        assert_eq!(dealer.table.read().await.count_cards(), 0);
    }

    #[tokio::test]
    async fn test_resolve_rejects_selection_whose_cards_were_redealt() {
        let (mut dealer, _controller) =
            build_dealer(test_cfg(false), filled_table(), Deck::new(0), Arc::new(AcceptAll));

        // Slot 1 loses its card and gains another before resolution
        {
            let mut table = dealer.table.write().await;
            table.remove_card(1);
            table.place_card(5, 1);
        }

        let (sub, verdict_rx) = submission(vec![0, 1, 2], vec![0, 1, 2]);
        dealer.resolve(sub).await;

        // Rejected on identity, and the table is untouched
        assert_eq!(verdict_rx.await.unwrap(), Verdict::Rejected);
        assert_eq!(dealer.table.read().await.count_cards(), 3);
        assert_eq!(dealer.table.read().await.card_at(1), Some(5));
    }

    #[tokio::test]
    async fn test_resolve_rejects_selection_naming_emptied_slot() {
        let (mut dealer, _controller) =
            build_dealer(test_cfg(false), filled_table(), Deck::new(0), Arc::new(AcceptAll));

        dealer.table.write().await.remove_card(2);

        let (sub, verdict_rx) = submission(vec![0, 1, 2], vec![0, 1, 2]);
        dealer.resolve(sub).await;

        assert_eq!(verdict_rx.await.unwrap(), Verdict::Rejected);
        assert_eq!(dealer.table.read().await.count_cards(), 2);
    }

    #[tokio::test]
    async fn test_refill_surfaces_hints_when_enabled() {
        let validator = Arc::new(CountingValidator {
            finds: AtomicUsize::new(0),
        });
        let table = Table::new(3, 81, 1, Arc::new(NullDisplay));
        let (mut dealer, _controller) = build_dealer(
            test_cfg(true),
            table,
            Deck::new(3),
            Arc::clone(&validator) as Arc<dyn SetValidator>,
        );

        dealer.refill().await;

        assert_eq!(dealer.table.read().await.count_cards(), 3);
        assert_eq!(validator.finds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refill_skips_hints_when_disabled() {
        let validator = Arc::new(CountingValidator {
            finds: AtomicUsize::new(0),
        });
        let table = Table::new(3, 81, 1, Arc::new(NullDisplay));
        let (mut dealer, _controller) = build_dealer(
            test_cfg(false),
            table,
            Deck::new(3),
            Arc::clone(&validator) as Arc<dyn SetValidator>,
        );

        dealer.refill().await;

        assert_eq!(dealer.table.read().await.count_cards(), 3);
        assert_eq!(validator.finds.load(Ordering::SeqCst), 0);
    }
}
