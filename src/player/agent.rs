//! PlayerAgent - one task per player, plus the handles around it.
//!
//! The agent owns a bounded queue of pending slot requests (capacity K) and
//! applies them against the table. Completing a K-sized selection submits it
//! to the dealer and suspends the agent on a verdict channel; broadcast game
//! events only ever cause a re-check, never an inferred outcome.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::dealer::{GameEvent, Submission, Verdict};
use crate::display::GameDisplay;
use crate::shutdown::{ShutdownController, ShutdownToken};
use crate::table::{Table, TokenToggle};
use crate::{CardId, PlayerId, SlotId};

use super::input::spawn_input_generator;

/// Freeze countdown is pushed to the display in slices of this size.
const FREEZE_TICK: Duration = Duration::from_millis(900);

/// State shared between the agent task, its handles, and the dealer.
pub(crate) struct PlayerShared {
    pub(crate) id: PlayerId,
    /// Monotonic score; +1 per accepted selection.
    pub(crate) score: AtomicU32,
    /// Cleared by the dealer while dealing or sweeping.
    pub(crate) input_enabled: AtomicBool,
    /// Set from submission until the cooldown ends.
    pub(crate) frozen: AtomicBool,
}

/// Timing knobs the agent needs from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct PlayerTiming {
    pub selection_size: usize,
    pub point_freeze: Duration,
    pub penalty_freeze: Duration,
}

/// Clone-friendly key entry point. This is the whole "keyboard" interface:
/// a request that arrives while the player is frozen, input is paused, or
/// the queue is full is silently dropped, modelling ignored UI input.
#[derive(Clone)]
pub struct PlayerKeys {
    shared: Arc<PlayerShared>,
    tx: mpsc::Sender<SlotId>,
}

impl PlayerKeys {
    pub fn player(&self) -> PlayerId {
        self.shared.id
    }

    /// Enqueue a slot request. Returns whether it was accepted; callers are
    /// free to ignore the answer.
    pub fn key_pressed(&self, slot: SlotId) -> bool {
        if !self.shared.input_enabled.load(Ordering::Acquire)
            || self.shared.frozen.load(Ordering::Acquire)
        {
            trace!(player = self.shared.id, slot, "key press ignored");
            return false;
        }
        self.tx.try_send(slot).is_ok()
    }
}

/// Dealer-side handle: score readout, input gating, and clean termination.
pub struct PlayerHandle {
    shared: Arc<PlayerShared>,
    keys: PlayerKeys,
    terminate: ShutdownController,
    join: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    pub fn id(&self) -> PlayerId {
        self.shared.id
    }

    pub fn score(&self) -> u32 {
        self.shared.score.load(Ordering::Acquire)
    }

    pub fn keys(&self) -> PlayerKeys {
        self.keys.clone()
    }

    pub fn set_input_enabled(&self, enabled: bool) {
        self.shared.input_enabled.store(enabled, Ordering::Release);
    }

    /// Request termination and join the agent task (which in turn joins its
    /// input generator). A clean join, not a forced kill.
    pub async fn terminate(&mut self) {
        self.terminate.shutdown();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                warn!(player = self.shared.id, error = %e, "player task join failed");
            }
        }
    }
}

struct PlayerAgent {
    shared: Arc<PlayerShared>,
    keys: PlayerKeys,
    keys_rx: mpsc::Receiver<SlotId>,
    table: Arc<RwLock<Table>>,
    display: Arc<dyn GameDisplay>,
    submit_tx: mpsc::Sender<Submission>,
    events: broadcast::Sender<GameEvent>,
    terminate: ShutdownToken,
    timing: PlayerTiming,
    automated: bool,
    slot_count: usize,
}

/// Build and spawn one player agent, returning the dealer-side handle.
#[allow(clippy::too_many_arguments)]
pub fn spawn_player(
    id: PlayerId,
    automated: bool,
    slot_count: usize,
    timing: PlayerTiming,
    table: Arc<RwLock<Table>>,
    display: Arc<dyn GameDisplay>,
    submit_tx: mpsc::Sender<Submission>,
    events: broadcast::Sender<GameEvent>,
) -> PlayerHandle {
    let shared = Arc::new(PlayerShared {
        id,
        score: AtomicU32::new(0),
        input_enabled: AtomicBool::new(false),
        frozen: AtomicBool::new(false),
    });
    // Pending-selection queue: at most one request per token of a selection
    let (keys_tx, keys_rx) = mpsc::channel(timing.selection_size.max(1));
    let keys = PlayerKeys {
        shared: Arc::clone(&shared),
        tx: keys_tx,
    };
    let controller = ShutdownController::new();
    let agent = PlayerAgent {
        shared: Arc::clone(&shared),
        keys: keys.clone(),
        keys_rx,
        table,
        display,
        submit_tx,
        events,
        terminate: controller.token(),
        timing,
        automated,
        slot_count,
    };
    let join = tokio::spawn(agent.run());
    PlayerHandle {
        shared,
        keys,
        terminate: controller,
        join: Some(join),
    }
}

impl PlayerAgent {
    async fn run(mut self) {
        let id = self.shared.id;
        info!(player = id, automated = self.automated, "player agent starting");

        let generator = self.automated.then(|| {
            spawn_input_generator(self.keys.clone(), self.slot_count, self.terminate.clone())
        });

        loop {
            tokio::select! {
                _ = self.terminate.cancelled() => break,
                slot = self.keys_rx.recv() => match slot {
                    Some(slot) => self.handle_key(slot).await,
                    None => break,
                },
            }
        }

        if let Some(generator) = generator {
            let _ = generator.await;
        }
        info!(player = id, "player agent terminated");
    }

    async fn handle_key(&mut self, slot: SlotId) {
        let id = self.shared.id;
        let k = self.timing.selection_size;
        let selection = {
            let mut table = self.table.write().await;
            // Occupancy re-checked under the lock: a request that raced a
            // card removal is discarded, never an error.
            if table.card_at(slot).is_none() {
                trace!(player = id, slot, "request for empty slot discarded");
                return;
            }
            match table.toggle_token(id, slot, k) {
                TokenToggle::Placed(n) if n == k => {
                    // Snapshot slots and their cards under the same lock, so
                    // the submission names exactly what the player selected.
                    let slots = table.tokened_slots(id);
                    let cards = slots.iter().filter_map(|&s| table.card_at(s)).collect();
                    Some((slots, cards))
                }
                _ => None,
            }
        };
        if let Some((slots, cards)) = selection {
            self.submit_selection(slots, cards).await;
        }
    }

    /// Submit the completed selection and suspend until the dealer resolves
    /// it, then serve the resulting cooldown.
    async fn submit_selection(&mut self, slots: Vec<SlotId>, cards: Vec<CardId>) {
        let id = self.shared.id;
        self.shared.frozen.store(true, Ordering::Release);

        let (verdict_tx, verdict_rx) = oneshot::channel();
        let submission = Submission {
            player: id,
            slots,
            cards,
            verdict_tx,
        };
        if self.submit_tx.send(submission).await.is_err() {
            // Dealer is gone; our terminate signal follows shortly.
            debug!(player = id, "submission channel closed");
            self.shared.frozen.store(false, Ordering::Release);
            return;
        }

        match self.await_verdict(verdict_rx).await {
            Some(Verdict::Accepted) => {
                let score = self.shared.score.fetch_add(1, Ordering::AcqRel) + 1;
                self.display.set_score(id, score);
                debug!(player = id, score, "selection accepted");
                self.cooldown(self.timing.point_freeze).await;
            }
            Some(Verdict::Rejected) => {
                // Tokens stay on the table as the visible wrong-guess marker;
                // the dealer or the round-end sweep clears them.
                debug!(player = id, "selection rejected");
                self.cooldown(self.timing.penalty_freeze).await;
            }
            None => {}
        }
        self.shared.frozen.store(false, Ordering::Release);
    }

    /// Wait for this submission's verdict. Broadcast events are spurious
    /// wakes: re-check the verdict channel, never infer an outcome from the
    /// wake itself. Termination returns `None`.
    async fn await_verdict(&mut self, mut verdict_rx: oneshot::Receiver<Verdict>) -> Option<Verdict> {
        let mut events = self.events.subscribe();
        loop {
            tokio::select! {
                verdict = &mut verdict_rx => return verdict.ok(),
                event = events.recv() => match event {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    // Dealer gone: the verdict sender is gone with it.
                    Err(broadcast::error::RecvError::Closed) => return verdict_rx.await.ok(),
                },
                _ = self.terminate.cancelled() => return None,
            }
        }
    }

    /// Sleep out a cooldown in bounded slices, surfacing a coarse decreasing
    /// countdown. Termination cuts it short.
    async fn cooldown(&mut self, total: Duration) {
        let id = self.shared.id;
        if total.is_zero() {
            return;
        }
        let deadline = Instant::now() + total;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.display.set_freeze(id, remaining.as_millis() as u64);
            let slice = remaining.min(FREEZE_TICK);
            tokio::select! {
                _ = self.terminate.cancelled() => break,
                _ = tokio::time::sleep(slice) => {}
            }
        }
        self.display.set_freeze(id, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NullDisplay;

    fn test_keys(capacity: usize) -> (PlayerKeys, mpsc::Receiver<SlotId>) {
        let shared = Arc::new(PlayerShared {
            id: 0,
            score: AtomicU32::new(0),
            input_enabled: AtomicBool::new(true),
            frozen: AtomicBool::new(false),
        });
        let (tx, rx) = mpsc::channel(capacity);
        (PlayerKeys { shared, tx }, rx)
    }

    #[tokio::test]
    async fn test_key_pressed_drops_when_frozen() {
        let (keys, _rx) = test_keys(3);
        assert!(keys.key_pressed(0));

        keys.shared.frozen.store(true, Ordering::Release);
        assert!(!keys.key_pressed(1));

        keys.shared.frozen.store(false, Ordering::Release);
        assert!(keys.key_pressed(1));
    }

    #[tokio::test]
    async fn test_key_pressed_drops_when_input_disabled() {
        let (keys, _rx) = test_keys(3);
        keys.shared.input_enabled.store(false, Ordering::Release);
        assert!(!keys.key_pressed(0));
    }

    #[tokio::test]
    async fn test_key_pressed_drops_when_queue_full() {
        let (keys, mut rx) = test_keys(2);
        assert!(keys.key_pressed(0));
        assert!(keys.key_pressed(1));
        assert!(!keys.key_pressed(2));

        assert_eq!(rx.recv().await, Some(0));
        assert!(keys.key_pressed(2));
    }

    #[tokio::test]
    async fn test_terminate_joins_suspended_agent() {
        // Agent with no traffic: suspended on its key queue.
        let table = Arc::new(RwLock::new(Table::new(4, 81, 1, Arc::new(NullDisplay))));
        let (submit_tx, _submit_rx) = mpsc::channel(1);
        let (events, _) = broadcast::channel(8);
        let timing = PlayerTiming {
            selection_size: 3,
            point_freeze: Duration::ZERO,
            penalty_freeze: Duration::ZERO,
        };
        let mut handle = spawn_player(0, false, 4, timing, table, Arc::new(NullDisplay), submit_tx, events);

        tokio::time::timeout(Duration::from_secs(1), handle.terminate())
            .await
            .expect("terminate did not join the agent");
    }
}
