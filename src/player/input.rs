//! Automated key-press generator: one task per computer player, producing
//! uniformly-random slot requests at a steady cadence. Gating (frozen,
//! paused input, full queue) happens inside `PlayerKeys::key_pressed`, so a
//! frozen player's queue is never flooded.

use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::shutdown::ShutdownToken;

use super::agent::PlayerKeys;

const KEY_CADENCE: Duration = Duration::from_millis(2);

pub(super) fn spawn_input_generator(
    keys: PlayerKeys,
    slot_count: usize,
    mut terminate: ShutdownToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let player = keys.player();
        debug!(player, "input generator starting");
        loop {
            if terminate.is_cancelled() {
                break;
            }
            let slot = rand::thread_rng().gen_range(0..slot_count);
            keys.key_pressed(slot);
            tokio::select! {
                _ = terminate.cancelled() => break,
                _ = tokio::time::sleep(KEY_CADENCE) => {}
            }
        }
        debug!(player, "input generator terminated");
    })
}
