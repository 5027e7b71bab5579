//! Game assembly: builds the table, deck, and player agents from the
//! configuration, wires the channels, and hands the dealer its registry.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, RwLock};

use crate::config::GameConfig;
use crate::dealer::{Dealer, GameOutcome};
use crate::deck::Deck;
use crate::display::GameDisplay;
use crate::error::{Result, SetDealError};
use crate::player::{spawn_player, PlayerKeys, PlayerTiming};
use crate::shutdown::ShutdownToken;
use crate::table::Table;
use crate::validator::SetValidator;

/// A fully-wired game, ready to run. Player agents are already spawned;
/// the dealer runs on the caller's task.
pub struct Game {
    dealer: Dealer,
}

impl Game {
    /// Build a game. Also returns one `PlayerKeys` per player (indexed by
    /// player id) so callers can drive human players externally; automated
    /// players are already fed by their generators.
    pub fn build(
        cfg: GameConfig,
        display: Arc<dyn GameDisplay>,
        validator: Arc<dyn SetValidator>,
        shutdown: ShutdownToken,
    ) -> Result<(Game, Vec<PlayerKeys>)> {
        cfg.validate()
            .map_err(|errors| SetDealError::InvalidConfig(errors.join("; ")))?;

        let table = Arc::new(RwLock::new(Table::new(
            cfg.slot_count(),
            cfg.deck_size,
            cfg.total_players(),
            Arc::clone(&display),
        )));
        let deck = Deck::new(cfg.deck_size);

        let (submit_tx, submit_rx) = mpsc::channel(cfg.total_players());
        let (events, _) = broadcast::channel(cfg.total_players() * 4);

        let timing = PlayerTiming {
            selection_size: cfg.selection_size,
            point_freeze: cfg.point_freeze(),
            penalty_freeze: cfg.penalty_freeze(),
        };

        let mut players = Vec::with_capacity(cfg.total_players());
        let mut keys = Vec::with_capacity(cfg.total_players());
        for id in 0..cfg.total_players() {
            let automated = id >= cfg.human_players;
            let handle = spawn_player(
                id,
                automated,
                cfg.slot_count(),
                timing,
                Arc::clone(&table),
                Arc::clone(&display),
                submit_tx.clone(),
                events.clone(),
            );
            keys.push(handle.keys());
            players.push(handle);
        }
        drop(submit_tx);

        let dealer = Dealer::new(
            cfg, table, deck, players, submit_rx, events, display, validator, shutdown,
        );
        Ok((Game { dealer }, keys))
    }

    /// Drive the dealer to completion and return the final standings.
    pub async fn run(self) -> GameOutcome {
        self.dealer.run().await
    }
}

/// Convenience wrapper: build and run one game.
pub async fn run_game(
    cfg: GameConfig,
    display: Arc<dyn GameDisplay>,
    validator: Arc<dyn SetValidator>,
    shutdown: ShutdownToken,
) -> Result<GameOutcome> {
    let (game, _keys) = Game::build(cfg, display, validator, shutdown)?;
    Ok(game.run().await)
}
