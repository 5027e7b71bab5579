pub mod bootstrap;
pub mod config;
pub mod dealer;
pub mod deck;
pub mod display;
pub mod error;
pub mod player;
pub mod shutdown;
pub mod table;
pub mod validator;

/// Player identity, dense from 0 in registration order.
pub type PlayerId = usize;
/// A fixed position in the grid; holds zero or one card.
pub type SlotId = usize;
/// Card identity, dense from 0 up to the configured deck size.
pub type CardId = usize;

pub use bootstrap::{run_game, Game};
pub use config::{GameConfig, LoggingConfig};
pub use dealer::{Dealer, GameEvent, GameOutcome, Submission, Verdict};
pub use deck::Deck;
pub use display::{GameDisplay, NullDisplay, TracingDisplay};
pub use error::{Result, SetDealError};
pub use player::{PlayerHandle, PlayerKeys, PlayerTiming};
pub use shutdown::{ShutdownController, ShutdownToken};
pub use table::{Table, TokenToggle};
pub use validator::{FeatureValidator, SetValidator};
