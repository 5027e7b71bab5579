mod agent;
mod input;

pub use agent::{spawn_player, PlayerHandle, PlayerKeys, PlayerTiming};
