//! Messages between player agents and the dealer.

use crate::{CardId, PlayerId, SlotId};
use tokio::sync::oneshot;

/// A completed selection, submitted by a player agent. The dealer sends
/// exactly one verdict back through `verdict_tx`; the submitting player is
/// suspended on the other end until it arrives.
#[derive(Debug)]
pub struct Submission {
    pub player: PlayerId,
    /// The K slots the player had tokened when the selection completed.
    pub slots: Vec<SlotId>,
    /// The cards those slots held at completion, same order as `slots`.
    /// Resolution checks each card still sits in its slot, so a selection
    /// cannot be judged against cards re-dealt after it was completed.
    pub cards: Vec<CardId>,
    pub verdict_tx: oneshot::Sender<Verdict>,
}

/// Outcome of one submitted selection. A selection whose slots no longer
/// hold the cards it named is rejected without consulting the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected,
}

/// Fan-out notifications, distinct from the per-submission verdict channel.
/// Receivers must treat any of these as a spurious wake and re-check their
/// own verdict channel rather than infer an outcome from the wake itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Table state changed (batch resolved, refill completed).
    Refresh,
    /// The round ended; all cards were swept and all tokens cleared.
    RoundEnd,
}
