//! Dealer - the coordinating actor that owns all card mutation.

mod dealer;
mod submission;

pub use dealer::{Dealer, GameOutcome};
pub use submission::{GameEvent, Submission, Verdict};
