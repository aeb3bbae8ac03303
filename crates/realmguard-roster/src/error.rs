//! Error types for the roster layer.

use crate::PlayerState;

/// Errors that can occur while updating presence state.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// A lifecycle transition that the state machine forbids, e.g. a
    /// second verdict for a player that is already being tracked.
    #[error("player {username}: invalid transition {from} -> {to}")]
    InvalidTransition {
        username: String,
        from: PlayerState,
        to: PlayerState,
    },
}
