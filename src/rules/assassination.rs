//! Endgame assassination.
//!
//! Once Good has won the required missions, the Assassin names one Good
//! participant. Naming Merlin hands Evil the game; anyone else confirms
//! Good's win. This is the only way Good's mission lead can be overturned.

use crate::core::{GameState, PlayerId, Scoreboard};
use crate::error::ValidationError;
use crate::roles::{Alignment, Role};

use super::engine::{GameResult, VictoryReason};

/// Check the assassin and target.
pub fn check_target(state: &GameState, assassin: PlayerId, target: PlayerId) -> Result<(), ValidationError> {
    if state.role_of(assassin) != Some(Role::Assassin) {
        return Err(ValidationError::NotAssassin(assassin));
    }
    let target_participant = state
        .participant(target)
        .ok_or(ValidationError::UnknownParticipant(target))?;
    if !target_participant.is_good() {
        return Err(ValidationError::InvalidTarget(target));
    }
    Ok(())
}

/// Good participants other than `assassin`.
#[must_use]
pub fn candidates(state: &GameState, assassin: PlayerId) -> Vec<PlayerId> {
    state
        .participants()
        .filter(|p| p.id != assassin && p.is_good())
        .map(|p| p.id)
        .collect()
}

/// Settle the game given the target's role.
pub fn settle(scores: &mut Scoreboard, target_role: Option<Role>) -> GameResult {
    let (winner, reason) = if target_role == Some(Role::Merlin) {
        scores.force_evil_win();
        (Alignment::Evil, VictoryReason::MerlinAssassinated)
    } else {
        scores.force_good_win();
        (Alignment::Good, VictoryReason::AssassinMissed)
    };

    GameResult {
        winner,
        reason,
        good_score: scores.good,
        evil_score: scores.evil,
    }
}
