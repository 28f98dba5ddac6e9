//! Mission card plays and mission resolution.

use serde::{Deserialize, Serialize};

use crate::core::{GameState, Mission, MissionCard, MissionStatus, PlayerId};
use crate::error::{StateInvariantError, ValidationError};

/// What a card play led to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionOutcome {
    /// More team members still have to play.
    AwaitingPlays { mission: u8, remaining: usize },
    Succeeded { mission: u8, fails: usize },
    Failed { mission: u8, fails: usize },
}

impl MissionOutcome {
    /// Outcome of a resolved mission, or the wait state of an open one.
    #[must_use]
    pub fn of(mission: &Mission) -> Self {
        match mission.status {
            MissionStatus::Success => MissionOutcome::Succeeded {
                mission: mission.number,
                fails: mission.fail_count(),
            },
            MissionStatus::Fail => MissionOutcome::Failed {
                mission: mission.number,
                fails: mission.fail_count(),
            },
            _ => MissionOutcome::AwaitingPlays {
                mission: mission.number,
                remaining: mission.team.len().saturating_sub(mission.plays.len()),
            },
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, MissionOutcome::AwaitingPlays { .. })
    }
}

/// Check that `player` may play `card` on `mission`.
///
/// Good participants may only play Success.
pub fn check_play(
    state: &GameState,
    mission: &Mission,
    player: PlayerId,
    card: MissionCard,
) -> Result<(), ValidationError> {
    if !mission.on_team(player) {
        return Err(ValidationError::NotOnTeam(player));
    }
    if mission.plays.contains_key(&player) {
        return Err(ValidationError::AlreadyPlayed(player));
    }
    let is_evil = state.participant(player).is_some_and(|p| p.is_evil());
    if card == MissionCard::Fail && !is_evil {
        return Err(ValidationError::CardNotAllowed(player));
    }
    Ok(())
}

/// Fails iff at least `fails_required` Fail cards were played.
#[must_use]
pub fn outcome_status(fail_count: usize, fails_required: usize) -> MissionStatus {
    if fail_count >= fails_required {
        MissionStatus::Fail
    } else {
        MissionStatus::Success
    }
}

/// Decide a mission whose plays are complete.
///
/// Refuses missions that are already resolved or still waiting on cards.
pub fn resolve(mission: &Mission) -> Result<MissionStatus, StateInvariantError> {
    if mission.is_resolved() {
        return Err(StateInvariantError::MissionAlreadyResolved(mission.number));
    }
    let remaining = mission.team.len().saturating_sub(mission.plays.len());
    if mission.status != MissionStatus::InProgress || remaining > 0 || mission.team.is_empty() {
        return Err(StateInvariantError::RoundIncomplete { remaining });
    }
    Ok(outcome_status(mission.fail_count(), mission.spec.fails_required))
}
