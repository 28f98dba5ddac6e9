//! Participant actions.
//!
//! Every input the state machine accepts is an `Action` submitted by an
//! actor. Bots and humans use the same enum, so bots can never take a
//! move a human could not.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::player::PlayerId;
use super::state::Phase;

/// A mission team. Five seats fit inline without allocating.
pub type Team = SmallVec<[PlayerId; 5]>;

/// A ballot on a proposed team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    Approve,
    Reject,
}

/// A mission card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionCard {
    Success,
    Fail,
}

/// A complete game action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Confirm one's role during role reveal.
    AcknowledgeRole,
    /// Leader proposes a team. The leader is on the team whether listed or not.
    ProposeTeam { members: Team },
    CastVote(Vote),
    PlayCard(MissionCard),
    ConfirmAssassination { target: PlayerId },
}

impl Action {
    /// Build a proposal from any iterator of seats.
    pub fn propose(members: impl IntoIterator<Item = PlayerId>) -> Self {
        Action::ProposeTeam {
            members: members.into_iter().collect(),
        }
    }

    /// The phase in which this action is accepted.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Action::AcknowledgeRole => Phase::RoleReveal,
            Action::ProposeTeam { .. } => Phase::TeamSelection,
            Action::CastVote(_) => Phase::TeamVoting,
            Action::PlayCard(_) => Phase::MissionPlay,
            Action::ConfirmAssassination { .. } => Phase::Assassination,
        }
    }
}

/// A recorded action with metadata for history tracking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub player: PlayerId,
    pub action: Action,
    /// Mission index (0-based) the action belonged to.
    pub mission: usize,
    /// Virtual time the action was applied.
    pub at_ms: u64,
}
