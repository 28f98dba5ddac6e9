//! Team proposal validation and vote tallying.
//!
//! Approval uses an absolute rejection count: a team passes while fewer
//! than `reject_threshold` ballots reject it, however many participants
//! voted. With the default threshold of 3 this matches a simple majority
//! only at a five-seat table.

use serde::{Deserialize, Serialize};

use crate::core::{GameState, Mission, PlayerId, Team, Vote};
use crate::error::ValidationError;

/// Outcome of a completed voting round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteVerdict {
    Approved,
    Rejected,
}

/// Running tally of the current voting round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub mission: u8,
    pub approvals: usize,
    pub rejections: usize,
    /// Ballots still missing.
    pub outstanding: usize,
    /// Set once every voter has voted.
    pub verdict: Option<VoteVerdict>,
}

/// Approval rule.
#[must_use]
pub fn verdict(rejections: usize, reject_threshold: usize) -> VoteVerdict {
    if rejections < reject_threshold {
        VoteVerdict::Approved
    } else {
        VoteVerdict::Rejected
    }
}

/// Everyone but the leader votes.
pub fn voters(state: &GameState) -> impl Iterator<Item = PlayerId> + '_ {
    state.participants().map(|p| p.id).filter(move |&id| !state.is_leader(id))
}

/// Tally `mission`'s ballots.
#[must_use]
pub fn tally(state: &GameState, mission: &Mission, reject_threshold: usize) -> VoteTally {
    let rejections = mission.reject_count();
    let approvals = mission.votes.len() - rejections;
    let outstanding = voters(state).filter(|id| !mission.votes.contains_key(id)).count();

    VoteTally {
        mission: mission.number,
        approvals,
        rejections,
        outstanding,
        verdict: (outstanding == 0).then(|| verdict(rejections, reject_threshold)),
    }
}

/// Build the team for a proposal: leader first, then listed members.
///
/// The leader may appear in `members`; any other repeat is an error.
pub fn build_team(
    state: &GameState,
    leader: PlayerId,
    members: &[PlayerId],
    required: usize,
) -> Result<Team, ValidationError> {
    let mut team = Team::new();
    team.push(leader);

    let mut leader_listed = false;
    for &member in members {
        if state.participant(member).is_none() {
            return Err(ValidationError::UnknownParticipant(member));
        }
        if member == leader && !leader_listed {
            leader_listed = true;
            continue;
        }
        if team.contains(&member) {
            return Err(ValidationError::DuplicateTeamMember(member));
        }
        team.push(member);
    }

    if team.len() != required {
        return Err(ValidationError::WrongTeamSize {
            required,
            actual: team.len(),
        });
    }

    Ok(team)
}

/// Check that `voter` may still vote on `mission`.
pub fn check_ballot(state: &GameState, mission: &Mission, voter: PlayerId) -> Result<(), ValidationError> {
    if state.is_leader(voter) {
        return Err(ValidationError::LeaderCannotVote);
    }
    if mission.votes.contains_key(&voter) {
        return Err(ValidationError::AlreadyVoted(voter));
    }
    Ok(())
}

/// Whether a team currently sits before the voters.
#[must_use]
pub fn ballot_open(mission: &Mission) -> bool {
    mission.status == crate::core::MissionStatus::TeamVoting
}
