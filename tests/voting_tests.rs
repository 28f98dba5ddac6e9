//! Team proposal and voting through the session surface.
//!
//! Seats are A..E = 0..4 and A leads the first mission.

use avalon_engine::core::{EngineConfig, MissionStatus, Participant, Phase, PlayerId, Vote};
use avalon_engine::error::{GameError, ValidationError};
use avalon_engine::game::GameSession;
use avalon_engine::roles::Alignment;
use avalon_engine::rules::{GameEvent, VictoryReason, VoteVerdict};

const A: PlayerId = PlayerId(0);
const B: PlayerId = PlayerId(1);
const C: PlayerId = PlayerId(2);
const D: PlayerId = PlayerId(3);
const E: PlayerId = PlayerId(4);

fn table_with(config: EngineConfig) -> GameSession {
    let roster = ["A", "B", "C", "D", "E"]
        .iter()
        .enumerate()
        .map(|(i, n)| Participant::human(PlayerId::new(i as u8), *n))
        .collect();
    let mut session = GameSession::new(config, roster, 17).unwrap();
    for id in PlayerId::all(5) {
        session.acknowledge_role(id).unwrap();
    }
    session
}

fn table() -> GameSession {
    table_with(EngineConfig::default())
}

/// Current leader proposes themselves plus the next seat; everyone rejects.
fn reject_round(session: &mut GameSession) {
    let leader = session.state().leader();
    let size = session.state().active_mission().unwrap().spec.team_size;
    let members: Vec<_> = (1..size).map(|k| PlayerId::new(((leader.index() + k) % 5) as u8)).collect();
    session.propose_team(leader, &members).unwrap();
    for voter in PlayerId::all(5).filter(|&id| id != leader) {
        session.cast_vote(voter, Vote::Reject).unwrap();
    }
}

#[test]
fn test_two_rejections_still_approve() {
    let mut session = table();

    let mission = session.propose_team(A, &[A, B]).unwrap();
    assert_eq!(mission.status, MissionStatus::TeamVoting);
    assert_eq!(mission.team.as_slice(), &[A, B]);

    session.cast_vote(B, Vote::Reject).unwrap();
    session.cast_vote(C, Vote::Reject).unwrap();
    session.cast_vote(D, Vote::Approve).unwrap();
    let tally = session.cast_vote(E, Vote::Approve).unwrap();

    assert_eq!(tally.verdict, Some(VoteVerdict::Approved));
    assert_eq!((tally.approvals, tally.rejections), (2, 2));
    assert_eq!(session.state().phase, Phase::MissionPlay);
    assert_eq!(session.state().consecutive_rejections, 0);
}

#[test]
fn test_three_rejections_pass_leadership() {
    let mut session = table();
    session.propose_team(A, &[A, B]).unwrap();

    session.cast_vote(B, Vote::Approve).unwrap();
    session.cast_vote(C, Vote::Reject).unwrap();
    session.cast_vote(D, Vote::Reject).unwrap();
    let tally = session.cast_vote(E, Vote::Reject).unwrap();

    assert_eq!(tally.verdict, Some(VoteVerdict::Rejected));
    assert_eq!(session.state().phase, Phase::TeamSelection);
    assert_eq!(session.state().consecutive_rejections, 1);
    assert_eq!(session.state().leader(), B);

    let mission = session.state().active_mission().unwrap();
    assert_eq!(mission.status, MissionStatus::TeamSelection);
    assert!(mission.team.is_empty());
    assert_eq!(mission.proposals, 1);
}

#[test]
fn test_partial_tally_has_no_verdict() {
    let mut session = table();
    session.propose_team(A, &[B]).unwrap();

    let tally = session.cast_vote(C, Vote::Reject).unwrap();
    assert_eq!(tally.outstanding, 3);
    assert_eq!(tally.verdict, None);
    assert_eq!(session.state().phase, Phase::TeamVoting);
}

// Approval compares rejections with a fixed threshold, not a majority of voters.
#[test]
fn test_approval_uses_absolute_reject_count() {
    let mut config = EngineConfig::default();
    config.reject_threshold = 2;
    let mut session = table_with(config);
    session.propose_team(A, &[B]).unwrap();

    session.cast_vote(B, Vote::Approve).unwrap();
    session.cast_vote(C, Vote::Approve).unwrap();
    session.cast_vote(D, Vote::Reject).unwrap();
    let tally = session.cast_vote(E, Vote::Reject).unwrap();

    assert_eq!(tally.verdict, Some(VoteVerdict::Rejected));
}

#[test]
fn test_four_rejections_evil_wins() {
    let mut session = table();
    for _ in 0..3 {
        reject_round(&mut session);
        assert!(session.result().is_none());
    }
    reject_round(&mut session);

    let result = session.result().unwrap();
    assert_eq!(result.winner, Alignment::Evil);
    assert_eq!(result.reason, VictoryReason::RejectionLimit);
    assert_eq!(result.evil_score, 3);
    assert_eq!(session.state().phase, Phase::GameOver);
    assert_eq!(session.state().consecutive_rejections, 4);
    assert_eq!(session.state().active_mission_index(), None);
    assert_eq!(session.state().mission(0).unwrap().status, MissionStatus::Pending);
    assert!(session.state().mission(0).unwrap().team.is_empty());
    assert!(session
        .events()
        .iter()
        .any(|e| matches!(e, GameEvent::TeamRejected { consecutive: 4, .. })));
}

#[test]
fn test_approval_resets_rejection_streak() {
    let mut session = table();
    reject_round(&mut session);
    reject_round(&mut session);
    assert_eq!(session.state().consecutive_rejections, 2);

    let leader = session.state().leader();
    session.propose_team(leader, &[A]).unwrap();
    for voter in PlayerId::all(5).filter(|&id| id != leader) {
        session.cast_vote(voter, Vote::Approve).unwrap();
    }
    assert_eq!(session.state().consecutive_rejections, 0);
}

#[test]
fn test_leader_cannot_vote() {
    let mut session = table();
    session.propose_team(A, &[B]).unwrap();
    let err = session.cast_vote(A, Vote::Approve).unwrap_err();
    assert_eq!(err, GameError::Validation(ValidationError::LeaderCannotVote));
}

#[test]
fn test_duplicate_vote_rejected() {
    let mut session = table();
    session.propose_team(A, &[B]).unwrap();
    session.cast_vote(C, Vote::Approve).unwrap();

    let before = session.state().clone();
    let err = session.cast_vote(C, Vote::Reject).unwrap_err();
    assert_eq!(err, GameError::Validation(ValidationError::AlreadyVoted(C)));
    assert_eq!(session.state(), &before);
}

#[test]
fn test_only_leader_proposes() {
    let mut session = table();
    let err = session.propose_team(C, &[C, D]).unwrap_err();
    assert_eq!(err, GameError::Validation(ValidationError::NotLeader { actor: C, leader: A }));
}

#[test]
fn test_team_size_enforced() {
    let mut session = table();
    let err = session.propose_team(A, &[B, C]).unwrap_err();
    assert_eq!(
        err,
        GameError::Validation(ValidationError::WrongTeamSize { required: 2, actual: 3 })
    );
    assert_eq!(session.state().phase, Phase::TeamSelection);
}

#[test]
fn test_vote_before_proposal_is_wrong_phase() {
    let mut session = table();
    let err = session.cast_vote(B, Vote::Approve).unwrap_err();
    assert!(matches!(
        err,
        GameError::Validation(ValidationError::WrongPhase { expected: Phase::TeamVoting, .. })
    ));
}

#[test]
fn test_input_after_rejection_limit_is_wrong_phase() {
    let mut session = table();
    for _ in 0..4 {
        reject_round(&mut session);
    }
    let leader = session.state().leader();

    let err = session.propose_team(leader, &[A]).unwrap_err();
    assert_eq!(
        err,
        GameError::Validation(ValidationError::WrongPhase {
            expected: Phase::TeamSelection,
            actual: Phase::GameOver
        })
    );
    let err = session.cast_vote(B, Vote::Approve).unwrap_err();
    assert_eq!(
        err,
        GameError::Validation(ValidationError::WrongPhase {
            expected: Phase::TeamVoting,
            actual: Phase::GameOver
        })
    );
}
