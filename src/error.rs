//! Error types for the engine.
//!
//! Every error is local and recoverable: the operation that produced it
//! left the game state untouched, and repeating the call with corrected
//! input is the intended recovery path.

use thiserror::Error;

use crate::core::{Phase, PlayerId};

/// Setup problems detected before or while starting a game.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Role assignment needs an exact participant count.
    #[error("expected exactly {expected} participants, found {actual}")]
    WrongParticipantCount { expected: usize, actual: usize },

    /// Some seated participants are not ready or not online.
    #[error("participants not ready or offline: {0:?}")]
    ParticipantsNotReady(Vec<String>),

    /// The mission ladder is malformed.
    #[error("invalid mission ladder: {0}")]
    InvalidLadder(String),

    /// A numeric setting is out of range.
    #[error("invalid setting '{name}': {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    /// A configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// An illegal action: wrong phase, wrong actor, or a rule violation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("action requires phase {expected}, game is in {actual}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("{0} is not seated in this game")]
    UnknownParticipant(PlayerId),

    #[error("{actor} is not the current leader ({leader})")]
    NotLeader { actor: PlayerId, leader: PlayerId },

    #[error("team needs exactly {required} members, got {actual}")]
    WrongTeamSize { required: usize, actual: usize },

    #[error("{0} appears more than once in the proposed team")]
    DuplicateTeamMember(PlayerId),

    #[error("the leader does not vote on their own team")]
    LeaderCannotVote,

    #[error("{0} has already voted this round")]
    AlreadyVoted(PlayerId),

    #[error("{0} is not on the mission team")]
    NotOnTeam(PlayerId),

    #[error("{0} has already played a mission card")]
    AlreadyPlayed(PlayerId),

    #[error("{0} is Good and must play Success")]
    CardNotAllowed(PlayerId),

    #[error("{0} does not hold the Assassin role")]
    NotAssassin(PlayerId),

    #[error("{0} is not a valid assassination target")]
    InvalidTarget(PlayerId),

    #[error("{0} has already acknowledged their role")]
    AlreadyAcknowledged(PlayerId),

    #[error("the lobby is locked")]
    LobbyLocked,

    #[error("the lobby is full ({0} seats)")]
    LobbyFull(usize),

    #[error("no lobby member with id '{0}'")]
    UnknownLobbyMember(String),

    #[error("lobby member '{0}' is already present")]
    DuplicateLobbyMember(String),

    #[error("'{0}' is not the lobby admin")]
    NotLobbyAdmin(String),
}

/// Defensive errors: an attempt to resolve something twice.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StateInvariantError {
    #[error("mission {0} is already resolved")]
    MissionAlreadyResolved(u8),

    #[error("no mission is currently active")]
    NoActiveMission,

    #[error("round is not complete: {remaining} input(s) outstanding")]
    RoundIncomplete { remaining: usize },

    #[error("the game has not produced a result")]
    NoResult,
}

/// Umbrella error returned by the game surface.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Invariant(#[from] StateInvariantError),
}

impl GameError {
    /// Check whether this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, GameError::Validation(_))
    }
}
