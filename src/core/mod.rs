//! Core engine types: participants, state, actions, RNG, configuration.

pub mod action;
pub mod config;
pub mod player;
pub mod rng;
pub mod state;

pub use action::{Action, ActionRecord, MissionCard, Team, Vote};
pub use config::{
    default_ladder, BotConfig, BotKnowledge, DelayRange, EngineConfig, MissionSpec, MISSION_COUNT,
    PARTICIPANT_COUNT,
};
pub use player::{Participant, ParticipantKind, PlayerId, PlayerMap};
pub use rng::{GameRng, GameRngState};
pub use state::{GameState, Mission, MissionStatus, Phase, RoundToken, Scoreboard, VisionGrant};
