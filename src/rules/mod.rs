//! Rules engine and the quest game's rules.
//!
//! `RulesEngine` defines:
//! - Legal actions for each game state
//! - How actions produce the next state
//! - Win/loss conditions
//!
//! `AvalonRules` implements it for the five-seat game. The helper modules
//! hold the checks and arithmetic of each phase so they can be tested on
//! their own.

pub mod assassination;
pub mod avalon;
pub mod engine;
pub mod missions;
pub mod voting;

pub use avalon::AvalonRules;
pub use engine::{GameEvent, GameResult, RulesEngine, Transition, VictoryReason};
pub use missions::MissionOutcome;
pub use voting::{VoteTally, VoteVerdict};
