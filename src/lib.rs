//! # avalon-engine
//!
//! Rules engine and bots for a five-player hidden-role quest game.
//!
//! Three Good and two Evil participants play up to five missions. A rotating
//! leader proposes a team, everyone else votes on it, and an approved team
//! secretly plays Success or Fail cards. Three successful missions give Good
//! the lead, but the Assassin then gets one guess at Merlin to steal the win.
//!
//! ## Design Principles
//!
//! 1. **One mutator**: `AvalonRules::apply_action` is the only way a
//!    `GameState` changes. Humans, bots and timers all submit `Action`s.
//!
//! 2. **Pure transitions**: applying an action clones the state (O(1) via
//!    `im-rs`) and returns the next one. A rejected action leaves the
//!    caller's state untouched.
//!
//! 3. **Virtual time**: bot thinking delays and vision expiry are tasks in a
//!    deterministic scheduler, each stamped with the round it belongs to.
//!    Tasks for a finished round are dropped instead of firing.
//!
//! ## Modules
//!
//! - `core`: participants, state, actions, RNG, configuration
//! - `roles`: role catalog, role dealing, private vision
//! - `rules`: `RulesEngine` trait, the state machine, phase helpers
//! - `bots`: bot beliefs and the heuristic policy
//! - `schedule`: virtual-time task queue
//! - `game`: lobby and the `GameSession` surface
//! - `error`: error types

pub mod bots;
pub mod core;
pub mod error;
pub mod game;
pub mod roles;
pub mod rules;
pub mod schedule;

pub use crate::core::{Action, EngineConfig, GameState, MissionCard, Participant, Phase, PlayerId, Vote};
pub use crate::error::{ConfigError, GameError, StateInvariantError, ValidationError};
pub use crate::game::{GameSession, Lobby};
pub use crate::roles::{Alignment, Role};
pub use crate::rules::{AvalonRules, GameEvent, GameResult, RulesEngine, VictoryReason};
