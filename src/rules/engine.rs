//! Rules engine trait and outcome types.
//!
//! A rules engine is a pure transition function over `GameState`:
//! - Which actions are legal for a participant
//! - How an action produces the next state
//! - Whether the game is over
//!
//! Transitions never modify their input. A rejected action returns an error
//! and the caller still holds the untouched previous state.

use serde::{Deserialize, Serialize};

use crate::core::{Action, EngineConfig, GameState, MissionStatus, Phase, PlayerId, Team};
use crate::error::GameError;
use crate::roles::Alignment;

/// Why the game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryReason {
    /// Evil failed enough missions.
    EvilMissions,
    /// Too many consecutive teams were rejected.
    RejectionLimit,
    /// The Assassin named Merlin.
    MerlinAssassinated,
    /// The Assassin named someone other than Merlin.
    AssassinMissed,
}

/// Result of a completed game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: Alignment,
    pub reason: VictoryReason,
    pub good_score: u8,
    pub evil_score: u8,
}

impl GameResult {
    /// Check if a side won.
    #[must_use]
    pub fn is_winner(&self, alignment: Alignment) -> bool {
        self.winner == alignment
    }
}

/// Something observable that happened during a transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    RolesAssigned,
    RoleAcknowledged(PlayerId),
    PhaseChanged { from: Phase, to: Phase },
    LeaderChanged(PlayerId),
    TeamProposed { mission: u8, leader: PlayerId, team: Team },
    VoteCast { voter: PlayerId },
    TeamApproved { mission: u8, approvals: usize, rejections: usize },
    TeamRejected { mission: u8, approvals: usize, rejections: usize, consecutive: u8 },
    /// Card contents stay hidden until the mission resolves.
    CardPlayed { player: PlayerId },
    MissionResolved { mission: u8, status: MissionStatus, fails: usize },
    AssassinationAttempted { target: PlayerId, hit: bool },
    VisionExpired(PlayerId),
    GameOver(GameResult),
}

/// The next state plus what happened on the way there.
#[derive(Clone, Debug)]
pub struct Transition {
    pub state: GameState,
    pub events: Vec<GameEvent>,
}

impl Transition {
    pub(crate) fn from_state(state: GameState) -> Self {
        Self { state, events: Vec::new() }
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Change phase and record the change.
    pub(crate) fn enter_phase(&mut self, to: Phase) {
        let from = self.state.phase;
        self.state.enter_phase(to);
        self.emit(GameEvent::PhaseChanged { from, to });
    }
}

/// Rules engine trait.
///
/// ## Implementation Notes
///
/// - `legal_actions`: empty when the participant cannot act
/// - `apply_action`: must be deterministic and must not mutate `state`
/// - `is_terminal`: `None` while the game continues
pub trait RulesEngine {
    /// Get the engine configuration.
    fn config(&self) -> &EngineConfig;

    /// Enumerate every legal action for a participant.
    fn legal_actions(&self, state: &GameState, player: PlayerId) -> Vec<Action>;

    /// Produce the state that follows `player` taking `action` at `now_ms`.
    fn apply_action(
        &self,
        state: &GameState,
        player: PlayerId,
        action: &Action,
        now_ms: u64,
    ) -> Result<Transition, GameError>;

    /// Check if the game is over.
    fn is_terminal(&self, state: &GameState) -> Option<GameResult>;

    // === Convenience Methods ===

    /// Check whether an action appears in the legal set.
    ///
    /// Proposals compare as sets, so member order does not matter.
    fn is_legal(&self, state: &GameState, player: PlayerId, action: &Action) -> bool {
        let normalise = |a: &Action| match a {
            Action::ProposeTeam { members } => {
                let mut members: Team = members.iter().copied().filter(|&m| m != player).collect();
                members.sort();
                Action::ProposeTeam { members }
            }
            other => other.clone(),
        };
        let wanted = normalise(action);
        self.legal_actions(state, player).iter().any(|a| normalise(a) == wanted)
    }

    /// Participants who currently owe the game an input.
    fn pending_actors(&self, state: &GameState) -> Vec<PlayerId> {
        state
            .participants()
            .map(|p| p.id)
            .filter(|&id| !self.legal_actions(state, id).is_empty())
            .collect()
    }
}
