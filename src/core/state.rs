//! Game state.
//!
//! ## GameState
//!
//! One value holding everything the rules need:
//! - Phase, leader, active mission, round epoch
//! - Participants (fixed seating order) with roles
//! - The mission ladder and its per-mission tallies
//! - Scores and the consecutive-rejection counter
//! - Time-limited role-reveal vision
//! - Action history
//!
//! States are treated as immutable values: the rules engine clones, mutates
//! the clone and hands it back. `im` persistent collections keep those
//! clones O(1).

use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};

use super::action::{ActionRecord, MissionCard, Team, Vote};
use super::config::MissionSpec;
use super::player::{Participant, PlayerId, PlayerMap};
use crate::roles::{Role, VisionMap};
use crate::rules::GameResult;

/// Top-level game phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    LobbySetup,
    RoleReveal,
    TeamSelection,
    TeamVoting,
    MissionPlay,
    Assassination,
    GameOver,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::LobbySetup => "lobby_setup",
            Phase::RoleReveal => "role_reveal",
            Phase::TeamSelection => "team_selection",
            Phase::TeamVoting => "team_voting",
            Phase::MissionPlay => "mission_play",
            Phase::Assassination => "assassination",
            Phase::GameOver => "game_over",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a single mission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Pending,
    TeamSelection,
    TeamVoting,
    InProgress,
    Success,
    Fail,
}

impl MissionStatus {
    #[must_use]
    pub fn is_resolved(self) -> bool {
        matches!(self, MissionStatus::Success | MissionStatus::Fail)
    }
}

/// One rung of the mission ladder and its current round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    /// 1-based ordinal.
    pub number: u8,
    pub spec: MissionSpec,
    pub status: MissionStatus,
    /// Leader first, then members in proposal order. Fixed once in progress.
    pub team: Team,
    /// Ballots of the current voting round.
    pub votes: OrdMap<PlayerId, Vote>,
    /// Cards played so far.
    pub plays: OrdMap<PlayerId, MissionCard>,
    /// Teams proposed for this mission so far.
    pub proposals: u8,
}

impl Mission {
    #[must_use]
    pub fn new(number: u8, spec: MissionSpec) -> Self {
        Self {
            number,
            spec,
            status: MissionStatus::Pending,
            team: Team::new(),
            votes: OrdMap::new(),
            plays: OrdMap::new(),
            proposals: 0,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status.is_resolved()
    }

    #[must_use]
    pub fn on_team(&self, player: PlayerId) -> bool {
        self.team.contains(&player)
    }

    #[must_use]
    pub fn fail_count(&self) -> usize {
        self.plays.values().filter(|&&c| c == MissionCard::Fail).count()
    }

    #[must_use]
    pub fn reject_count(&self) -> usize {
        self.votes.values().filter(|&&v| v == Vote::Reject).count()
    }
}

/// Mission wins per side, clamped to the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub good: u8,
    pub evil: u8,
    cap: u8,
}

impl Scoreboard {
    #[must_use]
    pub fn new(cap: u8) -> Self {
        Self { good: 0, evil: 0, cap }
    }

    /// The win target both scores are clamped to.
    #[must_use]
    pub fn cap(&self) -> u8 {
        self.cap
    }

    pub fn add_good(&mut self, points: u8) {
        self.good = self.good.saturating_add(points).min(self.cap);
    }

    pub fn add_evil(&mut self, points: u8) {
        self.evil = self.evil.saturating_add(points).min(self.cap);
    }

    /// Good takes the game; Evil is held below the target.
    pub fn force_good_win(&mut self) {
        self.good = self.cap;
        self.evil = self.evil.min(self.cap.saturating_sub(1));
    }

    /// Evil takes the game; Good is held below the target.
    pub fn force_evil_win(&mut self) {
        self.evil = self.cap;
        self.good = self.good.min(self.cap.saturating_sub(1));
    }

    #[must_use]
    pub fn good_reached(&self) -> bool {
        self.good >= self.cap
    }

    #[must_use]
    pub fn evil_reached(&self) -> bool {
        self.evil >= self.cap
    }
}

/// Identifies one input-collection round.
///
/// Scheduled work captures the token current at scheduling time and is
/// discarded if the token has moved on by the time it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundToken {
    pub phase: Phase,
    pub mission: Option<usize>,
    pub epoch: u32,
}

/// Vision handed to an observer when they confirm their role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionGrant {
    pub sightings: VisionMap,
    /// Virtual time after which the grant is no longer visible.
    pub expires_at_ms: u64,
}

/// Complete game state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub phase: Phase,
    participants: Vector<Participant>,
    missions: Vector<Mission>,
    active_mission: Option<usize>,
    leader: PlayerId,
    pub scores: Scoreboard,
    pub consecutive_rejections: u8,
    epoch: u32,
    vision: PlayerMap<Option<VisionGrant>>,
    history: Vector<ActionRecord>,
    result: Option<GameResult>,
}

impl GameState {
    /// Create a lobby-phase state. Seat 0 leads first.
    ///
    /// Participant ids are normalised to their position in `participants`.
    /// Seats past the 255th are dropped, as are ladder entries past the 255th.
    #[must_use]
    pub fn new(participants: Vec<Participant>, ladder: &[MissionSpec], wins_required: u8) -> Self {
        let participants: Vector<Participant> = (0..u8::MAX)
            .zip(participants)
            .map(|(i, p)| Participant { id: PlayerId::new(i), ..p })
            .collect();
        let count = participants.len().max(1);

        Self {
            phase: Phase::LobbySetup,
            participants,
            missions: ladder
                .iter()
                .zip(1..=u8::MAX)
                .map(|(&spec, number)| Mission::new(number, spec))
                .collect(),
            active_mission: None,
            leader: PlayerId::new(0),
            scores: Scoreboard::new(wins_required),
            consecutive_rejections: 0,
            epoch: 0,
            vision: PlayerMap::with_value(count, None),
            history: Vector::new(),
            result: None,
        }
    }

    // === Participants ===

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    #[must_use]
    pub fn participant(&self, id: PlayerId) -> Option<&Participant> {
        self.participants.get(id.index())
    }

    #[must_use]
    pub fn role_of(&self, id: PlayerId) -> Option<Role> {
        self.participant(id).and_then(|p| p.role)
    }

    /// Seat holding `role`, if dealt.
    #[must_use]
    pub fn holder_of(&self, role: Role) -> Option<PlayerId> {
        self.participants.iter().find(|p| p.role == Some(role)).map(|p| p.id)
    }

    pub(crate) fn participant_mut(&mut self, id: PlayerId) -> Option<&mut Participant> {
        self.participants.get_mut(id.index())
    }

    pub(crate) fn replace_participants(&mut self, participants: Vec<Participant>) {
        self.participants = participants.into_iter().collect();
    }

    // === Leadership ===

    #[must_use]
    pub fn leader(&self) -> PlayerId {
        self.leader
    }

    #[must_use]
    pub fn is_leader(&self, id: PlayerId) -> bool {
        self.leader == id
    }

    pub(crate) fn advance_leader(&mut self) {
        self.leader = self.leader.next(self.participant_count());
    }

    // === Missions ===

    pub fn missions(&self) -> impl Iterator<Item = &Mission> {
        self.missions.iter()
    }

    #[must_use]
    pub fn mission(&self, index: usize) -> Option<&Mission> {
        self.missions.get(index)
    }

    #[must_use]
    pub fn active_mission_index(&self) -> Option<usize> {
        self.active_mission
    }

    #[must_use]
    pub fn active_mission(&self) -> Option<&Mission> {
        self.active_mission.and_then(|i| self.missions.get(i))
    }

    pub(crate) fn mission_mut(&mut self, index: usize) -> Option<&mut Mission> {
        self.missions.get_mut(index)
    }

    pub(crate) fn set_active_mission(&mut self, index: Option<usize>) {
        self.active_mission = index;
    }

    /// First mission still pending.
    #[must_use]
    pub fn next_pending_mission(&self) -> Option<usize> {
        self.missions.iter().position(|m| m.status == MissionStatus::Pending)
    }

    #[must_use]
    pub fn resolved_missions(&self) -> usize {
        self.missions.iter().filter(|m| m.is_resolved()).count()
    }

    // === Rounds ===

    /// Change phase and open a new round.
    pub(crate) fn enter_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.epoch += 1;
    }

    #[must_use]
    pub fn round_token(&self) -> RoundToken {
        RoundToken {
            phase: self.phase,
            mission: self.active_mission,
            epoch: self.epoch,
        }
    }

    // === Vision ===

    /// Sightings visible to `observer` at virtual time `now_ms`.
    #[must_use]
    pub fn visible_vision(&self, observer: PlayerId, now_ms: u64) -> Option<&VisionMap> {
        if observer.index() >= self.vision.player_count() {
            return None;
        }
        self.vision[observer]
            .as_ref()
            .filter(|grant| now_ms < grant.expires_at_ms)
            .map(|grant| &grant.sightings)
    }

    #[must_use]
    pub fn vision_grant(&self, observer: PlayerId) -> Option<&VisionGrant> {
        if observer.index() >= self.vision.player_count() {
            return None;
        }
        self.vision[observer].as_ref()
    }

    pub(crate) fn set_vision(&mut self, observer: PlayerId, grant: Option<VisionGrant>) {
        if observer.index() < self.vision.player_count() {
            self.vision[observer] = grant;
        }
    }

    // === History / outcome ===

    pub fn history(&self) -> impl Iterator<Item = &ActionRecord> {
        self.history.iter()
    }

    pub(crate) fn record(&mut self, record: ActionRecord) {
        self.history.push_back(record);
    }

    #[must_use]
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub(crate) fn set_result(&mut self, result: GameResult) {
        self.result = Some(result);
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
}
