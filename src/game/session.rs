//! A running game: rules, state, clock and bots in one place.
//!
//! `GameSession` is the function-call surface of the engine. Human input
//! arrives through the typed methods (`propose_team`, `cast_vote`, ...);
//! bot input arrives through the scheduler. Both end up in
//! [`AvalonRules::apply_action`], so the state only ever changes through
//! the state machine.
//!
//! After every accepted transition the session:
//! 1. appends the transition's events to the log
//! 2. drops bot tasks scheduled for an earlier round
//! 3. schedules a turn for each bot that now owes an input
//! 4. schedules vision expiry for anyone who just acknowledged their role
//!
//! Once the game is over the queue is emptied.

use tracing::{debug, info, warn};

use crate::bots::{BotPolicy, HeuristicBot};
use serde::{Deserialize, Serialize};

use crate::core::{
    Action, BotConfig, DelayRange, EngineConfig, GameRng, GameRngState, GameState, Mission, MissionCard,
    Participant, Phase, PlayerId, Vote,
};
use crate::error::{GameError, StateInvariantError};
use crate::roles::VisionMap;
use crate::rules::voting::{self, VoteTally, VoteVerdict};
use crate::rules::{AvalonRules, GameEvent, GameResult, MissionOutcome, RulesEngine, Transition};
use crate::schedule::{ScheduledTask, Scheduler, TaskKind};

/// A single game in progress.
pub struct GameSession {
    rules: AvalonRules,
    state: GameState,
    scheduler: Scheduler,
    policy: Box<dyn BotPolicy>,
    bot_rng: GameRng,
    delay_rng: GameRng,
    events: Vec<GameEvent>,
}

/// Positions of the session's bot decision and bot delay streams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngCheckpoint {
    pub bots: GameRngState,
    pub delays: GameRngState,
}

/// Builder for creating a GameSession.
pub struct SessionBuilder {
    config: EngineConfig,
    participants: Vec<Participant>,
    seed: u64,
    policy: Option<Box<dyn BotPolicy>>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            participants: Vec::new(),
            seed: 0,
            policy: None,
        }
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bots(mut self, bots: BotConfig) -> Self {
        self.config.bots = bots;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn participant(mut self, participant: Participant) -> Self {
        self.participants.push(participant);
        self
    }

    pub fn participants(mut self, participants: impl IntoIterator<Item = Participant>) -> Self {
        self.participants.extend(participants);
        self
    }

    /// Replace the default `HeuristicBot`.
    pub fn policy(mut self, policy: impl BotPolicy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    /// Validate the config, deal roles and start the game.
    pub fn build(self) -> Result<GameSession, GameError> {
        let rules = AvalonRules::new(self.config)?;
        let policy = self
            .policy
            .unwrap_or_else(|| Box::new(HeuristicBot::new(rules.config().bots.knowledge)));
        GameSession::start(rules, self.participants, self.seed, policy)
    }
}

impl GameSession {
    /// Start a game with the default bot policy.
    pub fn new(config: EngineConfig, participants: Vec<Participant>, seed: u64) -> Result<Self, GameError> {
        SessionBuilder::new().config(config).participants(participants).seed(seed).build()
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    fn start(
        rules: AvalonRules,
        participants: Vec<Participant>,
        seed: u64,
        policy: Box<dyn BotPolicy>,
    ) -> Result<Self, GameError> {
        let root = GameRng::new(seed);
        let mut role_rng = root.for_context("roles");
        let lobby_state = rules.initial_state(participants);
        let transition = rules.start_game(&lobby_state, &mut role_rng, 0)?;

        let mut session = Self {
            rules,
            state: lobby_state,
            scheduler: Scheduler::new(),
            policy,
            bot_rng: root.for_context("bots"),
            delay_rng: root.for_context("delays"),
            events: Vec::new(),
        };
        session.commit(transition);
        info!("session started with seed {}", seed);
        Ok(session)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        self.rules.config()
    }

    #[must_use]
    pub fn rules(&self) -> &AvalonRules {
        &self.rules
    }

    /// Every event since the session started.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    #[must_use]
    pub fn result(&self) -> Option<&GameResult> {
        self.state.result()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// What `observer` can currently see of the table.
    #[must_use]
    pub fn vision(&self, observer: PlayerId) -> Option<&VisionMap> {
        self.state.visible_vision(observer, self.scheduler.now())
    }

    /// Where the bot streams currently stand. Saved alongside a state
    /// snapshot, this lets a replay draw the same decisions and delays.
    #[must_use]
    pub fn rng_checkpoint(&self) -> RngCheckpoint {
        RngCheckpoint {
            bots: self.bot_rng.state(),
            delays: self.delay_rng.state(),
        }
    }

    /// Rewind or fast-forward the bot streams to `checkpoint`.
    pub fn restore_rng(&mut self, checkpoint: &RngCheckpoint) {
        self.bot_rng = GameRng::from_state(&checkpoint.bots);
        self.delay_rng = GameRng::from_state(&checkpoint.delays);
    }

    /// Participants who owe an input in the current round.
    #[must_use]
    pub fn pending_actors(&self) -> Vec<PlayerId> {
        self.rules.pending_actors(&self.state)
    }

    // =========================================================================
    // Participant input
    // =========================================================================

    pub fn acknowledge_role(&mut self, participant: PlayerId) -> Result<(), GameError> {
        self.submit(participant, Action::AcknowledgeRole).map(drop)
    }

    /// Leader proposes a team. Returns the mission as it stands after the proposal.
    pub fn propose_team(&mut self, leader: PlayerId, members: &[PlayerId]) -> Result<Mission, GameError> {
        let index = self.state.active_mission_index();
        self.submit(leader, Action::propose(members.iter().copied()))?;
        self.mission_snapshot(index)
    }

    /// Record a ballot. Once every voter is in, the tally carries the verdict.
    pub fn cast_vote(&mut self, voter: PlayerId, vote: Vote) -> Result<VoteTally, GameError> {
        let index = self.state.active_mission_index();
        let events = self.submit(voter, Action::CastVote(vote))?;

        let resolved = events.iter().find_map(|event| match *event {
            GameEvent::TeamApproved { mission, approvals, rejections } => {
                Some((mission, approvals, rejections, VoteVerdict::Approved))
            }
            GameEvent::TeamRejected { mission, approvals, rejections, .. } => {
                Some((mission, approvals, rejections, VoteVerdict::Rejected))
            }
            _ => None,
        });

        match resolved {
            Some((mission, approvals, rejections, verdict)) => Ok(VoteTally {
                mission,
                approvals,
                rejections,
                outstanding: 0,
                verdict: Some(verdict),
            }),
            None => {
                let mission = index
                    .and_then(|i| self.state.mission(i))
                    .ok_or(StateInvariantError::NoActiveMission)?;
                Ok(voting::tally(&self.state, mission, self.rules.config().reject_threshold))
            }
        }
    }

    /// Play a mission card.
    pub fn play_card(&mut self, participant: PlayerId, card: MissionCard) -> Result<MissionOutcome, GameError> {
        let index = self.state.active_mission_index();
        self.submit(participant, Action::PlayCard(card))?;
        let mission = index
            .and_then(|i| self.state.mission(i))
            .ok_or(StateInvariantError::NoActiveMission)?;
        Ok(MissionOutcome::of(mission))
    }

    /// Name the assassination target and end the game.
    pub fn confirm_assassination(&mut self, assassin: PlayerId, target: PlayerId) -> Result<GameResult, GameError> {
        self.submit(assassin, Action::ConfirmAssassination { target })?;
        self.state.result().cloned().ok_or_else(|| StateInvariantError::NoResult.into())
    }

    /// Submit any action on behalf of `actor`.
    ///
    /// Returns the events the action produced. On error nothing changes.
    pub fn submit(&mut self, actor: PlayerId, action: Action) -> Result<Vec<GameEvent>, GameError> {
        let transition = self
            .rules
            .apply_action(&self.state, actor, &action, self.scheduler.now())?;
        let events = transition.events.clone();
        self.commit(transition);
        Ok(events)
    }

    // =========================================================================
    // Time
    // =========================================================================

    /// Move the clock forward `ms`, firing everything that falls due.
    pub fn advance_time(&mut self, ms: u64) {
        let until = self.scheduler.now().saturating_add(ms);
        while let Some(task) = self.scheduler.pop_due(until) {
            self.fire(task);
        }
        self.scheduler.advance_to(until);
    }

    /// Fire tasks until the queue is empty.
    ///
    /// Returns the number of tasks fired. With humans seated this stops as
    /// soon as the game waits on them.
    pub fn run_until_idle(&mut self) -> usize {
        let mut fired = 0;
        while let Some(due) = self.scheduler.next_due() {
            let Some(task) = self.scheduler.pop_due(due) else { break };
            self.fire(task);
            fired += 1;
        }
        fired
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// The mission at `index`, captured before the input was applied.
    fn mission_snapshot(&self, index: Option<usize>) -> Result<Mission, GameError> {
        index
            .and_then(|i| self.state.mission(i))
            .cloned()
            .ok_or_else(|| StateInvariantError::NoActiveMission.into())
    }

    fn commit(&mut self, transition: Transition) {
        let Transition { state, events } = transition;
        let now = self.scheduler.now();

        for event in &events {
            if let GameEvent::RoleAcknowledged(observer) = *event {
                if let Some(grant) = state.vision_grant(observer) {
                    let delay = grant.expires_at_ms.saturating_sub(now);
                    self.scheduler
                        .schedule(delay, state.round_token(), TaskKind::ExpireVision { observer });
                }
            }
        }

        self.events.extend(events);
        self.state = state;
        if self.state.is_over() {
            self.scheduler.clear();
            return;
        }
        self.scheduler.discard_stale(self.state.round_token());
        self.schedule_bots();
    }

    fn schedule_bots(&mut self) {
        let token = self.state.round_token();
        let delays = self.delay_for(self.state.phase);

        for actor in self.rules.pending_actors(&self.state) {
            let is_bot = self.state.participant(actor).is_some_and(Participant::is_bot);
            let kind = TaskKind::BotTurn { actor };
            if !is_bot || self.scheduler.has_pending(token, kind) {
                continue;
            }
            let delay = self.delay_rng.gen_range_u64(delays.as_range());
            self.scheduler.schedule(delay, token, kind);
            debug!("{} scheduled to act in {} ms ({})", actor, delay, token.phase);
        }
    }

    fn delay_for(&self, phase: Phase) -> DelayRange {
        let bots = &self.rules.config().bots;
        match phase {
            Phase::TeamSelection => bots.proposal_delay,
            Phase::TeamVoting => bots.vote_delay,
            Phase::MissionPlay => bots.card_delay,
            Phase::Assassination => bots.assassination_delay,
            _ => DelayRange::instant(),
        }
    }

    fn fire(&mut self, task: ScheduledTask) {
        match task.kind {
            TaskKind::ExpireVision { observer } => {
                let transition = self.rules.expire_vision(&self.state, observer);
                self.commit(transition);
            }
            TaskKind::BotTurn { actor } => {
                if task.token != self.state.round_token() {
                    debug!("dropping stale turn for {}", actor);
                    return;
                }
                let Some(action) = self.policy.decide(&self.state, actor, &mut self.bot_rng) else {
                    return;
                };
                if let Err(err) = self.submit(actor, action) {
                    warn!("bot {} action refused: {}", actor, err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BotConfig, MissionStatus};

    fn bots() -> Vec<Participant> {
        ["Guinevere", "Lancelot", "Uther", "Galahad", "Percy"]
            .iter()
            .enumerate()
            .map(|(i, n)| Participant::bot(PlayerId::new(i as u8), *n))
            .collect()
    }

    fn humans() -> Vec<Participant> {
        ["A", "B", "C", "D", "E"]
            .iter()
            .enumerate()
            .map(|(i, n)| Participant::human(PlayerId::new(i as u8), *n))
            .collect()
    }

    #[test]
    fn test_all_bot_game_finishes() {
        let mut session = GameSession::builder()
            .participants(bots())
            .bots(BotConfig::instant())
            .seed(11)
            .build()
            .unwrap();
        session.run_until_idle();
        assert!(session.result().is_some());
        assert_eq!(session.state().phase, Phase::GameOver);
    }

    #[test]
    fn test_humans_wait_for_acknowledgement() {
        let mut session = GameSession::new(EngineConfig::default(), humans(), 1).unwrap();
        assert_eq!(session.state().phase, Phase::RoleReveal);

        for id in PlayerId::all(5) {
            session.acknowledge_role(id).unwrap();
        }
        assert_eq!(session.state().phase, Phase::TeamSelection);
        assert_eq!(
            session.state().active_mission().map(|m| m.status),
            Some(MissionStatus::TeamSelection)
        );
    }

    #[test]
    fn test_vision_window() {
        let mut session = GameSession::new(EngineConfig::default(), humans(), 4).unwrap();
        let merlin = session.state().holder_of(crate::roles::Role::Merlin).unwrap();
        session.acknowledge_role(merlin).unwrap();

        assert_eq!(session.vision(merlin).map(|v| v.len()), Some(2));
        session.advance_time(9_999);
        assert!(session.vision(merlin).is_some());
        session.advance_time(1);
        assert!(session.vision(merlin).is_none());
    }

    #[test]
    fn test_rejected_input_changes_nothing() {
        let mut session = GameSession::new(EngineConfig::default(), humans(), 2).unwrap();
        for id in PlayerId::all(5) {
            session.acknowledge_role(id).unwrap();
        }
        let before = session.state().clone();
        let events = session.events().len();

        assert!(session.propose_team(PlayerId::new(3), &[PlayerId::new(1)]).is_err());
        assert_eq!(session.state(), &before);
        assert_eq!(session.events().len(), events);
    }

    #[test]
    fn test_game_over_empties_queue() {
        let mut session = GameSession::new(EngineConfig::default(), humans(), 3).unwrap();
        for id in PlayerId::all(5) {
            session.acknowledge_role(id).unwrap();
        }
        assert!(session.scheduler().pending_count() >= 5);

        for _ in 0..4 {
            let leader = session.state().leader();
            let next = leader.next(5);
            let size = session.state().active_mission().unwrap().spec.team_size;
            let members: Vec<_> = std::iter::successors(Some(next), |id| Some(id.next(5)))
                .take(size - 1)
                .collect();
            session.propose_team(leader, &members).unwrap();
            for voter in PlayerId::all(5).filter(|&id| id != leader) {
                session.cast_vote(voter, Vote::Reject).unwrap();
            }
        }

        assert_eq!(session.state().phase, Phase::GameOver);
        assert!(session.scheduler().is_idle());
        assert_eq!(session.run_until_idle(), 0);
    }

    #[test]
    fn test_rng_checkpoint_round_trips() {
        let run = |seed| {
            let mut session = GameSession::new(EngineConfig::default(), bots(), seed).unwrap();
            session.run_until_idle();
            session.rng_checkpoint()
        };
        let checkpoint = run(21);
        assert_eq!(checkpoint, run(21));
        assert_ne!(checkpoint, run(22));

        let json = serde_json::to_string(&checkpoint).unwrap();
        let decoded: RngCheckpoint = serde_json::from_str(&json).unwrap();

        let mut fresh = GameSession::new(EngineConfig::default(), bots(), 99).unwrap();
        fresh.restore_rng(&decoded);
        assert_eq!(fresh.rng_checkpoint(), checkpoint);
    }
}
