//! The five-seat quest game state machine.
//!
//! `AvalonRules` is the single place that produces new `GameState`s.
//! Every other component (bots, scheduler, session) computes intents and
//! submits them here.
//!
//! ```text
//! lobby_setup -> role_reveal -> team_selection -> team_voting -> mission_play
//!                                    ^   ^              |             |
//!                                    |   +-- rejected --+             |
//!                                    +------- next mission -----------+
//! mission_play -> assassination -> game_over
//! team_voting / mission_play -> game_over
//! ```

use tracing::{debug, info, warn};

use crate::core::{
    Action, ActionRecord, EngineConfig, GameRng, GameState, MissionCard, MissionStatus, Phase, PlayerId, Team,
    Vote, VisionGrant, PARTICIPANT_COUNT,
};
use crate::error::{ConfigError, GameError, StateInvariantError, ValidationError};
use crate::roles::{assign_roles, vision_for, Alignment, Role};

use super::assassination;
use super::engine::{GameEvent, GameResult, RulesEngine, Transition, VictoryReason};
use super::missions;
use super::voting::{self, VoteVerdict};

/// Rules for the fixed five-seat game.
#[derive(Clone, Debug)]
pub struct AvalonRules {
    config: EngineConfig,
}

impl AvalonRules {
    /// Create rules from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Fresh lobby-phase state for `participants`.
    #[must_use]
    pub fn initial_state(&self, participants: Vec<crate::core::Participant>) -> GameState {
        GameState::new(participants, &self.config.ladder, self.config.wins_required)
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// `lobby_setup -> role_reveal`: deal roles.
    ///
    /// Requires exactly five participants, all ready and online. Bots
    /// acknowledge their role on the spot; if every seat is a bot the game
    /// goes straight on to team selection.
    pub fn start_game(&self, state: &GameState, rng: &mut GameRng, now_ms: u64) -> Result<Transition, GameError> {
        expect_phase(state, Phase::LobbySetup)?;

        if state.participant_count() != PARTICIPANT_COUNT {
            return Err(ConfigError::WrongParticipantCount {
                expected: PARTICIPANT_COUNT,
                actual: state.participant_count(),
            }
            .into());
        }

        let not_ready: Vec<String> = state
            .participants()
            .filter(|p| !p.ready || !p.online)
            .map(|p| p.name.clone())
            .collect();
        if !not_ready.is_empty() {
            return Err(ConfigError::ParticipantsNotReady(not_ready).into());
        }

        let roster: Vec<_> = state.participants().cloned().collect();
        let assigned = assign_roles(&roster, rng)?;

        let mut t = Transition::from_state(state.clone());
        t.state.replace_participants(assigned);
        t.emit(GameEvent::RolesAssigned);
        t.enter_phase(Phase::RoleReveal);
        info!("game started, leader {}", t.state.leader());

        let bots: Vec<PlayerId> = t.state.participants().filter(|p| p.is_bot()).map(|p| p.id).collect();
        for bot in bots {
            self.acknowledge(&mut t, bot, now_ms)?;
        }

        Ok(t)
    }

    /// Hide an observer's role-reveal vision.
    #[must_use]
    pub fn expire_vision(&self, state: &GameState, observer: PlayerId) -> Transition {
        let mut t = Transition::from_state(state.clone());
        if t.state.vision_grant(observer).is_some() {
            t.state.set_vision(observer, None);
            t.emit(GameEvent::VisionExpired(observer));
            debug!("vision expired for {}", observer);
        }
        t
    }

    // =========================================================================
    // Action handlers
    // =========================================================================

    fn acknowledge(&self, t: &mut Transition, actor: PlayerId, now_ms: u64) -> Result<(), GameError> {
        let participant = t
            .state
            .participant_mut(actor)
            .ok_or(ValidationError::UnknownParticipant(actor))?;
        if participant.acknowledged {
            return Err(ValidationError::AlreadyAcknowledged(actor).into());
        }
        participant.acknowledged = true;

        let roster: Vec<_> = t.state.participants().cloned().collect();
        let grant = VisionGrant {
            sightings: vision_for(&roster, actor),
            expires_at_ms: now_ms.saturating_add(self.config.vision_window_ms),
        };
        t.state.set_vision(actor, Some(grant));
        t.emit(GameEvent::RoleAcknowledged(actor));

        if t.state.participants().all(|p| p.acknowledged) {
            self.open_mission(t, 0)?;
        }
        Ok(())
    }

    fn propose(&self, t: &mut Transition, actor: PlayerId, members: &[PlayerId]) -> Result<(), GameError> {
        let leader = t.state.leader();
        if actor != leader {
            return Err(ValidationError::NotLeader { actor, leader }.into());
        }

        let index = active_index(&t.state)?;
        let (required, number) = {
            let mission = active(&t.state, index)?;
            if mission.status != MissionStatus::TeamSelection {
                return Err(StateInvariantError::NoActiveMission.into());
            }
            (mission.spec.team_size, mission.number)
        };

        let team = voting::build_team(&t.state, leader, members, required)?;

        let mission = active_mut(&mut t.state, index)?;
        mission.team = team.clone();
        mission.votes.clear();
        mission.proposals += 1;
        mission.status = MissionStatus::TeamVoting;

        debug!("mission {} team proposed by {}: {:?}", number, leader, team.as_slice());
        t.emit(GameEvent::TeamProposed { mission: number, leader, team });
        t.enter_phase(Phase::TeamVoting);
        Ok(())
    }

    fn vote(&self, t: &mut Transition, actor: PlayerId, vote: Vote) -> Result<(), GameError> {
        let index = active_index(&t.state)?;
        {
            let mission = active(&t.state, index)?;
            if !voting::ballot_open(mission) {
                return Err(StateInvariantError::NoActiveMission.into());
            }
            voting::check_ballot(&t.state, mission, actor)?;
        }

        active_mut(&mut t.state, index)?.votes.insert(actor, vote);
        t.emit(GameEvent::VoteCast { voter: actor });

        let tally = voting::tally(&t.state, active(&t.state, index)?, self.config.reject_threshold);
        match tally.verdict {
            Some(verdict) => self.resolve_votes(t, index, verdict, tally.approvals, tally.rejections),
            None => Ok(()),
        }
    }

    fn resolve_votes(
        &self,
        t: &mut Transition,
        index: usize,
        verdict: VoteVerdict,
        approvals: usize,
        rejections: usize,
    ) -> Result<(), GameError> {
        let number = active(&t.state, index)?.number;

        match verdict {
            VoteVerdict::Approved => {
                t.state.consecutive_rejections = 0;
                let mission = active_mut(&mut t.state, index)?;
                mission.status = MissionStatus::InProgress;
                mission.plays.clear();

                info!("mission {} team approved ({} for, {} against)", number, approvals, rejections);
                t.emit(GameEvent::TeamApproved { mission: number, approvals, rejections });
                t.enter_phase(Phase::MissionPlay);
            }
            VoteVerdict::Rejected => {
                t.state.consecutive_rejections = t
                    .state
                    .consecutive_rejections
                    .saturating_add(1)
                    .min(self.config.max_consecutive_rejections);
                let consecutive = t.state.consecutive_rejections;

                info!(
                    "mission {} team rejected ({} for, {} against), rejection {} of {}",
                    number, approvals, rejections, consecutive, self.config.max_consecutive_rejections
                );
                t.emit(GameEvent::TeamRejected { mission: number, approvals, rejections, consecutive });

                if consecutive >= self.config.max_consecutive_rejections {
                    // Never sent: left unplayed.
                    let mission = active_mut(&mut t.state, index)?;
                    mission.status = MissionStatus::Pending;
                    mission.team.clear();
                    mission.votes.clear();
                    t.state.set_active_mission(None);
                    t.state.scores.add_evil(self.config.wins_required);
                    self.finish(t, Alignment::Evil, VictoryReason::RejectionLimit);
                } else {
                    let mission = active_mut(&mut t.state, index)?;
                    mission.status = MissionStatus::TeamSelection;
                    mission.team.clear();
                    self.pass_leadership(t);
                    t.enter_phase(Phase::TeamSelection);
                }
            }
        }
        Ok(())
    }

    fn play(&self, t: &mut Transition, actor: PlayerId, card: MissionCard) -> Result<(), GameError> {
        let index = active_index(&t.state)?;
        missions::check_play(&t.state, active(&t.state, index)?, actor, card)?;

        let mission = active_mut(&mut t.state, index)?;
        mission.plays.insert(actor, card);
        let complete = mission.plays.len() == mission.team.len();
        t.emit(GameEvent::CardPlayed { player: actor });

        if complete {
            self.advance_phase(t, index)?;
        }
        Ok(())
    }

    /// Resolve a completed mission and pick the next phase.
    fn advance_phase(&self, t: &mut Transition, index: usize) -> Result<(), GameError> {
        let status = missions::resolve(active(&t.state, index)?)?;

        let mission = active_mut(&mut t.state, index)?;
        mission.status = status;
        let number = mission.number;
        let fails = mission.fail_count();

        match status {
            MissionStatus::Fail => t.state.scores.add_evil(1),
            _ => t.state.scores.add_good(1),
        }
        info!(
            "mission {} {:?} with {} fail(s); score good {} evil {}",
            number, status, fails, t.state.scores.good, t.state.scores.evil
        );
        t.emit(GameEvent::MissionResolved { mission: number, status, fails });

        let scores = t.state.scores;
        if scores.good_reached() && !scores.evil_reached() {
            t.state.set_active_mission(None);
            t.enter_phase(Phase::Assassination);
            info!("good reached {} missions, assassination begins", scores.cap());
        } else if scores.evil_reached() {
            t.state.set_active_mission(None);
            self.finish(t, Alignment::Evil, VictoryReason::EvilMissions);
        } else {
            let next = t
                .state
                .next_pending_mission()
                .ok_or(StateInvariantError::NoActiveMission)?;
            self.pass_leadership(t);
            self.open_mission(t, next)?;
        }
        Ok(())
    }

    fn assassinate(&self, t: &mut Transition, actor: PlayerId, target: PlayerId) -> Result<(), GameError> {
        assassination::check_target(&t.state, actor, target)?;

        let target_role = t.state.role_of(target);
        let hit = target_role == Some(Role::Merlin);
        t.emit(GameEvent::AssassinationAttempted { target, hit });

        let result = assassination::settle(&mut t.state.scores, target_role);
        info!("assassin targeted {} ({}): {} wins", target, if hit { "hit" } else { "miss" }, result.winner);
        t.state.set_result(result.clone());
        t.emit(GameEvent::GameOver(result));
        t.enter_phase(Phase::GameOver);
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn open_mission(&self, t: &mut Transition, index: usize) -> Result<(), GameError> {
        let mission = active_mut(&mut t.state, index)?;
        mission.status = MissionStatus::TeamSelection;
        mission.team.clear();
        mission.votes.clear();
        mission.plays.clear();
        let number = mission.number;

        t.state.set_active_mission(Some(index));
        t.enter_phase(Phase::TeamSelection);
        debug!("mission {} open, leader {}", number, t.state.leader());
        Ok(())
    }

    fn pass_leadership(&self, t: &mut Transition) {
        t.state.advance_leader();
        t.emit(GameEvent::LeaderChanged(t.state.leader()));
    }

    fn finish(&self, t: &mut Transition, winner: Alignment, reason: VictoryReason) {
        let result = GameResult {
            winner,
            reason,
            good_score: t.state.scores.good,
            evil_score: t.state.scores.evil,
        };
        info!("game over: {} wins ({:?})", winner, reason);
        t.state.set_result(result.clone());
        t.emit(GameEvent::GameOver(result));
        t.enter_phase(Phase::GameOver);
    }
}

fn expect_phase(state: &GameState, expected: Phase) -> Result<(), ValidationError> {
    if state.phase != expected {
        return Err(ValidationError::WrongPhase {
            expected,
            actual: state.phase,
        });
    }
    Ok(())
}

fn active_index(state: &GameState) -> Result<usize, StateInvariantError> {
    state.active_mission_index().ok_or(StateInvariantError::NoActiveMission)
}

fn active(state: &GameState, index: usize) -> Result<&crate::core::Mission, StateInvariantError> {
    state.mission(index).ok_or(StateInvariantError::NoActiveMission)
}

fn active_mut(state: &mut GameState, index: usize) -> Result<&mut crate::core::Mission, StateInvariantError> {
    state.mission_mut(index).ok_or(StateInvariantError::NoActiveMission)
}

/// Every `k`-subset of `items`, each in ascending order.
fn combinations(items: &[PlayerId], k: usize) -> Vec<Team> {
    fn go(items: &[PlayerId], k: usize, start: usize, current: &mut Team, out: &mut Vec<Team>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..items.len() {
            current.push(items[i]);
            go(items, k, i + 1, current, out);
            current.pop();
        }
    }

    let mut sorted = items.to_vec();
    sorted.sort();
    let mut out = Vec::new();
    go(&sorted, k, 0, &mut Team::new(), &mut out);
    out
}

impl RulesEngine for AvalonRules {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn legal_actions(&self, state: &GameState, player: PlayerId) -> Vec<Action> {
        let Some(participant) = state.participant(player) else {
            return vec![];
        };
        let mission = state.active_mission();

        match state.phase {
            Phase::RoleReveal if !participant.acknowledged => vec![Action::AcknowledgeRole],
            Phase::TeamSelection if state.is_leader(player) => {
                let Some(mission) = mission else { return vec![] };
                let others: Vec<PlayerId> = state.participants().map(|p| p.id).filter(|&id| id != player).collect();
                combinations(&others, mission.spec.team_size.saturating_sub(1))
                    .into_iter()
                    .map(|members| Action::ProposeTeam { members })
                    .collect()
            }
            Phase::TeamVoting => match mission {
                Some(m) if voting::check_ballot(state, m, player).is_ok() => {
                    vec![Action::CastVote(Vote::Approve), Action::CastVote(Vote::Reject)]
                }
                _ => vec![],
            },
            Phase::MissionPlay => match mission {
                Some(m) if m.on_team(player) && !m.plays.contains_key(&player) => {
                    if participant.is_evil() {
                        vec![Action::PlayCard(MissionCard::Success), Action::PlayCard(MissionCard::Fail)]
                    } else {
                        vec![Action::PlayCard(MissionCard::Success)]
                    }
                }
                _ => vec![],
            },
            Phase::Assassination if participant.role == Some(Role::Assassin) => {
                assassination::candidates(state, player)
                    .into_iter()
                    .map(|target| Action::ConfirmAssassination { target })
                    .collect()
            }
            _ => vec![],
        }
    }

    fn apply_action(
        &self,
        state: &GameState,
        player: PlayerId,
        action: &Action,
        now_ms: u64,
    ) -> Result<Transition, GameError> {
        expect_phase(state, action.phase())?;
        if state.participant(player).is_none() {
            return Err(ValidationError::UnknownParticipant(player).into());
        }

        let mut t = Transition::from_state(state.clone());
        let mission = state.active_mission_index().unwrap_or(0);

        let applied = match action {
            Action::AcknowledgeRole => self.acknowledge(&mut t, player, now_ms),
            Action::ProposeTeam { members } => self.propose(&mut t, player, members),
            Action::CastVote(vote) => self.vote(&mut t, player, *vote),
            Action::PlayCard(card) => self.play(&mut t, player, *card),
            Action::ConfirmAssassination { target } => self.assassinate(&mut t, player, *target),
        };

        if let Err(err) = applied {
            warn!("{} rejected {:?}: {}", player, action, err);
            return Err(err);
        }

        t.state.record(ActionRecord {
            player,
            action: action.clone(),
            mission,
            at_ms: now_ms,
        });
        Ok(t)
    }

    fn is_terminal(&self, state: &GameState) -> Option<GameResult> {
        state.result().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BotConfig, Participant};

    fn rules() -> AvalonRules {
        AvalonRules::new(EngineConfig::new().with_bots(BotConfig::instant())).unwrap()
    }

    fn humans() -> Vec<Participant> {
        ["A", "B", "C", "D", "E"]
            .iter()
            .enumerate()
            .map(|(i, n)| Participant::human(PlayerId::new(i as u8), *n))
            .collect()
    }

    fn started() -> GameState {
        let rules = rules();
        let state = rules.initial_state(humans());
        let mut state = rules.start_game(&state, &mut GameRng::new(5), 0).unwrap().state;
        for id in PlayerId::all(5) {
            state = rules.apply_action(&state, id, &Action::AcknowledgeRole, 0).unwrap().state;
        }
        state
    }

    #[test]
    fn test_combinations() {
        let items: Vec<_> = PlayerId::all(4).collect();
        assert_eq!(combinations(&items, 1).len(), 4);
        assert_eq!(combinations(&items, 2).len(), 6);
        assert_eq!(combinations(&items, 0), vec![Team::new()]);
    }

    #[test]
    fn test_start_requires_five() {
        let rules = rules();
        let state = rules.initial_state(humans().into_iter().take(4).collect());
        let err = rules.start_game(&state, &mut GameRng::new(1), 0).unwrap_err();
        assert_eq!(
            err,
            GameError::Config(ConfigError::WrongParticipantCount { expected: 5, actual: 4 })
        );
    }

    #[test]
    fn test_start_requires_ready() {
        let rules = rules();
        let mut roster = humans();
        roster[2].ready = false;
        roster[4].online = false;
        let state = rules.initial_state(roster);

        let err = rules.start_game(&state, &mut GameRng::new(1), 0).unwrap_err();
        assert_eq!(
            err,
            GameError::Config(ConfigError::ParticipantsNotReady(vec!["C".into(), "E".into()]))
        );
    }

    #[test]
    fn test_acknowledging_opens_first_mission() {
        let state = started();
        assert_eq!(state.phase, Phase::TeamSelection);
        assert_eq!(state.active_mission_index(), Some(0));
        assert_eq!(state.active_mission().map(|m| m.status), Some(MissionStatus::TeamSelection));
    }

    #[test]
    fn test_double_acknowledge_rejected() {
        let rules = rules();
        let state = rules.initial_state(humans());
        let state = rules.start_game(&state, &mut GameRng::new(5), 0).unwrap().state;
        let state = rules.apply_action(&state, PlayerId::new(0), &Action::AcknowledgeRole, 0).unwrap().state;

        let err = rules.apply_action(&state, PlayerId::new(0), &Action::AcknowledgeRole, 0).unwrap_err();
        assert_eq!(err, GameError::Validation(ValidationError::AlreadyAcknowledged(PlayerId::new(0))));
    }

    #[test]
    fn test_legal_proposals() {
        let rules = rules();
        let state = started();

        // Mission 1 needs 2: the leader plus one of four others.
        let actions = rules.legal_actions(&state, state.leader());
        assert_eq!(actions.len(), 4);
        assert!(rules.legal_actions(&state, PlayerId::new(1)).is_empty());
        assert!(rules.is_legal(&state, state.leader(), &Action::propose([PlayerId::new(0), PlayerId::new(3)])));
        assert!(!rules.is_legal(&state, state.leader(), &Action::propose([PlayerId::new(3), PlayerId::new(4)])));
    }

    #[test]
    fn test_wrong_phase() {
        let rules = rules();
        let state = started();
        let err = rules
            .apply_action(&state, PlayerId::new(1), &Action::CastVote(Vote::Approve), 0)
            .unwrap_err();
        assert_eq!(
            err,
            GameError::Validation(ValidationError::WrongPhase {
                expected: Phase::TeamVoting,
                actual: Phase::TeamSelection,
            })
        );
    }

    #[test]
    fn test_pending_actors_during_vote() {
        let rules = rules();
        let state = started();
        let state = rules
            .apply_action(&state, PlayerId::new(0), &Action::propose([PlayerId::new(1)]), 0)
            .unwrap()
            .state;

        let pending = rules.pending_actors(&state);
        assert_eq!(pending, vec![PlayerId::new(1), PlayerId::new(2), PlayerId::new(3), PlayerId::new(4)]);
    }

    #[test]
    fn test_history_records_applied_actions_only() {
        let rules = rules();
        let state = started();
        let before = state.history().count();

        assert!(rules.apply_action(&state, PlayerId::new(2), &Action::propose([PlayerId::new(1)]), 0).is_err());
        let next = rules
            .apply_action(&state, PlayerId::new(0), &Action::propose([PlayerId::new(1)]), 42)
            .unwrap()
            .state;

        assert_eq!(state.history().count(), before);
        let last = next.history().last().unwrap();
        assert_eq!(last.player, PlayerId::new(0));
        assert_eq!(last.at_ms, 42);
    }
}
