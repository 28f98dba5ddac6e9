//! Bot policies.
//!
//! Policies are trait-based to allow customization:
//! - `propose_team`: who a leader puts on the mission
//! - `vote`: approve or reject the proposed team
//! - `mission_card`: what to play on a mission
//! - `assassination_target`: whom the Assassin names
//!
//! `decide` ties them together: given a state and an actor it returns the
//! action the bot wants to submit, or `None` when it owes no input.
//! Policies never apply actions themselves; they go through the rules
//! engine like any human input.

use tracing::trace;

use crate::core::{Action, BotKnowledge, GameRng, GameState, MissionCard, Phase, PlayerId, Team, Vote};
use crate::roles::{Alignment, Role};
use crate::rules::voting;

use super::view::BotView;

// =============================================================================
// Policy trait
// =============================================================================

/// Decision-making for a bot participant.
pub trait BotPolicy: Send + Sync {
    /// How much of the table this policy may read.
    fn knowledge(&self) -> BotKnowledge;

    /// Build a team of `required` seats led by the viewing bot, leader first.
    fn propose_team(&self, view: &BotView, state: &GameState, required: usize, rng: &mut GameRng) -> Team;

    /// Vote on `team`.
    fn vote(&self, view: &BotView, team: &[PlayerId]) -> Vote;

    /// Card to play on an approved mission.
    fn mission_card(&self, view: &BotView) -> MissionCard;

    /// Whom to assassinate. `None` if nobody qualifies.
    fn assassination_target(&self, view: &BotView, state: &GameState, rng: &mut GameRng) -> Option<PlayerId>;

    /// The action `actor` wants to take now, if any.
    fn decide(&self, state: &GameState, actor: PlayerId, rng: &mut GameRng) -> Option<Action> {
        let participant = state.participant(actor)?;
        if state.phase == Phase::RoleReveal {
            return (!participant.acknowledged).then_some(Action::AcknowledgeRole);
        }

        let view = BotView::build(state, actor, self.knowledge())?;
        let mission = state.active_mission();

        let action = match state.phase {
            Phase::TeamSelection if state.is_leader(actor) => {
                let required = mission?.spec.team_size;
                Action::ProposeTeam {
                    members: self.propose_team(&view, state, required, rng),
                }
            }
            Phase::TeamVoting => {
                let mission = mission?;
                voting::check_ballot(state, mission, actor).ok()?;
                Action::CastVote(self.vote(&view, &mission.team))
            }
            Phase::MissionPlay => {
                let mission = mission?;
                if !mission.on_team(actor) || mission.plays.contains_key(&actor) {
                    return None;
                }
                Action::PlayCard(self.mission_card(&view))
            }
            Phase::Assassination if view.role() == Role::Assassin => Action::ConfirmAssassination {
                target: self.assassination_target(&view, state, rng)?,
            },
            _ => return None,
        };

        trace!("{} ({}) decides {:?}", actor, view.role(), action);
        Some(action)
    }
}

// =============================================================================
// Heuristic bot
// =============================================================================

/// Role-driven heuristic bot.
///
/// - Evil leaders stack the team with non-Evil seats and then allies;
///   Evil voters approve any team with an ally on it and always fail missions
/// - Merlin keeps visible Evil off his teams and rejects teams carrying it
/// - Percival takes one of Merlin/Morgana along and rejects teams with both
/// - Everyone else approves and plays Success
/// - The Assassin picks a random non-Evil seat
#[derive(Clone, Debug, Default)]
pub struct HeuristicBot {
    knowledge: BotKnowledge,
}

impl HeuristicBot {
    #[must_use]
    pub fn new(knowledge: BotKnowledge) -> Self {
        Self { knowledge }
    }
}

impl BotPolicy for HeuristicBot {
    fn knowledge(&self) -> BotKnowledge {
        self.knowledge
    }

    fn propose_team(&self, view: &BotView, state: &GameState, required: usize, rng: &mut GameRng) -> Team {
        let me = view.me();
        let mut others: Vec<PlayerId> = state.participants().map(|p| p.id).filter(|&id| id != me).collect();
        rng.shuffle(&mut others);

        let mut team = Team::new();
        team.push(me);

        let take = |team: &mut Team, pick: &dyn Fn(PlayerId) -> bool| {
            for &id in &others {
                if team.len() >= required {
                    break;
                }
                if !team.contains(&id) && pick(id) {
                    team.push(id);
                }
            }
        };

        let leader_good = view.role().alignment() == Alignment::Good;
        match view.role() {
            role if role.alignment() == Alignment::Evil => {
                take(&mut team, &|id| !view.is_evil(id));
                take(&mut team, &|id| view.is_evil(id));
            }
            Role::Merlin => take(&mut team, &|id| !view.is_visible_evil(id)),
            Role::Percival => {
                if let Some(&first) = others.iter().find(|&&id| view.is_ambiguous(id)) {
                    if team.len() < required {
                        team.push(first);
                    }
                }
                take(&mut team, &|id| view.is_good(id) && !view.is_ambiguous(id));
            }
            _ => {}
        }

        // Fill what is left, preferring seats not believed Evil when leading for Good.
        if leader_good {
            others.sort_by_key(|&id| view.is_evil(id));
        }
        for &id in &others {
            if team.len() >= required {
                break;
            }
            if !team.contains(&id) {
                team.push(id);
            }
        }

        team.truncate(required);
        team
    }

    fn vote(&self, view: &BotView, team: &[PlayerId]) -> Vote {
        let approve = match view.role() {
            role if role.alignment() == Alignment::Evil => team.iter().any(|&id| view.is_evil(id)),
            Role::Merlin => !team.iter().any(|&id| view.is_visible_evil(id)),
            Role::Percival => team.iter().filter(|&&id| view.is_ambiguous(id)).count() < 2,
            _ => true,
        };
        if approve {
            Vote::Approve
        } else {
            Vote::Reject
        }
    }

    fn mission_card(&self, view: &BotView) -> MissionCard {
        match view.role().alignment() {
            Alignment::Good => MissionCard::Success,
            Alignment::Evil => MissionCard::Fail,
        }
    }

    fn assassination_target(&self, view: &BotView, state: &GameState, rng: &mut GameRng) -> Option<PlayerId> {
        let candidates: Vec<PlayerId> = state
            .participants()
            .map(|p| p.id)
            .filter(|&id| id != view.me() && !view.is_evil(id))
            .collect();
        rng.choose(&candidates).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{default_ladder, Participant};

    // Seats: 0 Merlin, 1 Percival, 2 Servant, 3 Morgana, 4 Assassin.
    fn table() -> GameState {
        let roles = [Role::Merlin, Role::Percival, Role::LoyalServant, Role::Morgana, Role::Assassin];
        let roster = roles
            .iter()
            .enumerate()
            .map(|(i, &role)| {
                let mut p = Participant::bot(PlayerId::new(i as u8), format!("B{i}"));
                p.role = Some(role);
                p
            })
            .collect();
        GameState::new(roster, &default_ladder(), 3)
    }

    fn view(state: &GameState, seat: u8) -> BotView {
        BotView::build(state, PlayerId::new(seat), BotKnowledge::Omniscient).unwrap()
    }

    fn ids(seats: &[u8]) -> Vec<PlayerId> {
        seats.iter().map(|&s| PlayerId::new(s)).collect()
    }

    #[test]
    fn test_evil_votes_for_allies() {
        let state = table();
        let bot = HeuristicBot::default();
        assert_eq!(bot.vote(&view(&state, 4), &ids(&[0, 3])), Vote::Approve);
        assert_eq!(bot.vote(&view(&state, 4), &ids(&[0, 1])), Vote::Reject);
    }

    #[test]
    fn test_merlin_rejects_visible_evil() {
        let state = table();
        let bot = HeuristicBot::default();
        assert_eq!(bot.vote(&view(&state, 0), &ids(&[1, 4])), Vote::Reject);
        assert_eq!(bot.vote(&view(&state, 0), &ids(&[1, 2])), Vote::Approve);
    }

    #[test]
    fn test_percival_rejects_both_pair() {
        let state = table();
        let bot = HeuristicBot::default();
        assert_eq!(bot.vote(&view(&state, 1), &ids(&[0, 3, 2])), Vote::Reject);
        assert_eq!(bot.vote(&view(&state, 1), &ids(&[0, 2])), Vote::Approve);
    }

    #[test]
    fn test_cards_follow_alignment() {
        let state = table();
        let bot = HeuristicBot::default();
        assert_eq!(bot.mission_card(&view(&state, 2)), MissionCard::Success);
        assert_eq!(bot.mission_card(&view(&state, 3)), MissionCard::Fail);
    }

    #[test]
    fn test_proposals_have_required_size() {
        let state = table();
        let bot = HeuristicBot::default();
        let mut rng = GameRng::new(3);
        for seat in 0..5 {
            for required in [2, 3] {
                let team = bot.propose_team(&view(&state, seat), &state, required, &mut rng);
                assert_eq!(team.len(), required);
                assert_eq!(team[0], PlayerId::new(seat));
                let mut sorted = team.to_vec();
                sorted.sort();
                sorted.dedup();
                assert_eq!(sorted.len(), required);
            }
        }
    }

    #[test]
    fn test_merlin_team_avoids_evil() {
        let state = table();
        let bot = HeuristicBot::default();
        for seed in 0..20 {
            let team = bot.propose_team(&view(&state, 0), &state, 3, &mut GameRng::new(seed));
            assert!(!team.contains(&PlayerId::new(3)));
            assert!(!team.contains(&PlayerId::new(4)));
        }
    }

    #[test]
    fn test_evil_leader_prefers_good_seats() {
        let state = table();
        let bot = HeuristicBot::default();
        let team = bot.propose_team(&view(&state, 4), &state, 3, &mut GameRng::new(1));
        assert!(team[1..].iter().all(|&id| state.participant(id).unwrap().is_good()));
    }

    #[test]
    fn test_assassin_targets_good() {
        let state = table();
        let bot = HeuristicBot::default();
        for seed in 0..20 {
            let target = bot.assassination_target(&view(&state, 4), &state, &mut GameRng::new(seed)).unwrap();
            assert!(state.participant(target).unwrap().is_good());
        }
    }

    #[test]
    fn test_decide_nothing_outside_turn() {
        let state = table();
        let bot = HeuristicBot::default();
        // Lobby phase: nothing to do.
        assert_eq!(bot.decide(&state, PlayerId::new(0), &mut GameRng::new(1)), None);
    }
}
