//! What a bot believes about the table.
//!
//! A `BotView` is built fresh for every decision from the current state and
//! the configured [`BotKnowledge`]. Heuristics read beliefs only through
//! the view, so switching knowledge modes never touches policy code.

use crate::core::{BotKnowledge, GameState, PlayerId, PlayerMap};
use crate::roles::{vision_for, Alignment, Role, Sighting};

/// A bot's belief about one seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Belief {
    /// The exact role is known.
    Known(Role),
    /// Only the alignment is known.
    Aligned(Alignment),
    /// One of Merlin/Morgana, unclear which.
    MerlinOrMorgana,
    Unknown,
}

/// Per-seat beliefs of one bot.
#[derive(Clone, Debug)]
pub struct BotView {
    me: PlayerId,
    role: Role,
    beliefs: PlayerMap<Belief>,
}

impl BotView {
    /// Build `actor`'s view. `None` if the actor has no role yet.
    #[must_use]
    pub fn build(state: &GameState, actor: PlayerId, knowledge: BotKnowledge) -> Option<Self> {
        let role = state.role_of(actor)?;
        let count = state.participant_count();

        let beliefs = match knowledge {
            BotKnowledge::Omniscient => PlayerMap::new(count, |id| {
                state.role_of(id).map_or(Belief::Unknown, Belief::Known)
            }),
            BotKnowledge::VisionGated => {
                // What the reveal showed, remembered past the display window.
                let roster: Vec<_> = state.participants().cloned().collect();
                let sightings = vision_for(&roster, actor);
                PlayerMap::new(count, |id| {
                    if id == actor {
                        return Belief::Known(role);
                    }
                    match sightings.get(&id) {
                        Some(Sighting::Evil) => Belief::Aligned(Alignment::Evil),
                        Some(Sighting::MerlinOrMorgana) => Belief::MerlinOrMorgana,
                        None => Belief::Unknown,
                    }
                })
            }
        };

        Some(Self { me: actor, role, beliefs })
    }

    #[must_use]
    pub fn me(&self) -> PlayerId {
        self.me
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn belief(&self, id: PlayerId) -> Belief {
        if id.index() < self.beliefs.player_count() {
            self.beliefs[id]
        } else {
            Belief::Unknown
        }
    }

    /// Believed to be Evil.
    #[must_use]
    pub fn is_evil(&self, id: PlayerId) -> bool {
        match self.belief(id) {
            Belief::Known(role) => role.alignment() == Alignment::Evil,
            Belief::Aligned(alignment) => alignment == Alignment::Evil,
            _ => false,
        }
    }

    /// Believed to be Good. Unknown seats are not.
    #[must_use]
    pub fn is_good(&self, id: PlayerId) -> bool {
        match self.belief(id) {
            Belief::Known(role) => role.is_good(),
            Belief::Aligned(alignment) => alignment == Alignment::Good,
            _ => false,
        }
    }

    /// Known to be Evil in a way Merlin's sight would reveal.
    #[must_use]
    pub fn is_visible_evil(&self, id: PlayerId) -> bool {
        match self.belief(id) {
            Belief::Known(role) => role.alignment() == Alignment::Evil && !role.hidden_from_merlin(),
            Belief::Aligned(alignment) => alignment == Alignment::Evil,
            _ => false,
        }
    }

    /// Merlin or Morgana, as Percival would see them.
    #[must_use]
    pub fn is_ambiguous(&self, id: PlayerId) -> bool {
        match self.belief(id) {
            Belief::Known(role) => role.is_percival_pair(),
            Belief::MerlinOrMorgana => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{default_ladder, Participant};

    fn dealt(roles: [Role; 5]) -> GameState {
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

    const TABLE: [Role; 5] = [Role::Merlin, Role::Percival, Role::LoyalServant, Role::Morgana, Role::Assassin];

    #[test]
    fn test_omniscient_knows_everything() {
        let state = dealt(TABLE);
        let view = BotView::build(&state, PlayerId::new(2), BotKnowledge::Omniscient).unwrap();
        assert_eq!(view.belief(PlayerId::new(0)), Belief::Known(Role::Merlin));
        assert!(view.is_evil(PlayerId::new(3)));
        assert!(view.is_good(PlayerId::new(1)));
    }

    #[test]
    fn test_vision_gated_servant_knows_nothing() {
        let state = dealt(TABLE);
        let view = BotView::build(&state, PlayerId::new(2), BotKnowledge::VisionGated).unwrap();
        assert_eq!(view.belief(PlayerId::new(2)), Belief::Known(Role::LoyalServant));
        for i in [0, 1, 3, 4] {
            assert_eq!(view.belief(PlayerId::new(i)), Belief::Unknown);
        }
    }

    #[test]
    fn test_vision_gated_percival_sees_pair() {
        let state = dealt(TABLE);
        let view = BotView::build(&state, PlayerId::new(1), BotKnowledge::VisionGated).unwrap();
        assert!(view.is_ambiguous(PlayerId::new(0)));
        assert!(view.is_ambiguous(PlayerId::new(3)));
        assert!(!view.is_evil(PlayerId::new(3)));
    }

    #[test]
    fn test_vision_gated_evil_sees_evil() {
        let state = dealt(TABLE);
        let view = BotView::build(&state, PlayerId::new(4), BotKnowledge::VisionGated).unwrap();
        assert!(view.is_evil(PlayerId::new(3)));
        assert!(!view.is_evil(PlayerId::new(0)));
    }

    #[test]
    fn test_no_role_no_view() {
        let roster = (0..5).map(|i| Participant::bot(PlayerId::new(i), format!("B{i}"))).collect();
        let state = GameState::new(roster, &default_ladder(), 3);
        assert!(BotView::build(&state, PlayerId::new(0), BotKnowledge::Omniscient).is_none());
    }
}
