//! Role dealing and private vision.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalog::{Alignment, Role, FIVE_PLAYER_ROLES};
use crate::core::{GameRng, Participant, PlayerId, PARTICIPANT_COUNT};
use crate::error::ConfigError;

/// How another participant appears to an observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sighting {
    /// Known to be Evil.
    Evil,
    /// One of Merlin/Morgana; Percival cannot tell which.
    MerlinOrMorgana,
}

/// Observer-relative sightings keyed by the seen participant.
pub type VisionMap = FxHashMap<PlayerId, Sighting>;

/// Deal the five-seat role set onto `participants`.
///
/// Role `i` of a uniform shuffle goes to participant `i`; no two
/// participants share a role. Fails without touching anything if the
/// roster is not exactly five.
pub fn assign_roles(participants: &[Participant], rng: &mut GameRng) -> Result<Vec<Participant>, ConfigError> {
    if participants.len() != PARTICIPANT_COUNT {
        return Err(ConfigError::WrongParticipantCount {
            expected: PARTICIPANT_COUNT,
            actual: participants.len(),
        });
    }

    let mut roles = FIVE_PLAYER_ROLES;
    rng.shuffle(&mut roles);

    let assigned = participants
        .iter()
        .zip(roles)
        .map(|(p, role)| Participant {
            role: Some(role),
            acknowledged: false,
            ..p.clone()
        })
        .collect();

    debug!("roles dealt to {} participants", PARTICIPANT_COUNT);
    Ok(assigned)
}

/// Compute what `observer` sees of the other participants.
///
/// Returns an empty map for unknown observers, unassigned roles, and roles
/// without sight.
#[must_use]
pub fn vision_for(participants: &[Participant], observer: PlayerId) -> VisionMap {
    let Some(role) = participants.iter().find(|p| p.id == observer).and_then(|p| p.role) else {
        return VisionMap::default();
    };

    let others = participants.iter().filter(|p| p.id != observer);

    let seen: Vec<(PlayerId, Sighting)> = match role {
        Role::Merlin => others
            .filter_map(|p| p.role.map(|r| (p.id, r)))
            .filter(|(_, r)| r.alignment() == Alignment::Evil && !r.hidden_from_merlin())
            .map(|(id, _)| (id, Sighting::Evil))
            .collect(),
        Role::Percival => others
            .filter(|p| p.role.is_some_and(Role::is_percival_pair))
            .map(|p| (p.id, Sighting::MerlinOrMorgana))
            .collect(),
        r if r.alignment() == Alignment::Evil && !r.hidden_from_evil() => others
            .filter(|p| p.role.is_some_and(|o| o.alignment() == Alignment::Evil && !o.hidden_from_evil()))
            .map(|p| (p.id, Sighting::Evil))
            .collect(),
        _ => Vec::new(),
    };

    seen.into_iter().collect()
}
