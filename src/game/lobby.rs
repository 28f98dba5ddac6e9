//! Pre-game roster.
//!
//! The lobby tracks who is seated and who is watching before a game starts.
//! Members are addressed by their stable `key`. The admin is seated on
//! creation; spectators move to seats through `take_seat`, which a locked
//! lobby only allows the admin to do.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{EngineConfig, Participant, PlayerId};
use crate::error::{GameError, ValidationError};

use super::session::GameSession;

/// Most participants a lobby will seat.
pub const MAX_SEATS: usize = 10;

/// Bot spectators every new lobby offers.
pub const DEFAULT_BOTS: [&str; 4] = ["Guinevere", "Lancelot", "Uther", "Galahad"];

/// Seats, spectators and the lock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lobby {
    admin: String,
    seats: Vec<Participant>,
    spectators: Vec<Participant>,
    locked: bool,
}

impl Lobby {
    /// Open a locked lobby with `admin` seated and the default bots watching.
    #[must_use]
    pub fn new(admin: Participant) -> Self {
        let spectators = DEFAULT_BOTS
            .iter()
            .map(|name| Participant::bot(PlayerId::new(0), *name))
            .filter(|bot| bot.key != admin.key)
            .collect();

        Self {
            admin: admin.key.clone(),
            seats: vec![admin],
            spectators,
            locked: true,
        }
    }

    #[must_use]
    pub fn admin(&self) -> &str {
        &self.admin
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn seats(&self) -> &[Participant] {
        &self.seats
    }

    #[must_use]
    pub fn spectators(&self) -> &[Participant] {
        &self.spectators
    }

    fn contains(&self, key: &str) -> bool {
        self.seats.iter().chain(&self.spectators).any(|p| p.key == key)
    }

    fn seated_mut(&mut self, key: &str) -> Result<&mut Participant, ValidationError> {
        self.seats
            .iter_mut()
            .find(|p| p.key == key)
            .ok_or_else(|| ValidationError::UnknownLobbyMember(key.to_string()))
    }

    fn require_admin(&self, requester: &str) -> Result<(), ValidationError> {
        if requester != self.admin {
            return Err(ValidationError::NotLobbyAdmin(requester.to_string()));
        }
        Ok(())
    }

    /// Add a spectator.
    pub fn join_spectator(&mut self, member: Participant) -> Result<(), ValidationError> {
        if self.contains(&member.key) {
            return Err(ValidationError::DuplicateLobbyMember(member.key));
        }
        debug!("{} joined as spectator", member.name);
        self.spectators.push(member);
        Ok(())
    }

    /// Move spectator `key` to a seat on behalf of `requester`.
    ///
    /// A seated member is ready exactly when online.
    pub fn take_seat(&mut self, requester: &str, key: &str) -> Result<(), ValidationError> {
        if self.locked && requester != self.admin {
            return Err(ValidationError::LobbyLocked);
        }
        let index = self
            .spectators
            .iter()
            .position(|p| p.key == key)
            .ok_or_else(|| ValidationError::UnknownLobbyMember(key.to_string()))?;
        if self.seats.len() >= MAX_SEATS {
            return Err(ValidationError::LobbyFull(MAX_SEATS));
        }

        let mut member = self.spectators.remove(index);
        member.ready = member.online;
        member.role = None;
        info!("{} took a seat ({} seated)", member.name, self.seats.len() + 1);
        self.seats.push(member);
        Ok(())
    }

    /// Move seated member `key` back to the spectators.
    pub fn leave_seat(&mut self, key: &str) -> Result<(), ValidationError> {
        let index = self
            .seats
            .iter()
            .position(|p| p.key == key)
            .ok_or_else(|| ValidationError::UnknownLobbyMember(key.to_string()))?;
        let member = self.seats.remove(index);
        self.spectators.push(member);
        Ok(())
    }

    /// Flip a seated member's readiness. Returns the new value.
    pub fn toggle_ready(&mut self, key: &str) -> Result<bool, ValidationError> {
        let member = self.seated_mut(key)?;
        member.ready = !member.ready;
        Ok(member.ready)
    }

    /// Mark a member on- or offline. Going offline also clears readiness.
    pub fn set_online(&mut self, key: &str, online: bool) -> Result<(), ValidationError> {
        let member = self
            .seats
            .iter_mut()
            .chain(self.spectators.iter_mut())
            .find(|p| p.key == key)
            .ok_or_else(|| ValidationError::UnknownLobbyMember(key.to_string()))?;
        member.online = online;
        if !online {
            member.ready = false;
        }
        Ok(())
    }

    /// Admin only. Returns whether the lobby is now locked.
    pub fn toggle_lock(&mut self, requester: &str) -> Result<bool, ValidationError> {
        self.require_admin(requester)?;
        self.locked = !self.locked;
        info!("lobby {}", if self.locked { "locked" } else { "unlocked" });
        Ok(self.locked)
    }

    /// Admin only. Re-lock and reset every seat's readiness to its online flag.
    pub fn reset(&mut self, requester: &str) -> Result<(), ValidationError> {
        self.require_admin(requester)?;
        for member in &mut self.seats {
            member.ready = member.online;
            member.role = None;
            member.acknowledged = false;
        }
        self.locked = true;
        Ok(())
    }

    /// Start a game with the seated members in seating order.
    pub fn start(&self, config: EngineConfig, seed: u64) -> Result<GameSession, GameError> {
        GameSession::new(config, self.seats.clone(), seed)
    }
}
