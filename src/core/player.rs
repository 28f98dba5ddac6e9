//! Participant identification and per-participant storage.
//!
//! ## PlayerId
//!
//! A seat index. Seating order is fixed when the lobby forms and never
//! changes afterwards; leadership rotates over it.
//!
//! ## PlayerMap
//!
//! `Vec`-backed per-seat storage with O(1) indexing by `PlayerId`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::roles::{Alignment, Role};

/// Seat identifier, 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw seat index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all seats of a table with `player_count` seats.
    ///
    /// ```
    /// use avalon_engine::core::PlayerId;
    ///
    /// let seats: Vec<_> = PlayerId::all(5).collect();
    /// assert_eq!(seats.len(), 5);
    /// assert_eq!(seats[4], PlayerId::new(4));
    /// ```
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..=u8::MAX).take(player_count).map(PlayerId)
    }

    /// The next seat in round-robin order, wrapping.
    #[must_use]
    pub fn next(self, player_count: usize) -> PlayerId {
        PlayerId(u8::try_from((self.index() + 1) % player_count).unwrap_or(0))
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seat {}", self.0)
    }
}

/// Who drives a participant's decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantKind {
    Human,
    Bot,
}

/// A seated participant.
///
/// `role` is `None` until roles are assigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Seat in the fixed seating order.
    pub id: PlayerId,
    /// Stable external identifier (session-layer key).
    pub key: String,
    /// Display name.
    pub name: String,
    pub kind: ParticipantKind,
    pub role: Option<Role>,
    /// Pre-game readiness.
    pub ready: bool,
    pub online: bool,
    /// Has confirmed their role during role reveal.
    pub acknowledged: bool,
}

impl Participant {
    /// Create a ready, online participant with no role.
    pub fn new(id: PlayerId, key: impl Into<String>, name: impl Into<String>, kind: ParticipantKind) -> Self {
        Self {
            id,
            key: key.into(),
            name: name.into(),
            kind,
            role: None,
            ready: true,
            online: true,
            acknowledged: false,
        }
    }

    /// Shorthand for a human participant.
    pub fn human(id: PlayerId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(id, name.to_lowercase().replace(char::is_whitespace, "-"), name, ParticipantKind::Human)
    }

    /// Shorthand for a bot participant.
    pub fn bot(id: PlayerId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(id, format!("bot-{}", name.to_lowercase()), name, ParticipantKind::Bot)
    }

    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.kind == ParticipantKind::Bot
    }

    /// Alignment derived from the role; `None` while unassigned.
    #[must_use]
    pub fn alignment(&self) -> Option<Alignment> {
        self.role.map(Role::alignment)
    }

    #[must_use]
    pub fn is_good(&self) -> bool {
        self.alignment() == Some(Alignment::Good)
    }

    #[must_use]
    pub fn is_evil(&self) -> bool {
        self.alignment() == Some(Alignment::Evil)
    }
}

/// Per-seat data storage with O(1) access.
///
/// ## Example
///
/// ```
/// use avalon_engine::core::{PlayerId, PlayerMap};
///
/// let mut acked: PlayerMap<bool> = PlayerMap::with_value(5, false);
/// acked[PlayerId::new(2)] = true;
/// assert!(acked[PlayerId::new(2)]);
/// assert!(!acked[PlayerId::new(0)]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Create a new PlayerMap with values from a factory function.
    pub fn new(player_count: usize, factory: impl Fn(PlayerId) -> T) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        let data = (0..=u8::MAX).take(player_count).map(|i| factory(PlayerId(i))).collect();

        Self { data }
    }

    /// Create a new PlayerMap with all entries set to the same value.
    pub fn with_value(player_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(player_count, |_| value.clone())
    }

    /// Create a new PlayerMap with default values.
    pub fn with_default(player_count: usize) -> Self
    where
        T: Default,
    {
        Self::new(player_count, |_| T::default())
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Iterate over (PlayerId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        (0..=u8::MAX).zip(&self.data).map(|(i, v)| (PlayerId(i), v))
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}
