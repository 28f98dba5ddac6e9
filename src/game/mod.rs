//! Lobby and running sessions.

pub mod lobby;
pub mod session;

pub use lobby::{Lobby, MAX_SEATS};
pub use session::{GameSession, RngCheckpoint, SessionBuilder};
