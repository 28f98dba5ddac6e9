//! Role catalog, dealing, and role-reveal vision.
//!
//! - `catalog`: static role table with alignment and traits
//! - `assignor`: random role dealing and per-observer vision

pub mod assignor;
pub mod catalog;

pub use assignor::{assign_roles, vision_for, Sighting, VisionMap};
pub use catalog::{Alignment, Role, RoleDetail, FIVE_PLAYER_ROLES, UNKNOWN_ROLE};
