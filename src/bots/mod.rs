//! Bot participants.
//!
//! - `view`: per-bot beliefs under the configured knowledge mode
//! - `policy`: the `BotPolicy` trait and the role-driven `HeuristicBot`

pub mod policy;
pub mod view;

pub use policy::{BotPolicy, HeuristicBot};
pub use view::{Belief, BotView};
