//! Engine configuration.
//!
//! - `MissionSpec`: one rung of the mission ladder (team size, fail threshold)
//! - `BotConfig`: bot knowledge mode and thinking delays
//! - `EngineConfig`: combines everything, with reference defaults
//!
//! Configs are plain serde values. Load them from JSON with
//! [`EngineConfig::from_json_str`] and always run [`EngineConfig::validate`]
//! before starting a game (the session does this for you).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The engine supports exactly this many participants.
pub const PARTICIPANT_COUNT: usize = 5;

/// Number of missions in a game.
pub const MISSION_COUNT: usize = 5;

/// One mission of the ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionSpec {
    /// Team size, leader included.
    pub team_size: usize,
    /// Fail cards needed to fail the mission.
    pub fails_required: usize,
}

impl MissionSpec {
    #[must_use]
    pub const fn new(team_size: usize, fails_required: usize) -> Self {
        Self { team_size, fails_required }
    }
}

/// The five-player ladder: sizes 2, 3, 2, 3, 3, one fail each.
#[must_use]
pub fn default_ladder() -> Vec<MissionSpec> {
    vec![
        MissionSpec::new(2, 1),
        MissionSpec::new(3, 1),
        MissionSpec::new(2, 1),
        MissionSpec::new(3, 1),
        MissionSpec::new(3, 1),
    ]
}

/// What a bot's heuristics are allowed to know.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotKnowledge {
    /// Bots read every participant's true role.
    #[default]
    Omniscient,
    /// Bots only know their own role and what their vision showed them.
    VisionGated,
}

/// Half-open range of virtual milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Zero delay.
    #[must_use]
    pub const fn instant() -> Self {
        Self::new(0, 0)
    }

    #[must_use]
    pub fn as_range(&self) -> std::ops::Range<u64> {
        self.min_ms..self.max_ms
    }
}

/// Bot behaviour settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub knowledge: BotKnowledge,
    pub proposal_delay: DelayRange,
    pub vote_delay: DelayRange,
    pub card_delay: DelayRange,
    pub assassination_delay: DelayRange,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            knowledge: BotKnowledge::Omniscient,
            proposal_delay: DelayRange::new(2_000, 3_500),
            vote_delay: DelayRange::new(1_000, 4_000),
            card_delay: DelayRange::new(500, 1_500),
            assassination_delay: DelayRange::new(2_000, 3_000),
        }
    }
}

impl BotConfig {
    /// Bots act with zero delay. Used by tests and simulations.
    #[must_use]
    pub fn instant() -> Self {
        Self {
            proposal_delay: DelayRange::instant(),
            vote_delay: DelayRange::instant(),
            card_delay: DelayRange::instant(),
            assassination_delay: DelayRange::instant(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_knowledge(mut self, knowledge: BotKnowledge) -> Self {
        self.knowledge = knowledge;
        self
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Mission ladder, in play order.
    pub ladder: Vec<MissionSpec>,

    /// A team is approved while rejections stay strictly below this.
    ///
    /// This is an absolute count, not a majority of voters.
    pub reject_threshold: usize,

    /// Consecutive rejected proposals that hand Evil the game.
    pub max_consecutive_rejections: u8,

    /// Missions a side must win.
    pub wins_required: u8,

    /// How long role-reveal vision stays visible, in virtual milliseconds.
    pub vision_window_ms: u64,

    pub bots: BotConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ladder: default_ladder(),
            reject_threshold: 3,
            max_consecutive_rejections: 4,
            wins_required: 3,
            vision_window_ms: 10_000,
            bots: BotConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mission ladder.
    pub fn with_ladder(mut self, ladder: Vec<MissionSpec>) -> Self {
        self.ladder = ladder;
        self
    }

    /// Set the bot configuration.
    pub fn with_bots(mut self, bots: BotConfig) -> Self {
        self.bots = bots;
        self
    }

    /// Set the vision window.
    pub fn with_vision_window(mut self, ms: u64) -> Self {
        self.vision_window_ms = ms;
        self
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration against the fixed five-seat table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ladder.len() != MISSION_COUNT {
            return Err(ConfigError::InvalidLadder(format!(
                "expected {} missions, found {}",
                MISSION_COUNT,
                self.ladder.len()
            )));
        }

        for (i, spec) in self.ladder.iter().enumerate() {
            if spec.team_size < 2 || spec.team_size > PARTICIPANT_COUNT {
                return Err(ConfigError::InvalidLadder(format!(
                    "mission {} team size {} outside 2..={}",
                    i + 1,
                    spec.team_size,
                    PARTICIPANT_COUNT
                )));
            }
            if spec.fails_required == 0 || spec.fails_required > spec.team_size {
                return Err(ConfigError::InvalidLadder(format!(
                    "mission {} needs {} fails with a team of {}",
                    i + 1,
                    spec.fails_required,
                    spec.team_size
                )));
            }
        }

        if self.reject_threshold == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "reject_threshold",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.max_consecutive_rejections == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "max_consecutive_rejections",
                reason: "must be at least 1".to_string(),
            });
        }

        // Two sides cannot both fall short of the target over five missions.
        if self.wins_required == 0 || 2 * self.wins_required as usize - 1 > MISSION_COUNT {
            return Err(ConfigError::InvalidSetting {
                name: "wins_required",
                reason: format!("must be in 1..={}", MISSION_COUNT.div_ceil(2)),
            });
        }

        let delays = [
            ("bots.proposal_delay", self.bots.proposal_delay),
            ("bots.vote_delay", self.bots.vote_delay),
            ("bots.card_delay", self.bots.card_delay),
            ("bots.assassination_delay", self.bots.assassination_delay),
        ];
        for (name, delay) in delays {
            if delay.min_ms > delay.max_ms {
                return Err(ConfigError::InvalidSetting {
                    name,
                    reason: format!("min {} exceeds max {}", delay.min_ms, delay.max_ms),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ladder.iter().map(|m| m.team_size).collect::<Vec<_>>(), vec![2, 3, 2, 3, 3]);
        assert!(config.ladder.iter().all(|m| m.fails_required == 1));
    }

    #[test]
    fn test_rejects_short_ladder() {
        let config = EngineConfig::new().with_ladder(vec![MissionSpec::new(2, 1)]);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLadder(_))));
    }

    #[test]
    fn test_rejects_oversized_threshold() {
        let mut ladder = default_ladder();
        ladder[0] = MissionSpec::new(2, 3);
        let config = EngineConfig::new().with_ladder(ladder);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLadder(_))));
    }

    #[test]
    fn test_rejects_inverted_delay() {
        let mut bots = BotConfig::default();
        bots.vote_delay = DelayRange::new(500, 100);
        let config = EngineConfig::new().with_bots(bots);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting { name: "bots.vote_delay", .. })
        ));
    }

    #[test]
    fn test_rejects_unreachable_win_target() {
        let config = EngineConfig { wins_required: 4, ..EngineConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_partial_document() {
        let json = r#"{ "vision_window_ms": 2500, "bots": { "knowledge": "vision_gated" } }"#;
        let config = EngineConfig::from_json_str(json).unwrap();

        assert_eq!(config.vision_window_ms, 2500);
        assert_eq!(config.bots.knowledge, BotKnowledge::VisionGated);
        assert_eq!(config.bots.vote_delay, BotConfig::default().vote_delay);
        assert_eq!(config.reject_threshold, 3);
    }

    #[test]
    fn test_json_parse_error() {
        assert!(matches!(EngineConfig::from_json_str("{ not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_round_trip() {
        let config = EngineConfig::new().with_bots(BotConfig::instant());
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }
}
