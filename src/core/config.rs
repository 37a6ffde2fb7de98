//! Game configuration with documented constants
//!
//! All tuning numbers are collected here with explanations of their purpose
//! and how they interact with each other. Every section deserializes with
//! `#[serde(default)]`, so a TOML file only needs to name what it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, ShroomError};
use crate::core::types::Millis;
use crate::entity::food::FoodType;

/// Top-level configuration handed to every component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub stats: StatsConfig,
    pub behavior: BehaviorConfig,
    pub timing: TimingConfig,
    pub dialogue: DialogueConfig,
    pub progression: ProgressionConfig,
    pub mist: MistConfig,
    pub poke: PokeConfig,
    pub jar: JarConfig,
    pub foods: FoodTable,
}

/// Need decay rates and relief amounts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Seconds for hunger (and boredom) to climb from 0 to 100 unattended
    ///
    /// This is the pacing knob of the whole game: at 15s a neglected
    /// mushroom goes demonic in 15 seconds of real play.
    pub fill_time: f32,

    /// Thirst gain per second (independent of fill time, slower)
    pub thirst_rate: f32,

    /// Boredom removed by any feed once boredom is an active need
    pub feed_boredom_relief: f32,

    /// Boredom removed by a successful chat exchange
    pub chat_boredom_relief: f32,

    /// Hunger at or above which the mushroom turns dark
    ///
    /// Dark is not sticky: dropping back below this recovers to normal.
    /// Only hunger reaching 100 (demonic) is terminal.
    pub dark_threshold: f32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            fill_time: 15.0,
            thirst_rate: 100.0 / 20.0,
            feed_boredom_relief: 5.0,
            chat_boredom_relief: 15.0,
            dark_threshold: 65.0,
        }
    }
}

impl StatsConfig {
    /// Hunger gain per second
    pub fn hunger_rate(&self) -> f32 {
        100.0 / self.fill_time
    }

    /// Boredom gain per second (shares the hunger fill time)
    pub fn boredom_rate(&self) -> f32 {
        100.0 / self.fill_time
    }
}

/// When the mushroom speaks up on its own
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Hunger at or above which the mushroom complains
    pub hunger_threshold: f32,

    /// Thirst at or above which the mushroom complains
    pub thirst_threshold: f32,

    /// Boredom floor below which it never starts a conversation
    pub boredom_initiation: f32,

    /// Boredom span over which initiation probability climbs from 0 to 1
    ///
    /// Probability = (boredom - initiation) / scale. With the defaults
    /// (40, 400) even a maximally bored mushroom only fires 15% of checks,
    /// so boredom chatter stays occasional.
    pub boredom_probability_scale: f32,

    /// Minimum gap between two complaints about the same need (ms)
    pub complaint_interval: Millis,

    /// Minimum gap between two boredom rolls (ms)
    pub boredom_check_interval: Millis,

    /// How often the host polls the conversation scheduler (ms)
    pub check_interval: Millis,

    /// Global minimum gap between any two self-initiated lines (ms)
    pub message_cooldown: Millis,

    /// Seconds in dark state after which boredom lines turn ominous
    pub irreversible_timer: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            hunger_threshold: 70.0,
            thirst_threshold: 70.0,
            boredom_initiation: 40.0,
            boredom_probability_scale: 400.0,
            complaint_interval: 12_000,
            boredom_check_interval: 3_000,
            check_interval: 500,
            message_cooldown: 8_000,
            irreversible_timer: 10.0,
        }
    }
}

/// Frame timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Largest dt (seconds) a single frame may advance the simulation
    ///
    /// Protects against a huge jump after the host was suspended.
    pub max_frame_delta: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: 0.1,
        }
    }
}

/// External text-generation call parameters and arbitration timings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub model: String,
    pub max_tokens: u32,

    /// Most recent turns sent with each request
    pub history_window: usize,

    /// Hard client-side timeout per attempt (ms)
    pub request_timeout: Millis,

    /// Extra attempts for self-initiated lines (user sends never retry)
    pub max_retries: u32,

    /// Pause between retry attempts (ms)
    pub retry_delay: Millis,

    /// Minimum gap between two reaction lines (ms)
    pub reaction_cooldown: Millis,

    /// How long a reaction waits for the floor before giving up (ms)
    pub reaction_wait: Millis,

    /// How often a waiting reaction re-checks the voice predicate (ms)
    pub busy_poll: Millis,

    /// Ceiling on "still speaking" after the last message (ms)
    ///
    /// A stuck audio subsystem must not block new turns forever.
    pub voice_ceiling: Millis,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 150,
            history_window: 10,
            request_timeout: 10_000,
            max_retries: 2,
            retry_delay: 1_500,
            reaction_cooldown: 6_000,
            reaction_wait: 5_000,
            busy_poll: 250,
            voice_ceiling: 6_000,
        }
    }
}

/// Stage-up thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Lifetime feeds that move stage 1 to stage 2 (unlocks thirst)
    pub feeds_to_stage2: u32,
    /// Lifetime mists that move stage 2 to stage 3 (unlocks boredom)
    pub mists_to_stage3: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            feeds_to_stage2: 5,
            mists_to_stage3: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MistConfig {
    pub thirst_relief: f32,
    /// Minimum gap between two spray applications (ms)
    pub cooldown_ms: Millis,
}

impl Default for MistConfig {
    fn default() -> Self {
        Self {
            thirst_relief: 25.0,
            cooldown_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PokeConfig {
    /// Pokes closer together than this are ignored (ms)
    pub cooldown_ms: Millis,
    /// Pokes inside the window that make the mushroom annoyed
    pub annoyance_threshold: usize,
    /// Sliding window for counting pokes (ms)
    pub annoyance_window: Millis,
}

impl Default for PokeConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 800,
            annoyance_threshold: 5,
            annoyance_window: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JarConfig {
    pub boredom_relief_per_firefly: f32,
    /// Upper bound on boredom relief from one gift
    pub boredom_relief_cap: f32,
    /// Jar unusable for this long after a gift lands (ms)
    pub cooldown_ms: Millis,
}

impl Default for JarConfig {
    fn default() -> Self {
        Self {
            boredom_relief_per_firefly: 4.0,
            boredom_relief_cap: 60.0,
            cooldown_ms: 1_000,
        }
    }
}

/// Per-food tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodSpec {
    pub label: String,
    pub hunger_relief: f32,
    /// Re-throw cooldown for this food (ms)
    pub cooldown_ms: Millis,
    /// First stage at which the food appears in the tray
    pub unlock_stage: u8,
}

impl FoodSpec {
    fn new(label: &str, hunger_relief: f32, cooldown_ms: Millis, unlock_stage: u8) -> Self {
        Self {
            label: label.into(),
            hunger_relief,
            cooldown_ms,
            unlock_stage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodTable {
    pub bark_chip: FoodSpec,
    pub dead_leaf: FoodSpec,
    pub rotten_log: FoodSpec,
    pub compost: FoodSpec,
}

impl Default for FoodTable {
    fn default() -> Self {
        Self {
            bark_chip: FoodSpec::new("Bark Chip", 12.0, 800, 1),
            dead_leaf: FoodSpec::new("Dead Leaf", 25.0, 1_500, 1),
            rotten_log: FoodSpec::new("Rotten Log", 40.0, 3_000, 2),
            compost: FoodSpec::new("Compost", 55.0, 5_000, 3),
        }
    }
}

impl FoodTable {
    pub fn get(&self, food: FoodType) -> &FoodSpec {
        match food {
            FoodType::BarkChip => &self.bark_chip,
            FoodType::DeadLeaf => &self.dead_leaf,
            FoodType::RottenLog => &self.rotten_log,
            FoodType::Compost => &self.compost,
        }
    }
}

impl GameConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML document on top of the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.stats.fill_time <= 0.0 || self.stats.thirst_rate <= 0.0 {
            return Err(ShroomError::Config("Decay rates must be positive".into()));
        }

        if !(0.0..100.0).contains(&self.stats.dark_threshold) {
            return Err(ShroomError::Config(format!(
                "dark_threshold ({}) must be in [0, 100)",
                self.stats.dark_threshold
            )));
        }

        if self.behavior.boredom_probability_scale <= 0.0 {
            return Err(ShroomError::Config(
                "boredom_probability_scale must be positive".into(),
            ));
        }

        if self.behavior.boredom_initiation >= self.behavior.hunger_threshold {
            return Err(ShroomError::Config(format!(
                "boredom_initiation ({}) should be < hunger_threshold ({})",
                self.behavior.boredom_initiation, self.behavior.hunger_threshold
            )));
        }

        if self.timing.max_frame_delta <= 0.0 {
            return Err(ShroomError::Config("max_frame_delta must be positive".into()));
        }

        if self.dialogue.history_window == 0 {
            return Err(ShroomError::Config("history_window must be at least 1".into()));
        }

        for food in FoodType::ALL {
            let spec = self.foods.get(food);
            if !(1..=3).contains(&spec.unlock_stage) {
                return Err(ShroomError::Config(format!(
                    "{} unlock_stage ({}) must be 1, 2 or 3",
                    spec.label, spec.unlock_stage
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rates_from_fill_time() {
        let stats = StatsConfig::default();
        assert!((stats.hunger_rate() - 100.0 / 15.0).abs() < 1e-5);
        assert_eq!(stats.hunger_rate(), stats.boredom_rate());
        assert!(stats.thirst_rate < stats.hunger_rate());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = GameConfig::from_toml_str(
            r#"
            [stats]
            dark_threshold = 50.0

            [dialogue]
            max_retries = 4

            [foods.compost]
            label = "Compost"
            hunger_relief = 70.0
            cooldown_ms = 1000
            unlock_stage = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.stats.dark_threshold, 50.0);
        assert_eq!(config.stats.fill_time, 15.0);
        assert_eq!(config.dialogue.max_retries, 4);
        assert_eq!(config.dialogue.history_window, 10);
        assert_eq!(config.foods.compost.hunger_relief, 70.0);
        assert_eq!(config.foods.bark_chip.hunger_relief, 12.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = GameConfig::from_toml_str("[stats]\nfill_time = 0.0\n").unwrap_err();
        assert!(matches!(err, ShroomError::Config(_)));

        let err = GameConfig::from_toml_str("[behavior]\nboredom_probability_scale = 0.0\n")
            .unwrap_err();
        assert!(matches!(err, ShroomError::Config(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = GameConfig::from_toml_str("[stats\n").unwrap_err();
        assert!(matches!(err, ShroomError::TomlError(_)));
    }
}
