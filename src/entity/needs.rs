//! The three needs that drive the mushroom's mood

use serde::{Deserialize, Serialize};

use crate::core::config::StatsConfig;
use crate::entity::stage::Stage;

/// Upper bound of every need
pub const NEED_MAX: f32 = 100.0;

/// Hunger, thirst and boredom, each 0 (content) to 100 (desperate)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    pub hunger: f32,
    pub thirst: f32,
    pub boredom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeedType {
    Hunger,
    Thirst,
    Boredom,
}

impl NeedType {
    pub const ALL: [NeedType; 3] = [NeedType::Hunger, NeedType::Thirst, NeedType::Boredom];
}

impl Needs {
    pub fn get(&self, need: NeedType) -> f32 {
        match need {
            NeedType::Hunger => self.hunger,
            NeedType::Thirst => self.thirst,
            NeedType::Boredom => self.boredom,
        }
    }

    fn slot(&mut self, need: NeedType) -> &mut f32 {
        match need {
            NeedType::Hunger => &mut self.hunger,
            NeedType::Thirst => &mut self.thirst,
            NeedType::Boredom => &mut self.boredom,
        }
    }

    /// Grow every need the stage has unlocked by `rate * dt`, capped at 100
    pub fn decay(&mut self, dt: f32, stage: Stage, stats: &StatsConfig) {
        for need in NeedType::ALL {
            if !stage.is_active(need) {
                continue;
            }
            let rate = match need {
                NeedType::Hunger => stats.hunger_rate(),
                NeedType::Thirst => stats.thirst_rate,
                NeedType::Boredom => stats.boredom_rate(),
            };
            let value = self.slot(need);
            *value = (*value + rate * dt).clamp(0.0, NEED_MAX);
        }
    }

    /// Satisfy a need, never going below zero
    pub fn relieve(&mut self, need: NeedType, amount: f32) {
        let value = self.slot(need);
        *value = (*value - amount).clamp(0.0, NEED_MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_respects_stage_gate() {
        let stats = StatsConfig::default();
        let mut needs = Needs::default();
        needs.decay(1.0, Stage::Sprout, &stats);

        assert!(needs.hunger > 0.0);
        assert_eq!(needs.thirst, 0.0);
        assert_eq!(needs.boredom, 0.0);

        needs.decay(1.0, Stage::Bloom, &stats);
        assert!(needs.thirst > 0.0);
        assert!(needs.boredom > 0.0);
    }

    #[test]
    fn test_decay_caps_at_max() {
        let stats = StatsConfig::default();
        let mut needs = Needs::default();
        for _ in 0..1000 {
            needs.decay(0.1, Stage::Bloom, &stats);
        }
        assert_eq!(needs.hunger, NEED_MAX);
        assert_eq!(needs.thirst, NEED_MAX);
        assert_eq!(needs.boredom, NEED_MAX);
    }

    #[test]
    fn test_thirst_slower_than_hunger() {
        let stats = StatsConfig::default();
        let mut needs = Needs::default();
        needs.decay(1.0, Stage::Bloom, &stats);
        assert!(needs.thirst < needs.hunger);
        assert_eq!(needs.hunger, needs.boredom);
    }

    #[test]
    fn test_relieve_clamps_at_zero() {
        let mut needs = Needs {
            hunger: 10.0,
            ..Default::default()
        };
        needs.relieve(NeedType::Hunger, 55.0);
        assert_eq!(needs.hunger, 0.0);
    }
}
