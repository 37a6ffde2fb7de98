//! Stage progression
//!
//! The mushroom grows through three stages. Each stage unlocks another
//! need and more food. Stage-ups are driven by lifetime feed and mist
//! counts and are checked right after the counter moves, never deferred.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::config::ProgressionConfig;
use crate::entity::needs::NeedType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Stage {
    /// Hunger only
    Sprout = 1,
    /// Hunger and thirst
    Cap = 2,
    /// Hunger, thirst and boredom
    Bloom = 3,
}

/// Which needs tick and show on the HUD at a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageGate {
    pub hunger: bool,
    pub thirst: bool,
    pub boredom: bool,
}

const GATES: [StageGate; 3] = [
    StageGate {
        hunger: true,
        thirst: false,
        boredom: false,
    },
    StageGate {
        hunger: true,
        thirst: true,
        boredom: false,
    },
    StageGate {
        hunger: true,
        thirst: true,
        boredom: true,
    },
];

impl Stage {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn gate(self) -> &'static StageGate {
        &GATES[self.as_u8() as usize - 1]
    }

    pub fn is_active(self, need: NeedType) -> bool {
        let gate = self.gate();
        match need {
            NeedType::Hunger => gate.hunger,
            NeedType::Thirst => gate.thirst,
            NeedType::Boredom => gate.boredom,
        }
    }

    pub fn active_needs(self) -> impl Iterator<Item = NeedType> {
        NeedType::ALL.into_iter().filter(move |n| self.is_active(*n))
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Sprout
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Advance at most one stage based on lifetime counters. Never goes down.
pub fn check_stage_up(
    stage: Stage,
    total_feeds: u32,
    total_mists: u32,
    progression: &ProgressionConfig,
) -> Stage {
    match stage {
        Stage::Sprout if total_feeds >= progression.feeds_to_stage2 => Stage::Cap,
        Stage::Cap if total_mists >= progression.mists_to_stage3 => Stage::Bloom,
        other => other,
    }
}
