//! Conversation scheduler - decides when the mushroom speaks up on its own
//!
//! Polled on a fixed interval. Owns its own cooldown memory, separate from
//! the creature, and returns at most one trigger per poll. Priority is
//! hunger, then thirst, then boredom; a need is only considered once the
//! current stage has unlocked it.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::BehaviorConfig;
use crate::core::types::{interval_elapsed, Millis};
use crate::entity::creature::CreatureState;
use crate::entity::needs::NeedType;

/// Why the mushroom is starting a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Hunger,
    Thirst,
    Boredom,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trigger::Hunger => "hunger",
            Trigger::Thirst => "thirst",
            Trigger::Boredom => "boredom",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationManager {
    last_complaint: Option<Millis>,
    last_thirst_complaint: Option<Millis>,
    last_bored_check: Option<Millis>,
    last_message: Option<Millis>,
}

impl ConversationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<R: Rng + ?Sized>(
        &mut self,
        now: Millis,
        creature: &CreatureState,
        behavior: &BehaviorConfig,
        rng: &mut R,
    ) -> Option<Trigger> {
        if !interval_elapsed(now, self.last_message, behavior.message_cooldown) {
            return None;
        }

        let stage = creature.stage;
        let needs = &creature.needs;

        if stage.is_active(NeedType::Hunger)
            && needs.hunger >= behavior.hunger_threshold
            && interval_elapsed(now, self.last_complaint, behavior.complaint_interval)
        {
            self.last_complaint = Some(now);
            self.last_message = Some(now);
            tracing::debug!("Hunger complaint at {:.1}", needs.hunger);
            return Some(Trigger::Hunger);
        }

        if stage.is_active(NeedType::Thirst)
            && needs.thirst >= behavior.thirst_threshold
            && interval_elapsed(now, self.last_thirst_complaint, behavior.complaint_interval)
        {
            self.last_thirst_complaint = Some(now);
            self.last_message = Some(now);
            tracing::debug!("Thirst complaint at {:.1}", needs.thirst);
            return Some(Trigger::Thirst);
        }

        if stage.is_active(NeedType::Boredom)
            && needs.boredom >= behavior.boredom_initiation
            && !creature.is_conversing
            && interval_elapsed(now, self.last_bored_check, behavior.boredom_check_interval)
        {
            self.last_bored_check = Some(now);
            let chance = boredom_chance(needs.boredom, behavior);
            let roll: f32 = rng.gen();
            tracing::debug!("Boredom roll {:.3} against {:.3}", roll, chance);
            if roll < chance {
                self.last_message = Some(now);
                return Some(Trigger::Boredom);
            }
        }

        None
    }

    /// Forget all cooldowns (new game)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Probability of speaking out of boredom: linear above the initiation floor
pub fn boredom_chance(boredom: f32, behavior: &BehaviorConfig) -> f32 {
    ((boredom - behavior.boredom_initiation) / behavior.boredom_probability_scale).clamp(0.0, 1.0)
}
