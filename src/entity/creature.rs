//! The mushroom: one mutable aggregate holding needs, evolution, stage,
//! event markers and the conversation.
//!
//! All mutation goes through the handlers here (feed, mist, poke, gift,
//! tick, message bookkeeping). Cooldowns that belong to the input layer are
//! enforced by the session before a handler is called; the handlers
//! themselves only reject calls that can never be valid.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::core::config::GameConfig;
use crate::core::error::{Result, ShroomError};
use crate::core::types::{ChatMessage, Millis};
use crate::entity::evolution::Evolution;
use crate::entity::food::FoodType;
use crate::entity::needs::{NeedType, Needs};
use crate::entity::stage::{check_stage_up, Stage};

#[derive(Debug, Clone, Default)]
pub struct CreatureState {
    pub needs: Needs,
    pub evolution: Evolution,
    pub stage: Stage,

    /// Lifetime counters, only cleared by a full reset
    pub total_feeds: u32,
    pub total_mists: u32,

    pub last_feed_time: Option<Millis>,
    pub last_mist_time: Option<Millis>,
    pub last_poke_time: Option<Millis>,
    pub last_gift_time: Option<Millis>,
    pub last_chat_time: Option<Millis>,
    pub last_reaction_time: Option<Millis>,
    pub last_message_time: Option<Millis>,
    pub last_gift_count: u32,

    pub conversation_history: Vec<ChatMessage>,
    /// True while a dialogue request is outstanding
    pub is_conversing: bool,
    pub last_mushroom_message: Option<String>,
    /// Bumped on every new line so repeats of the same text are still seen
    pub last_mushroom_message_id: u64,

    /// Seconds spent continuously in the dark state
    pub dark_seconds: f32,
    /// Incremented by every reset; stale dialogue results compare against it
    pub life: u64,
}

/// Read-only copy handed to renderers each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSnapshot {
    pub needs: Needs,
    pub evolution: Evolution,
    pub stage: Stage,
    pub active_needs: Vec<NeedType>,
    pub total_feeds: u32,
    pub total_mists: u32,
    pub last_feed_time: Option<Millis>,
    pub last_mist_time: Option<Millis>,
    pub last_poke_time: Option<Millis>,
    pub last_gift_time: Option<Millis>,
    pub last_gift_count: u32,
    pub last_message_time: Option<Millis>,
    pub is_conversing: bool,
    pub last_mushroom_message: Option<String>,
    pub last_mushroom_message_id: u64,
    pub life: u64,
}

impl CreatureState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance needs by `dt` seconds and re-derive evolution.
    ///
    /// Returns the new evolution when it changed. Frozen once demonic.
    pub fn tick(&mut self, dt: f32, config: &GameConfig) -> Option<Evolution> {
        if self.evolution.is_terminal() {
            return None;
        }
        let dt = dt.max(0.0);

        self.needs.decay(dt, self.stage, &config.stats);

        let previous = self.evolution;
        self.evolution =
            Evolution::resolve(self.needs.hunger, previous, config.stats.dark_threshold);

        if self.evolution == Evolution::Dark && previous == Evolution::Dark {
            self.dark_seconds += dt;
        } else if self.evolution != Evolution::Dark {
            self.dark_seconds = 0.0;
        }

        if self.evolution != previous {
            tracing::info!(
                "Evolution {} -> {} at hunger {:.1}",
                previous,
                self.evolution,
                self.needs.hunger
            );
            Some(self.evolution)
        } else {
            None
        }
    }

    /// Feed one piece of food. Returns the new stage if this feed caused a stage-up.
    pub fn feed(&mut self, food: FoodType, now: Millis, config: &GameConfig) -> Result<Option<Stage>> {
        if !food.is_unlocked(self.stage, &config.foods) {
            return Err(ShroomError::FoodLocked {
                food,
                stage: self.stage,
            });
        }

        self.needs
            .relieve(NeedType::Hunger, config.foods.get(food).hunger_relief);
        if self.stage.is_active(NeedType::Boredom) {
            self.needs
                .relieve(NeedType::Boredom, config.stats.feed_boredom_relief);
        }
        self.total_feeds += 1;
        self.last_feed_time = Some(now);

        Ok(self.recompute_stage(config))
    }

    /// Spray once. Unconditional: the caller enforces the spray interval.
    pub fn mist(&mut self, now: Millis, config: &GameConfig) -> Option<Stage> {
        self.needs
            .relieve(NeedType::Thirst, config.mist.thirst_relief);
        self.total_mists += 1;
        self.last_mist_time = Some(now);

        self.recompute_stage(config)
    }

    pub fn poke(&mut self, now: Millis) {
        self.last_poke_time = Some(now);
    }

    /// Hand over a jar of fireflies. Returns the boredom relief applied.
    pub fn give_fireflies(&mut self, count: u32, now: Millis, config: &GameConfig) -> Result<f32> {
        if count == 0 {
            return Err(ShroomError::InvalidCount(0));
        }
        let relief = (count as f32 * config.jar.boredom_relief_per_firefly)
            .min(config.jar.boredom_relief_cap);
        self.needs.relieve(NeedType::Boredom, relief);
        self.last_gift_time = Some(now);
        self.last_gift_count = count;
        Ok(relief)
    }

    fn recompute_stage(&mut self, config: &GameConfig) -> Option<Stage> {
        let next = check_stage_up(
            self.stage,
            self.total_feeds,
            self.total_mists,
            &config.progression,
        );
        if next > self.stage {
            tracing::info!("Stage up: {} -> {}", self.stage, next);
            self.stage = next;
            Some(next)
        } else {
            None
        }
    }

    /// Claim the single dialogue slot. False if a turn is already in flight.
    pub fn begin_turn(&mut self) -> bool {
        if self.is_conversing {
            return false;
        }
        self.is_conversing = true;
        true
    }

    pub fn end_turn(&mut self) {
        self.is_conversing = false;
    }

    pub fn push_user_message(&mut self, text: impl Into<String>, now: Millis) {
        self.conversation_history.push(ChatMessage::user(text));
        self.last_chat_time = Some(now);
    }

    /// Record a line spoken by the mushroom and return its message id
    pub fn receive_message(&mut self, text: impl Into<String>, now: Millis) -> u64 {
        let text = text.into();
        self.conversation_history
            .push(ChatMessage::assistant(text.clone()));
        self.last_mushroom_message = Some(text);
        self.last_mushroom_message_id += 1;
        self.last_message_time = Some(now);
        self.last_mushroom_message_id
    }

    /// The most recent `n` turns of conversation
    pub fn recent_history(&self, n: usize) -> &[ChatMessage] {
        let start = self.conversation_history.len().saturating_sub(n);
        &self.conversation_history[start..]
    }

    /// Start a new life. An in-flight dialogue turn keeps its slot until it
    /// resolves, and its result is discarded because `life` moved on.
    pub fn reset(&mut self) {
        let is_conversing = self.is_conversing;
        let life = self.life + 1;
        *self = Self {
            is_conversing,
            life,
            ..Self::default()
        };
    }

    pub fn snapshot(&self) -> CreatureSnapshot {
        CreatureSnapshot {
            needs: self.needs,
            evolution: self.evolution,
            stage: self.stage,
            active_needs: self.stage.active_needs().collect(),
            total_feeds: self.total_feeds,
            total_mists: self.total_mists,
            last_feed_time: self.last_feed_time,
            last_mist_time: self.last_mist_time,
            last_poke_time: self.last_poke_time,
            last_gift_time: self.last_gift_time,
            last_gift_count: self.last_gift_count,
            last_message_time: self.last_message_time,
            is_conversing: self.is_conversing,
            last_mushroom_message: self.last_mushroom_message.clone(),
            last_mushroom_message_id: self.last_mushroom_message_id,
            life: self.life,
        }
    }
}

/// Single owner of a creature shared between the frame loop and dialogue tasks.
///
/// Every mutation happens inside one short critical section; the lock is
/// never held across an await.
#[derive(Debug, Clone, Default)]
pub struct SharedCreature(Arc<Mutex<CreatureState>>);

impl SharedCreature {
    pub fn new(state: CreatureState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    fn lock(&self) -> MutexGuard<'_, CreatureState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read<R>(&self, f: impl FnOnce(&CreatureState) -> R) -> R {
        f(&self.lock())
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut CreatureState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> CreatureSnapshot {
        self.read(CreatureState::snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn test_initial_state() {
        let c = CreatureState::new();
        assert_eq!(c.needs, Needs::default());
        assert_eq!(c.stage, Stage::Sprout);
        assert_eq!(c.evolution, Evolution::Normal);
        assert!(!c.is_conversing);
    }

    #[test]
    fn test_tick_freezes_when_demonic() {
        let cfg = config();
        let mut c = CreatureState::new();
        c.needs.hunger = 99.9;
        assert_eq!(c.tick(0.1, &cfg), Some(Evolution::Demonic));

        c.needs.hunger = 50.0;
        assert_eq!(c.tick(1.0, &cfg), None);
        assert_eq!(c.needs.hunger, 50.0);
        assert_eq!(c.evolution, Evolution::Demonic);
    }

    #[test]
    fn test_feed_then_tick_recovers_from_dark() {
        let cfg = config();
        let mut c = CreatureState::new();
        c.needs.hunger = 80.0;
        c.tick(0.0, &cfg);
        assert_eq!(c.evolution, Evolution::Dark);

        c.feed(FoodType::DeadLeaf, 1_000, &cfg).unwrap();
        assert_eq!(c.needs.hunger, 55.0);
        assert_eq!(c.evolution, Evolution::Dark);

        c.tick(0.0, &cfg);
        assert_eq!(c.evolution, Evolution::Normal);
    }

    #[test]
    fn test_feed_same_timestamp_twice() {
        let cfg = config();
        let mut c = CreatureState::new();
        c.needs.hunger = 60.0;
        c.feed(FoodType::BarkChip, 42, &cfg).unwrap();
        c.feed(FoodType::BarkChip, 42, &cfg).unwrap();
        assert_eq!(c.last_feed_time, Some(42));
        assert_eq!(c.needs.hunger, 36.0);
        assert_eq!(c.total_feeds, 2);
    }

    #[test]
    fn test_feed_locked_food_rejected() {
        let cfg = config();
        let mut c = CreatureState::new();
        let err = c.feed(FoodType::Compost, 0, &cfg).unwrap_err();
        assert!(matches!(err, ShroomError::FoodLocked { .. }));
        assert_eq!(c.total_feeds, 0);
        assert_eq!(c.last_feed_time, None);
    }

    #[test]
    fn test_feed_relieves_boredom_only_when_active() {
        let cfg = config();
        let mut c = CreatureState::new();
        c.needs.boredom = 50.0;
        c.feed(FoodType::BarkChip, 0, &cfg).unwrap();
        assert_eq!(c.needs.boredom, 50.0);

        c.stage = Stage::Bloom;
        c.feed(FoodType::BarkChip, 0, &cfg).unwrap();
        assert_eq!(c.needs.boredom, 45.0);
    }

    #[test]
    fn test_stage_up_on_exact_feed() {
        let cfg = config();
        let mut c = CreatureState::new();
        for i in 1..cfg.progression.feeds_to_stage2 {
            assert_eq!(c.feed(FoodType::BarkChip, i as u64, &cfg).unwrap(), None);
        }
        assert_eq!(c.feed(FoodType::BarkChip, 99, &cfg).unwrap(), Some(Stage::Cap));
        assert_eq!(c.stage, Stage::Cap);
    }

    #[test]
    fn test_mist_counts_and_stages_up() {
        let cfg = config();
        let mut c = CreatureState::new();
        c.stage = Stage::Cap;
        c.needs.thirst = 30.0;
        assert_eq!(c.mist(10, &cfg), None);
        assert_eq!(c.needs.thirst, 5.0);
        for t in 0..3 {
            c.mist(t, &cfg);
        }
        assert_eq!(c.mist(500, &cfg), Some(Stage::Bloom));
        assert_eq!(c.needs.thirst, 0.0);
        assert_eq!(c.last_mist_time, Some(500));
    }

    #[test]
    fn test_give_fireflies_caps_relief() {
        let cfg = config();
        let mut c = CreatureState::new();
        c.needs.boredom = 100.0;
        assert_eq!(c.give_fireflies(3, 7, &cfg).unwrap(), 12.0);
        assert_eq!(c.give_fireflies(40, 8, &cfg).unwrap(), 60.0);
        assert_eq!(c.needs.boredom, 28.0);
        assert_eq!(c.last_gift_count, 40);
        assert!(matches!(
            c.give_fireflies(0, 9, &cfg),
            Err(ShroomError::InvalidCount(0))
        ));
    }

    #[test]
    fn test_begin_turn_is_exclusive() {
        let mut c = CreatureState::new();
        assert!(c.begin_turn());
        assert!(!c.begin_turn());
        c.end_turn();
        assert!(c.begin_turn());
    }

    #[test]
    fn test_receive_message_bumps_id_on_repeat() {
        let mut c = CreatureState::new();
        let a = c.receive_message("Boop!", 1);
        let b = c.receive_message("Boop!", 2);
        assert_eq!(b, a + 1);
        assert_eq!(c.last_message_time, Some(2));
        assert_eq!(c.conversation_history.len(), 2);
    }

    #[test]
    fn test_recent_history_window() {
        let mut c = CreatureState::new();
        for i in 0..15 {
            c.push_user_message(format!("m{}", i), i);
        }
        let recent = c.recent_history(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].content, "m5");
        assert_eq!(c.recent_history(100).len(), 15);
    }

    #[test]
    fn test_reset_keeps_turn_and_bumps_life() {
        let cfg = config();
        let mut c = CreatureState::new();
        c.feed(FoodType::BarkChip, 5, &cfg).unwrap();
        c.begin_turn();
        c.reset();
        assert_eq!(c.total_feeds, 0);
        assert_eq!(c.last_feed_time, None);
        assert!(c.is_conversing);
        assert_eq!(c.life, 1);
    }

    #[test]
    fn test_dark_seconds_accumulate_and_clear() {
        let cfg = config();
        let mut c = CreatureState::new();
        c.needs.hunger = 70.0;
        c.tick(0.0, &cfg);
        c.tick(0.1, &cfg);
        c.tick(0.1, &cfg);
        assert!(c.dark_seconds > 0.19);

        c.needs.hunger = 0.0;
        c.tick(0.1, &cfg);
        assert_eq!(c.dark_seconds, 0.0);
    }
}
