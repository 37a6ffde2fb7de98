//! Input-side bookkeeping that sits in front of the creature handlers
//!
//! The handlers on `CreatureState` are unconditional. The throttles here are
//! what the tray, spray bottle, finger and firefly jar enforce before they
//! call into the creature.

use std::collections::{HashMap, VecDeque};

use crate::core::config::{GameConfig, JarConfig, PokeConfig};
use crate::core::error::{Result, ShroomError};
use crate::core::types::{elapsed_since, Millis};
use crate::entity::food::FoodType;

/// Per-food throw cooldowns and the spray interval
#[derive(Debug, Clone, Default)]
pub struct InputCooldowns {
    food_ready_at: HashMap<FoodType, Millis>,
    last_spray: Option<Millis>,
}

impl InputCooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check_food(&self, food: FoodType, now: Millis) -> Result<()> {
        match self.food_ready_at.get(&food) {
            Some(&ready) if now < ready => Err(ShroomError::OnCooldown {
                action: "feed",
                remaining_ms: ready - now,
            }),
            _ => Ok(()),
        }
    }

    /// Start the food's cooldown after it landed
    pub fn record_food(&mut self, food: FoodType, now: Millis, config: &GameConfig) {
        self.food_ready_at
            .insert(food, now + config.foods.get(food).cooldown_ms);
    }

    pub fn check_spray(&self, now: Millis, config: &GameConfig) -> Result<()> {
        match elapsed_since(now, self.last_spray) {
            Some(e) if e < config.mist.cooldown_ms => Err(ShroomError::OnCooldown {
                action: "mist",
                remaining_ms: config.mist.cooldown_ms - e,
            }),
            _ => Ok(()),
        }
    }

    pub fn record_spray(&mut self, now: Millis) {
        self.last_spray = Some(now);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// How the mushroom feels about being poked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PokeMood {
    Playful,
    Annoyed,
}

/// Sliding window of recent pokes
#[derive(Debug, Clone, Default)]
pub struct PokeTracker {
    recent: VecDeque<Millis>,
}

impl PokeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a poke. `None` if it landed inside the poke cooldown.
    pub fn register(&mut self, now: Millis, config: &PokeConfig) -> Option<PokeMood> {
        if let Some(&last) = self.recent.back() {
            if now.saturating_sub(last) < config.cooldown_ms {
                return None;
            }
        }
        while let Some(&oldest) = self.recent.front() {
            if now.saturating_sub(oldest) > config.annoyance_window {
                self.recent.pop_front();
            } else {
                break;
            }
        }
        self.recent.push_back(now);

        if self.recent.len() >= config.annoyance_threshold {
            Some(PokeMood::Annoyed)
        } else {
            Some(PokeMood::Playful)
        }
    }

    pub fn reset(&mut self) {
        self.recent.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JarPhase {
    Idle,
    /// Dragging an empty-ish jar through the air to catch fireflies
    Scooping,
    /// Dragging a jar with fireflies toward the mushroom
    Gifting,
}

/// Firefly jar: collect fireflies, then deliver them as one gift
#[derive(Debug, Clone)]
pub struct FireflyJar {
    count: u32,
    phase: JarPhase,
    gift_active: bool,
    cooling_until: Option<Millis>,
}

impl Default for FireflyJar {
    fn default() -> Self {
        Self {
            count: 0,
            phase: JarPhase::Idle,
            gift_active: false,
            cooling_until: None,
        }
    }
}

impl FireflyJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn phase(&self) -> JarPhase {
        self.phase
    }

    fn cooling(&self, now: Millis) -> bool {
        self.cooling_until.map_or(false, |t| now < t)
    }

    /// Pick up the jar. Scooping when empty, gifting when it holds fireflies.
    pub fn start_drag(&mut self, now: Millis) -> bool {
        if self.gift_active || self.cooling(now) {
            return false;
        }
        self.phase = if self.count > 0 {
            JarPhase::Gifting
        } else {
            JarPhase::Scooping
        };
        true
    }

    pub fn add_catch(&mut self) {
        self.count += 1;
    }

    /// Let go of the jar. True if this release sends a gift on its way.
    pub fn end_drag(&mut self) -> bool {
        if self.phase == JarPhase::Idle {
            return false;
        }
        self.phase = JarPhase::Idle;
        if self.count == 0 {
            return false;
        }
        self.gift_active = true;
        true
    }

    /// True while a drag with fireflies in the jar is underway
    pub fn holds_gift(&self) -> bool {
        self.phase != JarPhase::Idle && self.count > 0
    }

    /// The gift reached the mushroom: empty the jar and start its cooldown
    pub fn complete_gift(&mut self, now: Millis, config: &JarConfig) -> u32 {
        let count = self.count;
        self.count = 0;
        self.phase = JarPhase::Idle;
        self.gift_active = false;
        self.cooling_until = Some(now + config.cooldown_ms);
        count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
