//! Top-level game object
//!
//! Owns one creature, the session controller, the trigger scheduler, the
//! input throttles and the dialogue client. Nothing here is global: every
//! game is constructed explicitly, so tests can run many side by side.
//!
//! Player actions are synchronous. Any dialogue they cause is returned to the
//! caller as a `Reaction` (or a `Trigger` from `poll_conversation`) and run
//! on the async runtime through the `spawn_*` helpers.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::task::JoinHandle;

use crate::core::config::GameConfig;
use crate::core::error::{Result, ShroomError};
use crate::core::types::{Clock, Millis};
use crate::entity::creature::{CreatureSnapshot, CreatureState, SharedCreature};
use crate::entity::food::FoodType;
use crate::entity::stage::Stage;
use crate::llm::client::DialogueTransport;
use crate::llm::dialogue::{DialogueClient, DialogueOutcome};
use crate::llm::lines::{self, Reaction};
use crate::simulation::conversation::{ConversationManager, Trigger};
use crate::simulation::interactions::{FireflyJar, InputCooldowns, JarPhase, PokeMood, PokeTracker};
use crate::simulation::session::{GameController, SessionState};
use crate::simulation::tick::{run_simulation_tick, SimulationEvent};
use crate::storage::KeyValueStore;
use crate::ui::state::HudView;
use crate::ui::voice::{Silent, VoiceMonitor};

/// Construction options beyond the config
pub struct GameOptions {
    pub seed: u64,
    pub player_name: Option<String>,
    pub voice: Arc<dyn VoiceMonitor>,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            player_name: None,
            voice: Arc::new(Silent),
        }
    }
}

/// What a player action did
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Fed {
        food: FoodType,
        stage_up: Option<Stage>,
    },
    Misted {
        stage_up: Option<Stage>,
    },
    /// `line` is `None` when a dialogue turn was in flight
    Poked {
        mood: PokeMood,
        line: Option<String>,
    },
    /// Poke landed inside the poke cooldown
    PokeIgnored,
    Gifted {
        count: u32,
        relief: f32,
    },
}

impl Interaction {
    /// Dialogue reaction this action asks for, if any
    pub fn reaction(&self) -> Option<Reaction> {
        match self {
            Interaction::Fed { .. } => Some(Reaction::Fed),
            Interaction::Misted { .. } => Some(Reaction::Misted),
            Interaction::Gifted { count, .. } => Some(Reaction::Gifted { count: *count }),
            Interaction::Poked { .. } | Interaction::PokeIgnored => None,
        }
    }
}

pub struct Game {
    config: Arc<GameConfig>,
    clock: Arc<dyn Clock>,
    creature: SharedCreature,
    controller: GameController,
    conversation: ConversationManager,
    dialogue: Arc<DialogueClient>,
    cooldowns: InputCooldowns,
    pokes: PokeTracker,
    jar: FireflyJar,
    rng: ChaCha8Rng,
}

impl Game {
    pub fn new(
        config: GameConfig,
        transport: Arc<dyn DialogueTransport>,
        store: Box<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        options: GameOptions,
    ) -> Self {
        let config = Arc::new(config);
        let creature = SharedCreature::default();

        let mut dialogue = DialogueClient::new(
            transport,
            creature.clone(),
            config.clone(),
            clock.clone(),
            options.seed.wrapping_add(1),
        )
        .with_voice(options.voice);
        if let Some(name) = options.player_name {
            dialogue = dialogue.with_player_name(name);
        }

        Self {
            config,
            clock,
            creature,
            controller: GameController::new(store),
            conversation: ConversationManager::new(),
            dialogue: Arc::new(dialogue),
            cooldowns: InputCooldowns::new(),
            pokes: PokeTracker::new(),
            jar: FireflyJar::new(),
            rng: ChaCha8Rng::seed_from_u64(options.seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn creature(&self) -> &SharedCreature {
        &self.creature
    }

    pub fn dialogue(&self) -> Arc<DialogueClient> {
        self.dialogue.clone()
    }

    pub fn session(&self) -> SessionState {
        self.controller.state()
    }

    pub fn snapshot(&self) -> CreatureSnapshot {
        self.creature.snapshot()
    }

    pub fn jar(&self) -> &FireflyJar {
        &self.jar
    }

    pub fn hud(&self) -> HudView {
        HudView {
            creature: self.snapshot(),
            session: self.session(),
            jar_count: self.jar.count(),
        }
    }

    fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    fn ensure_playing(&self) -> Result<()> {
        if self.controller.is_playing() {
            Ok(())
        } else {
            Err(ShroomError::GameOver)
        }
    }

    /// Advance one frame of `dt` seconds
    pub fn step(&mut self, dt: f32) -> Vec<SimulationEvent> {
        run_simulation_tick(&self.creature, &mut self.controller, dt, &self.config)
    }

    /// Ask the scheduler whether the mushroom wants to speak up
    pub fn poll_conversation(&mut self) -> Option<Trigger> {
        if !self.controller.is_playing() {
            return None;
        }
        let now = self.now();
        let behavior = &self.config.behavior;
        let conversation = &mut self.conversation;
        let rng = &mut self.rng;
        self.creature
            .read(|c| conversation.update(now, c, behavior, rng))
    }

    pub fn feed(&mut self, food: FoodType) -> Result<Interaction> {
        self.ensure_playing()?;
        let now = self.now();
        self.cooldowns.check_food(food, now)?;

        let config = &self.config;
        let stage_up = self.creature.write(|c| c.feed(food, now, config))?;
        self.cooldowns.record_food(food, now, config);
        Ok(Interaction::Fed { food, stage_up })
    }

    pub fn mist(&mut self) -> Result<Interaction> {
        self.ensure_playing()?;
        let now = self.now();
        self.cooldowns.check_spray(now, &self.config)?;

        let config = &self.config;
        let stage_up = self.creature.write(|c| c.mist(now, config));
        self.cooldowns.record_spray(now);
        Ok(Interaction::Misted { stage_up })
    }

    /// Poke the mushroom. With fireflies in a jar being dragged, the poke
    /// hands over the jar instead.
    pub fn poke(&mut self) -> Result<Interaction> {
        self.ensure_playing()?;
        if self.jar.holds_gift() {
            self.jar.end_drag();
            return self.deliver_gift();
        }

        let now = self.now();
        let Some(mood) = self.pokes.register(now, &self.config.poke) else {
            return Ok(Interaction::PokeIgnored);
        };

        let quip = lines::pick(lines::poke_pool(mood), &mut self.rng);
        let line = self.creature.write(|c| {
            c.poke(now);
            if c.is_conversing {
                None
            } else {
                c.receive_message(quip, now);
                Some(quip.to_string())
            }
        });
        Ok(Interaction::Poked { mood, line })
    }

    /// Pick up the firefly jar
    pub fn start_jar_drag(&mut self) -> Result<bool> {
        self.ensure_playing()?;
        Ok(self.jar.start_drag(self.now()))
    }

    /// A firefly flew into the jar while scooping. False if no drag is on.
    pub fn catch_firefly(&mut self) -> Result<bool> {
        self.ensure_playing()?;
        if self.jar.phase() != JarPhase::Scooping {
            return Ok(false);
        }
        self.jar.add_catch();
        Ok(true)
    }

    /// Let go of the jar. Delivers the gift when it holds fireflies.
    pub fn release_jar(&mut self) -> Result<Option<Interaction>> {
        self.ensure_playing()?;
        if !self.jar.end_drag() {
            return Ok(None);
        }
        self.deliver_gift().map(Some)
    }

    fn deliver_gift(&mut self) -> Result<Interaction> {
        let now = self.now();
        let count = self.jar.complete_gift(now, &self.config.jar);
        let config = &self.config;
        let relief = self
            .creature
            .write(|c| c.give_fireflies(count, now, config))?;
        tracing::info!("Gifted {} fireflies (boredom -{:.0})", count, relief);
        Ok(Interaction::Gifted { count, relief })
    }

    /// Start a fresh life. The best time survives.
    pub fn restart(&mut self) {
        self.creature.write(CreatureState::reset);
        self.conversation.reset();
        self.cooldowns.reset();
        self.pokes.reset();
        self.jar.reset();
        self.controller.restart();
        tracing::info!("New game started");
    }

    pub fn spawn_initiation(&self, trigger: Trigger) -> JoinHandle<DialogueOutcome> {
        let dialogue = self.dialogue.clone();
        tokio::spawn(async move { dialogue.initiate(trigger).await })
    }

    pub fn spawn_reaction(&self, reaction: Reaction) -> JoinHandle<DialogueOutcome> {
        let dialogue = self.dialogue.clone();
        tokio::spawn(async move { dialogue.react(reaction).await })
    }

    pub fn spawn_chat(&self, text: impl Into<String>) -> Result<JoinHandle<DialogueOutcome>> {
        self.ensure_playing()?;
        let dialogue = self.dialogue.clone();
        let text = text.into();
        Ok(tokio::spawn(async move {
            dialogue.send_user_message(&text).await
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ManualClock;
    use crate::llm::mock::MockBackend;
    use crate::storage::MemoryStore;

    fn game() -> (Game, Arc<ManualClock>, Arc<MockBackend>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let mock = Arc::new(MockBackend::instant(9));
        let game = Game::new(
            GameConfig::default(),
            mock.clone(),
            Box::new(MemoryStore::new()),
            clock.clone(),
            GameOptions::default(),
        );
        (game, clock, mock)
    }

    #[test]
    fn test_feed_respects_food_cooldown() {
        let (mut game, clock, _) = game();
        assert!(game.feed(FoodType::BarkChip).is_ok());
        assert!(matches!(
            game.feed(FoodType::BarkChip),
            Err(ShroomError::OnCooldown { action: "feed", .. })
        ));
        assert!(game.feed(FoodType::DeadLeaf).is_ok());
        clock.advance(800);
        assert!(game.feed(FoodType::BarkChip).is_ok());
        assert_eq!(game.snapshot().total_feeds, 3);
    }

    #[test]
    fn test_locked_food_rejected() {
        let (mut game, _, _) = game();
        assert!(matches!(
            game.feed(FoodType::RottenLog),
            Err(ShroomError::FoodLocked { .. })
        ));
    }

    #[test]
    fn test_mist_interval() {
        let (mut game, clock, _) = game();
        assert!(game.mist().is_ok());
        assert!(game.mist().is_err());
        clock.advance(500);
        assert!(game.mist().is_ok());
    }

    #[test]
    fn test_poke_quip_lands_in_conversation() {
        let (mut game, clock, _) = game();
        match game.poke().unwrap() {
            Interaction::Poked { mood, line } => {
                assert_eq!(mood, PokeMood::Playful);
                let line = line.unwrap();
                assert!(lines::poke_pool(PokeMood::Playful).contains(&line.as_str()));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(game.poke().unwrap(), Interaction::PokeIgnored);
        clock.advance(800);
        assert!(matches!(game.poke().unwrap(), Interaction::Poked { .. }));
        assert_eq!(game.snapshot().last_mushroom_message_id, 2);
    }

    #[test]
    fn test_poke_silent_while_conversing() {
        let (mut game, _, _) = game();
        game.creature().write(|c| c.is_conversing = true);
        assert!(matches!(
            game.poke().unwrap(),
            Interaction::Poked { line: None, .. }
        ));
        assert_eq!(game.snapshot().last_mushroom_message, None);
    }

    #[test]
    fn test_poke_while_scooping_delivers_gift() {
        let (mut game, _, _) = game();
        game.creature().write(|c| c.needs.boredom = 50.0);
        assert!(game.start_jar_drag().unwrap());
        assert!(game.catch_firefly().unwrap());
        assert!(game.catch_firefly().unwrap());

        let result = game.poke().unwrap();
        assert_eq!(result, Interaction::Gifted { count: 2, relief: 8.0 });
        assert_eq!(result.reaction(), Some(Reaction::Gifted { count: 2 }));
        assert_eq!(game.jar().count(), 0);
        let snap = game.snapshot();
        assert_eq!(snap.needs.boredom, 42.0);
        assert_eq!(snap.last_poke_time, None);
    }

    #[test]
    fn test_release_jar() {
        let (mut game, _, _) = game();
        assert!(!game.catch_firefly().unwrap());
        game.start_jar_drag().unwrap();
        assert_eq!(game.release_jar().unwrap(), None);

        game.start_jar_drag().unwrap();
        game.catch_firefly().unwrap();
        assert!(matches!(
            game.release_jar().unwrap(),
            Some(Interaction::Gifted { count: 1, .. })
        ));
    }

    #[test]
    fn test_actions_rejected_after_game_over() {
        let (mut game, _, _) = game();
        game.creature().write(|c| c.needs.hunger = 100.0);
        let events = game.step(0.016);
        assert!(events
            .iter()
            .any(|e| matches!(e, SimulationEvent::GameOver { .. })));

        assert!(matches!(game.feed(FoodType::BarkChip), Err(ShroomError::GameOver)));
        assert!(matches!(game.mist(), Err(ShroomError::GameOver)));
        assert!(matches!(game.poke(), Err(ShroomError::GameOver)));
        assert_eq!(game.poll_conversation(), None);
    }

    #[test]
    fn test_restart_resets_everything_but_best() {
        let (mut game, _, _) = game();
        game.step(0.1);
        game.feed(FoodType::BarkChip).unwrap();
        game.creature().write(|c| c.needs.hunger = 100.0);
        game.step(0.1);
        let best = game.session().best_survival_time;
        assert!(best > 0.0);

        game.restart();
        let snap = game.snapshot();
        assert_eq!(snap.total_feeds, 0);
        assert_eq!(snap.needs.hunger, 0.0);
        assert!(game.feed(FoodType::BarkChip).is_ok());
        assert_eq!(game.session().best_survival_time, best);
        assert_eq!(game.session().survival_time, 0.0);
    }

    #[test]
    fn test_poll_fires_hunger() {
        let (mut game, _, _) = game();
        game.creature().write(|c| c.needs.hunger = 75.0);
        assert_eq!(game.poll_conversation(), Some(Trigger::Hunger));
        assert_eq!(game.poll_conversation(), None);
    }

    #[tokio::test]
    async fn test_spawned_reaction_speaks() {
        let (mut game, _, mock) = game();
        let fed = game.feed(FoodType::BarkChip).unwrap();
        let outcome = game
            .spawn_reaction(fed.reaction().unwrap())
            .await
            .unwrap();
        assert!(outcome.line().is_some());
        assert_eq!(mock.calls(), 1);
    }
}
