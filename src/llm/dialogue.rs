//! Dialogue client: one conversational turn in flight at a time
//!
//! Every way the mushroom can speak through the backend (self-initiated
//! trigger, reply to the player, reaction to an action) goes through
//! `DialogueClient`. A turn claims the creature's `is_conversing` slot with
//! an atomic check-and-set under the creature lock; a second request while
//! the slot is taken is dropped. The slot is released by a guard on every
//! exit path, and waiters are woken through a `Notify`.
//!
//! Backend errors never escape this module. They end in a canned line.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::core::config::GameConfig;
use crate::core::error::{Result, ShroomError};
use crate::core::types::{interval_elapsed, Clock};
use crate::entity::creature::{CreatureState, SharedCreature};
use crate::entity::evolution::Mode;
use crate::entity::needs::NeedType;
use crate::llm::client::{ChatRequest, DialogueTransport};
use crate::llm::lines::{self, Reaction, CHAT_FALLBACK};
use crate::llm::prompts::{self, PromptContext, INITIATION_USER_TURN};
use crate::simulation::conversation::Trigger;
use crate::ui::voice::{is_speaking, Silent, VoiceMonitor};

/// A line that made it into the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenLine {
    pub text: String,
    pub message_id: u64,
    /// True when the backend failed and a canned line was used
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueOutcome {
    Spoke(SpokenLine),
    /// Another turn held the slot, or stayed busy past the wait
    Busy,
    /// Nothing to do: empty input or a reaction still cooling down
    Skipped,
    /// The creature was reset while the request was out; result dropped
    Stale,
}

impl DialogueOutcome {
    pub fn line(&self) -> Option<&SpokenLine> {
        match self {
            DialogueOutcome::Spoke(line) => Some(line),
            _ => None,
        }
    }
}

/// Everything captured at dispatch time, under the creature lock
struct Turn {
    request: ChatRequest,
    life: u64,
    mode: Mode,
    past_irreversible: bool,
}

enum Claim<'a> {
    Granted(TurnGuard<'a>, Turn),
    Busy,
    Declined,
}

/// Releases the conversing slot when the turn ends, however it ends
struct TurnGuard<'a> {
    client: &'a DialogueClient,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.client.creature.write(CreatureState::end_turn);
        self.client.turn_finished.notify_waiters();
    }
}

pub struct DialogueClient {
    transport: Arc<dyn DialogueTransport>,
    creature: SharedCreature,
    config: Arc<GameConfig>,
    clock: Arc<dyn Clock>,
    voice: Arc<dyn VoiceMonitor>,
    rng: Mutex<ChaCha8Rng>,
    turn_finished: Notify,
    player_name: Option<String>,
}

impl DialogueClient {
    pub fn new(
        transport: Arc<dyn DialogueTransport>,
        creature: SharedCreature,
        config: Arc<GameConfig>,
        clock: Arc<dyn Clock>,
        seed: u64,
    ) -> Self {
        Self {
            transport,
            creature,
            config,
            clock,
            voice: Arc::new(Silent),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            turn_finished: Notify::new(),
            player_name: None,
        }
    }

    pub fn with_voice(mut self, voice: Arc<dyn VoiceMonitor>) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_player_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = Some(name.into());
        self
    }

    pub fn creature(&self) -> &SharedCreature {
        &self.creature
    }

    fn rng(&self) -> MutexGuard<'_, ChaCha8Rng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// In flight, or still speaking the last line (bounded by the voice ceiling)
    pub fn is_busy(&self) -> bool {
        let now = self.clock.now_ms();
        let ceiling = self.config.dialogue.voice_ceiling;
        self.creature.read(|c| {
            c.is_conversing || is_speaking(self.voice.as_ref(), now, c.last_message_time, ceiling)
        })
    }

    /// The mushroom speaks up on its own. Retries, then falls back to a
    /// canned line for `(trigger, mode)`.
    pub async fn initiate(&self, trigger: Trigger) -> DialogueOutcome {
        let (guard, turn) = match self.claim(|c| {
            let ctx = self.prompt_context(c);
            let system = prompts::build_initiation_prompt(&ctx, trigger, &self.config.behavior);
            Some(self.turn(c, system, Some(INITIATION_USER_TURN)))
        }) {
            Claim::Granted(guard, turn) => (guard, turn),
            Claim::Busy => {
                tracing::debug!("Dropping {} trigger: turn in flight", trigger);
                return DialogueOutcome::Busy;
            }
            Claim::Declined => return DialogueOutcome::Skipped,
        };

        let dialogue = &self.config.dialogue;
        let attempts = dialogue.max_retries + 1;
        let mut reply = None;
        for attempt in 1..=attempts {
            match self.attempt(&turn.request).await {
                Ok(text) => {
                    reply = Some(text);
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        "Initiation attempt {}/{} for {} failed: {}",
                        attempt,
                        attempts,
                        trigger,
                        e
                    );
                    if attempt == attempts || !e.is_transient() || !self.same_life(&turn) {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(dialogue.retry_delay)).await;
                    if !self.same_life(&turn) {
                        break;
                    }
                }
            }
        }

        if reply.is_none() && !self.same_life(&turn) {
            tracing::info!("Abandoning {} trigger from a previous life", trigger);
            drop(guard);
            return DialogueOutcome::Stale;
        }

        let outcome = match reply {
            Some(text) => self.deliver(&turn, text, false, |_| {}),
            None => {
                let text = lines::trigger_fallback(
                    trigger,
                    turn.mode,
                    turn.past_irreversible,
                    &mut *self.rng(),
                );
                self.deliver(&turn, text.to_string(), true, |_| {})
            }
        };
        drop(guard);
        outcome
    }

    /// Reply to the player. One attempt, then the apologetic line.
    pub async fn send_user_message(&self, text: &str) -> DialogueOutcome {
        let text = text.trim();
        if text.is_empty() {
            return DialogueOutcome::Skipped;
        }

        let (guard, turn) = match self.claim(|c| {
            c.push_user_message(text, self.clock.now_ms());
            let ctx = self.prompt_context(c);
            let system = prompts::build_system_prompt(&ctx, &self.config.behavior);
            Some(self.turn(c, system, None))
        }) {
            Claim::Granted(guard, turn) => (guard, turn),
            Claim::Busy => {
                tracing::debug!("Dropping player message: turn in flight");
                return DialogueOutcome::Busy;
            }
            Claim::Declined => return DialogueOutcome::Skipped,
        };

        let relief = self.config.stats.chat_boredom_relief;
        let outcome = match self.attempt(&turn.request).await {
            Ok(reply) => self.deliver(&turn, reply, false, |c| {
                c.needs.relieve(NeedType::Boredom, relief)
            }),
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                self.deliver(&turn, CHAT_FALLBACK.to_string(), true, |_| {})
            }
        };
        drop(guard);
        outcome
    }

    /// React to something the player did.
    ///
    /// Gated by the reaction cooldown. Waits a bounded time for any turn in
    /// flight or voice playback to finish, then gives up silently.
    pub async fn react(&self, reaction: Reaction) -> DialogueOutcome {
        let dialogue = &self.config.dialogue;
        if !self.reaction_ready() {
            return DialogueOutcome::Skipped;
        }

        if !self.wait_until_quiet().await {
            tracing::debug!("Dropping {:?} reaction: still busy", reaction);
            return DialogueOutcome::Busy;
        }

        let (guard, turn) = match self.claim(|c| {
            let now = self.clock.now_ms();
            if !interval_elapsed(now, c.last_reaction_time, dialogue.reaction_cooldown) {
                return None;
            }
            c.last_reaction_time = Some(now);
            let ctx = self.prompt_context(c);
            let system = prompts::build_reaction_prompt(&ctx, reaction, &self.config.behavior);
            Some(self.turn(c, system, Some(prompts::reaction_user_turn(reaction))))
        }) {
            Claim::Granted(guard, turn) => (guard, turn),
            Claim::Busy => return DialogueOutcome::Busy,
            Claim::Declined => return DialogueOutcome::Skipped,
        };

        let outcome = match self.attempt(&turn.request).await {
            Ok(text) => self.deliver(&turn, text, false, |_| {}),
            Err(e) => {
                tracing::warn!("Reaction request failed: {}", e);
                let text = lines::pick(lines::reaction_pool(reaction, turn.mode), &mut *self.rng());
                self.deliver(&turn, text.to_string(), true, |_| {})
            }
        };
        drop(guard);
        outcome
    }

    fn reaction_ready(&self) -> bool {
        let now = self.clock.now_ms();
        let cooldown = self.config.dialogue.reaction_cooldown;
        self.creature
            .read(|c| interval_elapsed(now, c.last_reaction_time, cooldown))
    }

    /// Wait until nothing is in flight and nothing is being spoken, or until
    /// the reaction wait runs out. True if it went quiet in time.
    async fn wait_until_quiet(&self) -> bool {
        let dialogue = &self.config.dialogue;
        let deadline = Instant::now() + Duration::from_millis(dialogue.reaction_wait);
        let poll = Duration::from_millis(dialogue.busy_poll.max(1));

        loop {
            let notified = self.turn_finished.notified();
            tokio::pin!(notified);
            // Register before checking so a release in between is not missed
            notified.as_mut().enable();

            if !self.is_busy() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let _ = tokio::time::timeout(poll.min(deadline - now), notified).await;
        }
    }

    /// Atomically take the conversing slot and capture the turn
    fn claim(&self, prepare: impl FnOnce(&mut CreatureState) -> Option<Turn>) -> Claim<'_> {
        let claimed = self.creature.write(|c| {
            if c.is_conversing {
                return Err(());
            }
            let turn = prepare(c);
            if turn.is_some() {
                c.begin_turn();
            }
            Ok(turn)
        });

        match claimed {
            Err(()) => Claim::Busy,
            Ok(None) => Claim::Declined,
            Ok(Some(turn)) => Claim::Granted(TurnGuard { client: self }, turn),
        }
    }

    fn prompt_context(&self, c: &CreatureState) -> PromptContext {
        PromptContext::from_creature(c, self.player_name.as_deref())
    }

    fn turn(&self, c: &CreatureState, system: String, trailing: Option<&str>) -> Turn {
        let dialogue = &self.config.dialogue;
        Turn {
            request: ChatRequest {
                model: dialogue.model.clone(),
                max_tokens: dialogue.max_tokens,
                system,
                messages: prompts::prepare_messages(
                    &c.conversation_history,
                    dialogue.history_window,
                    trailing,
                ),
            },
            life: c.life,
            mode: c.evolution.mode(),
            past_irreversible: c.dark_seconds > self.config.behavior.irreversible_timer,
        }
    }

    fn same_life(&self, turn: &Turn) -> bool {
        self.creature.read(|c| c.life == turn.life)
    }

    /// One network call under the hard timeout, then clean-up of the text
    async fn attempt(&self, request: &ChatRequest) -> Result<String> {
        let limit = Duration::from_millis(self.config.dialogue.request_timeout);
        let response = tokio::time::timeout(limit, self.transport.send(request))
            .await
            .map_err(|_| ShroomError::Timeout(limit))??;

        let raw = response.first_text().ok_or(ShroomError::EmptyResponse)?;
        let text = prompts::strip_stage_directions(raw);
        if text.is_empty() {
            return Err(ShroomError::EmptyResponse);
        }
        Ok(text)
    }

    /// Record the line unless the creature moved on to a new life
    fn deliver(
        &self,
        turn: &Turn,
        text: String,
        fallback: bool,
        on_success: impl FnOnce(&mut CreatureState),
    ) -> DialogueOutcome {
        let now = self.clock.now_ms();
        let delivered = self.creature.write(|c| {
            if c.life != turn.life {
                return None;
            }
            on_success(c);
            Some(c.receive_message(text.clone(), now))
        });

        match delivered {
            Some(message_id) => {
                tracing::info!("Mushroom says: {}", text);
                DialogueOutcome::Spoke(SpokenLine {
                    text,
                    message_id,
                    fallback,
                })
            }
            None => {
                tracing::info!("Discarding line from a previous life");
                DialogueOutcome::Stale
            }
        }
    }
}
