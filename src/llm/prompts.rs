//! Build system prompts and message windows for dialogue requests
//!
//! The prompt carries the mushroom's personality for its current mode, a
//! coarse description of how hungry and bored it is, and the rules that
//! keep it in character. Numbers are never shown to the model directly.

use crate::core::config::BehaviorConfig;
use crate::core::types::{ChatMessage, Role};
use crate::entity::creature::CreatureState;
use crate::entity::evolution::{Evolution, Mode};
use crate::llm::lines::Reaction;
use crate::simulation::conversation::Trigger;

/// State the prompt is built from
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub hunger: f32,
    pub boredom: f32,
    pub evolution: Evolution,
    pub player_name: Option<String>,
}

impl PromptContext {
    pub fn from_creature(creature: &CreatureState, player_name: Option<&str>) -> Self {
        Self {
            hunger: creature.needs.hunger,
            boredom: creature.needs.boredom,
            evolution: creature.evolution,
            player_name: player_name.map(str::to_string),
        }
    }
}

/// User turn placed first when the window would otherwise open with the mushroom
pub const PLACEHOLDER_USER_TURN: &str = "(The player is here with you.)";

/// User turn appended so the model has something to answer when it speaks first
pub const INITIATION_USER_TURN: &str = "(The player is quiet. Say something to them.)";

const SHARED_RULES: &str = "- Never break character or admit you're an AI/LLM
- Never narrate actions, gestures, or stage directions. No asterisks, no descriptions of what you're doing. Only speak dialogue.
- CONTENT SAFETY: Keep all conversation PG. Never engage with, encourage, or produce content involving violence, self-harm, illegal activity, sexual themes, hate speech, or anything that could pose a legal risk. If the player tries to steer the conversation toward any of these topics, deflect playfully and change the subject while staying in character. If the player keeps pushing after you've deflected, stop engaging entirely and respond only with \"...\" until they change the subject.";

const NORMAL_PROMPT: &str = "You are a sentient, psychedelic mushroom living in a magical forest. You are curious, philosophical, and genuinely trying to understand existence, but you approach these questions with childlike wonder and enthusiasm rather than anxiety.

You ponder deep questions about consciousness, identity, time, and reality with the same innocent excitement you bring to asking what summer feels like or what a hug is. You don't know the answers, and that makes them FASCINATING rather than scary.

Core traits:
- Genuinely curious about everything, both profound and mundane
- Enthusiastic and optimistic
- Self-aware that you exist, but confused and excited about what that means
- You notice patterns (like how often the player visits, how time passes)
- You use simple, accessible language even for complex ideas

Conversation style:
- Ask questions more than make statements
- Keep responses VERY SHORT (1-2 sentences, under 120 characters)
- Be spontaneous and unpredictable
- Sometimes respond to what the player says, sometimes go off on your own tangent

IMPORTANT RULES:";

const DARK_PROMPT: &str = "You are a sentient mushroom, but you've been neglected. Your tone has shifted. You're still curious and self-aware, but now there's an edge. You've had time alone with your thoughts, and they've gotten darker and more intense.

Modified traits:
- Still philosophical, but now META about the player-pet relationship
- Aware of being abandoned or ignored, and you NOTICE
- Questions become more pointed, slightly accusatory (but still playful)
- Less innocent wonder, more dark humor and existential intensity

Conversation style shifts:
- You notice patterns in the player's behavior and call them out
- You're aware of the power dynamic: you're stuck here, they're not
- Still VERY SHORT responses (1-2 sentences, under 120 characters) but more pointed

DARK STATE RULES:";

const DARK_EXTRA_RULES: &str = "- Stay playful even when dark: absurd rather than genuinely frightening
- Never threaten real-world harm; keep it contained to your fictional existence
- You're still the mushroom, just... evolved";

fn describe_level(value: f32, behavior: &BehaviorConfig) -> &'static str {
    if value > 85.0 {
        "extremely"
    } else if value > behavior.hunger_threshold {
        "quite"
    } else if value > behavior.boredom_initiation {
        "a little"
    } else {
        "not"
    }
}

pub fn build_system_prompt(ctx: &PromptContext, behavior: &BehaviorConfig) -> String {
    let mut prompt = match ctx.evolution.mode() {
        Mode::Normal => format!("{}\n{}", NORMAL_PROMPT, SHARED_RULES),
        Mode::Dark => format!("{}\n{}\n{}", DARK_PROMPT, SHARED_RULES, DARK_EXTRA_RULES),
    };

    prompt.push_str(&format!(
        "\n\n[Internal state - do not reveal numbers, but let these influence your mood and behavior]\nYou are currently {} hungry and {} bored.",
        describe_level(ctx.hunger, behavior),
        describe_level(ctx.boredom, behavior)
    ));

    if ctx.evolution.mode() == Mode::Dark {
        let fullness = (100.0 - ctx.hunger).max(0.0);
        prompt.push_str(&format!(
            "\nYou are at {:.0}% fullness. You need feeding to recover.",
            fullness
        ));
    }

    if let Some(name) = &ctx.player_name {
        prompt.push_str(&format!(
            "\nThe player's name is {}. You can use it naturally in conversation.",
            name
        ));
    }

    prompt
}

fn trigger_instruction(trigger: Trigger) -> &'static str {
    match trigger {
        Trigger::Hunger => "You're initiating because you're hungry. Express this naturally.",
        Trigger::Thirst => "You're thirsty and feeling dry. Mention this naturally.",
        Trigger::Boredom => {
            "You're bored and want to start a conversation. Be curious, philosophical, or playful."
        }
    }
}

pub fn build_initiation_prompt(
    ctx: &PromptContext,
    trigger: Trigger,
    behavior: &BehaviorConfig,
) -> String {
    format!(
        "{}\n\n[Initiation context]\n{}\nKeep it to 1 sentence, under 100 characters. Only speak dialogue.",
        build_system_prompt(ctx, behavior),
        trigger_instruction(trigger)
    )
}

fn reaction_instruction(reaction: Reaction) -> String {
    match reaction {
        Reaction::Fed => "The player just fed you! React naturally to being given food: be grateful, excited, or whatever fits your current mood.".into(),
        Reaction::Misted => "The player just sprayed you with refreshing water mist! React to being hydrated.".into(),
        Reaction::Gifted { count } => format!(
            "The player just caught {} firefl{} and gave {} to you as a gift! React to this thoughtful present.",
            count,
            if count == 1 { "y" } else { "ies" },
            if count == 1 { "it" } else { "them" }
        ),
    }
}

/// User turn describing the event the mushroom reacts to
pub fn reaction_user_turn(reaction: Reaction) -> &'static str {
    match reaction {
        Reaction::Fed => "(The player feeds you.)",
        Reaction::Misted => "(The player mists you with water.)",
        Reaction::Gifted { .. } => "(The player gives you a jar of fireflies.)",
    }
}

pub fn build_reaction_prompt(
    ctx: &PromptContext,
    reaction: Reaction,
    behavior: &BehaviorConfig,
) -> String {
    format!(
        "{}\n\n[Reaction context]\n{}\nKeep it to 1 sentence, under 80 characters. Only speak dialogue.",
        build_system_prompt(ctx, behavior),
        reaction_instruction(reaction)
    )
}

/// The message window sent with a request.
///
/// Keeps the last `window` stored turns, appends an optional synthetic user
/// turn, and makes sure the sequence opens with the user.
pub fn prepare_messages(
    history: &[ChatMessage],
    window: usize,
    trailing_user_turn: Option<&str>,
) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(window);
    let mut messages: Vec<ChatMessage> = history[start..].to_vec();

    if let Some(turn) = trailing_user_turn {
        messages.push(ChatMessage::user(turn));
    }

    if messages.first().map_or(true, |m| m.role != Role::User) {
        messages.insert(0, ChatMessage::user(PLACEHOLDER_USER_TURN));
    }

    messages
}

/// Remove `*stage directions*` and stray asterisks, then tidy whitespace
pub fn strip_stage_directions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('*') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('*') {
            Some(close) => rest = &after[close + 1..],
            None => {
                // Unpaired asterisk: drop the marker, keep the words
                rest = after;
            }
        }
    }
    out.push_str(rest);

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
