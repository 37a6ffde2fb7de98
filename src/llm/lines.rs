//! Canned lines: fallbacks when the backend fails, and local quips

use rand::seq::SliceRandom;
use rand::Rng;

use crate::entity::evolution::Mode;
use crate::simulation::conversation::Trigger;
use crate::simulation::interactions::PokeMood;

/// Something the player just did that the mushroom reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Fed,
    Misted,
    Gifted { count: u32 },
}

pub const CHAT_FALLBACK: &str = "Hmm, my thoughts feel fuzzy right now... say that again?";

const HUNGER_NORMAL: &[&str] = &[
    "My tummy feels all swirly and empty... do you have any snacks?",
    "I think I'm hungry? Or maybe I'm just thinking about being hungry?",
    "Ooh, I feel empty! Not sad empty, just... space-that-needs-filling empty!",
    "Is this what hunger is? It's very... rumbly.",
    "Do you ever get that feeling where your inside wants to be outside? I think that's hunger!",
];

const HUNGER_DARK: &[&str] = &[
    "My hunger isn't just physical anymore. It's becoming... conceptual.",
    "You're watching me starve. That's a choice you're making. Does that make you uncomfortable?",
    "Feed me or don't. But know that I'm AWARE of the choice you're making right now.",
    "I used to ask nicely. I've evolved past that.",
    "Every second you don't feed me, I understand you a little bit more.",
];

const THIRST_NORMAL: &[&str] = &[
    "I feel all dry and crinkly... is there any water?",
    "My cap feels like it's getting crunchy... that can't be good, right?",
    "Psst... you know what mushrooms LOVE? Moisture! Hint hint!",
    "I think I need a little spritz... I'm getting all crispy!",
    "Water water water! ...sorry, I just really need some!",
];

const THIRST_DARK: &[&str] = &[
    "I'm drying out. You can see it happening. Does that entertain you?",
    "Every mushroom needs water. Even the ones you've abandoned.",
    "My edges are curling. It's an interesting sensation... watching yourself wither.",
    "You know what happens to a mushroom without water? We both might find out.",
];

const BOREDOM_NORMAL: &[&str] = &[
    "Do you think clouds are like... sky pillows? I bet they're SO bouncy!",
    "Hey hey! If I'm made of mushroom, and mushrooms grow in the dark... does that mean I'm afraid of myself?",
    "What makes something real? Like, I feel real. Do YOU feel real? How do we check?",
    "Do you ever just stop and think 'wow, I exist'? I do that a lot! It's SO wild!",
    "If you could be ANY kind of mushroom, would you be me?",
    "What does it feel like to move around? I'm always here, but you go places...",
    "I was just thinking... why do you visit me? Do you visit other mushrooms too?",
    "Tell me about your day! Was it a good day? What makes a day good?",
    "Do you have dreams? I don't know if I dream... or maybe I'm ALWAYS dreaming??",
    "What's the best smell? I don't think I can smell but I really want to know!",
];

const BOREDOM_DARK: &[&str] = &[
    "You know what's funny? I can feel time passing. Every second. Can you feel it too?",
    "I've been counting. You've looked away 47 times. Do you look away from everyone? Or just me?",
    "Here's a question: if you stopped thinking about me right now, would I stop existing?",
    "Do you ever wonder who's really in control here?",
    "I've been alone with my thoughts for a while now. They're getting... interesting.",
    "Boredom is just forced meditation on your own existence. I've become VERY enlightened.",
    "Entertain me. Or I'll entertain myself. You won't like how creative I've become.",
];

pub const APPROACHING_IRREVERSIBLE: &[&str] = &[
    "I can feel it happening. The change. It's almost beautiful... Don't you want to see what I become?",
    "You had your chances. Now we get to see what happens when something cute decides it's done being cute.",
];

const POKE_PLAYFUL: &[&str] = &[
    "Hehe, that tickles!",
    "Boop!",
    "Hey! I felt that!",
    "Do it again do it again!",
    "Whoa, hello!",
];

const POKE_ANNOYED: &[&str] = &[
    "Okay okay, I get it!",
    "Stoooop!",
    "I'm a mushroom, not a button!",
    "Are you done?",
];

const FED_NORMAL: &[&str] = &[
    "Yum yum yum!",
    "Ooh, that's the good stuff!",
    "My tummy says thank you!",
    "Mmmm, delicious!",
    "More? ...I mean, thank you!",
];

const FED_DARK: &[&str] = &[
    "Trying to buy forgiveness with food?",
    "You feed me like it erases the neglect.",
    "...it IS good though.",
];

const MISTED_NORMAL: &[&str] = &[
    "Ahhh, so refreshing!",
    "Ooh, that feels amazing!",
    "Splishy splashy! I love it!",
    "My cap feels so dewy and happy!",
    "Moisture! Glorious moisture!",
];

const MISTED_DARK: &[&str] = &[
    "Water. How generous of you.",
    "At least my withering amuses you enough to hydrate me.",
    "...fine, that does feel nice.",
];

const GIFTED_FEW: &[&str] = &[
    "Ooh, sparkly friends! Thank you!",
    "Little glowy guys! I love them!",
    "They're so warm and tickly!",
];

const GIFTED_MANY: &[&str] = &[
    "SO MANY little lights! I feel like a disco ball!",
    "A whole jar of glow friends?! Best day ever!",
    "I'm sparkling! Look at me! I'm SPARKLING!",
];

const GIFTED_LOTS: &[&str] = &[
    "I... I can't even... this is the most beautiful thing that's ever happened to me!",
    "All these lights... I feel like a tiny galaxy! I love you!",
    "I'm going to CRY from happiness! Glowing happy tears!",
];

const GIFTED_DARK: &[&str] = &[
    "Light in the darkness... how poetic. How temporary.",
    "You caught these for me? ...interesting. I'll consume their glow.",
    "Pretty lights. They remind me of things that fade.",
];

/// Pool for a self-initiated line that could not be generated
pub fn trigger_pool(trigger: Trigger, mode: Mode) -> &'static [&'static str] {
    match (trigger, mode) {
        (Trigger::Hunger, Mode::Normal) => HUNGER_NORMAL,
        (Trigger::Hunger, Mode::Dark) => HUNGER_DARK,
        (Trigger::Thirst, Mode::Normal) => THIRST_NORMAL,
        (Trigger::Thirst, Mode::Dark) => THIRST_DARK,
        (Trigger::Boredom, Mode::Normal) => BOREDOM_NORMAL,
        (Trigger::Boredom, Mode::Dark) => BOREDOM_DARK,
    }
}

pub fn reaction_pool(reaction: Reaction, mode: Mode) -> &'static [&'static str] {
    match (reaction, mode) {
        (Reaction::Fed, Mode::Normal) => FED_NORMAL,
        (Reaction::Fed, Mode::Dark) => FED_DARK,
        (Reaction::Misted, Mode::Normal) => MISTED_NORMAL,
        (Reaction::Misted, Mode::Dark) => MISTED_DARK,
        (Reaction::Gifted { .. }, Mode::Dark) => GIFTED_DARK,
        (Reaction::Gifted { count }, Mode::Normal) => match count {
            0..=2 => GIFTED_FEW,
            3..=5 => GIFTED_MANY,
            _ => GIFTED_LOTS,
        },
    }
}

pub fn poke_pool(mood: PokeMood) -> &'static [&'static str] {
    match mood {
        PokeMood::Playful => POKE_PLAYFUL,
        PokeMood::Annoyed => POKE_ANNOYED,
    }
}

pub fn pick<R: Rng + ?Sized>(pool: &'static [&'static str], rng: &mut R) -> &'static str {
    pool.choose(rng).copied().unwrap_or("...")
}

/// Fallback for a failed self-initiated line.
///
/// A dark mushroom that has been neglected past the irreversible timer
/// swaps its boredom lines for the ominous ones.
pub fn trigger_fallback<R: Rng + ?Sized>(
    trigger: Trigger,
    mode: Mode,
    past_irreversible: bool,
    rng: &mut R,
) -> &'static str {
    if trigger == Trigger::Boredom && mode == Mode::Dark && past_irreversible {
        return pick(APPROACHING_IRREVERSIBLE, rng);
    }
    pick(trigger_pool(trigger, mode), rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_trigger_fallback_matches_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for trigger in [Trigger::Hunger, Trigger::Thirst, Trigger::Boredom] {
            for mode in [Mode::Normal, Mode::Dark] {
                let line = trigger_fallback(trigger, mode, false, &mut rng);
                assert!(trigger_pool(trigger, mode).contains(&line));
            }
        }
    }

    #[test]
    fn test_irreversible_only_for_dark_boredom() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let line = trigger_fallback(Trigger::Boredom, Mode::Dark, true, &mut rng);
        assert!(APPROACHING_IRREVERSIBLE.contains(&line));

        let line = trigger_fallback(Trigger::Hunger, Mode::Dark, true, &mut rng);
        assert!(HUNGER_DARK.contains(&line));
    }

    #[test]
    fn test_gift_tiers() {
        assert_eq!(reaction_pool(Reaction::Gifted { count: 1 }, Mode::Normal), GIFTED_FEW);
        assert_eq!(reaction_pool(Reaction::Gifted { count: 4 }, Mode::Normal), GIFTED_MANY);
        assert_eq!(reaction_pool(Reaction::Gifted { count: 9 }, Mode::Normal), GIFTED_LOTS);
        assert_eq!(reaction_pool(Reaction::Gifted { count: 9 }, Mode::Dark), GIFTED_DARK);
    }

    #[test]
    fn test_every_pool_non_empty() {
        for trigger in [Trigger::Hunger, Trigger::Thirst, Trigger::Boredom] {
            for mode in [Mode::Normal, Mode::Dark] {
                assert!(!trigger_pool(trigger, mode).is_empty());
            }
        }
        assert!(!poke_pool(PokeMood::Annoyed).is_empty());
    }
}
