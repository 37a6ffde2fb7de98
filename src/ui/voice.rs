//! Voice-output contract
//!
//! The core does not play audio. A voice consumer reports whether playback
//! is ongoing through `VoiceMonitor`; the dialogue client combines that with
//! `last_message_time` and a ceiling so a stuck audio device cannot block
//! new turns forever.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::core::types::{elapsed_since, Millis};
use crate::entity::evolution::Mode;

/// Polled predicate: is the last line still being spoken?
pub trait VoiceMonitor: Send + Sync {
    fn is_playing(&self) -> bool;
}

/// No audio attached
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl VoiceMonitor for Silent {
    fn is_playing(&self) -> bool {
        false
    }
}

/// Flag a voice consumer flips when playback starts and stops
#[derive(Debug, Default)]
pub struct VoiceFlag(AtomicBool);

impl VoiceFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_playing(&self, playing: bool) {
        self.0.store(playing, Ordering::SeqCst);
    }
}

impl VoiceMonitor for VoiceFlag {
    fn is_playing(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Whether the mushroom still counts as speaking.
///
/// Playback counts only within `ceiling` ms of the last message.
pub fn is_speaking(
    monitor: &dyn VoiceMonitor,
    now: Millis,
    last_message_time: Option<Millis>,
    ceiling: Millis,
) -> bool {
    match elapsed_since(now, last_message_time) {
        Some(elapsed) => elapsed < ceiling && monitor.is_playing(),
        None => false,
    }
}

/// Speech synthesis settings for a mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceProfile {
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
}

/// Voice names tried in order when the platform offers them
pub const PREFERRED_VOICES: &[&str] = &["Samantha", "Karen", "Moira"];

impl VoiceProfile {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Normal => Self {
                pitch: 1.4,
                rate: 0.9,
                volume: 0.8,
            },
            Mode::Dark => Self {
                pitch: 0.6,
                rate: 0.75,
                volume: 1.0,
            },
        }
    }
}

/// First preferred voice the platform has, matched by substring
pub fn choose_voice<'a>(available: &[&'a str]) -> Option<&'a str> {
    PREFERRED_VOICES
        .iter()
        .find_map(|want| available.iter().copied().find(|v| v.contains(want)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaking_respects_ceiling() {
        let flag = VoiceFlag::new();
        flag.set_playing(true);
        assert!(is_speaking(&flag, 1_000, Some(0), 6_000));
        assert!(!is_speaking(&flag, 6_000, Some(0), 6_000));
        assert!(!is_speaking(&flag, 1_000, None, 6_000));

        flag.set_playing(false);
        assert!(!is_speaking(&flag, 1_000, Some(0), 6_000));
        assert!(!is_speaking(&Silent, 1_000, Some(0), 6_000));
    }

    #[test]
    fn test_profiles() {
        assert!(VoiceProfile::for_mode(Mode::Dark).pitch < VoiceProfile::for_mode(Mode::Normal).pitch);
    }

    #[test]
    fn test_choose_voice_order() {
        let available = ["Alex", "Moira (en-IE)", "Karen"];
        assert_eq!(choose_voice(&available), Some("Karen"));
        assert_eq!(choose_voice(&["Alex"]), None);
    }
}
