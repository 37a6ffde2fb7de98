//! Evolution state machine: normal -> dark -> demonic

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::needs::NEED_MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evolution {
    #[default]
    Normal,
    Dark,
    /// Terminal for the current life
    Demonic,
}

/// Tone used to pick prompts, canned lines and voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Normal,
    Dark,
}

impl Evolution {
    /// Next evolution from the new hunger and the previous evolution.
    ///
    /// Entering dark has no hysteresis and leaving it is automatic once
    /// hunger drops below the threshold. Demonic never changes.
    pub fn resolve(hunger: f32, current: Evolution, dark_threshold: f32) -> Evolution {
        if current == Evolution::Demonic || hunger >= NEED_MAX {
            return Evolution::Demonic;
        }
        if hunger >= dark_threshold {
            return Evolution::Dark;
        }
        if current == Evolution::Dark {
            return Evolution::Normal;
        }
        current
    }

    pub fn is_terminal(self) -> bool {
        self == Evolution::Demonic
    }

    /// Demonic keeps the dark tone for its last lines; ticking has stopped by then
    pub fn mode(self) -> Mode {
        match self {
            Evolution::Normal => Mode::Normal,
            Evolution::Dark | Evolution::Demonic => Mode::Dark,
        }
    }
}

impl fmt::Display for Evolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Evolution::Normal => "normal",
            Evolution::Dark => "dark",
            Evolution::Demonic => "demonic",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trajectory(hungers: &[f32]) -> Vec<Evolution> {
        let mut evo = Evolution::Normal;
        hungers
            .iter()
            .map(|&h| {
                evo = Evolution::resolve(h, evo, 65.0);
                evo
            })
            .collect()
    }

    #[test]
    fn test_dark_recovers_below_threshold() {
        assert_eq!(
            trajectory(&[0.0, 70.0, 60.0, 70.0]),
            vec![
                Evolution::Normal,
                Evolution::Dark,
                Evolution::Normal,
                Evolution::Dark
            ]
        );
    }

    #[test]
    fn test_demonic_is_sticky() {
        let evos = trajectory(&[70.0, 100.0, 10.0, 70.0]);
        assert_eq!(evos[1], Evolution::Demonic);
        assert_eq!(evos[2], Evolution::Demonic);
        assert_eq!(evos[3], Evolution::Demonic);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(Evolution::resolve(65.0, Evolution::Normal, 65.0), Evolution::Dark);
        assert_eq!(Evolution::resolve(64.9, Evolution::Normal, 65.0), Evolution::Normal);
    }

    #[test]
    fn test_demonic_speaks_in_dark_mode() {
        assert_eq!(Evolution::Normal.mode(), Mode::Normal);
        assert_eq!(Evolution::Dark.mode(), Mode::Dark);
        assert_eq!(Evolution::Demonic.mode(), Mode::Dark);
    }
}
