//! Consumer-side state: change detection over creature markers and the HUD log
//!
//! Renderers never get callbacks. They poll a snapshot each frame and ask
//! the watcher what changed since they last looked; each occurrence is
//! reported once.

use std::collections::VecDeque;

use serde::Serialize;

use crate::core::types::Millis;
use crate::entity::creature::CreatureSnapshot;
use crate::entity::evolution::Evolution;
use crate::entity::stage::Stage;
use crate::simulation::session::SessionState;

/// Maximum speech log entries to keep
const MAX_LOG_ENTRIES: usize = 50;

/// Everything a HUD draws in one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudView {
    pub creature: CreatureSnapshot,
    pub session: SessionState,
    pub jar_count: u32,
}

/// Something that happened to the creature since the last poll
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerEvent {
    Fed,
    Misted,
    Poked,
    Gifted { count: u32 },
    Spoke { id: u64, text: String },
    Evolved { from: Evolution, to: Evolution },
    StageUp { stage: Stage },
}

#[derive(Debug, Clone, Default)]
pub struct MarkerWatcher {
    feed: Option<Millis>,
    mist: Option<Millis>,
    poke: Option<Millis>,
    gift: Option<Millis>,
    message_id: u64,
    evolution: Evolution,
    stage: Stage,
    life: u64,
}

impl MarkerWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start watching from `snapshot` without reporting what is already there
    pub fn primed(snapshot: &CreatureSnapshot) -> Self {
        let mut watcher = Self::new();
        watcher.poll(snapshot);
        watcher
    }

    /// Report marker changes since the previous poll
    pub fn poll(&mut self, snap: &CreatureSnapshot) -> Vec<MarkerEvent> {
        let mut events = Vec::new();

        // A new life starts from fresh markers, so compare against those
        if snap.life != self.life {
            *self = Self {
                life: snap.life,
                ..Self::default()
            };
        }

        if changed(&mut self.feed, snap.last_feed_time) {
            events.push(MarkerEvent::Fed);
        }
        if changed(&mut self.mist, snap.last_mist_time) {
            events.push(MarkerEvent::Misted);
        }
        if changed(&mut self.poke, snap.last_poke_time) {
            events.push(MarkerEvent::Poked);
        }
        if changed(&mut self.gift, snap.last_gift_time) {
            events.push(MarkerEvent::Gifted {
                count: snap.last_gift_count,
            });
        }

        if snap.last_mushroom_message_id > self.message_id {
            if let Some(text) = &snap.last_mushroom_message {
                events.push(MarkerEvent::Spoke {
                    id: snap.last_mushroom_message_id,
                    text: text.clone(),
                });
            }
        }
        self.message_id = snap.last_mushroom_message_id;

        if snap.evolution != self.evolution {
            events.push(MarkerEvent::Evolved {
                from: self.evolution,
                to: snap.evolution,
            });
            self.evolution = snap.evolution;
        }
        if snap.stage > self.stage {
            events.push(MarkerEvent::StageUp { stage: snap.stage });
        }
        self.stage = snap.stage;

        events
    }
}

/// True once per new value of a marker. A marker cleared by a reset is not an event.
fn changed(seen: &mut Option<Millis>, current: Option<Millis>) -> bool {
    let fired = current.is_some() && current != *seen;
    *seen = current;
    fired
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechEntry {
    pub id: u64,
    pub text: String,
}

/// Rolling log of what the mushroom said, newest last
#[derive(Debug, Default)]
pub struct SpeechLog {
    entries: VecDeque<SpeechEntry>,
}

impl SpeechLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(MAX_LOG_ENTRIES),
        }
    }

    pub fn push(&mut self, id: u64, text: impl Into<String>) {
        if self.entries.len() >= MAX_LOG_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(SpeechEntry {
            id,
            text: text.into(),
        });
    }

    /// Record every `Spoke` event in `events`
    pub fn extend_from(&mut self, events: &[MarkerEvent]) {
        for event in events {
            if let MarkerEvent::Spoke { id, text } = event {
                self.push(*id, text.clone());
            }
        }
    }

    pub fn latest(&self) -> Option<&SpeechEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpeechEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
