//! UI contract - snapshots, change detection and the voice hook

pub mod state;
pub mod voice;

pub use state::{HudView, MarkerEvent, MarkerWatcher, SpeechLog};
pub use voice::{Silent, VoiceFlag, VoiceMonitor, VoiceProfile};
