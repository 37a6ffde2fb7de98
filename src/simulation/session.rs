//! Game/session controller: play phase, survival clock and best time

use serde::{Deserialize, Serialize};

use crate::storage::{load_best_time, save_best_time, KeyValueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: GamePhase,
    /// Seconds survived this life
    pub survival_time: f32,
    /// Longest survival across lives, loaded from and saved to the store
    pub best_survival_time: f32,
}

pub struct GameController {
    state: SessionState,
    store: Box<dyn KeyValueStore>,
}

impl GameController {
    /// Start playing, loading the best time from the store
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        let best = load_best_time(store.as_ref());
        Self {
            state: SessionState {
                phase: GamePhase::Playing,
                survival_time: 0.0,
                best_survival_time: best,
            },
            store,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn is_playing(&self) -> bool {
        self.state.phase == GamePhase::Playing
    }

    pub fn tick_survival(&mut self, dt: f32) {
        if self.is_playing() {
            self.state.survival_time += dt.max(0.0);
        }
    }

    /// Move to game over, keeping the longer of this run and the best.
    /// Returns false if the game was already over.
    pub fn trigger_game_over(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        let best = self.state.survival_time.max(self.state.best_survival_time);
        save_best_time(self.store.as_ref(), best);
        self.state.best_survival_time = best;
        self.state.phase = GamePhase::GameOver;
        tracing::info!(
            "Game over after {:.1}s (best {:.1}s)",
            self.state.survival_time,
            best
        );
        true
    }

    pub fn restart(&mut self) {
        self.state.phase = GamePhase::Playing;
        self.state.survival_time = 0.0;
    }
}
