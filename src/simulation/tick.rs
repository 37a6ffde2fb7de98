//! Frame step - advances the creature and the survival clock by one frame
//!
//! The render loop supplies `dt` in seconds. It is clamped so a stalled
//! frame (tab in the background, debugger pause) cannot dump a huge jump
//! into the needs. Game over is raised by the first frame that observes a
//! demonic creature.

use serde::Serialize;

use crate::core::config::GameConfig;
use crate::entity::creature::SharedCreature;
use crate::entity::evolution::Evolution;
use crate::simulation::session::GameController;

/// Events generated during a frame step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SimulationEvent {
    EvolutionChanged {
        from: Evolution,
        to: Evolution,
    },
    GameOver {
        survival_time: f32,
        best_survival_time: f32,
    },
}

/// Clamp a raw frame delta into `[0, max_frame_delta]`
pub fn clamp_frame_delta(dt: f32, config: &GameConfig) -> f32 {
    if !dt.is_finite() {
        return 0.0;
    }
    dt.clamp(0.0, config.timing.max_frame_delta)
}

/// Run one frame. Does nothing once the game is over.
pub fn run_simulation_tick(
    creature: &SharedCreature,
    game: &mut GameController,
    dt: f32,
    config: &GameConfig,
) -> Vec<SimulationEvent> {
    let mut events = Vec::new();
    if !game.is_playing() {
        return events;
    }

    let dt = clamp_frame_delta(dt, config);
    let (changed, evolution) = creature.write(|c| {
        let previous = c.evolution;
        (c.tick(dt, config).map(|to| (previous, to)), c.evolution)
    });
    if let Some((from, to)) = changed {
        events.push(SimulationEvent::EvolutionChanged { from, to });
    }

    game.tick_survival(dt);

    if evolution == Evolution::Demonic && game.trigger_game_over() {
        let state = game.state();
        events.push(SimulationEvent::GameOver {
            survival_time: state.survival_time,
            best_survival_time: state.best_survival_time,
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn setup() -> (SharedCreature, GameController, GameConfig) {
        (
            SharedCreature::default(),
            GameController::new(Box::new(MemoryStore::new())),
            GameConfig::default(),
        )
    }

    #[test]
    fn test_large_delta_is_clamped() {
        let (creature, mut game, cfg) = setup();
        run_simulation_tick(&creature, &mut game, 30.0, &cfg);
        let hunger = creature.read(|c| c.needs.hunger);
        assert!((hunger - cfg.stats.hunger_rate() * 0.1).abs() < 1e-4);
        assert!((game.state().survival_time - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_bad_deltas_do_nothing() {
        let cfg = GameConfig::default();
        assert_eq!(clamp_frame_delta(-1.0, &cfg), 0.0);
        assert_eq!(clamp_frame_delta(f32::NAN, &cfg), 0.0);
        assert_eq!(clamp_frame_delta(0.05, &cfg), 0.05);
    }

    #[test]
    fn test_dark_transition_reported() {
        let (creature, mut game, cfg) = setup();
        creature.write(|c| c.needs.hunger = 64.9);
        let events = run_simulation_tick(&creature, &mut game, 0.1, &cfg);
        assert_eq!(
            events,
            vec![SimulationEvent::EvolutionChanged {
                from: Evolution::Normal,
                to: Evolution::Dark
            }]
        );
    }

    #[test]
    fn test_demonic_ends_the_game_once() {
        let (creature, mut game, cfg) = setup();
        creature.write(|c| c.needs.hunger = 99.95);

        let events = run_simulation_tick(&creature, &mut game, 0.1, &cfg);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], SimulationEvent::GameOver { .. }));
        assert!(!game.is_playing());

        let survival = game.state().survival_time;
        assert!(run_simulation_tick(&creature, &mut game, 0.1, &cfg).is_empty());
        assert_eq!(game.state().survival_time, survival);
    }
}
