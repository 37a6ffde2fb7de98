pub mod conversation;
pub mod game;
pub mod interactions;
pub mod session;
pub mod tick;

pub use conversation::{ConversationManager, Trigger};
pub use game::{Game, GameOptions, Interaction};
pub use interactions::{FireflyJar, InputCooldowns, JarPhase, PokeMood, PokeTracker};
pub use session::{GameController, GamePhase, SessionState};
pub use tick::{run_simulation_tick, SimulationEvent};
