pub mod creature;
pub mod evolution;
pub mod food;
pub mod needs;
pub mod stage;

pub use creature::{CreatureSnapshot, CreatureState, SharedCreature};
pub use evolution::{Evolution, Mode};
pub use food::FoodType;
pub use needs::{NeedType, Needs};
pub use stage::Stage;
