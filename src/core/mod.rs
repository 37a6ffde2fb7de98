pub mod config;
pub mod error;
pub mod types;

pub use config::GameConfig;
pub use error::{Result, ShroomError};
pub use types::{Clock, ManualClock, Millis, SystemClock};
