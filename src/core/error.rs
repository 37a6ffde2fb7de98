use std::time::Duration;

use thiserror::Error;

use crate::entity::food::FoodType;
use crate::entity::stage::Stage;

#[derive(Error, Debug)]
pub enum ShroomError {
    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("API error ({status}): {body}")]
    ApiStatus { status: u16, body: String },

    #[error("No text content in AI response")]
    EmptyResponse,

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unknown food type: {0}")]
    UnknownFood(String),

    #[error("{food:?} is not available at stage {stage}")]
    FoodLocked { food: FoodType, stage: Stage },

    #[error("Invalid count: {0}")]
    InvalidCount(i64),

    #[error("{action} is cooling down ({remaining_ms}ms left)")]
    OnCooldown {
        action: &'static str,
        remaining_ms: u64,
    },

    #[error("Game is over - restart to keep playing")]
    GameOver,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl ShroomError {
    /// Failures the dialogue client may retry and cover with a fallback line
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ShroomError::LlmError(_)
                | ShroomError::ApiStatus { .. }
                | ShroomError::EmptyResponse
                | ShroomError::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ShroomError>;
