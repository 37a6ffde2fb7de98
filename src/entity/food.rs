//! Food types the player can throw

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::config::FoodTable;
use crate::core::error::ShroomError;
use crate::entity::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FoodType {
    BarkChip,
    DeadLeaf,
    RottenLog,
    Compost,
}

impl FoodType {
    pub const ALL: [FoodType; 4] = [
        FoodType::BarkChip,
        FoodType::DeadLeaf,
        FoodType::RottenLog,
        FoodType::Compost,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FoodType::BarkChip => "barkChip",
            FoodType::DeadLeaf => "deadLeaf",
            FoodType::RottenLog => "rottenLog",
            FoodType::Compost => "compost",
        }
    }

    pub fn is_unlocked(self, stage: Stage, foods: &FoodTable) -> bool {
        stage.as_u8() >= foods.get(self).unlock_stage
    }
}

/// Foods in the tray at a stage, in tray order
pub fn available_foods(stage: Stage, foods: &FoodTable) -> Vec<FoodType> {
    FoodType::ALL
        .into_iter()
        .filter(|f| f.is_unlocked(stage, foods))
        .collect()
}

impl fmt::Display for FoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FoodType {
    type Err = ShroomError;

    /// Accepts `barkChip`, `bark_chip`, `bark-chip` and `bark chip`, any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "barkchip" | "bark" => Ok(FoodType::BarkChip),
            "deadleaf" | "leaf" => Ok(FoodType::DeadLeaf),
            "rottenlog" | "log" => Ok(FoodType::RottenLog),
            "compost" => Ok(FoodType::Compost),
            _ => Err(ShroomError::UnknownFood(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!("barkChip".parse::<FoodType>().unwrap(), FoodType::BarkChip);
        assert_eq!("dead_leaf".parse::<FoodType>().unwrap(), FoodType::DeadLeaf);
        assert_eq!("Rotten-Log".parse::<FoodType>().unwrap(), FoodType::RottenLog);
        assert_eq!("compost".parse::<FoodType>().unwrap(), FoodType::Compost);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "cake".parse::<FoodType>().unwrap_err();
        assert!(matches!(err, ShroomError::UnknownFood(ref s) if s == "cake"));
    }

    #[test]
    fn test_available_foods_grow_with_stage() {
        let foods = FoodTable::default();
        assert_eq!(
            available_foods(Stage::Sprout, &foods),
            vec![FoodType::BarkChip, FoodType::DeadLeaf]
        );
        assert_eq!(available_foods(Stage::Cap, &foods).len(), 3);
        assert_eq!(available_foods(Stage::Bloom, &foods).len(), 4);
    }
}
