//! Shroom - a needy mushroom with something to say

pub mod core;
pub mod entity;
pub mod llm;
pub mod simulation;
pub mod storage;
pub mod ui;
