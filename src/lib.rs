pub mod agent;
pub mod cards;
pub mod cfr;
pub mod cli;
pub mod display;
pub mod error;
pub mod fantasy;
pub mod game_state;
pub mod hand_evaluator;
pub mod rules;
pub mod storage;
pub mod training;
