pub mod algorithm;
pub mod common;
pub mod config;
pub mod map;
pub mod maze;
pub mod planner;
pub mod race;
pub mod report;
mod stat;
