// src/core/mod.rs — Generation pipeline

pub mod cost;
pub mod generator;
pub mod parser;
pub mod prompt;
pub mod suite;
pub mod telemetry;
