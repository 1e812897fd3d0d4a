// src/lib.rs — Library root for Caseforge

pub mod batch;
pub mod cli;
pub mod core;
pub mod corpus;
pub mod evaluator;
pub mod export;
pub mod index;
pub mod infra;
pub mod provider;
