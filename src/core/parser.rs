// src/core/parser.rs — JSON extraction from raw model output

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("response contains a fence marker but no complete code block")]
    UnterminatedFence,
}

static ANY_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").expect("valid regex"));
static JSON_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json(.*?)```").expect("valid regex"));

/// Extract the JSON payload from raw model text.
///
/// Models often wrap output in markdown fences, sometimes after a paragraph
/// of commentary. Blocks tagged `json` are preferred over untagged ones, and
/// the last matching block wins. Text without any fence is returned trimmed
/// as-is; whether it parses is the caller's problem.
pub fn extract_json(raw: &str) -> Result<String, ParseError> {
    if !raw.contains("```") {
        return Ok(raw.trim().to_string());
    }

    let pattern: &Regex = if raw.contains("```json") {
        &JSON_BLOCK
    } else {
        &ANY_BLOCK
    };

    let caps = pattern
        .captures_iter(raw)
        .last()
        .ok_or(ParseError::UnterminatedFence)?;

    Ok(caps[1].trim().to_string())
}
