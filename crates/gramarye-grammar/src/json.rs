//! JSON interchange for the grammar graph.
//!
//! The graph is normally produced by the grammar-authoring tool and shipped
//! to the parser as JSON. Deserialization re-checks the edge invariants so a
//! hand-edited file cannot smuggle dangling rule ids into the arena.

use thiserror::Error;

use crate::grammar::Grammar;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("grammar JSON error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("malformed grammar: {0}")]
    Malformed(String),
}

pub fn to_json(grammar: &Grammar) -> Result<String, JsonError> {
    Ok(serde_json::to_string_pretty(grammar)?)
}

pub fn from_json(text: &str) -> Result<Grammar, JsonError> {
    let grammar: Grammar = serde_json::from_str(text)?;
    grammar.check().map_err(JsonError::Malformed)?;
    Ok(grammar)
}
