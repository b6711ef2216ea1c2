//! Rule-table grammar graph.
//!
//! A grammar is a directed (and usually cyclic) graph of rule tables. Each
//! table has a kind (`Concatenate`, `Oneof`, `ZeroOrMore`, `ZeroOrOne`,
//! `Data`) and an ordered list of children, where a child is either an edge
//! to another table, a literal, or a token-kind marker. The graph is produced
//! ahead of time by a grammar-authoring tool and consumed read-only by the
//! recursion analysis and the parsing engine.

mod builder;
mod grammar;
mod json;
mod rule;
mod token;

pub use builder::{BuildError, GrammarBuilder};
pub use grammar::Grammar;
pub use json::{JsonError, from_json, to_json};
pub use rule::{RuleId, RuleKind, RuleTable, TableData};
pub use token::{Token, TokenKind};
