//! Grammar validation against the detection result.
//!
//! Detection only walks from the configured top tables, so a left cycle can
//! escape it (an unreferenced rule family is the common case). At parse time
//! such a cycle would defeat the engine's recursion handling, so it is
//! rejected up front: an independent SCC computation over the same left-edge
//! relation must not find a cycle that no detected recursion covers.

use thiserror::Error;

use gramarye_grammar::Grammar;

use crate::reach::{left_children, sccs};
use crate::recursion::RecursionTables;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("left-recursive cycle through [{}] is not covered by any detected recursion", rules.join(", "))]
    UnguardedCycle { rules: Vec<String> },
}

pub fn validate(grammar: &Grammar, tables: &RecursionTables) -> Result<(), GrammarError> {
    for component in sccs(grammar, &tables.maybe_zero) {
        let cyclic = component.len() > 1
            || left_children(grammar, &tables.maybe_zero, component[0]).contains(&component[0]);
        if !cyclic {
            continue;
        }
        if component
            .iter()
            .any(|&rule| tables.recursions_of(rule).is_empty())
        {
            return Err(GrammarError::UnguardedCycle {
                rules: component
                    .iter()
                    .map(|&r| grammar.name(r).to_string())
                    .collect(),
            });
        }
    }
    Ok(())
}
