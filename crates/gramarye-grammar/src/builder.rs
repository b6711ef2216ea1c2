//! Programmatic grammar construction.
//!
//! Cyclic graphs cannot be built bottom-up, so the builder hands out ids
//! first and accepts definitions in any order.

use indexmap::IndexMap;
use thiserror::Error;

use crate::grammar::Grammar;
use crate::rule::{RuleId, RuleKind, RuleTable};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("rule `{0}` was declared but never defined")]
    UndefinedRule(String),
    #[error("rule `{0}` has no children")]
    EmptyRule(String),
    #[error("grammar has no top tables")]
    NoTopTables,
}

/// Two-phase builder: declare names to get [`RuleId`]s, then attach a
/// [`RuleKind`] to each.
#[derive(Default)]
pub struct GrammarBuilder {
    names: IndexMap<String, RuleId>,
    kinds: Vec<Option<RuleKind>>,
    top: Vec<RuleId>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or look up) a rule by name.
    pub fn rule(&mut self, name: &str) -> RuleId {
        if let Some(id) = self.names.get(name) {
            return *id;
        }
        let id = RuleId::from_raw(self.kinds.len() as u32);
        self.names.insert(name.to_string(), id);
        self.kinds.push(None);
        id
    }

    /// Attach the definition for a previously declared rule.
    ///
    /// Panics if `id` was not handed out by this builder or is already
    /// defined.
    pub fn define(&mut self, id: RuleId, kind: RuleKind) {
        let slot = &mut self.kinds[id.as_usize()];
        assert!(slot.is_none(), "rule already defined");
        *slot = Some(kind);
    }

    /// Register a top table for the parse driver. Order is preserved.
    pub fn top(&mut self, id: RuleId) {
        if !self.top.contains(&id) {
            self.top.push(id);
        }
    }

    pub fn build(self) -> Result<Grammar, BuildError> {
        if self.top.is_empty() {
            return Err(BuildError::NoTopTables);
        }
        let mut rules = Vec::with_capacity(self.kinds.len());
        for (name, id) in &self.names {
            let kind = self.kinds[id.as_usize()]
                .clone()
                .ok_or_else(|| BuildError::UndefinedRule(name.clone()))?;
            if kind.children().is_empty() {
                return Err(BuildError::EmptyRule(name.clone()));
            }
            rules.push(RuleTable {
                name: name.clone(),
                kind,
            });
        }
        let grammar = Grammar::from_parts(rules, self.top);
        debug_assert!(grammar.check().is_ok());
        Ok(grammar)
    }
}
