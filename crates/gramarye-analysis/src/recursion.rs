//! Recursion table types and their serialized form.

use std::fmt::Write as _;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gramarye_grammar::{Grammar, RuleId};

/// One left-recursive path: the sequence of child indices that leads from a
/// recursion's lead rule back to itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecPath(Vec<usize>);

impl RecPath {
    pub fn new(steps: Vec<usize>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[usize] {
        &self.0
    }

    /// Follow the path from `lead` through the grammar's child edges. Every
    /// step must land on a rule child; the final step must return to `lead`.
    pub fn closes_cycle(&self, grammar: &Grammar, lead: RuleId) -> bool {
        let mut cur = lead;
        for &step in &self.0 {
            let Some(child) = grammar.children(cur).get(step) else {
                return false;
            };
            let Some(next) = child.rule() else {
                return false;
            };
            cur = next;
        }
        cur == lead
    }
}

/// A left-recursive cycle family: all cycles whose first re-entered rule
/// during detection was `lead`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recursion {
    pub(crate) lead: RuleId,
    pub(crate) paths: Vec<RecPath>,
    pub(crate) members: IndexSet<RuleId>,
}

impl Recursion {
    pub fn lead(&self) -> RuleId {
        self.lead
    }

    pub fn paths(&self) -> &[RecPath] {
        &self.paths
    }

    pub fn members(&self) -> &IndexSet<RuleId> {
        &self.members
    }
}

/// Recursions whose leads are mutually LR-reachable. Indices point into
/// [`RecursionTables::recursions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursionGroup {
    pub(crate) recursions: Vec<usize>,
    pub(crate) members: IndexSet<RuleId>,
}

impl RecursionGroup {
    pub fn recursions(&self) -> &[usize] {
        &self.recursions
    }

    pub fn members(&self) -> &IndexSet<RuleId> {
        &self.members
    }
}

#[derive(Debug, Error)]
pub enum TablesError {
    #[error("recursion tables serialization error: {0}")]
    Postcard(#[from] postcard::Error),
}

/// Complete analysis output for one grammar. Immutable once built; the
/// engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursionTables {
    pub(crate) recursions: Vec<Recursion>,
    pub(crate) groups: Vec<RecursionGroup>,
    /// Indexed by rule: recursions the rule participates in.
    pub(crate) rule_to_recursions: Vec<Vec<usize>>,
    /// Indexed by rule: the group the rule belongs to, if any.
    pub(crate) rule_to_group: Vec<Option<usize>>,
    /// Indexed by rule: whether the rule can match zero tokens.
    pub(crate) maybe_zero: Vec<bool>,
}

impl RecursionTables {
    pub fn recursions(&self) -> &[Recursion] {
        &self.recursions
    }

    pub fn groups(&self) -> &[RecursionGroup] {
        &self.groups
    }

    pub fn recursions_of(&self, rule: RuleId) -> &[usize] {
        &self.rule_to_recursions[rule.as_usize()]
    }

    pub fn group_of(&self, rule: RuleId) -> Option<usize> {
        self.rule_to_group[rule.as_usize()]
    }

    pub fn is_maybe_zero(&self, rule: RuleId) -> bool {
        self.maybe_zero[rule.as_usize()]
    }

    /// Index of the recursion led by `rule`, if `rule` is a lead.
    pub fn recursion_of_lead(&self, rule: RuleId) -> Option<usize> {
        self.recursions.iter().position(|r| r.lead == rule)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, TablesError> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, TablesError> {
        Ok(postcard::from_bytes(bytes)?)
    }

    /// Human-readable rendering, stable across runs on the same grammar.
    pub fn dump(&self, grammar: &Grammar) -> String {
        let mut out = String::new();
        for (i, rec) in self.recursions.iter().enumerate() {
            let _ = write!(out, "recursion {i}: lead {}", grammar.name(rec.lead));
            out.push_str(", paths [");
            for (j, path) in rec.paths.iter().enumerate() {
                if j > 0 {
                    out.push(' ');
                }
                let steps: Vec<String> = path.steps().iter().map(|s| s.to_string()).collect();
                let _ = write!(out, "{}", steps.join("."));
            }
            out.push_str("], members {");
            for (j, m) in rec.members.iter().enumerate() {
                if j > 0 {
                    out.push_str(", ");
                }
                out.push_str(grammar.name(*m));
            }
            out.push_str("}\n");
        }
        for (i, g) in self.groups.iter().enumerate() {
            let _ = write!(out, "group {i}: recursions {:?}, members {{", g.recursions);
            for (j, m) in g.members.iter().enumerate() {
                if j > 0 {
                    out.push_str(", ");
                }
                out.push_str(grammar.name(*m));
            }
            out.push_str("}\n");
        }
        out
    }
}
