//! The grammar graph arena.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::rule::{RuleId, RuleKind, RuleTable, TableData};

/// Immutable grammar graph: a rule-table arena plus the list of top tables
/// the parse driver tries for each top-level construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grammar {
    rules: Vec<RuleTable>,
    top: Vec<RuleId>,
}

impl Grammar {
    pub(crate) fn from_parts(rules: Vec<RuleTable>, top: Vec<RuleId>) -> Self {
        Self { rules, top }
    }

    pub fn rule(&self, id: RuleId) -> &RuleTable {
        &self.rules[id.as_usize()]
    }

    pub fn name(&self, id: RuleId) -> &str {
        &self.rule(id).name
    }

    pub fn kind(&self, id: RuleId) -> &RuleKind {
        &self.rule(id).kind
    }

    pub fn children(&self, id: RuleId) -> &[TableData] {
        self.rule(id).kind.children()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = RuleId> {
        (0..self.rules.len() as u32).map(RuleId::from_raw)
    }

    /// Top tables in driver order.
    pub fn top_tables(&self) -> &[RuleId] {
        &self.top
    }

    pub fn find(&self, name: &str) -> Option<RuleId> {
        self.rules
            .iter()
            .position(|r| r.name == name)
            .map(|i| RuleId::from_raw(i as u32))
    }

    /// Every `RuleId` reachable through a child slot is in range, and at
    /// least one top table is declared.
    pub(crate) fn check(&self) -> Result<(), String> {
        if self.top.is_empty() {
            return Err("grammar has no top tables".to_string());
        }
        let in_range = |id: RuleId| id.as_usize() < self.rules.len();
        for table in &self.rules {
            for child in table.kind.children() {
                if let TableData::Rule(id) = child
                    && !in_range(*id)
                {
                    return Err(format!(
                        "rule `{}` references out-of-range table {}",
                        table.name,
                        id.as_u32()
                    ));
                }
            }
        }
        for id in &self.top {
            if !in_range(*id) {
                return Err(format!("out-of-range top table {}", id.as_u32()));
            }
        }
        Ok(())
    }

    /// Human-readable rendering of the whole graph.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for id in self.rule_ids() {
            let table = self.rule(id);
            let _ = write!(out, "{}: {}(", table.name, table.kind.name());
            for (i, child) in table.kind.children().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match child {
                    TableData::Rule(r) => out.push_str(self.name(*r)),
                    TableData::Literal(s) => {
                        let _ = write!(out, "\"{s}\"");
                    }
                    TableData::Kind(k) => {
                        let _ = write!(out, "<{k:?}>");
                    }
                }
            }
            out.push_str(")\n");
        }
        let _ = write!(out, "top:");
        for id in &self.top {
            let _ = write!(out, " {}", self.name(*id));
        }
        out.push('\n');
        out
    }
}
