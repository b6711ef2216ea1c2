//! Rule table definitions.

use serde::{Deserialize, Serialize};

use crate::token::TokenKind;

/// Index of a rule table in the [`Grammar`](crate::Grammar) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(u32);

impl RuleId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// One child slot of a rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableData {
    /// Edge to another rule table.
    Rule(RuleId),
    /// Concrete keyword, operator or separator text.
    Literal(String),
    /// Token-kind marker; matches any token of that kind.
    Kind(TokenKind),
}

impl TableData {
    pub fn rule(&self) -> Option<RuleId> {
        match self {
            TableData::Rule(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TableData::Rule(_))
    }
}

/// Kind-tagged child list of a rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    /// All children must match in order.
    Concatenate(Vec<TableData>),
    /// Alternatives; the engine records every match and keeps the longest.
    Oneof(Vec<TableData>),
    /// Repeated child, zero times allowed.
    ZeroOrMore(Box<TableData>),
    /// Optional child.
    ZeroOrOne(Box<TableData>),
    /// Single mandatory child.
    Data(Box<TableData>),
}

impl RuleKind {
    /// Children in slot order, uniform across kinds.
    pub fn children(&self) -> &[TableData] {
        match self {
            RuleKind::Concatenate(c) | RuleKind::Oneof(c) => c,
            RuleKind::ZeroOrMore(d) | RuleKind::ZeroOrOne(d) | RuleKind::Data(d) => {
                std::slice::from_ref(&**d)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Concatenate(_) => "Concatenate",
            RuleKind::Oneof(_) => "Oneof",
            RuleKind::ZeroOrMore(_) => "ZeroOrMore",
            RuleKind::ZeroOrOne(_) => "ZeroOrOne",
            RuleKind::Data(_) => "Data",
        }
    }
}

/// A named rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub name: String,
    pub kind: RuleKind,
}
