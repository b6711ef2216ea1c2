//! The appeal tree: one node per traversal attempt.
//!
//! Nodes are arena-allocated per parse attempt and addressed by [`NodeId`];
//! parent/child links are ids, never references. Failed attempts stay in the
//! tree — the appeal pass and the winning-subtree extraction both need to see
//! them.

use gramarye_grammar::{Grammar, RuleId};

/// Index into the [`AppealTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// How a traversal attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppealStatus {
    /// Not yet decided.
    Na,
    Succ,
    /// Succeeded by reusing a cached match.
    SuccWasSucc,
    /// Rejected by the failure memoization.
    FailWasFailed,
    /// Cut because the rule re-entered itself without consuming a token.
    FailLooped,
    FailChildrenFailed,
    /// An identifier was required and the token is not one.
    FailNotIdentifier,
    /// A literal token was required and the token is not one.
    FailNotLiteral,
}

impl AppealStatus {
    pub fn is_succ(self) -> bool {
        matches!(self, AppealStatus::Succ | AppealStatus::SuccWasSucc)
    }

    pub fn is_fail(self) -> bool {
        matches!(
            self,
            AppealStatus::FailWasFailed
                | AppealStatus::FailLooped
                | AppealStatus::FailChildrenFailed
                | AppealStatus::FailNotIdentifier
                | AppealStatus::FailNotLiteral
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeContent {
    Rule(RuleId),
    /// A matched token, by index into the active window.
    Token(u32),
}

#[derive(Debug)]
pub struct AppealNode {
    pub content: NodeContent,
    /// First token position of the attempt.
    pub start: u32,
    /// One past the last matched token; equals `start` until the attempt
    /// succeeds.
    pub end: u32,
    pub status: AppealStatus,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// The alternative a `Oneof` rule committed to. Extraction follows this
    /// instead of scanning the children, which may hold several alternatives
    /// with the same span.
    pub chosen: Option<NodeId>,
    /// Allocated while re-resolving a multi-match sibling.
    pub second_try: bool,
}

#[derive(Debug, Default)]
pub struct AppealTree {
    nodes: Vec<AppealNode>,
}

impl AppealTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a node and link it under `parent`.
    pub fn alloc(&mut self, content: NodeContent, start: u32, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(AppealNode {
            content,
            start,
            end: start,
            status: AppealStatus::Na,
            parent,
            children: Vec::new(),
            chosen: None,
            second_try: false,
        });
        if let Some(p) = parent {
            self.nodes[p.as_usize()].children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &AppealNode {
        &self.nodes[id.as_usize()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut AppealNode {
        &mut self.nodes[id.as_usize()]
    }

    /// Debug rendering of a subtree, one line per attempt.
    pub fn dump(&self, grammar: &Grammar, root: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            let label = match node.content {
                NodeContent::Rule(rule) => grammar.name(rule).to_string(),
                NodeContent::Token(idx) => format!("token#{idx}"),
            };
            out.push_str(&"  ".repeat(depth));
            out.push_str(&format!(
                "{label}@{}..{} {:?}\n",
                node.start, node.end, node.status
            ));
            for &child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}
