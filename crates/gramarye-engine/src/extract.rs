//! Winning-subtree extraction.
//!
//! A finished appeal tree holds every attempt, failed ones included, and a
//! rule node's children may contain several generations of retries. This pass
//! reduces it to the single chain of matches that produced the final span: a
//! `Oneof` node yields the alternative it committed to, and other nodes are
//! walked backwards from their end position taking, for each gap, the latest
//! succeeding child that closes it. `SuccWasSucc` nodes
//! carry no children of their own and are resolved to the original succeeding
//! attempt with the same rule and span.

use std::collections::HashMap;

use gramarye_grammar::{RuleId, Token};

use crate::appeal::{AppealStatus, AppealTree, NodeContent, NodeId};

/// A matched rule with the matches that built it, in token order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTree {
    pub rule: RuleId,
    pub start: u32,
    pub end: u32,
    pub children: Vec<MatchChild>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchChild {
    Rule(MatchTree),
    Token(Token),
}

impl MatchTree {
    /// Rule children only, skipping matched tokens.
    pub fn rule_children(&self) -> impl Iterator<Item = &MatchTree> {
        self.children.iter().filter_map(|c| match c {
            MatchChild::Rule(t) => Some(t),
            MatchChild::Token(_) => None,
        })
    }
}

pub(crate) fn sort_out(
    tree: &AppealTree,
    succ_nodes: &HashMap<(RuleId, u32, u32), NodeId>,
    tokens: &[Token],
    id: NodeId,
) -> MatchTree {
    let node = tree.node(id);
    let NodeContent::Rule(rule) = node.content else {
        unreachable!("sort_out starts at rule nodes only");
    };
    debug_assert!(node.status.is_succ());

    if node.status == AppealStatus::SuccWasSucc {
        if let Some(&real) = succ_nodes.get(&(rule, node.start, node.end))
            && real != id
        {
            return sort_out(tree, succ_nodes, tokens, real);
        }
        return MatchTree {
            rule,
            start: node.start,
            end: node.end,
            children: Vec::new(),
        };
    }

    // A Oneof node records its committed alternative; several children may
    // share the winning span, and the engine commits to the first of equals.
    // Sequence nodes instead chain backwards from the end: among duplicated
    // attempts the latest one is the one that stuck (retries come after the
    // match they replace). Zero-length matches are dropped, they contribute
    // nothing to the chain.
    let picked = if let Some(chosen) = node.chosen {
        vec![chosen]
    } else {
        let mut remaining = node.children.clone();
        let mut picked = Vec::new();
        let mut target = node.end;
        while target > node.start {
            let found = remaining.iter().rposition(|&c| {
                let child = tree.node(c);
                child.status.is_succ()
                    && child.end == target
                    && child.start < child.end
                    && child.start >= node.start
            });
            let Some(at) = found else {
                break;
            };
            let child = remaining.remove(at);
            target = tree.node(child).start;
            picked.push(child);
        }
        picked.reverse();
        picked
    };

    let children = picked
        .into_iter()
        .map(|c| match tree.node(c).content {
            NodeContent::Rule(_) => MatchChild::Rule(sort_out(tree, succ_nodes, tokens, c)),
            NodeContent::Token(idx) => MatchChild::Token(tokens[idx as usize].clone()),
        })
        .collect();

    MatchTree {
        rule,
        start: node.start,
        end: node.end,
        children,
    }
}
