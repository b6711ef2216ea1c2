//! LR-reachability: which rules can be entered without consuming a token.
//!
//! The left-edge relation follows every child of a `Oneof`, the single child
//! of `ZeroOrMore`/`ZeroOrOne`/`Data`, and for `Concatenate` the prefix of
//! children up to and including the first one that is not MaybeZero (a
//! terminal child ends the prefix without contributing an edge). Detection,
//! back-patching, grouping and validation all share this relation.

use gramarye_grammar::{Grammar, RuleId, RuleKind, TableData};

/// Rule children of `rule` that occupy a leading position.
pub(crate) fn left_children(grammar: &Grammar, maybe_zero: &[bool], rule: RuleId) -> Vec<RuleId> {
    let mut out = Vec::new();
    match grammar.kind(rule) {
        RuleKind::Oneof(children) => {
            out.extend(children.iter().filter_map(TableData::rule));
        }
        RuleKind::ZeroOrMore(d) | RuleKind::ZeroOrOne(d) | RuleKind::Data(d) => {
            out.extend(d.rule());
        }
        RuleKind::Concatenate(children) => {
            for child in children {
                let Some(r) = child.rule() else {
                    break;
                };
                out.push(r);
                if !maybe_zero[r.as_usize()] {
                    break;
                }
            }
        }
    }
    out
}

/// Every rule reachable from `from` through left edges, `from` included.
pub(crate) fn reachable_set(grammar: &Grammar, maybe_zero: &[bool], from: RuleId) -> Vec<bool> {
    let mut seen = vec![false; grammar.len()];
    seen[from.as_usize()] = true;
    let mut queue = vec![from];
    while let Some(rule) = queue.pop() {
        for next in left_children(grammar, maybe_zero, rule) {
            if !seen[next.as_usize()] {
                seen[next.as_usize()] = true;
                queue.push(next);
            }
        }
    }
    seen
}

pub(crate) fn lr_reachable(grammar: &Grammar, maybe_zero: &[bool], from: RuleId, to: RuleId) -> bool {
    reachable_set(grammar, maybe_zero, from)[to.as_usize()]
}

/// Tarjan SCC over the left-edge relation, in discovery order.
pub(crate) fn sccs(grammar: &Grammar, maybe_zero: &[bool]) -> Vec<Vec<RuleId>> {
    let n = grammar.len();
    let mut state = Tarjan {
        grammar,
        maybe_zero,
        index: vec![None; n],
        lowlink: vec![0; n],
        on_stack: vec![false; n],
        stack: Vec::new(),
        next_index: 0,
        out: Vec::new(),
    };
    for rule in grammar.rule_ids() {
        if state.index[rule.as_usize()].is_none() {
            state.visit(rule);
        }
    }
    state.out
}

struct Tarjan<'g> {
    grammar: &'g Grammar,
    maybe_zero: &'g [bool],
    index: Vec<Option<u32>>,
    lowlink: Vec<u32>,
    on_stack: Vec<bool>,
    stack: Vec<RuleId>,
    next_index: u32,
    out: Vec<Vec<RuleId>>,
}

impl Tarjan<'_> {
    fn visit(&mut self, rule: RuleId) {
        let v = rule.as_usize();
        self.index[v] = Some(self.next_index);
        self.lowlink[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(rule);
        self.on_stack[v] = true;

        for next in left_children(self.grammar, self.maybe_zero, rule) {
            let w = next.as_usize();
            match self.index[w] {
                None => {
                    self.visit(next);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                }
                Some(idx) if self.on_stack[w] => {
                    self.lowlink[v] = self.lowlink[v].min(idx);
                }
                Some(_) => {}
            }
        }

        if Some(self.lowlink[v]) == self.index[v] {
            let mut component = Vec::new();
            loop {
                let w = self.stack.pop().unwrap();
                self.on_stack[w.as_usize()] = false;
                component.push(w);
                if w == rule {
                    break;
                }
            }
            component.reverse();
            self.out.push(component);
        }
    }
}
