//! The left-recursion detection DFS.
//!
//! Rules move through three sets: ToDo (queued as a DFS root), InProcess (on
//! the current DFS path) and Done. Hitting an InProcess rule again means the
//! path closed a left-recursive cycle; the re-entered rule becomes the cycle's
//! lead and the child indices along the path are recorded as a [`RecPath`].
//!
//! Every finished rule is classified either `Fail` (must consume at least one
//! token to match) or `MaybeZero` (can match the empty sequence). The
//! classification drives the `Concatenate` leading-position rule: the DFS
//! walks past a child only while all children so far are MaybeZero; the first
//! non-MaybeZero child is the last one in a leading position, and any children
//! after it are queued as fresh DFS roots instead.

use std::collections::VecDeque;

use indexmap::IndexSet;

use gramarye_grammar::{Grammar, RuleId, RuleKind, TableData};

use crate::backpatch::back_patch;
use crate::group::build_groups;
use crate::recursion::{RecPath, Recursion, RecursionTables};

/// Run the full analysis: detection DFS, back-patch fixpoint, grouping.
pub fn analyze(grammar: &Grammar) -> RecursionTables {
    let mut detector = Detector::new(grammar);
    detector.run();

    let maybe_zero: Vec<bool> = detector
        .done
        .iter()
        .map(|c| *c == Some(Class::MaybeZero))
        .collect();
    let mut recursions = detector.recursions;
    let mut rule_to_recursions = detector.rule_to_recursions;

    back_patch(grammar, &maybe_zero, &mut recursions, &mut rule_to_recursions);
    let (groups, rule_to_group) = build_groups(grammar, &maybe_zero, &recursions);

    RecursionTables {
        recursions,
        groups,
        rule_to_recursions,
        rule_to_group,
        maybe_zero,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    /// Matching needs at least one token.
    Fail,
    /// Can match zero tokens.
    MaybeZero,
}

/// One frame of the DFS path: the parent rule and the child slot taken.
#[derive(Debug, Clone, Copy)]
struct Step {
    rule: RuleId,
    child: usize,
}

struct Detector<'g> {
    grammar: &'g Grammar,
    todo: VecDeque<RuleId>,
    queued: Vec<bool>,
    in_process: Vec<bool>,
    done: Vec<Option<Class>>,
    path: Vec<Step>,
    recursions: Vec<Recursion>,
    rule_to_recursions: Vec<Vec<usize>>,
}

impl<'g> Detector<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let n = grammar.len();
        let mut det = Self {
            grammar,
            todo: VecDeque::new(),
            queued: vec![false; n],
            in_process: vec![false; n],
            done: vec![None; n],
            path: Vec::new(),
            recursions: Vec::new(),
            rule_to_recursions: vec![Vec::new(); n],
        };
        for &top in grammar.top_tables() {
            det.enqueue(top);
        }
        det
    }

    fn enqueue(&mut self, rule: RuleId) {
        if !self.queued[rule.as_usize()] && self.done[rule.as_usize()].is_none() {
            self.queued[rule.as_usize()] = true;
            self.todo.push_back(rule);
        }
    }

    fn run(&mut self) {
        while let Some(root) = self.todo.pop_front() {
            if self.done[root.as_usize()].is_some() {
                continue;
            }
            self.path.clear();
            self.visit(root);
            debug_assert!(self.in_process.iter().all(|p| !p));
        }
    }

    fn visit(&mut self, rule: RuleId) -> Class {
        if let Some(class) = self.done[rule.as_usize()] {
            return class;
        }
        if self.in_process[rule.as_usize()] {
            self.add_recursion(rule);
            return Class::Fail;
        }
        self.in_process[rule.as_usize()] = true;

        let grammar = self.grammar;
        let class = match grammar.kind(rule) {
            RuleKind::Oneof(children) => {
                let mut class = Class::Fail;
                for (i, child) in children.iter().enumerate() {
                    if let Some(r) = child.rule() && self.visit_child(rule, i, r) == Class::MaybeZero
                    {
                        class = Class::MaybeZero;
                    }
                }
                class
            }
            RuleKind::ZeroOrMore(d) | RuleKind::ZeroOrOne(d) => {
                if let Some(r) = d.rule() {
                    self.visit_child(rule, 0, r);
                }
                Class::MaybeZero
            }
            RuleKind::Data(d) => match d.rule() {
                Some(r) => self.visit_child(rule, 0, r),
                None => Class::Fail,
            },
            RuleKind::Concatenate(children) => {
                let mut class = Class::MaybeZero;
                for (i, child) in children.iter().enumerate() {
                    let child_class = match child.rule() {
                        Some(r) => self.visit_child(rule, i, r),
                        None => Class::Fail,
                    };
                    if child_class == Class::Fail {
                        class = Class::Fail;
                        self.defer(&children[i + 1..]);
                        break;
                    }
                }
                class
            }
        };

        self.in_process[rule.as_usize()] = false;
        self.done[rule.as_usize()] = Some(class);
        class
    }

    fn visit_child(&mut self, parent: RuleId, child: usize, rule: RuleId) -> Class {
        self.path.push(Step {
            rule: parent,
            child,
        });
        let class = self.visit(rule);
        self.path.pop();
        class
    }

    /// Children past the leading positions become fresh DFS roots.
    fn defer(&mut self, rest: &[TableData]) {
        for child in rest {
            if let Some(r) = child.rule() {
                self.enqueue(r);
            }
        }
    }

    /// The current path closed a cycle at `lead`: record the suffix of the
    /// path from the first (outermost) occurrence of `lead` as a RecPath, and
    /// register every rule on it as a member of the lead's recursion.
    fn add_recursion(&mut self, lead: RuleId) {
        let first = self
            .path
            .iter()
            .position(|s| s.rule == lead)
            .expect("in-process rule must be on the DFS path");
        let steps: Vec<usize> = self.path[first..].iter().map(|s| s.child).collect();
        let path = RecPath::new(steps);
        debug_assert!(path.closes_cycle(self.grammar, lead));

        let idx = match self.recursions.iter().position(|r| r.lead == lead) {
            Some(idx) => idx,
            None => {
                self.recursions.push(Recursion {
                    lead,
                    paths: Vec::new(),
                    members: IndexSet::new(),
                });
                self.recursions.len() - 1
            }
        };
        let rec = &mut self.recursions[idx];
        if !rec.paths.contains(&path) {
            rec.paths.push(path);
        }
        for step in &self.path[first..] {
            if rec.members.insert(step.rule) {
                self.rule_to_recursions[step.rule.as_usize()].push(idx);
            }
        }
    }
}
