//! Per-construct traversal caches.

use std::collections::HashSet;

use indexmap::IndexMap;

use gramarye_grammar::RuleId;

/// Every match a rule produced at each start position. A rule can match the
/// same start with several lengths (a greedy `Oneof` records all of them);
/// second-try consumes the shorter ones when the longest starves a sibling.
#[derive(Debug, Default, Clone)]
pub struct SuccMatch {
    ends: IndexMap<u32, Vec<u32>>,
}

impl SuccMatch {
    /// Record a match from `start` to `end` (exclusive). Duplicates are
    /// ignored; ends stay sorted ascending.
    pub fn add(&mut self, start: u32, end: u32) {
        let ends = self.ends.entry(start).or_default();
        if let Err(at) = ends.binary_search(&end) {
            ends.insert(at, end);
        }
    }

    pub fn ends(&self, start: u32) -> &[u32] {
        self.ends.get(&start).map_or(&[], Vec::as_slice)
    }

    pub fn longest(&self, start: u32) -> Option<u32> {
        self.ends(start).last().copied()
    }

    pub fn clear(&mut self) {
        self.ends.clear();
    }
}

/// All mutable traversal state for one top-level construct: the visited
/// flags and per-rule position stacks for loop detection, the failure
/// memoization and the success cache. Reset between constructs.
#[derive(Debug)]
pub struct ParseSession {
    visited: Vec<bool>,
    visited_stack: Vec<Vec<u32>>,
    failed: Vec<HashSet<u32>>,
    succ: Vec<SuccMatch>,
}

impl ParseSession {
    pub fn new(rule_count: usize) -> Self {
        Self {
            visited: vec![false; rule_count],
            visited_stack: vec![Vec::new(); rule_count],
            failed: vec![HashSet::new(); rule_count],
            succ: vec![SuccMatch::default(); rule_count],
        }
    }

    pub fn reset(&mut self) {
        for v in &mut self.visited {
            *v = false;
        }
        for s in &mut self.visited_stack {
            s.clear();
        }
        for f in &mut self.failed {
            f.clear();
        }
        for s in &mut self.succ {
            s.clear();
        }
    }

    pub fn is_visited(&self, rule: RuleId) -> bool {
        self.visited[rule.as_usize()]
    }

    pub fn set_visited(&mut self, rule: RuleId) {
        self.visited[rule.as_usize()] = true;
    }

    /// Token position of the innermost active re-entry, if any.
    pub fn top_visited(&self, rule: RuleId) -> Option<u32> {
        self.visited_stack[rule.as_usize()].last().copied()
    }

    pub fn push_visited(&mut self, rule: RuleId, pos: u32) {
        self.visited_stack[rule.as_usize()].push(pos);
    }

    /// Unwind one entry: pop the re-entry stack, or clear the flag when the
    /// outermost entry exits.
    pub fn pop_visited(&mut self, rule: RuleId) {
        if self.visited_stack[rule.as_usize()].pop().is_none() {
            self.visited[rule.as_usize()] = false;
        }
    }

    pub fn add_failed(&mut self, rule: RuleId, pos: u32) {
        self.failed[rule.as_usize()].insert(pos);
    }

    pub fn was_failed(&self, rule: RuleId, pos: u32) -> bool {
        self.failed[rule.as_usize()].contains(&pos)
    }

    /// Clear a failure mark. No-op when the mark was never set, so appeal can
    /// fire on the same node more than once.
    pub fn reset_failed(&mut self, rule: RuleId, pos: u32) {
        self.failed[rule.as_usize()].remove(&pos);
    }

    pub fn add_succ(&mut self, rule: RuleId, start: u32, end: u32) {
        self.succ[rule.as_usize()].add(start, end);
    }

    pub fn succ_ends(&self, rule: RuleId, start: u32) -> &[u32] {
        self.succ[rule.as_usize()].ends(start)
    }

    pub fn succ_longest(&self, rule: RuleId, start: u32) -> Option<u32> {
        self.succ[rule.as_usize()].longest(start)
    }
}
