//! Membership back-patching.
//!
//! The DFS caches finished rules, so a rule that reaches a cycle only through
//! an already-Done child never lands on the path when the cycle's back edge
//! fires, and misses its membership registration. This pass closes the gap:
//! if a rule has a leading-position child inside a recursion, and the
//! recursion's lead can reach the rule through left edges, the rule sits on a
//! cycle of that recursion and is added. Repeated until no pass changes
//! anything.

use gramarye_grammar::{Grammar, RuleId};

use crate::reach::{left_children, lr_reachable};
use crate::recursion::Recursion;

pub(crate) fn back_patch(
    grammar: &Grammar,
    maybe_zero: &[bool],
    recursions: &mut [Recursion],
    rule_to_recursions: &mut [Vec<usize>],
) {
    let mut passes = 0;
    loop {
        let mut changed = false;
        for rule in grammar.rule_ids() {
            for child in left_children(grammar, maybe_zero, rule) {
                changed |= adopt(grammar, maybe_zero, recursions, rule_to_recursions, rule, child);
            }
        }
        passes += 1;
        if !changed {
            break;
        }
        // Each productive pass adds at least one membership.
        assert!(
            passes <= grammar.len() + 1,
            "recursion back-patch failed to converge"
        );
    }
}

fn adopt(
    grammar: &Grammar,
    maybe_zero: &[bool],
    recursions: &mut [Recursion],
    rule_to_recursions: &mut [Vec<usize>],
    rule: RuleId,
    child: RuleId,
) -> bool {
    let mut changed = false;
    let candidates = rule_to_recursions[child.as_usize()].clone();
    for idx in candidates {
        let rec = &recursions[idx];
        if rec.members.contains(&rule) {
            continue;
        }
        // child is a member, so child reaches the lead; a left edge from a
        // lead-reachable rule into the cycle puts the rule on a cycle too.
        if lr_reachable(grammar, maybe_zero, rec.lead, rule) {
            recursions[idx].members.insert(rule);
            rule_to_recursions[rule.as_usize()].push(idx);
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze;
    use gramarye_grammar::{GrammarBuilder, RuleKind, TableData, TokenKind};

    #[test]
    fn back_patch_restores_a_missing_membership() {
        let mut b = GrammarBuilder::new();
        let e = b.rule("E");
        let e_plus_t = b.rule("EPlusT");
        let t = b.rule("T");
        b.define(
            e,
            RuleKind::Oneof(vec![TableData::Rule(t), TableData::Rule(e_plus_t)]),
        );
        b.define(
            e_plus_t,
            RuleKind::Concatenate(vec![
                TableData::Rule(e),
                TableData::Literal("+".into()),
                TableData::Rule(t),
            ]),
        );
        b.define(t, RuleKind::Data(Box::new(TableData::Kind(TokenKind::Literal))));
        b.top(e);
        let g = b.build().unwrap();

        let tables = analyze(&g);
        let mut recursions = tables.recursions().to_vec();
        let mut rule_to_recursions: Vec<Vec<usize>> =
            g.rule_ids().map(|r| tables.recursions_of(r).to_vec()).collect();
        let maybe_zero: Vec<bool> = g.rule_ids().map(|r| tables.is_maybe_zero(r)).collect();

        // Strip EPlusT as if the DFS had missed it.
        recursions[0].members.shift_remove(&e_plus_t);
        rule_to_recursions[e_plus_t.as_usize()].clear();

        back_patch(&g, &maybe_zero, &mut recursions, &mut rule_to_recursions);
        assert!(recursions[0].members.contains(&e_plus_t));
        assert_eq!(rule_to_recursions[e_plus_t.as_usize()], vec![0]);
    }

    #[test]
    fn unrelated_rules_are_not_adopted() {
        // S references E from a leading position but the lead cannot reach S,
        // so S is not on any cycle.
        let mut b = GrammarBuilder::new();
        let s = b.rule("S");
        let e = b.rule("E");
        let e_plus_t = b.rule("EPlusT");
        let t = b.rule("T");
        b.define(
            s,
            RuleKind::Concatenate(vec![TableData::Rule(e), TableData::Literal(";".into())]),
        );
        b.define(
            e,
            RuleKind::Oneof(vec![TableData::Rule(t), TableData::Rule(e_plus_t)]),
        );
        b.define(
            e_plus_t,
            RuleKind::Concatenate(vec![
                TableData::Rule(e),
                TableData::Literal("+".into()),
                TableData::Rule(t),
            ]),
        );
        b.define(t, RuleKind::Data(Box::new(TableData::Kind(TokenKind::Literal))));
        b.top(s);
        let g = b.build().unwrap();

        let tables = analyze(&g);
        assert_eq!(tables.recursions().len(), 1);
        assert!(!tables.recursions()[0].members().contains(&s));
        assert!(tables.recursions_of(s).is_empty());
    }
}
