//! Recursion grouping.
//!
//! Two recursions belong to the same group when their leads are mutually
//! LR-reachable; the engine must iterate such recursions together because a
//! longer match for one lead can enable a longer match for the other.

use indexmap::IndexSet;

use gramarye_grammar::Grammar;

use crate::reach::reachable_set;
use crate::recursion::{Recursion, RecursionGroup};

pub(crate) fn build_groups(
    grammar: &Grammar,
    maybe_zero: &[bool],
    recursions: &[Recursion],
) -> (Vec<RecursionGroup>, Vec<Option<usize>>) {
    let n = recursions.len();
    let reach: Vec<Vec<bool>> = recursions
        .iter()
        .map(|r| reachable_set(grammar, maybe_zero, r.lead))
        .collect();

    // Union-find over recursion indices.
    let mut rep: Vec<usize> = (0..n).collect();
    fn find(rep: &mut [usize], mut i: usize) -> usize {
        while rep[i] != i {
            rep[i] = rep[rep[i]];
            i = rep[i];
        }
        i
    }
    for i in 0..n {
        for j in i + 1..n {
            let i_sees_j = reach[i][recursions[j].lead.as_usize()];
            let j_sees_i = reach[j][recursions[i].lead.as_usize()];
            if i_sees_j && j_sees_i {
                let (a, b) = (find(&mut rep, i), find(&mut rep, j));
                if a != b {
                    rep[b] = a;
                }
            }
        }
    }

    // Emit groups in first-encountered order.
    let mut groups: Vec<RecursionGroup> = Vec::new();
    let mut rep_to_group: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        let r = find(&mut rep, i);
        let gi = match rep_to_group[r] {
            Some(gi) => gi,
            None => {
                groups.push(RecursionGroup {
                    recursions: Vec::new(),
                    members: IndexSet::new(),
                });
                rep_to_group[r] = Some(groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[gi].recursions.push(i);
        groups[gi].members.extend(recursions[i].members.iter().copied());
    }

    let mut rule_to_group = vec![None; grammar.len()];
    for (gi, group) in groups.iter().enumerate() {
        for &member in &group.members {
            debug_assert!(
                rule_to_group[member.as_usize()].is_none_or(|g: usize| g == gi),
                "rule assigned to two recursion groups"
            );
            rule_to_group[member.as_usize()] = Some(gi);
        }
    }
    (groups, rule_to_group)
}
