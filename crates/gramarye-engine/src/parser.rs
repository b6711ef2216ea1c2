//! The traversal state machine.
//!
//! `traverse_rule` is the single entry for matching a rule at the current
//! token position. Entry checks run in a fixed order: cached success
//! (`SuccWasSucc`), memoized failure (`FailWasFailed`), then the loop check —
//! a rule re-entering itself at an unchanged position is cut with
//! `FailLooped` and, crucially, that cut is never memoized as a failure.
//!
//! Left recursion is resolved by growing lead rules: when a recursion's lead
//! is entered fresh, the engine opens a "wave" and re-traverses the lead
//! while each round extends its longest cached match. Inside a wave, rules of
//! the same recursion group must not trust their caches at the wave position,
//! neither a cached success nor a memoized failure (both are exactly what is
//! still growing); the lead itself must, which is how the recursive reference
//! inside the cycle resolves to the previous round's match.

use std::collections::HashMap;

use thiserror::Error;

use gramarye_analysis::RecursionTables;
use gramarye_grammar::{Grammar, RuleId, RuleKind, TableData, TokenKind};

use crate::appeal::{AppealStatus, AppealTree, NodeContent, NodeId};
use crate::extract::{MatchTree, sort_out};
use crate::limits::ParseLimits;
use crate::session::ParseSession;
use crate::source::{TokenSource, TokenWindow};
use crate::trace::{NoopTracer, Tracer};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error at line {line}, column {col}: unexpected token `{text}`")]
    Syntax { line: u32, col: u32, text: String },
    #[error("recursion depth limit exceeded ({0} nested rule entries)")]
    RecursionLimitExceeded(u32),
}

/// Result of one [`Parser::parse_unit`] call.
#[derive(Debug)]
pub enum UnitOutcome {
    /// A top table matched `consumed` tokens, now discarded from the window.
    Matched { tree: MatchTree, consumed: u32 },
    EndOfFile,
}

/// Outcome of one rule dispatch.
enum RuleMatch {
    Matched,
    Failed(AppealStatus),
}

/// An in-progress left-recursion fixpoint.
struct Wave {
    group: usize,
    lead: RuleId,
    pos: u32,
}

pub struct Parser<'g, S, T = NoopTracer> {
    grammar: &'g Grammar,
    tables: &'g RecursionTables,
    window: TokenWindow<S>,
    session: ParseSession,
    tree: AppealTree,
    /// Latest real `Succ` node per (rule, start, end); resolves
    /// `SuccWasSucc` references during extraction.
    succ_nodes: HashMap<(RuleId, u32, u32), NodeId>,
    waves: Vec<Wave>,
    cur: u32,
    depth: u32,
    limits: ParseLimits,
    tracer: T,
}

impl<'g, S: TokenSource> Parser<'g, S> {
    pub fn new(grammar: &'g Grammar, tables: &'g RecursionTables, source: S) -> Self {
        Self::with_tracer(grammar, tables, source, NoopTracer)
    }
}

impl<'g, S: TokenSource, T: Tracer> Parser<'g, S, T> {
    pub fn with_tracer(
        grammar: &'g Grammar,
        tables: &'g RecursionTables,
        source: S,
        tracer: T,
    ) -> Self {
        Self {
            grammar,
            tables,
            window: TokenWindow::new(source),
            session: ParseSession::new(grammar.len()),
            tree: AppealTree::new(),
            succ_nodes: HashMap::new(),
            waves: Vec::new(),
            cur: 0,
            depth: 0,
            limits: ParseLimits::default(),
            tracer,
        }
    }

    pub fn limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    /// The appeal tree of the most recent parse attempt.
    pub fn appeal_tree(&self) -> &AppealTree {
        &self.tree
    }

    /// Match one top-level construct. Tries each top table in order against
    /// the token window; the first success wins, its tokens are discarded and
    /// its winning subtree returned. All session state is per-construct.
    pub fn parse_unit(&mut self) -> Result<UnitOutcome, ParseError> {
        self.session.reset();
        self.tree.clear();
        self.succ_nodes.clear();
        self.waves.clear();
        self.depth = 0;

        let Some(first) = self.window.get(0) else {
            return Ok(UnitOutcome::EndOfFile);
        };
        let first = first.clone();

        let grammar = self.grammar;
        for &top in grammar.top_tables() {
            self.cur = 0;
            if let Some(root) = self.traverse_rule(top, None)? {
                let consumed = self.tree.node(root).end;
                let tree = sort_out(&self.tree, &self.succ_nodes, self.window.active(), root);
                self.window.discard(consumed);
                return Ok(UnitOutcome::Matched { tree, consumed });
            }
        }

        Err(ParseError::Syntax {
            line: first.line,
            col: first.col,
            text: first.text,
        })
    }

    /// Match `rule` at the current position. `Some(node)` on success with the
    /// position advanced past the match; `None` with the position restored on
    /// failure.
    fn traverse_rule(
        &mut self,
        rule: RuleId,
        parent: Option<NodeId>,
    ) -> Result<Option<NodeId>, ParseError> {
        if self.tables.recursion_of_lead(rule).is_some() {
            let pos = self.cur;
            let in_own_wave = self.waves.iter().any(|w| w.lead == rule && w.pos == pos);
            if !in_own_wave && let Some(group) = self.tables.group_of(rule) {
                return self.traverse_lead(rule, group, parent);
            }
        }
        self.traverse_rule_inner(rule, parent, true)
    }

    /// Grow a recursion lead to its fixpoint: re-traverse while each round
    /// extends the longest match. The first round cuts the recursive
    /// re-entry with the loop check (and appeal cleans up after it); later
    /// rounds resolve it from the success cache instead, one round deeper
    /// each time.
    fn traverse_lead(
        &mut self,
        rule: RuleId,
        group: usize,
        parent: Option<NodeId>,
    ) -> Result<Option<NodeId>, ParseError> {
        let pos = self.cur;
        self.waves.push(Wave {
            group,
            lead: rule,
            pos,
        });
        let mut best: Option<NodeId> = None;
        loop {
            self.cur = pos;
            let Some(node) = self.traverse_rule_inner(rule, parent, false)? else {
                break;
            };
            let end = self.tree.node(node).end;
            match best {
                Some(b) if end <= self.tree.node(b).end => break,
                _ => best = Some(node),
            }
        }
        self.waves.pop();
        match best {
            Some(node) => {
                self.cur = self.tree.node(node).end;
                Ok(Some(node))
            }
            None => {
                self.cur = pos;
                Ok(None)
            }
        }
    }

    fn traverse_rule_inner(
        &mut self,
        rule: RuleId,
        parent: Option<NodeId>,
        allow_shortcut: bool,
    ) -> Result<Option<NodeId>, ParseError> {
        let grammar = self.grammar;
        let start = self.cur;
        let name = grammar.name(rule);
        let node = self.tree.alloc(NodeContent::Rule(rule), start, parent);
        self.tracer.enter_rule(name, start);

        let wave_front = self.in_wave_front(rule, start);
        if allow_shortcut
            && !wave_front
            && let Some(end) = self.session.succ_longest(rule, start)
        {
            self.cur = end;
            return Ok(Some(self.succeed(node, AppealStatus::SuccWasSucc, end, name)));
        }
        if !wave_front && self.session.was_failed(rule, start) {
            return Ok(self.fail(node, AppealStatus::FailWasFailed, start, name));
        }
        if self.session.is_visited(rule) {
            // One re-entry per position is a valuable loop; an unchanged
            // position proves no progress and the attempt is cut. The cut is
            // not a real failure of the rule, so it is never memoized.
            if self.session.top_visited(rule) == Some(start) {
                self.tracer.loop_detected(name, start);
                return Ok(self.fail(node, AppealStatus::FailLooped, start, name));
            }
            self.session.push_visited(rule, start);
        } else {
            self.session.set_visited(rule);
        }

        self.depth += 1;
        if self.depth > self.limits.max_depth {
            return Err(ParseError::RecursionLimitExceeded(self.limits.max_depth));
        }
        let outcome = self.dispatch(rule, node)?;
        self.depth -= 1;
        self.session.pop_visited(rule);

        match outcome {
            RuleMatch::Matched => {
                let end = self.cur;
                self.session.add_succ(rule, start, end);
                self.succ_nodes.insert((rule, start, end), node);
                let node = self.succeed(node, AppealStatus::Succ, end, name);
                self.appeal(node);
                Ok(Some(node))
            }
            RuleMatch::Failed(status) => {
                self.cur = start;
                self.session.add_failed(rule, start);
                Ok(self.fail(node, status, start, name))
            }
        }
    }

    /// Whether `rule` sits on the growing front of an active wave. Members of
    /// the wave's group at the wave position must neither shortcut to a
    /// cached success nor trust a memoized failure there: both caches are
    /// exactly what the wave is still reshaping round by round. The lead
    /// itself is exempt and reuses the previous round, which is how the
    /// recursive reference inside the cycle resolves.
    fn in_wave_front(&self, rule: RuleId, pos: u32) -> bool {
        if let Some(group) = self.tables.group_of(rule)
            && let Some(wave) = self.waves.iter().rev().find(|w| w.group == group)
        {
            wave.pos == pos && wave.lead != rule
        } else {
            false
        }
    }

    fn succeed(&mut self, node: NodeId, status: AppealStatus, end: u32, name: &str) -> NodeId {
        let n = self.tree.node_mut(node);
        n.status = status;
        n.end = end;
        self.tracer.exit_rule(name, end, status);
        node
    }

    fn fail(
        &mut self,
        node: NodeId,
        status: AppealStatus,
        start: u32,
        name: &str,
    ) -> Option<NodeId> {
        let n = self.tree.node_mut(node);
        n.status = status;
        n.end = start;
        self.tracer.exit_rule(name, start, status);
        None
    }

    fn dispatch(&mut self, rule: RuleId, node: NodeId) -> Result<RuleMatch, ParseError> {
        let grammar = self.grammar;
        match grammar.kind(rule) {
            RuleKind::Oneof(children) => self.traverse_oneof(rule, children, node),
            RuleKind::Concatenate(children) => self.match_sequence(children, node, 0),
            RuleKind::ZeroOrMore(d) => self.traverse_zero_or_more(&**d, node),
            RuleKind::ZeroOrOne(d) => {
                self.traverse_data(&**d, node)?;
                Ok(RuleMatch::Matched)
            }
            RuleKind::Data(d) => self.traverse_one(&**d, node),
        }
    }

    /// Try every alternative from the same start; keep the longest, with ties
    /// going to the first in declaration order. Every alternative's end is
    /// recorded under the rule itself, not just the winner: those shorter
    /// ends are what second-try re-resolves a starving sibling against, and
    /// for a non-recursive rule this loop is their only producer.
    fn traverse_oneof(
        &mut self,
        rule: RuleId,
        children: &[TableData],
        node: NodeId,
    ) -> Result<RuleMatch, ParseError> {
        let start = self.cur;
        let mut best: Option<(u32, NodeId)> = None;
        for child in children {
            self.cur = start;
            if let Some(matched) = self.traverse_data(child, node)? {
                let end = self.tree.node(matched).end;
                self.session.add_succ(rule, start, end);
                if best.is_none_or(|(b, _)| end > b) {
                    best = Some((end, matched));
                }
            }
        }
        match best {
            Some((end, chosen)) => {
                self.tree.node_mut(node).chosen = Some(chosen);
                self.cur = end;
                Ok(RuleMatch::Matched)
            }
            None => Ok(RuleMatch::Failed(AppealStatus::FailChildrenFailed)),
        }
    }

    /// Match children left to right. When a child fails and its predecessor
    /// was a rule with shorter cached matches, re-resolve the predecessor to
    /// the next shorter match and retry from the failed child — only the
    /// immediate parent re-resolves, so the retry cost stays local.
    fn match_sequence(
        &mut self,
        children: &[TableData],
        node: NodeId,
        from: usize,
    ) -> Result<RuleMatch, ParseError> {
        let mut prev: Option<NodeId> = None;
        for i in from..children.len() {
            match self.traverse_data(&children[i], node)? {
                Some(matched) => prev = Some(matched),
                None => {
                    if i > from
                        && let Some(p) = prev
                        && let NodeContent::Rule(prev_rule) = self.tree.node(p).content
                    {
                        return self.second_try(children, node, i, prev_rule, p);
                    }
                    return Ok(RuleMatch::Failed(AppealStatus::FailChildrenFailed));
                }
            }
        }
        Ok(RuleMatch::Matched)
    }

    fn second_try(
        &mut self,
        children: &[TableData],
        node: NodeId,
        failed_at: usize,
        prev_rule: RuleId,
        prev_node: NodeId,
    ) -> Result<RuleMatch, ParseError> {
        let prev_start = self.tree.node(prev_node).start;
        let prev_end = self.tree.node(prev_node).end;
        let mut shorter: Vec<u32> = self
            .session
            .succ_ends(prev_rule, prev_start)
            .iter()
            .copied()
            .filter(|&end| end < prev_end)
            .collect();
        shorter.sort_unstable_by(|a, b| b.cmp(a));

        let name = self.grammar.name(prev_rule);
        for alt in shorter {
            self.tracer.second_try(name, prev_start, alt);
            let retry = self.tree.alloc(NodeContent::Rule(prev_rule), prev_start, Some(node));
            {
                let n = self.tree.node_mut(retry);
                n.status = AppealStatus::SuccWasSucc;
                n.end = alt;
                n.second_try = true;
            }
            self.cur = alt;
            if let RuleMatch::Matched = self.match_sequence(children, node, failed_at)? {
                return Ok(RuleMatch::Matched);
            }
        }
        Ok(RuleMatch::Failed(AppealStatus::FailChildrenFailed))
    }

    fn traverse_zero_or_more(
        &mut self,
        child: &TableData,
        node: NodeId,
    ) -> Result<RuleMatch, ParseError> {
        loop {
            let pos = self.cur;
            match self.traverse_data(child, node)? {
                Some(matched) if self.tree.node(matched).end > pos => {}
                // a zero-length iteration would repeat forever
                _ => break,
            }
        }
        Ok(RuleMatch::Matched)
    }

    fn traverse_one(&mut self, child: &TableData, node: NodeId) -> Result<RuleMatch, ParseError> {
        match self.traverse_data(child, node)? {
            Some(_) => Ok(RuleMatch::Matched),
            None => Ok(RuleMatch::Failed(match child {
                TableData::Kind(TokenKind::Identifier) => AppealStatus::FailNotIdentifier,
                TableData::Kind(TokenKind::Literal) => AppealStatus::FailNotLiteral,
                _ => AppealStatus::FailChildrenFailed,
            })),
        }
    }

    /// Match one child slot: a rule edge recurses, a terminal consumes one
    /// token on match and leaves the position alone otherwise.
    fn traverse_data(
        &mut self,
        child: &TableData,
        parent: NodeId,
    ) -> Result<Option<NodeId>, ParseError> {
        match child {
            TableData::Rule(rule) => self.traverse_rule(*rule, Some(parent)),
            TableData::Literal(text) => {
                let matched = self
                    .window
                    .get(self.cur)
                    .is_some_and(|t| t.matches_literal(text));
                Ok(self.token_node(matched, parent))
            }
            TableData::Kind(kind) => {
                let matched = self.window.get(self.cur).is_some_and(|t| t.kind == *kind);
                Ok(self.token_node(matched, parent))
            }
        }
    }

    fn token_node(&mut self, matched: bool, parent: NodeId) -> Option<NodeId> {
        if !matched {
            return None;
        }
        let pos = self.cur;
        let node = self.tree.alloc(NodeContent::Token(pos), pos, Some(parent));
        {
            let n = self.tree.node_mut(node);
            n.status = AppealStatus::Succ;
            n.end = pos + 1;
        }
        self.cur = pos + 1;
        Some(node)
    }

    /// Clear failure marks that exist only because a loop was cut somewhere
    /// below `root`. A descendant whose children failed on top of a
    /// `FailLooped` cut was not genuinely rejected: once the enclosing rule
    /// succeeds, that memoized failure would wrongly block later attempts at
    /// the same position. Successful descendants seal their subtree — their
    /// loop cuts were already appealed when they succeeded.
    fn appeal(&mut self, root: NodeId) {
        // post-order: children before parents
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.tree.node(id).children.iter().copied());
        }

        let mut looped_below = vec![false; self.tree.len()];
        for &id in order.iter().rev() {
            let node = self.tree.node(id);
            let contains = node.status == AppealStatus::FailLooped
                || node
                    .children
                    .iter()
                    .any(|c| looped_below[c.as_usize()]);
            if !contains {
                continue;
            }
            if id != root && node.status.is_succ() {
                continue; // sealed
            }
            looped_below[id.as_usize()] = true;
            if node.status == AppealStatus::FailChildrenFailed
                && let NodeContent::Rule(rule) = node.content
            {
                let start = node.start;
                self.session.reset_failed(rule, start);
                let name = self.grammar.name(rule);
                self.tracer.appeal(name, start);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VecSource;
    use crate::trace::PrintTracer;
    use gramarye_analysis::analyze;
    use gramarye_grammar::{GrammarBuilder, Token};

    fn parse(grammar: &Grammar, tokens: Vec<Token>) -> Result<UnitOutcome, ParseError> {
        let tables = analyze(grammar);
        let mut parser = Parser::new(grammar, &tables, VecSource::new(tokens));
        parser.parse_unit()
    }

    fn expr_grammar() -> Grammar {
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
        b.build().unwrap()
    }

    fn plus_tokens() -> Vec<Token> {
        vec![
            Token::literal("1"),
            Token::operator("+"),
            Token::literal("2"),
            Token::operator("+"),
            Token::literal("3"),
        ]
    }

    #[test]
    fn left_recursion_consumes_the_whole_expression() {
        let g = expr_grammar();
        let tables = analyze(&g);
        assert_eq!(tables.recursions().len(), 1);
        assert_eq!(tables.groups().len(), 1);

        let outcome = parse(&g, plus_tokens()).unwrap();
        let UnitOutcome::Matched { tree, consumed } = outcome else {
            panic!("expected a match");
        };
        assert_eq!(consumed, 5);
        assert_eq!(g.name(tree.rule), "E");
        assert_eq!((tree.start, tree.end), (0, 5));
    }

    #[test]
    fn extracted_tree_nests_two_applications() {
        let g = expr_grammar();
        let UnitOutcome::Matched { tree, .. } = parse(&g, plus_tokens()).unwrap() else {
            panic!("expected a match");
        };

        // E(0..5) -> EPlusT(0..5) -> [E(0..3), '+', T(4..5)]
        let outer: Vec<_> = tree.rule_children().collect();
        assert_eq!(outer.len(), 1);
        let outer = outer[0];
        assert_eq!(g.name(outer.rule), "EPlusT");
        assert_eq!((outer.start, outer.end), (0, 5));

        let parts: Vec<_> = outer.rule_children().collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(g.name(parts[0].rule), "E");
        assert_eq!((parts[0].start, parts[0].end), (0, 3));
        assert_eq!(g.name(parts[1].rule), "T");
        assert_eq!((parts[1].start, parts[1].end), (4, 5));

        // inner application: E(0..3) -> EPlusT(0..3)
        let inner: Vec<_> = parts[0].rule_children().collect();
        assert_eq!(inner.len(), 1);
        assert_eq!(g.name(inner[0].rule), "EPlusT");
        assert_eq!((inner[0].start, inner[0].end), (0, 3));
    }

    #[test]
    fn single_term_still_matches() {
        let g = expr_grammar();
        let UnitOutcome::Matched { tree, consumed } =
            parse(&g, vec![Token::literal("42")]).unwrap()
        else {
            panic!("expected a match");
        };
        assert_eq!(consumed, 1);
        let child: Vec<_> = tree.rule_children().collect();
        assert_eq!(g.name(child[0].rule), "T");
    }

    /// Primary : Data(PrimaryNoNewArray)
    /// PrimaryNoNewArray : Oneof("this", PrimDot, FieldAccess)
    /// PrimDot : Primary "#"            (never matches; plants a stale mark)
    /// FieldAccess : Primary "." Identifier
    fn field_access_grammar() -> Grammar {
        let mut b = GrammarBuilder::new();
        let primary = b.rule("Primary");
        let pnna = b.rule("PrimaryNoNewArray");
        let prim_dot = b.rule("PrimDot");
        let field_access = b.rule("FieldAccess");
        b.define(primary, RuleKind::Data(Box::new(TableData::Rule(pnna))));
        b.define(
            pnna,
            RuleKind::Oneof(vec![
                TableData::Literal("this".into()),
                TableData::Rule(prim_dot),
                TableData::Rule(field_access),
            ]),
        );
        b.define(
            prim_dot,
            RuleKind::Concatenate(vec![
                TableData::Rule(primary),
                TableData::Literal("#".into()),
            ]),
        );
        b.define(
            field_access,
            RuleKind::Concatenate(vec![
                TableData::Rule(primary),
                TableData::Literal(".".into()),
                TableData::Kind(TokenKind::Identifier),
            ]),
        );
        b.top(primary);
        b.build().unwrap()
    }

    #[test]
    fn appeal_clears_the_stale_field_access_failure() {
        // While matching the PrimDot alternative, FieldAccess fails at
        // position 0 purely because the Primary loop was cut underneath it.
        // Without appeal that memoized failure would reject the real
        // FieldAccess attempt and `this . a` would stop after one token.
        let g = field_access_grammar();
        let tokens = vec![
            Token::keyword("this"),
            Token::separator("."),
            Token::ident("a"),
        ];
        let UnitOutcome::Matched { tree, consumed } = parse(&g, tokens).unwrap() else {
            panic!("expected a match");
        };
        assert_eq!(consumed, 3);

        let pnna: Vec<_> = tree.rule_children().collect();
        assert_eq!(g.name(pnna[0].rule), "PrimaryNoNewArray");
        let winner: Vec<_> = pnna[0].rule_children().collect();
        assert_eq!(winner.len(), 1);
        assert_eq!(g.name(winner[0].rule), "FieldAccess");
        assert_eq!((winner[0].start, winner[0].end), (0, 3));
    }

    /// Prim : Oneof("this", PrimDot)
    /// PrimDot : Prim "." Identifier
    fn greedy_grammar(b: &mut GrammarBuilder) -> RuleId {
        let prim = b.rule("Prim");
        let prim_dot = b.rule("PrimDot");
        b.define(
            prim,
            RuleKind::Oneof(vec![
                TableData::Literal("this".into()),
                TableData::Rule(prim_dot),
            ]),
        );
        b.define(
            prim_dot,
            RuleKind::Concatenate(vec![
                TableData::Rule(prim),
                TableData::Literal(".".into()),
                TableData::Kind(TokenKind::Identifier),
            ]),
        );
        prim
    }

    #[test]
    fn greedy_context_takes_the_longest_match() {
        let mut b = GrammarBuilder::new();
        let prim = greedy_grammar(&mut b);
        b.top(prim);
        let g = b.build().unwrap();

        let tokens = vec![
            Token::keyword("this"),
            Token::separator("."),
            Token::ident("a"),
        ];
        let UnitOutcome::Matched { consumed, .. } = parse(&g, tokens).unwrap() else {
            panic!("expected a match");
        };
        assert_eq!(consumed, 3);
    }

    #[test]
    fn second_try_backs_off_when_the_sibling_needs_the_tokens() {
        // Outer : Prim "." Identifier — the greedy 3-token Prim starves the
        // "." sibling; second-try re-resolves Prim to its 1-token match.
        let mut b = GrammarBuilder::new();
        let prim = greedy_grammar(&mut b);
        let outer = b.rule("Outer");
        b.define(
            outer,
            RuleKind::Concatenate(vec![
                TableData::Rule(prim),
                TableData::Literal(".".into()),
                TableData::Kind(TokenKind::Identifier),
            ]),
        );
        b.top(outer);
        let g = b.build().unwrap();

        let tokens = vec![
            Token::keyword("this"),
            Token::separator("."),
            Token::ident("a"),
        ];
        let UnitOutcome::Matched { tree, consumed } = parse(&g, tokens).unwrap() else {
            panic!("expected a match");
        };
        assert_eq!(consumed, 3);
        let prim_match: Vec<_> = tree.rule_children().collect();
        assert_eq!(prim_match.len(), 1);
        assert_eq!(g.name(prim_match[0].rule), "Prim");
        assert_eq!((prim_match[0].start, prim_match[0].end), (0, 1));
    }

    #[test]
    fn second_try_uses_a_shorter_oneof_alternative() {
        // Outer : X "y" ; X : Oneof(Long, Short). Nothing here is recursive:
        // the greedy X eats both tokens through Long and starves the "y"
        // sibling, so the cached 1-token Short end must rescue the sequence.
        let mut b = GrammarBuilder::new();
        let outer = b.rule("Outer");
        let x = b.rule("X");
        let long = b.rule("Long");
        let short = b.rule("Short");
        b.define(
            outer,
            RuleKind::Concatenate(vec![
                TableData::Rule(x),
                TableData::Literal("y".into()),
            ]),
        );
        b.define(
            x,
            RuleKind::Oneof(vec![TableData::Rule(long), TableData::Rule(short)]),
        );
        b.define(
            long,
            RuleKind::Concatenate(vec![
                TableData::Literal("a".into()),
                TableData::Literal("y".into()),
            ]),
        );
        b.define(short, RuleKind::Data(Box::new(TableData::Literal("a".into()))));
        b.top(outer);
        let g = b.build().unwrap();

        let tokens = vec![Token::operator("a"), Token::operator("y")];
        let UnitOutcome::Matched { tree, consumed } = parse(&g, tokens).unwrap() else {
            panic!("expected a match");
        };
        assert_eq!(consumed, 2);
        let x_match: Vec<_> = tree.rule_children().collect();
        assert_eq!(x_match.len(), 1);
        assert_eq!(g.name(x_match[0].rule), "X");
        assert_eq!((x_match[0].start, x_match[0].end), (0, 1));
    }

    #[test]
    fn oneof_tie_keeps_the_first_declared_alternative() {
        let mut b = GrammarBuilder::new();
        let x = b.rule("X");
        let first = b.rule("First");
        let second = b.rule("Second");
        b.define(
            x,
            RuleKind::Oneof(vec![TableData::Rule(first), TableData::Rule(second)]),
        );
        b.define(first, RuleKind::Data(Box::new(TableData::Literal("a".into()))));
        b.define(second, RuleKind::Data(Box::new(TableData::Literal("a".into()))));
        b.top(x);
        let g = b.build().unwrap();

        let UnitOutcome::Matched { tree, consumed } =
            parse(&g, vec![Token::operator("a")]).unwrap()
        else {
            panic!("expected a match");
        };
        assert_eq!(consumed, 1);
        let winner: Vec<_> = tree.rule_children().collect();
        assert_eq!(winner.len(), 1);
        assert_eq!(g.name(winner[0].rule), "First");
    }

    #[test]
    fn nullable_prefix_loop_terminates() {
        // L : Oneof(LL, "x"); LL : Opt L "q"; Opt : ZeroOrOne("z")
        // Opt can match empty, so LL re-enters L without progress; the loop
        // check must cut it instead of recursing forever.
        let mut b = GrammarBuilder::new();
        let l = b.rule("L");
        let ll = b.rule("LL");
        let opt = b.rule("Opt");
        b.define(
            l,
            RuleKind::Oneof(vec![TableData::Rule(ll), TableData::Literal("x".into())]),
        );
        b.define(
            ll,
            RuleKind::Concatenate(vec![
                TableData::Rule(opt),
                TableData::Rule(l),
                TableData::Literal("q".into()),
            ]),
        );
        b.define(opt, RuleKind::ZeroOrOne(Box::new(TableData::Literal("z".into()))));
        b.top(l);
        let g = b.build().unwrap();

        let UnitOutcome::Matched { consumed, .. } =
            parse(&g, vec![Token::operator("x")]).unwrap()
        else {
            panic!("expected a match");
        };
        assert_eq!(consumed, 1);

        let err = parse(&g, vec![Token::ident("nope")]).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn zero_or_more_consumes_repetitions() {
        let mut b = GrammarBuilder::new();
        let list = b.rule("List");
        let item = b.rule("Item");
        b.define(list, RuleKind::ZeroOrMore(Box::new(TableData::Rule(item))));
        b.define(item, RuleKind::Data(Box::new(TableData::Kind(TokenKind::Identifier))));
        b.top(list);
        let g = b.build().unwrap();

        let tokens = vec![Token::ident("a"), Token::ident("b"), Token::ident("c")];
        let UnitOutcome::Matched { tree, consumed } = parse(&g, tokens).unwrap() else {
            panic!("expected a match");
        };
        assert_eq!(consumed, 3);
        assert_eq!(tree.rule_children().count(), 3);
    }

    #[test]
    fn syntax_error_reports_the_offending_token() {
        let mut b = GrammarBuilder::new();
        let s = b.rule("S");
        b.define(s, RuleKind::Data(Box::new(TableData::Literal(";".into()))));
        b.top(s);
        let g = b.build().unwrap();

        let err = parse(&g, vec![Token::new(TokenKind::Identifier, "oops", 3, 7)]).unwrap_err();
        let ParseError::Syntax { line, col, text } = err else {
            panic!("expected a syntax error");
        };
        assert_eq!((line, col), (3, 7));
        assert_eq!(text, "oops");
    }

    #[test]
    fn depth_limit_turns_runaway_nesting_into_an_error() {
        let mut b = GrammarBuilder::new();
        let a = b.rule("A");
        let bb = b.rule("B");
        let c = b.rule("C");
        b.define(a, RuleKind::Data(Box::new(TableData::Rule(bb))));
        b.define(bb, RuleKind::Data(Box::new(TableData::Rule(c))));
        b.define(c, RuleKind::Data(Box::new(TableData::Literal("x".into()))));
        b.top(a);
        let g = b.build().unwrap();
        let tables = analyze(&g);

        let source = VecSource::new(vec![Token::operator("x")]);
        let mut parser =
            Parser::new(&g, &tables, source).limits(ParseLimits::new().max_depth(2));
        let err = parser.parse_unit().unwrap_err();
        assert!(matches!(err, ParseError::RecursionLimitExceeded(2)));
    }

    #[test]
    fn driver_parses_consecutive_units_until_eof() {
        let mut b = GrammarBuilder::new();
        let s = b.rule("S");
        b.define(
            s,
            RuleKind::Concatenate(vec![
                TableData::Kind(TokenKind::Identifier),
                TableData::Literal(";".into()),
            ]),
        );
        b.top(s);
        let g = b.build().unwrap();
        let tables = analyze(&g);

        let tokens = vec![
            Token::ident("a"),
            Token::separator(";"),
            Token::ident("b"),
            Token::separator(";"),
        ];
        let mut parser = Parser::new(&g, &tables, VecSource::new(tokens));
        for _ in 0..2 {
            let UnitOutcome::Matched { consumed, .. } = parser.parse_unit().unwrap() else {
                panic!("expected a match");
            };
            assert_eq!(consumed, 2);
        }
        assert!(matches!(parser.parse_unit().unwrap(), UnitOutcome::EndOfFile));
    }

    #[test]
    fn empty_input_is_end_of_file() {
        let g = expr_grammar();
        assert!(matches!(parse(&g, vec![]).unwrap(), UnitOutcome::EndOfFile));
    }

    #[test]
    fn tracer_sees_enter_exit_and_loop_events() {
        // The recursive alternative comes first so its re-entry runs before
        // any cached match exists and the loop check actually fires.
        let mut b = GrammarBuilder::new();
        let e = b.rule("E");
        let e_plus_t = b.rule("EPlusT");
        let t = b.rule("T");
        b.define(
            e,
            RuleKind::Oneof(vec![TableData::Rule(e_plus_t), TableData::Rule(t)]),
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
        let mut parser = Parser::with_tracer(
            &g,
            &tables,
            VecSource::new(plus_tokens()),
            PrintTracer::new(),
        );
        parser.parse_unit().unwrap();

        let lines = parser.tracer().lines();
        assert!(lines.iter().any(|l| l.trim_start() == "enter E@0"));
        assert!(lines.iter().any(|l| l.trim_start().starts_with("loop E@0")));
        assert!(lines.iter().any(|l| l.trim_start().starts_with("exit E@5 Succ")));
    }
}
