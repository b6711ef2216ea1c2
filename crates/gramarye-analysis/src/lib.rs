//! Left-recursion analysis over a rule-table grammar graph.
//!
//! The parsing engine cannot traverse a left-recursive rule naively, so this
//! crate precomputes, per grammar, which rules sit on left-recursive cycles
//! and how those cycles interlock:
//!
//! - [`detect`]: a DFS over the graph that classifies every rule as `Fail` or
//!   `MaybeZero` and records each left-recursive cycle as a [`Recursion`]
//!   (lead rule + child-index paths back to the lead).
//! - [`backpatch`]: a fixpoint pass that registers rules the DFS reached only
//!   through already-finished subtrees.
//! - [`group`]: merges recursions whose leads are mutually LR-reachable into
//!   [`RecursionGroup`]s, the unit the engine iterates to a fixpoint at parse
//!   time.
//! - [`validate`]: an independent SCC computation over the same reachability
//!   relation that rejects grammars with left cycles the detector did not
//!   cover.
//!
//! The resulting [`RecursionTables`] are immutable once built and can be
//! serialized (postcard) next to the grammar so the parser does not redo the
//! analysis at startup.

mod backpatch;
mod detect;
mod group;
mod reach;
mod recursion;
mod validate;

pub use detect::analyze;
pub use recursion::{RecPath, Recursion, RecursionGroup, RecursionTables, TablesError};
pub use validate::{GrammarError, validate};
