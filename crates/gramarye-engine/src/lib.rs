//! Table-driven recursive-descent parsing engine.
//!
//! The engine walks the grammar graph directly, dispatching on each rule
//! table's kind, and copes with ambiguity and left recursion through four
//! cooperating mechanisms:
//!
//! - per-(rule, position) failure memoization (`WasFailed`),
//! - a visited stack that cuts loops which re-enter a rule at the same token
//!   position (`FailLooped`),
//! - a success cache recording every match length a rule produced at a
//!   position, which powers both `SuccWasSucc` shortcuts and the second-try
//!   re-resolution of a greedy child, and
//! - the appeal pass, which clears failure marks that only existed because a
//!   left-recursive loop was cut underneath them.
//!
//! Left-recursive lead rules (from the precomputed
//! [`RecursionTables`](gramarye_analysis::RecursionTables)) are additionally
//! grown to a fixpoint: the lead is re-traversed while each round extends its
//! longest match, which turns `E -> E '+' T | T` into iteration.

mod appeal;
mod extract;
mod limits;
mod parser;
mod session;
mod source;
mod trace;

pub use appeal::{AppealNode, AppealStatus, AppealTree, NodeContent, NodeId};
pub use extract::{MatchChild, MatchTree};
pub use limits::ParseLimits;
pub use parser::{ParseError, Parser, UnitOutcome};
pub use session::{ParseSession, SuccMatch};
pub use source::{TokenSource, TokenWindow, VecSource};
pub use trace::{NoopTracer, PrintTracer, Tracer};
