//! Traversal tracing hooks.
//!
//! The parser is generic over a [`Tracer`]; [`NoopTracer`] compiles the hooks
//! away, [`PrintTracer`] collects an indented line per event for debugging
//! grammar behavior.

use crate::appeal::AppealStatus;

pub trait Tracer {
    fn enter_rule(&mut self, _name: &str, _pos: u32) {}
    fn exit_rule(&mut self, _name: &str, _pos: u32, _status: AppealStatus) {}
    fn loop_detected(&mut self, _name: &str, _pos: u32) {}
    fn second_try(&mut self, _name: &str, _pos: u32, _end: u32) {}
    fn appeal(&mut self, _name: &str, _pos: u32) {}
}

/// Zero-cost tracer.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn enter_rule(&mut self, _name: &str, _pos: u32) {}

    #[inline(always)]
    fn exit_rule(&mut self, _name: &str, _pos: u32, _status: AppealStatus) {}

    #[inline(always)]
    fn loop_detected(&mut self, _name: &str, _pos: u32) {}

    #[inline(always)]
    fn second_try(&mut self, _name: &str, _pos: u32, _end: u32) {}

    #[inline(always)]
    fn appeal(&mut self, _name: &str, _pos: u32) {}
}

/// Collects trace lines, indented by rule nesting.
#[derive(Default)]
pub struct PrintTracer {
    lines: Vec<String>,
    depth: usize,
}

impl PrintTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn print(&self) {
        for line in &self.lines {
            println!("{line}");
        }
    }

    fn push(&mut self, line: String) {
        self.lines.push(format!("{}{}", "  ".repeat(self.depth), line));
    }
}

impl Tracer for PrintTracer {
    fn enter_rule(&mut self, name: &str, pos: u32) {
        self.push(format!("enter {name}@{pos}"));
        self.depth += 1;
    }

    fn exit_rule(&mut self, name: &str, pos: u32, status: AppealStatus) {
        self.depth = self.depth.saturating_sub(1);
        self.push(format!("exit {name}@{pos} {status:?}"));
    }

    fn loop_detected(&mut self, name: &str, pos: u32) {
        self.push(format!("loop {name}@{pos}"));
    }

    fn second_try(&mut self, name: &str, pos: u32, end: u32) {
        self.push(format!("second-try {name}@{pos} -> {end}"));
    }

    fn appeal(&mut self, name: &str, pos: u32) {
        self.push(format!("appeal {name}@{pos}"));
    }
}
