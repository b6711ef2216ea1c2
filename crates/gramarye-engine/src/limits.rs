//! Parse-time resource limits.

/// Caps on a single parse attempt. The loop checks make runaway traversal a
/// grammar bug rather than an expected state, so the default depth is
/// generous; the guard exists to turn that bug into an error instead of a
/// stack overflow.
#[derive(Debug, Clone, Copy)]
pub struct ParseLimits {
    pub max_depth: u32,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self { max_depth: 1024 }
    }
}

impl ParseLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum nested rule entries.
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }
}
