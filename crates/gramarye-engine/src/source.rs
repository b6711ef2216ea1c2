//! The lexer boundary and the active token window.

use gramarye_grammar::Token;

/// What the engine requires from a lexer.
///
/// The traversal itself never rewinds the source: [`TokenWindow`] buffers
/// every pulled token and backtracking happens by index inside the window, so
/// the engine only calls [`next_token`](Self::next_token). The snapshot
/// methods are part of the boundary for the callers that own the source —
/// drivers that probe ahead, hand one lexer to several parsers, or resync
/// after a syntax error rewind through them.
pub trait TokenSource {
    /// Produce the next token, or `None` at end of input.
    fn next_token(&mut self) -> Option<Token>;
    /// Snapshot the cursor for later restore.
    fn save_position(&self) -> usize;
    /// Rewind to a snapshot taken with [`save_position`](Self::save_position).
    fn restore_position(&mut self, pos: usize);
    fn end_of_file(&self) -> bool;
}

/// A pre-lexed token vector, the source used in tests and by batch drivers.
pub struct VecSource {
    tokens: Vec<Token>,
    cursor: usize,
}

impl VecSource {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }
}

impl TokenSource for VecSource {
    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn save_position(&self) -> usize {
        self.cursor
    }

    fn restore_position(&mut self, pos: usize) {
        self.cursor = pos;
    }

    fn end_of_file(&self) -> bool {
        self.cursor >= self.tokens.len()
    }
}

/// Tokens of the construct currently being parsed. The engine addresses
/// tokens by index into this window and pulls from the source on demand;
/// matched tokens are discarded when a construct completes.
pub struct TokenWindow<S> {
    source: S,
    active: Vec<Token>,
}

impl<S: TokenSource> TokenWindow<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            active: Vec::new(),
        }
    }

    /// Token at `idx`, lexing forward as needed.
    pub fn get(&mut self, idx: u32) -> Option<&Token> {
        while self.active.len() <= idx as usize {
            match self.source.next_token() {
                Some(token) => self.active.push(token),
                None => break,
            }
        }
        self.active.get(idx as usize)
    }

    pub fn active(&self) -> &[Token] {
        &self.active
    }

    /// Drop the first `n` tokens after a construct matched them.
    pub fn discard(&mut self, n: u32) {
        self.active.drain(..n as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_pulls_lazily_and_discards() {
        let source = VecSource::new(vec![
            Token::ident("a"),
            Token::separator(";"),
            Token::ident("b"),
        ]);
        let mut window = TokenWindow::new(source);
        assert_eq!(window.get(1).unwrap().text, ";");
        assert_eq!(window.active().len(), 2);
        window.discard(2);
        assert_eq!(window.get(0).unwrap().text, "b");
        assert!(window.get(1).is_none());
        assert!(window.get(5).is_none());
    }

    #[test]
    fn vec_source_save_restore() {
        let mut source = VecSource::new(vec![Token::ident("a"), Token::ident("b")]);
        let mark = source.save_position();
        assert_eq!(source.next_token().unwrap().text, "a");
        source.restore_position(mark);
        assert_eq!(source.next_token().unwrap().text, "a");
        assert_eq!(source.next_token().unwrap().text, "b");
        assert!(source.end_of_file());
        assert!(source.next_token().is_none());
    }
}
