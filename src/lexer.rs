//! Lexical analysis: splitting one raw input line into word tokens.
//!
//! Whitespace outside quotes separates tokens; a single-quoted span
//! contributes its contents to the current token verbatim, quotes
//! stripped, so `'a b'` stays one token. The lexer knows nothing about
//! aliases, pipes or builtins; `|` is an ordinary word.

use thiserror::Error;

/// Errors that can occur while tokenizing a line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    /// A single-quoted span was opened but never closed. The whole
    /// line is discarded, never partially executed.
    #[error("missing closing quote")]
    UnclosedQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    /// Between tokens.
    Start,
    /// Accumulating an unquoted word.
    Word,
    /// Inside a `'...'` span.
    Quote,
}

struct LexFsm {
    state: LexState,
    buffer: String,
    tokens: Vec<String>,
}

impl LexFsm {
    fn new() -> Self {
        LexFsm {
            state: LexState::Start,
            buffer: String::new(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self, line: &str) -> Result<Vec<String>, LexError> {
        for ch in line.chars() {
            match self.state {
                LexState::Start => match ch {
                    ' ' | '\t' => {}
                    '\'' => self.state = LexState::Quote,
                    c => {
                        self.buffer.push(c);
                        self.state = LexState::Word;
                    }
                },
                LexState::Word => match ch {
                    ' ' | '\t' => {
                        self.finish_token();
                        self.state = LexState::Start;
                    }
                    '\'' => self.state = LexState::Quote,
                    c => self.buffer.push(c),
                },
                LexState::Quote => match ch {
                    // An empty span `''` still yields a (possibly
                    // empty) token, so quote close returns to Word.
                    '\'' => self.state = LexState::Word,
                    c => self.buffer.push(c),
                },
            }
        }

        match self.state {
            LexState::Quote => Err(LexError::UnclosedQuote),
            LexState::Word => {
                self.finish_token();
                Ok(self.tokens)
            }
            LexState::Start => Ok(self.tokens),
        }
    }

    fn finish_token(&mut self) {
        self.tokens.push(std::mem::take(&mut self.buffer));
    }
}

/// Split `line` into owned word tokens.
///
/// Returns an empty vector for a blank (or whitespace-only) line.
pub fn tokenize(line: &str) -> Result<Vec<String>, LexError> {
    LexFsm::new().run(line)
}
