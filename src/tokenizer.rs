use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;
use std::sync::Arc;

use crate::error::{ConfigError, Position, SyntaxError};

/// Characters that always form a token of their own outside strings.
/// `/` never reaches the token stream: it either opens a comment or is an error.
const SEPARATORS: &str = "{}[](),/\\\"=:;";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// A single separator character.
    Punct(char),
    /// Identifier or bare literal (`name`, `42`, `0xff`, `true`, `@include`).
    Word,
    /// Quoted string; `text` holds the unescaped content without quotes.
    Str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
    /// Source position just past the last character, closing quote included.
    pub end: Position,
    pub file: Option<Arc<Path>>,
}

impl Token {
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punct(ch)
    }

    pub fn is_word(&self, text: &str) -> bool {
        self.kind == TokenKind::Word && self.text == text
    }

    /// Source form of the token, as shown in error messages.
    pub fn display(&self) -> String {
        match self.kind {
            TokenKind::Str => format!("\"{}\"", self.text),
            _ => self.text.clone(),
        }
    }

    pub fn error(&self, message: impl Into<String>) -> ConfigError {
        SyntaxError::new(message, self.file.as_deref(), self.position).into()
    }

    /// An error located just past the end of this token.
    pub fn error_after(&self, message: impl Into<String>) -> ConfigError {
        SyntaxError::new(message, self.file.as_deref(), self.end).into()
    }
}

/// Lazy, forward-only token stream over a source text.
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    pos: Position,
    file: Option<Arc<Path>>,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str, file: Option<Arc<Path>>) -> Self {
        Tokenizer {
            chars: input.chars().peekable(),
            pos: Position::start(),
            file,
            done: false,
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.pos.offset += 1;
        if ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(ch)
    }

    fn error_at(&self, message: impl Into<String>, position: Position) -> ConfigError {
        SyntaxError::new(message, self.file.as_deref(), position).into()
    }

    /// A token starting at `position` and ending at the current position.
    fn token(&self, kind: TokenKind, text: String, position: Position) -> Token {
        Token {
            kind,
            text,
            position,
            end: self.pos,
            file: self.file.clone(),
        }
    }

    // ── Whitespace & Comments ───────────────────────────────────────

    fn skip_line(&mut self) {
        while let Some(ch) = self.bump() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn skip_block(&mut self, begin: Position) -> Result<(), ConfigError> {
        let mut star = false;
        loop {
            match self.bump() {
                None => return Err(self.error_at("unterminated comment", begin)),
                Some('/') if star => return Ok(()),
                Some(ch) => star = ch == '*',
            }
        }
    }

    fn skip_ws_and_comments(&mut self) -> Result<(), ConfigError> {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else if ch == '#' {
                self.skip_line();
            } else if ch == '/' {
                let begin = self.pos;
                self.bump();
                match self.peek() {
                    Some('/') => self.skip_line(),
                    Some('*') => {
                        self.bump();
                        self.skip_block(begin)?;
                    }
                    Some(other) => {
                        return Err(
                            self.error_at(format!("unexpected character {}", other), self.pos)
                        );
                    }
                    None => return Err(self.error_at("unexpected end of comment", begin)),
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    // ── Tokens ──────────────────────────────────────────────────────

    fn next_token(&mut self) -> Result<Option<Token>, ConfigError> {
        self.skip_ws_and_comments()?;
        let begin = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(None);
        };
        if ch == '"' {
            return self.string(begin).map(Some);
        }
        if SEPARATORS.contains(ch) {
            self.bump();
            return Ok(Some(self.token(TokenKind::Punct(ch), ch.to_string(), begin)));
        }

        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '#' || SEPARATORS.contains(ch) {
                break;
            }
            text.push(ch);
            self.bump();
        }
        Ok(Some(self.token(TokenKind::Word, text, begin)))
    }

    fn string(&mut self, begin: Position) -> Result<Token, ConfigError> {
        self.bump();
        let mut text = String::new();
        loop {
            let escape_pos = self.pos;
            match self.bump() {
                None => return Err(self.error_at("unterminated string", begin)),
                Some('"') => return Ok(self.token(TokenKind::Str, text, begin)),
                Some('\\') => match self.bump() {
                    Some('\\') => text.push('\\'),
                    Some('"') => text.push('"'),
                    Some('t') => text.push('\t'),
                    Some('n') => text.push('\n'),
                    Some(other) => {
                        return Err(
                            self.error_at(format!("unallowed escape \\{}", other), escape_pos)
                        );
                    }
                    None => return Err(self.error_at("unterminated string", begin)),
                },
                Some(ch) => text.push(ch),
            }
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token, ConfigError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Tokenize a whole source text.
pub fn tokenize(input: &str, file: Option<Arc<Path>>) -> Result<Vec<Token>, ConfigError> {
    Tokenizer::new(input, file).collect()
}

/// Merge runs of adjacent string tokens into one, like C string literal
/// concatenation. The merged token starts where the first one starts and
/// ends where the last one ends.
pub fn concat_strings(tokens: Vec<Token>) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match result.last_mut() {
            Some(prev) if prev.kind == TokenKind::Str && token.kind == TokenKind::Str => {
                prev.text.push_str(&token.text);
                prev.end = token.end;
            }
            _ => result.push(token),
        }
    }
    result
}
