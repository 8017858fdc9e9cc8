use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ConfigError, Result};
use crate::tokenizer::{concat_strings, Token, TokenKind};
use crate::tree::{Format, NodeId, Scalar, SettingType, SourceLocation, Tree};

/// Parser state: the expanded token stream and the tree being built.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    tree: Tree,
}

/// Build a setting tree from an include-expanded token stream.
pub fn parse(tokens: Vec<Token>) -> Result<Tree> {
    let mut parser = Parser {
        tokens: concat_strings(tokens),
        pos: 0,
        tree: Tree::new(),
    };
    let root = parser.tree.root();
    parser.parse_settings(root, None)?;
    Ok(parser.tree)
}

impl Parser {
    // ── Helpers ──────────────────────────────────────────────────────

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(token)
    }

    fn peek_is(&self, ch: char) -> bool {
        self.peek().is_some_and(|t| t.is_punct(ch))
    }

    /// Insert a child, reporting tree violations at `anchor`.
    fn insert(
        &mut self,
        parent: NodeId,
        name: &str,
        ty: SettingType,
        anchor: &Token,
    ) -> Result<NodeId> {
        self.tree
            .insert(parent, name, ty)
            .map_err(|err| located(err, anchor))
    }

    fn insert_scalar(
        &mut self,
        parent: NodeId,
        name: &str,
        (value, format): (Scalar, Format),
        anchor: &Token,
    ) -> Result<NodeId> {
        self.tree
            .insert_scalar(parent, name, value, format)
            .map_err(|err| located(err, anchor))
    }

    // ── Statement lists ─────────────────────────────────────────────

    /// `setting*` up to the end of input, or up to the `}` matching `open`.
    fn parse_settings(&mut self, parent: NodeId, open: Option<&Token>) -> Result<()> {
        loop {
            let Some(token) = self.bump() else {
                return match open {
                    Some(open) => Err(open.error(format!(
                        "unable to find closing tag of {}",
                        open.text
                    ))),
                    None => Ok(()),
                };
            };
            match token.kind {
                TokenKind::Word => self.parse_setting(parent, &token)?,
                TokenKind::Punct('}') if open.is_some() => return Ok(()),
                TokenKind::Punct('[' | ']') => return Err(token.error("unexpected array")),
                TokenKind::Punct('{' | '}') => {
                    return Err(token.error("unexpected group without identifier"))
                }
                TokenKind::Punct(ch) => {
                    return Err(token.error(format!("unexpected token {}", ch)))
                }
                TokenKind::Str => {
                    return Err(token.error(format!(
                        "expected a setting name, found {}",
                        token.display()
                    )))
                }
            }
        }
    }

    /// `IDENT ('=' | ':') value (';' | ',')?`
    fn parse_setting(&mut self, parent: NodeId, name: &Token) -> Result<()> {
        let Some(op) = self.bump() else {
            return Err(name.error_after("unexpected end of file"));
        };
        if !op.is_punct('=') && !op.is_punct(':') {
            return Err(op.error(format!("unexpected token {}", op.display())));
        }
        if self.peek().is_none() {
            return Err(op.error_after("unexpected end of file"));
        }
        self.parse_value(parent, &name.text, name)?;
        if self.peek_is(';') || self.peek_is(',') {
            self.pos += 1;
        }
        Ok(())
    }

    // ── Values ──────────────────────────────────────────────────────

    /// Parse one value into a new child of `parent`. `anchor` is the token
    /// that names it (or the value token itself for anonymous elements).
    fn parse_value(&mut self, parent: NodeId, name: &str, anchor: &Token) -> Result<NodeId> {
        let Some(token) = self.bump() else {
            return Err(anchor.error_after("unexpected end of file"));
        };
        let id = match token.kind {
            TokenKind::Punct('{') => {
                let id = self.insert(parent, name, SettingType::Group, anchor)?;
                self.parse_settings(id, Some(&token))?;
                id
            }
            TokenKind::Punct('(') => {
                let id = self.insert(parent, name, SettingType::List, anchor)?;
                self.parse_items(id, &token, ')')?;
                id
            }
            TokenKind::Punct('[') => {
                let id = self.insert(parent, name, SettingType::Array, anchor)?;
                self.parse_items(id, &token, ']')?;
                id
            }
            _ => {
                let literal = parse_literal(&token)?;
                self.insert_scalar(parent, name, literal, anchor)?
            }
        };
        self.tree.node_mut(id).source = Some(SourceLocation {
            file: anchor.file.clone(),
            line: anchor.position.line,
        });
        Ok(id)
    }

    /// Comma-separated anonymous values up to `close`. Empty items are skipped.
    fn parse_items(&mut self, container: NodeId, open: &Token, close: char) -> Result<()> {
        loop {
            let Some(token) = self.peek().cloned() else {
                return Err(open.error(format!("unable to find closing tag of {}", open.text)));
            };
            if token.is_punct(close) {
                self.pos += 1;
                return Ok(());
            }
            match token.kind {
                TokenKind::Punct(',') => {
                    self.pos += 1;
                    continue;
                }
                TokenKind::Punct(']') => return Err(token.error("unmatched array brace")),
                TokenKind::Punct('}') => return Err(token.error("unmatched group brace")),
                TokenKind::Punct(')') => return Err(token.error("unmatched list brace")),
                _ => {}
            }
            self.parse_value(container, "", &token)?;
            match self.peek() {
                Some(next) if next.is_punct(',') => self.pos += 1,
                Some(next) if next.is_punct(close) => {}
                Some(next) => {
                    return Err(next.error(format!("unexpected token {}", next.display())));
                }
                None => {}
            }
        }
    }
}

/// Turn a tree violation met while parsing into a positioned syntax error.
fn located(err: ConfigError, anchor: &Token) -> ConfigError {
    if err.is_syntax_error() {
        return err;
    }
    let message = match err {
        ConfigError::SettingNameConflict { path } => format!("duplicate setting name {}", path),
        ConfigError::Type { message, .. } => message,
        other => other.to_string(),
    };
    anchor.error(message)
}

// ── Literals ────────────────────────────────────────────────────────

struct LiteralPatterns {
    boolean: Regex,
    hex: Regex,
    int: Regex,
    int64: Regex,
    float: Regex,
}

fn patterns() -> &'static LiteralPatterns {
    static PATTERNS: OnceLock<LiteralPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| LiteralPatterns {
        boolean: Regex::new(r"(?i)^(true|false)$").expect("boolean pattern"),
        hex: Regex::new(r"^0[xX]([0-9A-Fa-f]+)(L{0,2})$").expect("hex pattern"),
        int: Regex::new(r"^[-+]?[0-9]+$").expect("int pattern"),
        int64: Regex::new(r"^([-+]?[0-9]+)LL?$").expect("int64 pattern"),
        float: Regex::new(
            r"^[-+]?([0-9]*\.[0-9]*([eE][-+]?[0-9]+)?|[0-9]+(\.[0-9]*)?[eE][-+]?[0-9]+)$",
        )
        .expect("float pattern"),
    })
}

/// Infer the type of a bare literal, in order: string, boolean, hex,
/// decimal int, int64 (`L`/`LL` suffix), float.
pub fn parse_literal(token: &Token) -> Result<(Scalar, Format)> {
    let text = token.text.as_str();
    match token.kind {
        TokenKind::Str => return Ok((Scalar::String(token.text.clone()), Format::Default)),
        TokenKind::Punct(_) => return Err(invalid_value(token)),
        TokenKind::Word => {}
    }
    let p = patterns();

    if p.boolean.is_match(text) {
        return Ok((Scalar::Bool(text.eq_ignore_ascii_case("true")), Format::Default));
    }
    if let Some(caps) = p.hex.captures(text) {
        let digits = &caps[1];
        let value = if caps[2].is_empty() {
            match u32::from_str_radix(digits, 16) {
                Ok(v) => Scalar::Int(v as i32),
                Err(_) => Scalar::Int64(parse_hex64(digits, token)? as i64),
            }
        } else {
            Scalar::Int64(parse_hex64(digits, token)? as i64)
        };
        return Ok((value, Format::Hex));
    }
    if p.int.is_match(text) {
        let value = match text.parse::<i32>() {
            Ok(v) => Scalar::Int(v),
            Err(_) => Scalar::Int64(
                text.parse::<i64>()
                    .map_err(|_| token.error(format!("integer out of range {}", text)))?,
            ),
        };
        return Ok((value, Format::Default));
    }
    if let Some(caps) = p.int64.captures(text) {
        let v = caps[1]
            .parse::<i64>()
            .map_err(|_| token.error(format!("integer out of range {}", text)))?;
        return Ok((Scalar::Int64(v), Format::Default));
    }
    if p.float.is_match(text) {
        let v = text.parse::<f32>().map_err(|_| invalid_value(token))?;
        if !v.is_finite() {
            return Err(token.error(format!("float out of range {}", text)));
        }
        return Ok((Scalar::Float(v), Format::Default));
    }
    Err(invalid_value(token))
}

fn parse_hex64(digits: &str, token: &Token) -> Result<u64> {
    u64::from_str_radix(digits, 16)
        .map_err(|_| token.error(format!("integer out of range 0x{}", digits)))
}

fn invalid_value(token: &Token) -> ConfigError {
    token.error(format!("invalid value {}", token.display()))
}
