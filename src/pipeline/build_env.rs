//! Build-environment file: a strict, declarative reader for `chromium.gyp_env`.
//!
//! The file is a single GYP-style mapping literal, for example:
//!
//! ```text
//! {
//!   'GYP_DEFINES': 'component=shared_library',
//!   # route compiles through GOMA
//!   'CC': 'C:/goma/gomacc.exe cl.exe',
//! }
//! ```
//!
//! It is parsed, never evaluated. The accepted grammar is the literal subset
//! GYP itself writes: string keys, and values that are strings (adjacent
//! literals concatenate), numbers, `True`/`False`/`None` (or their JSON
//! spellings), lists, and nested mappings. `#` comments and trailing commas
//! are allowed. Anything else (calls, names, arithmetic) is rejected with a
//! line and column so a broken file fails loudly instead of silently falling
//! back to the default compiler.
//!
//! The parsed mapping lands in a [`serde_json::Value`] tree and is then
//! deserialised into [`BuildEnv`], which is where schema checks live.

use crate::error::C99ConvError;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;
use tracing::debug;

/// The keys of the build environment this crate understands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildEnv {
    /// Compiler command, e.g. `"gomacc.exe cl.exe"`.
    #[serde(rename = "CC", default)]
    pub cc: Option<String>,

    /// Every other key, kept as parsed.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl BuildEnv {
    /// The `CC` entry split on whitespace, if declared.
    pub fn compiler_command(&self) -> Option<Vec<String>> {
        self.cc.as_deref().map(crate::config::split_command)
    }
}

/// A syntax error in a mapping literal, 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub detail: String,
}

/// Read the build environment at `path`.
///
/// Returns `Ok(None)` when no regular file exists there.
pub async fn load_build_env(path: &Path) -> Result<Option<BuildEnv>, C99ConvError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            debug!("No build environment at {}", path.display());
            return Ok(None);
        }
    }

    let src = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| C99ConvError::BuildEnvUnreadable {
            path: path.to_path_buf(),
            source: e,
        })?;

    parse_build_env(path, &src).map(Some)
}

/// Parse and schema-check build-environment text. `path` is used for errors.
pub fn parse_build_env(path: &Path, src: &str) -> Result<BuildEnv, C99ConvError> {
    let map = parse_mapping(src).map_err(|e| C99ConvError::BuildEnvMalformed {
        path: path.to_path_buf(),
        line: e.line,
        column: e.column,
        detail: e.detail,
    })?;

    serde_json::from_value(Value::Object(map)).map_err(|e| C99ConvError::BuildEnvSchema {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Parse a mapping literal into a JSON object.
pub fn parse_mapping(src: &str) -> Result<Map<String, Value>, ParseError> {
    Parser::new(src).parse_document()
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, detail: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line,
            column: self.column,
            detail: detail.into(),
        }
    }

    fn skip_ws(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn expect(&mut self, want: char) -> Result<(), ParseError> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{want}', found '{c}'"))),
            None => Err(self.error(format!("expected '{want}', found end of input"))),
        }
    }

    fn parse_document(&mut self) -> Result<Map<String, Value>, ParseError> {
        self.skip_ws();
        if self.peek() != Some('{') {
            return Err(self.error("build environment must be a single '{…}' mapping"));
        }
        let map = self.parse_dict()?;
        self.skip_ws();
        if let Some(c) = self.peek() {
            return Err(self.error(format!("unexpected '{c}' after mapping")));
        }
        Ok(map)
    }

    fn parse_dict(&mut self) -> Result<Map<String, Value>, ParseError> {
        self.expect('{')?;
        let mut map = Map::new();

        loop {
            self.skip_ws();
            let (line, column) = (self.line, self.column);
            let key = match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(map);
                }
                Some('\'' | '"') => self.parse_string()?,
                Some(c) => return Err(self.error(format!("mapping keys must be strings, found '{c}'"))),
                None => return Err(self.error("unterminated mapping")),
            };

            if map.contains_key(&key) {
                return Err(ParseError {
                    line,
                    column,
                    detail: format!("duplicate key '{key}'"),
                });
            }

            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                Some(c) => return Err(self.error(format!("expected ',' or '}}', found '{c}'"))),
                None => return Err(self.error("unterminated mapping")),
            }
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Value>, ParseError> {
        self.expect('[')?;
        let mut items = Vec::new();

        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.bump();
                return Ok(items);
            }

            items.push(self.parse_value()?);

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                Some(c) => return Err(self.error(format!("expected ',' or ']', found '{c}'"))),
                None => return Err(self.error("unterminated list")),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some('{') => self.parse_dict().map(Value::Object),
            Some('[') => self.parse_list().map(Value::Array),
            Some('\'' | '"') => self.parse_string().map(Value::String),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_ident(),
            Some(c) => Err(self.error(format!("unexpected '{c}' where a value was expected"))),
            None => Err(self.error("expected a value, found end of input")),
        }
    }

    /// One or more adjacent string literals, concatenated.
    fn parse_string(&mut self) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            self.parse_string_literal(&mut out)?;
            self.skip_ws();
            if !matches!(self.peek(), Some('\'' | '"')) {
                return Ok(out);
            }
        }
    }

    fn parse_string_literal(&mut self, out: &mut String) -> Result<(), ParseError> {
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a string")),
        };

        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated string literal")),
                Some(c) if c == quote => return Ok(()),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some(c @ ('\\' | '\'' | '"')) => c,
                        Some(c) => return Err(self.error(format!("unsupported escape '\\{c}'"))),
                        None => return Err(self.error("unterminated string literal")),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Value, ParseError> {
        let mut text = String::new();
        if self.peek() == Some('-') {
            self.bump();
            text.push('-');
        }

        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                text.push(c);
            } else {
                break;
            }
            self.bump();
        }

        if !text.chars().any(|c| c.is_ascii_digit()) || text.ends_with('.') {
            return Err(self.error(format!("malformed number '{text}'")));
        }

        let number = if seen_dot {
            text.parse::<f64>().ok().and_then(Number::from_f64)
        } else {
            text.parse::<i64>().ok().map(Number::from)
        };
        number
            .map(Value::Number)
            .ok_or_else(|| self.error(format!("number out of range '{text}'")))
    }

    fn parse_ident(&mut self) -> Result<Value, ParseError> {
        let (line, column) = (self.line, self.column);
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            _ => Err(ParseError {
                line,
                column,
                detail: format!("unsupported expression '{ident}' (only literals are allowed)"),
            }),
        }
    }
}
