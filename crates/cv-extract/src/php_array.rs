//! A small tokenizer for PHP array literals.
//!
//! Translation catalogs and configuration files are plain `return [...]`
//! scripts. This module understands just enough of the language to walk those
//! literals: single and double quoted strings with escapes, `=>` pairs, nested
//! `[...]` and `array(...)` literals, comments, and trailing commas. Anything
//! else in value position is captured verbatim as an [`PhpValue::Expr`].
//!
//! # Examples
//!
//! ```
//! use cv_extract::php_array::{flatten, parse_return_array};
//!
//! let source = r#"<?php
//! return [
//!     'failed' => 'These credentials do not match our records.',
//!     'throttle' => [
//!         'short' => 'Too many attempts.',
//!     ],
//! ];
//! "#;
//!
//! let items = parse_return_array(source)?;
//! let keys: Vec<_> = flatten(&items).into_iter().map(|e| e.key).collect();
//! assert_eq!(keys, vec!["failed", "throttle", "throttle.short"]);
//! # Ok::<(), cv_extract::ExtractError>(())
//! ```

use crate::error::ExtractError;

/// A value inside an array literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhpValue {
    /// A string literal with escapes resolved.
    Str(String),
    /// A nested array literal.
    Array(Vec<PhpItem>),
    /// Any other expression, as written.
    Expr(String),
}

impl PhpValue {
    /// Returns the string literal, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested items, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[PhpItem]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// One element of an array literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpItem {
    /// Key text for `key => value` elements.
    pub key: Option<String>,
    /// Element value.
    pub value: PhpValue,
    /// Byte offset of the element in the parsed source.
    pub offset: usize,
}

/// A node of a flattened array tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    /// Dot-joined key path.
    pub key: String,
    /// String value for string leaves.
    pub value: Option<String>,
    /// Whether the node has no children.
    pub is_leaf: bool,
    /// Byte offset of the element in the parsed source.
    pub offset: usize,
}

/// Parses the first `return [...]` or `return array(...)` in `src`.
pub fn parse_return_array(src: &str) -> Result<Vec<PhpItem>, ExtractError> {
    let mut parser = Parser::new(src, 0);
    loop {
        parser.skip_trivia();
        let Some(c) = parser.peek_char() else {
            return Err(ExtractError::MissingReturn);
        };
        if parser.at_keyword("return") {
            parser.pos += "return".len();
            parser.skip_trivia();
            let open = parser.pos;
            if let Some(close) = parser.try_array_open() {
                return parser.parse_items(close, open);
            }
        } else if c == '\'' || c == '"' {
            parser.read_string()?;
        } else {
            parser.pos += c.len_utf8();
        }
    }
}

/// Parses the array literal that starts at `offset`, skipping leading trivia.
///
/// Offsets in the returned items are relative to the whole of `src`.
pub fn parse_array_at(src: &str, offset: usize) -> Result<Vec<PhpItem>, ExtractError> {
    let mut parser = Parser::new(src, offset);
    parser.skip_trivia();
    let open = parser.pos;
    match parser.try_array_open() {
        Some(close) => parser.parse_items(close, open),
        None => match parser.peek_char() {
            Some(found) => Err(ExtractError::UnexpectedToken {
                found,
                line: parser.line_at(open),
            }),
            None => Err(ExtractError::MissingReturn),
        },
    }
}

/// Flattens an array tree into dot-joined paths, parents before children.
///
/// Elements without a key use their position among siblings.
#[must_use]
pub fn flatten(items: &[PhpItem]) -> Vec<FlatEntry> {
    let mut out = Vec::new();
    flatten_into(items, "", &mut out);
    out
}

fn flatten_into(items: &[PhpItem], prefix: &str, out: &mut Vec<FlatEntry>) {
    for (index, item) in items.iter().enumerate() {
        let segment = item.key.clone().unwrap_or_else(|| index.to_string());
        let key = if prefix.is_empty() {
            segment
        } else {
            format!("{prefix}.{segment}")
        };
        match &item.value {
            PhpValue::Array(children) => {
                out.push(FlatEntry {
                    key: key.clone(),
                    value: None,
                    is_leaf: children.is_empty(),
                    offset: item.offset,
                });
                flatten_into(children, &key, out);
            }
            PhpValue::Str(s) => out.push(FlatEntry {
                key,
                value: Some(s.clone()),
                is_leaf: true,
                offset: item.offset,
            }),
            PhpValue::Expr(_) => out.push(FlatEntry {
                key,
                value: None,
                is_leaf: true,
                offset: item.offset,
            }),
        }
    }
}

/// Collects the string literals of a flat list such as `['name', 'email']`.
#[must_use]
pub fn string_values(items: &[PhpItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.value.as_str())
        .map(str::to_owned)
        .collect()
}

/// Collects `'key' => 'value'` pairs whose value is a string literal.
#[must_use]
pub fn string_pairs(items: &[PhpItem]) -> Vec<(String, String)> {
    items
        .iter()
        .filter_map(|item| Some((item.key.clone()?, item.value.as_str()?.to_owned())))
        .collect()
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self {
            src,
            pos: pos.min(src.len()),
        }
    }

    fn rest(&self) -> &'a str {
        self.src.get(self.pos..).unwrap_or("")
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn line_at(&self, offset: usize) -> u32 {
        let before = self.src.get(..offset).unwrap_or(self.src);
        u32::try_from(before.matches('\n').count() + 1).unwrap_or(u32::MAX)
    }

    fn at_keyword(&self, word: &str) -> bool {
        let rest = self.rest();
        if !rest.starts_with(word) {
            return false;
        }
        let before_ok = self.src[..self.pos]
            .chars()
            .next_back()
            .is_none_or(|c| !is_ident_char(c));
        let after_ok = rest[word.len()..].chars().next().is_none_or(|c| !is_ident_char(c));
        before_ok && after_ok
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("//") || (trimmed.starts_with('#') && !trimmed.starts_with("#[")) {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else if trimmed.starts_with("/*") {
                self.pos += trimmed.find("*/").map_or(trimmed.len(), |end| end + 2);
            } else if trimmed.starts_with("<?php") {
                self.pos += "<?php".len();
            } else {
                return;
            }
        }
    }

    /// Consumes `[` or `array(` and returns the matching closing character.
    fn try_array_open(&mut self) -> Option<char> {
        let rest = self.rest();
        if rest.starts_with('[') {
            self.pos += 1;
            return Some(']');
        }
        let is_array_keyword = rest
            .get(..5)
            .is_some_and(|word| word.eq_ignore_ascii_case("array") && self.at_keyword(word));
        if is_array_keyword {
            let save = self.pos;
            self.pos += 5;
            self.skip_trivia();
            if self.rest().starts_with('(') {
                self.pos += 1;
                return Some(')');
            }
            self.pos = save;
        }
        None
    }

    fn parse_items(&mut self, close: char, open: usize) -> Result<Vec<PhpItem>, ExtractError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek_char() {
                None => return Err(ExtractError::UnbalancedArray { line: self.line_at(open) }),
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => {}
            }

            let offset = self.pos;
            let first = self.parse_value()?;
            self.skip_trivia();
            let item = if self.rest().starts_with("=>") {
                self.pos += 2;
                let key = match first {
                    PhpValue::Str(s) | PhpValue::Expr(s) => s,
                    PhpValue::Array(_) => {
                        return Err(ExtractError::UnexpectedToken {
                            found: '[',
                            line: self.line_at(offset),
                        });
                    }
                };
                PhpItem {
                    key: Some(key),
                    value: self.parse_value()?,
                    offset,
                }
            } else {
                PhpItem {
                    key: None,
                    value: first,
                    offset,
                }
            };
            items.push(item);

            self.skip_trivia();
            match self.peek_char() {
                Some(',') => self.pos += 1,
                Some(c) if c == close => {}
                None => return Err(ExtractError::UnbalancedArray { line: self.line_at(open) }),
                Some(found) => {
                    return Err(ExtractError::UnexpectedToken {
                        found,
                        line: self.line_at(self.pos),
                    });
                }
            }
        }
    }

    fn parse_value(&mut self) -> Result<PhpValue, ExtractError> {
        self.skip_trivia();
        let start = self.pos;
        if let Some(close) = self.try_array_open() {
            return Ok(PhpValue::Array(self.parse_items(close, start)?));
        }
        if matches!(self.peek_char(), Some('\'' | '"')) {
            let s = self.read_string()?;
            let after_string = self.pos;
            self.skip_trivia();
            let rest = self.rest();
            let terminated = rest.is_empty()
                || rest.starts_with("=>")
                || rest.starts_with([',', ']', ')']);
            if terminated {
                self.pos = after_string;
                return Ok(PhpValue::Str(s));
            }
            // Concatenation or a call on the string: keep the whole expression.
            self.pos = start;
        }
        self.read_expr()
    }

    fn read_expr(&mut self) -> Result<PhpValue, ExtractError> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.peek_char() {
            match c {
                '\'' | '"' => {
                    self.read_string()?;
                    continue;
                }
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' if depth == 0 => break,
                ')' | ']' | '}' => depth -= 1,
                ',' if depth == 0 => break,
                '=' if depth == 0 && self.rest().starts_with("=>") => break,
                _ => {}
            }
            self.pos += c.len_utf8();
        }
        let text = self.src[start..self.pos].trim();
        if text.is_empty() {
            return match self.peek_char() {
                Some(found) => Err(ExtractError::UnexpectedToken {
                    found,
                    line: self.line_at(self.pos),
                }),
                None => Err(ExtractError::UnbalancedArray { line: self.line_at(start) }),
            };
        }
        Ok(PhpValue::Expr(text.to_owned()))
    }

    fn read_string(&mut self) -> Result<String, ExtractError> {
        let open = self.pos;
        let mut chars = self.rest().char_indices();
        let Some((_, quote)) = chars.next() else {
            return Err(ExtractError::UnterminatedString { line: self.line_at(open) });
        };
        let mut out = String::new();
        while let Some((i, c)) = chars.next() {
            if c == quote {
                self.pos = open + i + c.len_utf8();
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let Some((_, escaped)) = chars.next() else {
                break;
            };
            match (quote, escaped) {
                (_, '\\') => out.push('\\'),
                (q, e) if q == e => out.push(e),
                ('"', 'n') => out.push('\n'),
                ('"', 't') => out.push('\t'),
                ('"', 'r') => out.push('\r'),
                ('"', '$') => out.push('$'),
                (_, other) => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
        Err(ExtractError::UnterminatedString { line: self.line_at(open) })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(items: &[PhpItem]) -> Vec<String> {
        flatten(items).into_iter().map(|e| e.key).collect()
    }

    #[test]
    fn test_nested_arrays_and_trailing_commas() {
        let src = "<?php\nreturn [\n  'a' => 'x',\n  'b' => [\n    'c' => 'y',\n    'd' => ['e' => 'z',],\n  ],\n];\n";
        let items = parse_return_array(src).unwrap();
        assert_eq!(keys(&items), vec!["a", "b", "b.c", "b.d", "b.d.e"]);

        let flat = flatten(&items);
        assert_eq!(flat[0].value.as_deref(), Some("x"));
        assert!(!flat[1].is_leaf);
        assert_eq!(flat[4].value.as_deref(), Some("z"));
    }

    #[test]
    fn test_legacy_array_syntax() {
        let src = "<?php return array(\n 'welcome' => 'Hello',\n 'nested' => array('k' => 'v'),\n);";
        let items = parse_return_array(src).unwrap();
        assert_eq!(keys(&items), vec!["welcome", "nested", "nested.k"]);
    }

    #[test]
    fn test_comments_are_skipped() {
        let src = "<?php\n// header\nreturn [\n  /* block */ 'a' => 'x', // trailing\n  # hash\n  'b' => 'y',\n];";
        let items = parse_return_array(src).unwrap();
        assert_eq!(keys(&items), vec!["a", "b"]);
    }

    #[test]
    fn test_return_inside_comment_ignored() {
        let src = "<?php\n// return ['no' => 'pe'];\nreturn ['yes' => 'ok'];";
        let items = parse_return_array(src).unwrap();
        assert_eq!(keys(&items), vec!["yes"]);
    }

    #[test]
    fn test_string_escapes() {
        let src = r#"<?php return ['a' => 'It\'s', 'b' => "Say \"hi\"\n", 'c' => 'back\\slash', 'd' => 'raw\n'];"#;
        let items = parse_return_array(src).unwrap();
        let flat = flatten(&items);
        assert_eq!(flat[0].value.as_deref(), Some("It's"));
        assert_eq!(flat[1].value.as_deref(), Some("Say \"hi\"\n"));
        assert_eq!(flat[2].value.as_deref(), Some("back\\slash"));
        assert_eq!(flat[3].value.as_deref(), Some("raw\\n"));
    }

    #[test]
    fn test_expression_values() {
        let src = "<?php return [\n 'name' => env('APP_NAME', 'Laravel'),\n 'debug' => (bool) env('APP_DEBUG', false),\n 'joined' => 'a' . 'b',\n 'flag' => true,\n];";
        let items = parse_return_array(src).unwrap();
        assert_eq!(
            items[0].value,
            PhpValue::Expr("env('APP_NAME', 'Laravel')".to_owned())
        );
        assert_eq!(items[2].value, PhpValue::Expr("'a' . 'b'".to_owned()));
        assert_eq!(items[3].value, PhpValue::Expr("true".to_owned()));
        assert!(flatten(&items).iter().all(|e| e.value.is_none()));
    }

    #[test]
    fn test_list_items_use_indexes() {
        let src = "<?php return ['days' => ['Mon', 'Tue']];";
        let items = parse_return_array(src).unwrap();
        assert_eq!(keys(&items), vec!["days", "days.0", "days.1"]);
    }

    #[test]
    fn test_offsets_point_at_items() {
        let src = "<?php return [\n  'a' => 'x',\n  'b' => 'y',\n];";
        let items = parse_return_array(src).unwrap();
        assert!(src[items[1].offset..].starts_with("'b'"));
    }

    #[test]
    fn test_parse_array_at() {
        let src = "protected $fillable = ['title', 'body'];";
        let offset = src.find('=').unwrap() + 1;
        let items = parse_array_at(src, offset).unwrap();
        assert_eq!(string_values(&items), vec!["title", "body"]);
    }

    #[test]
    fn test_string_pairs() {
        let src = "<?php return ['a' => 'int', 'b' => Status::class, 'c' => 'bool'];";
        let items = parse_return_array(src).unwrap();
        assert_eq!(
            string_pairs(&items),
            vec![("a".to_owned(), "int".to_owned()), ("c".to_owned(), "bool".to_owned())]
        );
    }

    #[test]
    fn test_missing_return() {
        assert!(matches!(
            parse_return_array("<?php echo 'hi';"),
            Err(ExtractError::MissingReturn)
        ));
    }

    #[test]
    fn test_unterminated_string() {
        let err = parse_return_array("<?php\nreturn [\n 'a' => 'oops,\n];").unwrap_err();
        assert!(matches!(err, ExtractError::UnterminatedString { line: 3 }));
    }

    #[test]
    fn test_unbalanced_array() {
        let err = parse_return_array("<?php\nreturn [\n 'a' => ['b' => 'c',\n").unwrap_err();
        assert!(matches!(err, ExtractError::UnbalancedArray { .. }));
    }

    #[test]
    fn test_unexpected_token() {
        let err = parse_return_array("<?php return ['a' => 'x' 'b' => 'y'];").unwrap_err();
        assert!(matches!(err, ExtractError::UnexpectedToken { .. }));
    }
}
