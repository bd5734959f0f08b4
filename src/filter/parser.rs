//! RFC 4515 string filter parser for caller-supplied raw filters.

use super::{AttributeName, Filter, Substrings};
use crate::error::{DirectoryError, Result};

const MAX_DEPTH: usize = 32;

/// Parse a filter string into a [`Filter`].
///
/// A single unparenthesized item (`uid=jdoe`) is accepted as a convenience.
/// Extensible matches (`:=`) are not supported.
pub fn parse_filter(input: &str) -> Result<Filter> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DirectoryError::syntax(input, "empty filter"));
    }

    let wrapped;
    let text = if trimmed.starts_with('(') {
        trimmed
    } else {
        wrapped = format!("({})", trimmed);
        wrapped.as_str()
    };

    let mut parser = FilterParser {
        input: text.as_bytes(),
        pos: 0,
        depth: 0,
    };
    let filter = parser
        .filter()
        .map_err(|message| DirectoryError::syntax(input, message))?;
    if parser.pos != parser.input.len() {
        return Err(DirectoryError::syntax(
            input,
            format!("unexpected trailing input at offset {}", parser.pos),
        ));
    }
    Ok(filter)
}

struct FilterParser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

type ParseResult<T> = std::result::Result<T, String>;

impl<'a> FilterParser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> ParseResult<()> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(format!(
                "expected '{}' at offset {}, found '{}'",
                byte as char, self.pos, b as char
            )),
            None => Err(format!("expected '{}' but filter ended", byte as char)),
        }
    }

    fn filter(&mut self) -> ParseResult<Filter> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(format!("filter nested deeper than {} levels", MAX_DEPTH));
        }

        self.expect(b'(')?;
        let filter = match self.peek() {
            Some(b'&') => {
                self.pos += 1;
                Filter::And(self.filter_list()?)
            }
            Some(b'|') => {
                self.pos += 1;
                Filter::Or(self.filter_list()?)
            }
            Some(b'!') => {
                self.pos += 1;
                Filter::Not(Box::new(self.filter()?))
            }
            Some(_) => self.item()?,
            None => return Err("filter ended after '('".to_string()),
        };
        self.expect(b')')?;

        self.depth -= 1;
        Ok(filter)
    }

    fn filter_list(&mut self) -> ParseResult<Vec<Filter>> {
        let mut items = Vec::new();
        while self.peek() == Some(b'(') {
            items.push(self.filter()?);
        }
        Ok(items)
    }

    fn attribute(&mut self) -> ParseResult<AttributeName> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'-' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or_default();
        if name.is_empty() {
            return Err(format!("missing attribute name at offset {}", start));
        }
        AttributeName::parse(name).map_err(|e| e.to_string())
    }

    fn item(&mut self) -> ParseResult<Filter> {
        let attr = self.attribute()?;

        match self.peek() {
            Some(b'=') => {
                self.pos += 1;
                self.equality_or_substring(attr)
            }
            Some(b'>') => {
                self.pos += 1;
                self.expect(b'=')?;
                Ok(Filter::GreaterOrEqual(attr, self.value()?))
            }
            Some(b'<') => {
                self.pos += 1;
                self.expect(b'=')?;
                Ok(Filter::LessOrEqual(attr, self.value()?))
            }
            Some(b'~') => {
                self.pos += 1;
                self.expect(b'=')?;
                Ok(Filter::Approx(attr, self.value()?))
            }
            Some(b':') => Err("extensible match filters are not supported".to_string()),
            Some(b) => Err(format!(
                "unexpected '{}' after attribute '{}'",
                b as char, attr
            )),
            None => Err(format!("filter ended after attribute '{}'", attr)),
        }
    }

    /// Reads one assertion value up to `)` or an unescaped `*`.
    fn value(&mut self) -> ParseResult<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(b) = self.peek() {
            match b {
                b')' | b'*' => break,
                b'(' => return Err(format!("unescaped '(' at offset {}", self.pos)),
                b'\\' => {
                    let hex = self
                        .input
                        .get(self.pos + 1..self.pos + 3)
                        .ok_or_else(|| format!("truncated escape at offset {}", self.pos))?;
                    let hex = std::str::from_utf8(hex).map_err(|_| "invalid escape".to_string())?;
                    let byte = u8::from_str_radix(hex, 16)
                        .map_err(|_| format!("invalid escape '\\{}'", hex))?;
                    out.push(byte);
                    self.pos += 3;
                }
                _ => {
                    out.push(b);
                    self.pos += 1;
                }
            }
        }
        Ok(out)
    }

    fn equality_or_substring(&mut self, attr: AttributeName) -> ParseResult<Filter> {
        let mut pieces = vec![self.value()?];
        while self.peek() == Some(b'*') {
            self.pos += 1;
            pieces.push(self.value()?);
        }

        if pieces.len() == 1 {
            return Ok(Filter::Equality(attr, pieces.remove(0)));
        }
        if pieces.len() == 2 && pieces.iter().all(|p| p.is_empty()) {
            return Ok(Filter::Present(attr));
        }

        let last = pieces.pop().filter(|p| !p.is_empty());
        let initial = Some(pieces.remove(0)).filter(|p| !p.is_empty());
        if pieces.iter().any(|p| p.is_empty()) {
            return Err("empty substring component ('**')".to_string());
        }

        Ok(Filter::Substring(
            attr,
            Substrings {
                initial,
                any: pieces,
                last,
            },
        ))
    }
}
