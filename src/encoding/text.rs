//! Diagnostic text format for taint
//!
//! Input is a JSON-like list of range objects:
//!
//! ```text
//! [{begin: 10, end: 20, source: 'src1'}, {begin: 80, end: 90, source: "src2"}]
//! ```
//!
//! Keys may come in any order; string values are delimited by matching `'`
//! or `"` without escape processing. Ranges must be listed in order without
//! overlap. Anything malformed decodes to the untainted state.
//!
//! Output is one line per range, `begin - end : source`. The two directions
//! are deliberately asymmetric: the output is for humans and is not meant to
//! be fed back into the decoder.

use std::fmt;
use std::io::{self, Write};

use tracing::{debug, warn};

use crate::error::TextError;
use crate::flow::TaintOperation;
use crate::range::TaintRange;
use crate::string_taint::StringTaint;

/// Text format encoder
#[derive(Debug, Default)]
pub struct TextEncoder {
    _private: (),
}

impl TextEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one `begin - end : source` line per range.
    pub fn encode<W: Write>(&self, taint: &StringTaint, mut writer: W) -> io::Result<()> {
        for range in taint {
            writeln!(writer, "{}", range)?;
        }
        Ok(())
    }
}

/// Text format decoder
#[derive(Debug, Default)]
pub struct TextDecoder {
    _private: (),
}

impl TextDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode, degrading any error to the untainted state.
    pub fn decode(&self, text: &str) -> StringTaint {
        match self.try_decode(text) {
            Ok(taint) => taint,
            Err(err) => {
                debug!("Rejecting taint text {:?}: {}", text, err);
                StringTaint::new()
            }
        }
    }

    /// Decode, reporting why the input was rejected.
    pub fn try_decode(&self, text: &str) -> Result<StringTaint, TextError> {
        Parser::new(text).parse_list()
    }
}

/// Parse diagnostic taint text; malformed input yields untainted.
pub fn parse_taint(text: &str) -> StringTaint {
    TextDecoder::new().decode(text)
}

/// Parse diagnostic taint text, keeping the rejection reason.
pub fn try_parse_taint(text: &str) -> Result<StringTaint, TextError> {
    TextDecoder::new().try_decode(text)
}

/// Render `taint` in the one-line-per-range debug form.
pub fn print_taint(taint: &StringTaint) -> String {
    taint.to_string()
}

impl fmt::Display for StringTaint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for range in self {
            writeln!(f, "{}", range)?;
        }
        Ok(())
    }
}

/// Key/value content of one `{...}` object.
#[derive(Default)]
struct RangeFields {
    begin: Option<u32>,
    end: Option<u32>,
    source: Option<String>,
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn unexpected(&self) -> TextError {
        match self.peek() {
            Some(found) => TextError::UnexpectedChar {
                found,
                offset: self.pos,
            },
            None => TextError::UnexpectedEnd { offset: self.pos },
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TextError> {
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_list(mut self) -> Result<StringTaint, TextError> {
        let trimmed = self.text.trim();
        if !trimmed.starts_with('[') || !trimmed.ends_with(']') {
            return Err(TextError::MalformedList);
        }

        let mut taint = StringTaint::new();
        let mut previous_end = 0;

        self.skip_whitespace();
        self.expect('[')?;
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.bump();
        } else {
            loop {
                let range = self.parse_range()?;
                if range.begin() < previous_end {
                    return Err(TextError::Overlapping {
                        begin: range.begin(),
                        end: range.end(),
                        previous_end,
                    });
                }
                previous_end = range.end();
                taint.append(range);

                self.skip_whitespace();
                match self.bump() {
                    Some(',') => self.skip_whitespace(),
                    Some(']') => break,
                    Some(found) => {
                        return Err(TextError::UnexpectedChar {
                            found,
                            offset: self.pos - found.len_utf8(),
                        })
                    }
                    None => return Err(TextError::UnexpectedEnd { offset: self.pos }),
                }
            }
        }

        self.skip_whitespace();
        if self.peek().is_some() {
            return Err(self.unexpected());
        }
        Ok(taint)
    }

    fn parse_range(&mut self) -> Result<TaintRange, TextError> {
        let start = self.pos;
        self.expect('{')?;
        let mut fields = RangeFields::default();

        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.bump();
        } else {
            loop {
                self.skip_whitespace();
                let key = self.parse_word()?;
                self.skip_whitespace();
                self.expect(':')?;
                self.skip_whitespace();
                let value = self.parse_value()?;

                match key {
                    "begin" => fields.begin = Some(parse_position("begin", value)?),
                    "end" => fields.end = Some(parse_position("end", value)?),
                    "source" => fields.source = Some(value.to_owned()),
                    other => warn!("Ignoring unknown taint range key '{}'", other),
                }

                self.skip_whitespace();
                match self.bump() {
                    Some(',') => continue,
                    Some('}') => break,
                    Some(found) => {
                        return Err(TextError::UnexpectedChar {
                            found,
                            offset: self.pos - found.len_utf8(),
                        })
                    }
                    None => return Err(TextError::UnexpectedEnd { offset: self.pos }),
                }
            }
        }

        let missing = |key| TextError::MissingKey { key, offset: start };
        let begin = fields.begin.ok_or_else(|| missing("begin"))?;
        let end = fields.end.ok_or_else(|| missing("end"))?;
        let source = fields.source.ok_or_else(|| missing("source"))?;
        if begin > end {
            return Err(TextError::InvertedRange { begin, end });
        }
        Ok(TaintRange::from_operation(
            begin,
            end,
            TaintOperation::new(source),
        ))
    }

    /// Bare identifier or number.
    fn parse_word(&mut self) -> Result<&'a str, TextError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(&self.text[start..self.pos])
    }

    fn parse_value(&mut self) -> Result<&'a str, TextError> {
        match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                let start = self.pos;
                self.bump();
                let content_start = self.pos;
                match self.text[content_start..].find(quote) {
                    Some(len) => {
                        self.pos = content_start + len + quote.len_utf8();
                        Ok(&self.text[content_start..content_start + len])
                    }
                    None => Err(TextError::UnterminatedString { offset: start }),
                }
            }
            _ => self.parse_word(),
        }
    }
}

fn parse_position(key: &'static str, value: &str) -> Result<u32, TextError> {
    value.parse().map_err(|_| TextError::InvalidInteger {
        key,
        value: value.to_owned(),
    })
}
