//! String-literal escaping for embedded module sources.
//!
//! Each module's source ends up inside a single-line string literal in the
//! bundle. De-escaping is left to the target's own lexer when the bundle runs,
//! so an [`Escaper`] must produce exactly what that lexer accepts.
//! [`Escaper::unescape`] mirrors the lexer and exists to check the round trip.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    #[error("unfinished string literal at byte {0}")]
    UnfinishedString(usize),

    #[error("unescaped quote at byte {0}")]
    UnescapedQuote(usize),

    #[error("invalid escape sequence '\\{sequence}' at byte {position}")]
    InvalidEscape { position: usize, sequence: char },

    #[error("decimal escape too large at byte {0}")]
    DecimalOutOfRange(usize),

    #[error("hexadecimal digit expected at byte {0}")]
    InvalidHex(usize),

    #[error("invalid unicode escape at byte {0}")]
    InvalidUnicode(usize),

    #[error("escaped bytes do not form valid UTF-8")]
    InvalidUtf8,
}

/// Conversion between raw source text and the body of a target string literal.
pub trait Escaper: Send + Sync {
    /// Escape `source` so it can sit between the literal's quotes.
    fn escape(&self, source: &str) -> String;

    /// Escape `source` and wrap it in quotes.
    fn quote(&self, source: &str) -> String;

    /// Decode a literal body the way the target lexer would.
    fn unescape(&self, literal: &str) -> Result<String, EscapeError>;
}

/// Lua short string literals delimited by `"`.
///
/// Backslashes, double quotes, line feeds and carriage returns are escaped.
/// Everything else, including other control bytes, is copied through; Lua
/// accepts those inside a short string.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuaEscaper;

impl Escaper for LuaEscaper {
    fn escape(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len() + source.len() / 8);
        // Single pass, so a backslash added for one character is never escaped again.
        for ch in source.chars() {
            match ch {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                _ => out.push(ch),
            }
        }
        out
    }

    fn quote(&self, source: &str) -> String {
        format!("\"{}\"", self.escape(source))
    }

    fn unescape(&self, literal: &str) -> Result<String, EscapeError> {
        let bytes = literal.as_bytes();
        let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\n' | b'\r' => return Err(EscapeError::UnfinishedString(i)),
                b'"' => return Err(EscapeError::UnescapedQuote(i)),
                b'\\' => {
                    let position = i;
                    i += 1;
                    let Some(&next) = bytes.get(i) else {
                        return Err(EscapeError::UnfinishedString(position));
                    };
                    match next {
                        b'a' => out.push(0x07),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0C),
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'v' => out.push(0x0B),
                        b'\\' | b'"' | b'\'' => out.push(next),
                        b'\n' | b'\r' => {
                            // An escaped line break yields one '\n'; "\r\n" and "\n\r" count once.
                            out.push(b'\n');
                            if let Some(&pair) = bytes.get(i + 1) {
                                if (pair == b'\n' || pair == b'\r') && pair != next {
                                    i += 1;
                                }
                            }
                        }
                        b'z' => {
                            while bytes.get(i + 1).is_some_and(|b| b.is_ascii_whitespace()) {
                                i += 1;
                            }
                        }
                        b'x' => {
                            let hex = bytes.get(i + 1..i + 3).ok_or(EscapeError::InvalidHex(position))?;
                            let value = std::str::from_utf8(hex)
                                .ok()
                                .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
                                .and_then(|h| u8::from_str_radix(h, 16).ok())
                                .ok_or(EscapeError::InvalidHex(position))?;
                            out.push(value);
                            i += 2;
                        }
                        b'0'..=b'9' => {
                            let mut value: u32 = 0;
                            let mut digits = 0;
                            while digits < 3 {
                                match bytes.get(i + digits) {
                                    Some(d) if d.is_ascii_digit() => {
                                        value = value * 10 + u32::from(d - b'0');
                                        digits += 1;
                                    }
                                    _ => break,
                                }
                            }
                            let byte = u8::try_from(value)
                                .map_err(|_| EscapeError::DecimalOutOfRange(position))?;
                            out.push(byte);
                            i += digits - 1;
                        }
                        b'u' => {
                            if bytes.get(i + 1) != Some(&b'{') {
                                return Err(EscapeError::InvalidUnicode(position));
                            }
                            let start = i + 2;
                            let end = bytes[start..]
                                .iter()
                                .position(|&b| b == b'}')
                                .map(|offset| start + offset)
                                .ok_or(EscapeError::InvalidUnicode(position))?;
                            let code = std::str::from_utf8(&bytes[start..end])
                                .ok()
                                .filter(|h| !h.is_empty() && h.bytes().all(|b| b.is_ascii_hexdigit()))
                                .and_then(|h| u32::from_str_radix(h, 16).ok())
                                .ok_or(EscapeError::InvalidUnicode(position))?;
                            let ch = char::from_u32(code).ok_or(EscapeError::InvalidUnicode(position))?;
                            let mut buf = [0u8; 4];
                            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                            i = end;
                        }
                        other => {
                            return Err(EscapeError::InvalidEscape {
                                position,
                                sequence: char::from(other),
                            })
                        }
                    }
                    i += 1;
                }
                byte => {
                    out.push(byte);
                    i += 1;
                }
            }
        }

        String::from_utf8(out).map_err(|_| EscapeError::InvalidUtf8)
    }
}
