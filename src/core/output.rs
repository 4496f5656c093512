//! Output rendering for `get` and `list`.
//!
//! Raw bytes go to the sink untouched unless the sink is a human terminal, in
//! which case non-UTF-8 keys and values are replaced with a placeholder unless
//! `show_binary` is set. The sink kind is decided by the caller and passed in.

use crate::core::error::StashError;
use crate::core::store::{Namespace, ScanOptions};
use std::io::{IsTerminal, Write};

pub const BINARY_PLACEHOLDER: &str = "(omitted binary data)";

/// Where output ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    /// An interactive terminal; binary data is redacted.
    Terminal,
    /// A pipe or file; bytes are written verbatim.
    Redirected,
}

impl Sink {
    /// Probe stdout.
    pub fn detect() -> Self {
        if std::io::stdout().is_terminal() {
            Sink::Terminal
        } else {
            Sink::Redirected
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Sink::Terminal
    }
}

/// Per-invocation listing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub reverse: bool,
    pub keys_only: bool,
    pub values_only: bool,
    /// Already unescaped; see [`unescape_delimiter`].
    pub delimiter: Vec<u8>,
    pub show_binary: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            reverse: false,
            keys_only: false,
            values_only: false,
            delimiter: b"\t".to_vec(),
            show_binary: false,
        }
    }
}

impl ListOptions {
    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            reverse: self.reverse,
            keys_only: self.keys_only,
        }
    }
}

/// Decode backslash escapes in a user-supplied delimiter.
///
/// Accepts the usual quoted-string set: `\a \b \f \n \r \t \v \\ \' \"`,
/// `\xNN` (one raw byte), `\NNN` (octal byte), `\uNNNN` and `\UNNNNNNNN`.
/// A lone `\0` is NUL.
pub fn unescape_delimiter(raw: &str) -> Result<Vec<u8>, StashError> {
    let mut out = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err(StashError::Format(
                "delimiter ends with a lone backslash".to_string(),
            ));
        };
        match esc {
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0b),
            '\\' | '\'' | '"' => out.push(esc as u8),
            'x' => {
                let byte = take_hex(&mut chars, 2, esc)?;
                out.push(byte as u8);
            }
            'u' | 'U' => {
                let width = if esc == 'u' { 4 } else { 8 };
                let code = take_hex(&mut chars, width, esc)?;
                let ch = char::from_u32(code).ok_or_else(|| {
                    StashError::Format(format!("invalid code point {:#x} in delimiter", code))
                })?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            '0'..='7' => {
                let mut value = esc.to_digit(8).unwrap_or(0);
                let mut digits = 1;
                while digits < 3 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits != 3 && !(esc == '0' && digits == 1) {
                    return Err(StashError::Format(
                        "octal escape in delimiter needs three digits".to_string(),
                    ));
                }
                if value > 0xff {
                    return Err(StashError::Format(format!(
                        "octal escape \\{:o} in delimiter is out of range",
                        value
                    )));
                }
                out.push(value as u8);
            }
            other => {
                return Err(StashError::Format(format!(
                    "invalid escape '\\{}' in delimiter",
                    other
                )));
            }
        }
    }
    Ok(out)
}

fn take_hex(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    count: usize,
    esc: char,
) -> Result<u32, StashError> {
    let mut value: u32 = 0;
    for _ in 0..count {
        let digit = chars.next().and_then(|d| d.to_digit(16)).ok_or_else(|| {
            StashError::Format(format!(
                "escape \\{} in delimiter needs {} hex digits",
                esc, count
            ))
        })?;
        value = value * 16 + digit;
    }
    Ok(value)
}

pub struct Formatter<W: Write> {
    out: W,
    sink: Sink,
    show_binary: bool,
}

impl<W: Write> Formatter<W> {
    pub fn new(out: W, sink: Sink, show_binary: bool) -> Self {
        Self {
            out,
            sink,
            show_binary,
        }
    }

    fn field<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        if self.sink.is_terminal() && !self.show_binary && std::str::from_utf8(bytes).is_err() {
            BINARY_PLACEHOLDER.as_bytes()
        } else {
            bytes
        }
    }

    /// Write a single value as `get` does. Terminals get a trailing newline;
    /// redirected output gets the exact bytes.
    pub fn write_value(&mut self, value: &[u8]) -> Result<(), StashError> {
        let shown = self.field(value);
        self.out.write_all(shown)?;
        if self.sink.is_terminal() {
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Write one listing record according to `opts`.
    pub fn write_record(
        &mut self,
        opts: &ListOptions,
        key: &[u8],
        value: Option<&[u8]>,
    ) -> Result<(), StashError> {
        match value {
            _ if opts.keys_only => self.write_line(key)?,
            Some(v) if opts.values_only => self.write_line(v)?,
            Some(v) => {
                let key = self.field(key);
                let v = self.field(v);
                self.out.write_all(key)?;
                self.out.write_all(&opts.delimiter)?;
                self.out.write_all(v)?;
                self.out.write_all(b"\n")?;
            }
            None => self.write_line(key)?,
        }
        Ok(())
    }

    fn write_line(&mut self, bytes: &[u8]) -> Result<(), StashError> {
        let shown = self.field(bytes);
        self.out.write_all(shown)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), StashError> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Sync `ns` and stream every entry through `fmt`. Returns the number of records written.
pub fn iterate<W: Write>(
    ns: &mut Namespace,
    opts: &ListOptions,
    fmt: &mut Formatter<W>,
) -> Result<usize, StashError> {
    ns.sync()?;
    let written = ns.with_txn(true, |txn| {
        txn.scan(opts.scan_options(), |key, value| {
            fmt.write_record(opts, key, value)
        })
    })?;
    fmt.flush()?;
    tracing::debug!(namespace = ns.name(), records = written, "listed namespace");
    Ok(written)
}
