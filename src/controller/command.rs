use crate::address::Address;
use crate::error::{EdError, EdResult};
use crate::search::body;
use std::fmt::Write;

/// How a line is written by `p`, `n`, `l` and the print suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrintMode {
    Plain,
    Numbered,
    Unambiguous,
}

impl PrintMode {
    pub fn from_char(c: char) -> Option<PrintMode> {
        match c {
            'p' => Some(PrintMode::Plain),
            'n' => Some(PrintMode::Numbered),
            'l' => Some(PrintMode::Unambiguous),
            _ => None,
        }
    }
}

/// Print suffix after a command: nothing, or any run of `p`, `n`, `l`.
/// `n` and `l` win over `p`.
pub fn parse_suffix(args: &str) -> EdResult<Option<PrintMode>> {
    let mut mode: Option<PrintMode> = None;
    for c in args.chars() {
        let next = PrintMode::from_char(c).ok_or(EdError::InvalidSuffix)?;
        mode = Some(mode.map_or(next, |m| m.max(next)));
    }
    Ok(mode)
}

/// A filename argument is either absent or separated from the command by
/// blanks.
pub fn parse_filename(args: &str) -> EdResult<Option<&str>> {
    if args.is_empty() {
        return Ok(None);
    }
    if !args.starts_with([' ', '\t']) {
        return Err(EdError::InvalidSuffix);
    }
    let name = args.trim();
    Ok((!name.is_empty()).then_some(name))
}

/// A single-character argument, as taken by `k`.
pub fn parse_char(args: &str) -> EdResult<char> {
    let mut chars = args.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(EdError::InvalidSuffix),
    }
}

pub fn no_address(addr: &Address) -> EdResult<()> {
    if addr.is_explicit() {
        Err(EdError::InvalidAddress)
    } else {
        Ok(())
    }
}

/// Render a line for `l`: escapes for backslash, `$` and control bytes,
/// octal for anything outside printable ASCII, and a `$` at the end.
pub fn escape_unambiguous(text: &[u8]) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    for &b in body(text) {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'$' => out.push_str("\\$"),
            0x07 => out.push_str("\\a"),
            0x08 => out.push_str("\\b"),
            0x0c => out.push_str("\\f"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x0b => out.push_str("\\v"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
    out.push('$');
    out
}
