//! Address expressions.
//!
//! Turns the address prefix of a command line into a pair of line handles.
//! Resolution only reads the document. Line 0 (the head sentinel) is a
//! legal result; commands that need a real line reject it themselves.

use crate::document_model::{Document, LineId, MarkLookup};
use crate::error::{EdError, EdResult};
use crate::search::{scan_delimited, unescape_delimiter};

/// The regex primitive the resolver runs `/re/` and `?re?` through.
/// An empty pattern means "the previous pattern".
pub trait LineMatcher {
    fn matches(&mut self, text: &[u8], pattern: &str) -> EdResult<bool>;
}

/// A resolved range. `count` is how many addresses the user actually gave
/// (0, 1 or 2); zero means both ends defaulted to the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    pub from: LineId,
    pub to: LineId,
    pub count: usize,
}

impl Address {
    pub fn is_explicit(&self) -> bool {
        self.count > 0
    }
}

/// Resolve the address prefix of `input`. Returns the range and whatever
/// of `input` follows the address.
pub fn resolve<'a, M, L>(
    input: &'a str,
    doc: &Document,
    marks: &M,
    matcher: &mut L,
) -> EdResult<(Address, &'a str)>
where
    M: MarkLookup + ?Sized,
    L: LineMatcher + ?Sized,
{
    let mut resolver = Resolver {
        input,
        pos: 0,
        doc,
        marks,
        matcher,
        base: doc.current(),
    };
    let address = resolver.range()?;
    Ok((address, &input[resolver.pos..]))
}

struct Resolver<'a, 'd, M: ?Sized, L: ?Sized> {
    input: &'a str,
    pos: usize,
    doc: &'d Document,
    marks: &'d M,
    matcher: &'d mut L,
    /// What `.` and bare offsets refer to. Starts at the current line and
    /// moves when `;` is seen.
    base: LineId,
}

impl<M, L> Resolver<'_, '_, M, L>
where
    M: MarkLookup + ?Sized,
    L: LineMatcher + ?Sized,
{
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.pos += 1;
        }
    }

    fn first_line(&self) -> LineId {
        if self.doc.is_empty() {
            self.doc.head()
        } else {
            self.doc.first()
        }
    }

    fn range(&mut self) -> EdResult<Address> {
        let mut from = None;
        let mut to = None;
        let mut separated = false;
        let mut count = 0;

        loop {
            let term = self.term()?;
            self.skip_blanks();
            match self.peek() {
                Some(',') => {
                    self.bump();
                    from = Some(term.unwrap_or_else(|| self.first_line()));
                    to = None;
                    separated = true;
                    count = 2;
                }
                Some(';') => {
                    self.bump();
                    let left = term.unwrap_or(self.base);
                    self.base = left;
                    from = Some(left);
                    to = None;
                    separated = true;
                    count = 2;
                }
                _ => {
                    if let Some(line) = term {
                        if separated {
                            to = Some(line);
                        } else {
                            from = Some(line);
                            to = Some(line);
                            count = 1;
                        }
                    }
                    break;
                }
            }
        }

        let current = self.doc.current();
        let from = from.unwrap_or(current);
        let to = match to {
            Some(line) => line,
            None if separated => self.doc.last(),
            None => from,
        };

        // A single line is checked without numbering it.
        if from == to {
            if from == self.doc.tail() || !self.doc.is_attached(from) {
                return Err(EdError::InvalidAddress);
            }
            return Ok(Address { from, to, count });
        }
        let from_index = self.ordinal(from)?;
        let to_index = self.ordinal(to)?;
        if to_index < from_index {
            return Err(EdError::AddressOrder {
                from: from_index,
                to: to_index,
            });
        }
        Ok(Address { from, to, count })
    }

    /// One address term: an optional base followed by any number of
    /// `+N`/`-N` offsets.
    fn term(&mut self) -> EdResult<Option<LineId>> {
        self.skip_blanks();
        let mut line = match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                let n = self.number()?;
                Some(self.doc.at(n).ok_or(EdError::AddressOutOfRange)?)
            }
            Some('.') => {
                self.bump();
                Some(self.base)
            }
            Some('$') => {
                self.bump();
                Some(self.doc.last())
            }
            Some(delim @ ('/' | '?')) => {
                self.bump();
                Some(self.search(delim)?)
            }
            Some('\'') => {
                self.bump();
                let mark = self.bump().ok_or(EdError::InvalidAddress)?;
                let id = self.marks.lookup(mark).ok_or(EdError::UnsetMark(mark))?;
                if !self.doc.is_attached(id) {
                    return Err(EdError::UnsetMark(mark));
                }
                Some(id)
            }
            _ => None,
        };

        loop {
            self.skip_blanks();
            let forward = match self.peek() {
                Some('+') => true,
                Some('-' | '^') => false,
                Some(c) if c.is_ascii_digit() && line.is_some() => {
                    // "5 2" means "5+2"
                    let n = self.number()?;
                    line = Some(self.offset(line.unwrap_or(self.base), n, true)?);
                    continue;
                }
                _ => break,
            };
            self.bump();
            let n = match self.peek() {
                Some(c) if c.is_ascii_digit() => self.number()?,
                _ => 1,
            };
            line = Some(self.offset(line.unwrap_or(self.base), n, forward)?);
        }
        Ok(line)
    }

    fn number(&mut self) -> EdResult<usize> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| EdError::AddressOutOfRange)
    }

    fn offset(&self, from: LineId, n: usize, forward: bool) -> EdResult<LineId> {
        let index = self.ordinal(from)?;
        let target = if forward {
            index.checked_add(n)
        } else {
            index.checked_sub(n)
        }
        .ok_or(EdError::AddressOutOfRange)?;
        self.doc.at(target).ok_or(EdError::AddressOutOfRange)
    }

    /// `/re/` picks the first matching line of the document, `?re?` the
    /// last. The closing delimiter may be left off at the end of input.
    fn search(&mut self, delim: char) -> EdResult<LineId> {
        let (raw, rest, _) = scan_delimited(&self.input[self.pos..], delim);
        let pattern = unescape_delimiter(raw, delim);
        self.pos = self.input.len() - rest.len();

        let mut found = None;
        for id in self.doc.iter() {
            if self.matcher.matches(self.doc.text(id), &pattern)? {
                found = Some(id);
                if delim == '/' {
                    break;
                }
            }
        }
        // An empty document still validates the pattern.
        if self.doc.is_empty() {
            self.matcher.matches(b"", &pattern)?;
        }
        found.ok_or(EdError::NoMatch)
    }

    fn ordinal(&self, id: LineId) -> EdResult<usize> {
        self.doc.ordinal(id).ok_or(EdError::InvalidAddress)
    }
}
