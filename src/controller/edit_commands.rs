use super::Session;
use super::command::{PrintMode, no_address, parse_char, parse_suffix};
use crate::address::Address;
use crate::document_model::LineId;
use crate::error::{EdError, EdResult};
use crate::search::{scan_delimited, unescape_delimiter};
use std::io::{BufRead, Write};
use tracing::debug;

impl<R: BufRead, W: Write> Session<R, W> {
    /// Print the current line if the command carried a print suffix.
    pub(super) fn finish(&mut self, suffix: Option<PrintMode>) -> EdResult<()> {
        match suffix {
            Some(mode) => {
                let current = self.editor.current();
                self.print_lines(current, current, mode)
            }
            None => Ok(()),
        }
    }

    pub(super) fn append_text(&mut self, addr: Address, args: &str) -> EdResult<()> {
        let suffix = parse_suffix(args)?;
        let lines = self.read_text()?;
        self.editor.append(addr.to, lines);
        self.finish(suffix)
    }

    pub(super) fn insert_text(&mut self, addr: Address, args: &str) -> EdResult<()> {
        let suffix = parse_suffix(args)?;
        let lines = self.read_text()?;
        self.editor.insert(addr.to, lines);
        self.finish(suffix)
    }

    pub(super) fn change_text(&mut self, addr: Address, args: &str) -> EdResult<()> {
        let suffix = parse_suffix(args)?;
        // Check the range before swallowing the user's text.
        self.editor.lines(addr.from, addr.to)?;
        let lines = self.read_text()?;
        self.editor.change(addr.from, addr.to, lines)?;
        self.finish(suffix)
    }

    pub(super) fn delete_lines(&mut self, addr: Address, args: &str) -> EdResult<()> {
        let suffix = parse_suffix(args)?;
        self.editor.delete(addr.from, addr.to)?;
        self.finish(suffix)
    }

    fn destination<'a>(&mut self, args: &'a str) -> EdResult<(LineId, &'a str)> {
        let (dest, rest) = self.editor.resolve(args)?;
        Ok((dest.to, rest))
    }

    pub(super) fn move_lines(&mut self, addr: Address, args: &str) -> EdResult<()> {
        let (dest, rest) = self.destination(args)?;
        let suffix = parse_suffix(rest)?;
        self.editor.move_lines(addr.from, addr.to, dest)?;
        self.finish(suffix)
    }

    pub(super) fn transfer_lines(&mut self, addr: Address, args: &str) -> EdResult<()> {
        let (dest, rest) = self.destination(args)?;
        let suffix = parse_suffix(rest)?;
        self.editor.transfer(addr.from, addr.to, dest)?;
        self.finish(suffix)
    }

    /// `j` without an address joins the current line with the next one.
    pub(super) fn join_lines(&mut self, addr: Address, args: &str) -> EdResult<()> {
        let suffix = parse_suffix(args)?;
        let (from, to) = if addr.is_explicit() {
            (addr.from, addr.to)
        } else {
            let doc = self.editor.document();
            let next = doc.next(addr.from);
            if next == doc.tail() {
                return Err(EdError::InvalidAddress);
            }
            (addr.from, next)
        };
        self.editor.join(from, to)?;
        self.finish(suffix)
    }

    pub(super) fn substitute(&mut self, addr: Address, args: &str, global: bool) -> EdResult<()> {
        let sub = self.editor.search_mut().parse_substitute(args)?;
        match self.editor.substitute(addr.from, addr.to, &sub) {
            Ok(_) => {}
            // Inside g, lines the substitution misses are simply skipped.
            Err(EdError::NoMatch) if global => return Ok(()),
            Err(err) => return Err(err),
        }
        self.finish(sub.print.and_then(PrintMode::from_char))
    }

    /// `g/re/cmds` and `v/re/cmds`. Matching lines are picked first, then
    /// the command list runs once per line that is still in the document.
    /// Everything the list changes undoes as one step.
    pub(super) fn global(&mut self, addr: Address, args: &str, invert: bool) -> EdResult<()> {
        if self.editor.in_global() {
            return Err(EdError::NestedGlobal);
        }
        let mut chars = args.chars();
        let delim = match chars.next() {
            Some(c) if c != ' ' && c != '\n' && c != '\\' => c,
            _ => return Err(EdError::Unterminated("global pattern")),
        };
        let (raw, rest, closed) = scan_delimited(chars.as_str(), delim);
        if !closed {
            return Err(EdError::Unterminated("global pattern"));
        }
        let pattern = unescape_delimiter(raw, delim);

        let mut list = rest.to_string();
        while list.ends_with('\\') {
            list.pop();
            list.push('\n');
            let more = self.read_line()?.ok_or(EdError::UnexpectedEof)?;
            list.push_str(&more);
        }
        let commands: Vec<String> = if list.trim().is_empty() {
            vec!["p".to_string()]
        } else {
            list.split('\n').map(str::to_string).collect()
        };

        let (from, to) = if addr.is_explicit() {
            (addr.from, addr.to)
        } else {
            let doc = self.editor.document();
            (doc.first(), doc.last())
        };
        let targets = self.editor.select(from, to, &pattern, invert)?;
        debug!(matched = targets.len(), invert, "global");

        self.editor.begin_global()?;
        let result = self.run_global(&targets, &commands);
        self.editor.end_global();
        result
    }

    fn run_global(&mut self, targets: &[LineId], commands: &[String]) -> EdResult<()> {
        for &line in targets {
            if !self.editor.is_live(line) {
                continue;
            }
            self.editor.set_current(line);
            for command in commands {
                let command = if command.is_empty() { "p" } else { command.as_str() };
                self.dispatch(command, true)?;
            }
        }
        Ok(())
    }

    pub(super) fn mark_line(&mut self, addr: Address, args: &str) -> EdResult<()> {
        let name = parse_char(args)?;
        self.editor.mark(name, addr.to)
    }

    pub(super) fn yank_lines(&mut self, addr: Address, args: &str) -> EdResult<()> {
        let suffix = parse_suffix(args)?;
        self.editor.yank(addr.from, addr.to)?;
        self.finish(suffix)
    }

    pub(super) fn paste_lines(&mut self, addr: Address, args: &str) -> EdResult<()> {
        let suffix = parse_suffix(args)?;
        self.editor.paste(addr.to)?;
        self.finish(suffix)
    }

    pub(super) fn undo(&mut self, addr: Address, args: &str) -> EdResult<()> {
        no_address(&addr)?;
        let suffix = parse_suffix(args)?;
        let tag = self.editor.undo()?;
        debug!(%tag, "undo command");
        self.finish(suffix)
    }

    pub(super) fn redo(&mut self, addr: Address, args: &str) -> EdResult<()> {
        no_address(&addr)?;
        let suffix = parse_suffix(args)?;
        let tag = self.editor.redo()?;
        debug!(%tag, "redo command");
        self.finish(suffix)
    }
}
