use super::Session;
use super::command::{PrintMode, escape_unambiguous, no_address, parse_suffix};
use crate::address::Address;
use crate::document_model::LineId;
use crate::error::{EdError, EdResult};
use std::io::{BufRead, Write};

impl<R: BufRead, W: Write> Session<R, W> {
    /// Write `from..=to` and leave the current line on `to`.
    pub(super) fn print_lines(&mut self, from: LineId, to: LineId, mode: PrintMode) -> EdResult<()> {
        let lines = self.editor.lines(from, to)?;
        let doc = self.editor.document();
        let mut number = match mode {
            PrintMode::Numbered => doc.index_of(from).unwrap_or(0),
            _ => 0,
        };
        for id in lines {
            let text = doc.text(id);
            match mode {
                PrintMode::Plain => self.output.write_all(text)?,
                PrintMode::Numbered => {
                    write!(self.output, "{number}\t")?;
                    self.output.write_all(text)?;
                }
                PrintMode::Unambiguous => writeln!(self.output, "{}", escape_unambiguous(text))?,
            }
            number += 1;
        }
        self.editor.set_current(to);
        Ok(())
    }

    pub(super) fn print_range(&mut self, addr: Address, args: &str, mode: PrintMode) -> EdResult<()> {
        let mode = parse_suffix(args)?.map_or(mode, |suffix| suffix.max(mode));
        self.print_lines(addr.from, addr.to, mode)
    }

    /// A bare address prints that line; a bare newline prints the next one.
    pub(super) fn null_command(&mut self, addr: Address) -> EdResult<()> {
        let line = if addr.is_explicit() {
            addr.to
        } else {
            self.editor.document().next(self.editor.current())
        };
        self.print_lines(line, line, PrintMode::Plain)
    }

    /// `=` prints the addressed line number, defaulting to the last line.
    pub(super) fn line_number(&mut self, addr: Address, args: &str) -> EdResult<()> {
        let suffix = parse_suffix(args)?;
        let doc = self.editor.document();
        let line = if addr.is_explicit() { addr.to } else { doc.last() };
        let number = doc.ordinal(line).ok_or(EdError::InvalidAddress)?;
        writeln!(self.output, "{number}")?;
        self.finish(suffix)
    }

    /// `P` toggles the prompt; `P text` sets it and turns it on.
    pub(super) fn toggle_prompt(&mut self, addr: Address, args: &str) -> EdResult<()> {
        no_address(&addr)?;
        let prompt = args.trim();
        if prompt.is_empty() {
            self.config.show_prompt = !self.config.show_prompt;
        } else {
            self.config.prompt = prompt.to_string();
            self.config.show_prompt = true;
        }
        Ok(())
    }

    pub(super) fn explain(&mut self, addr: Address, args: &str) -> EdResult<()> {
        no_address(&addr)?;
        if !args.is_empty() {
            return Err(EdError::InvalidSuffix);
        }
        if let Some(message) = &self.last_error {
            writeln!(self.output, "{message}")?;
        }
        Ok(())
    }

    pub(super) fn toggle_verbose(&mut self, addr: Address, args: &str) -> EdResult<()> {
        no_address(&addr)?;
        if !args.is_empty() {
            return Err(EdError::InvalidSuffix);
        }
        self.config.verbose = !self.config.verbose;
        if self.config.verbose {
            if let Some(message) = &self.last_error {
                writeln!(self.output, "{message}")?;
            }
        }
        Ok(())
    }
}
