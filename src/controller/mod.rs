/// Controller subsystem - the command loop
///
/// Reads command lines, resolves their addresses, dispatches on the command
/// letter and reports failures the way ed does: a `?`, with the reason on
/// request. Command handlers are split by concern across the submodules.

pub mod command;
mod edit_commands;
mod file_commands;
mod print_commands;

pub use command::PrintMode;

use crate::config::RcConfig;
use crate::document_model::terminated;
use crate::editor::Editor;
use crate::error::{EdError, EdResult};
use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct Session<R, W> {
    editor: Editor,
    input: R,
    output: W,
    config: RcConfig,
    filename: Option<PathBuf>,
    last_error: Option<String>,
    last_shell: Option<String>,
    /// Command refused for unsaved changes by the previous command line.
    /// Repeating it straight away goes through.
    warned: Option<char>,
    armed: Option<char>,
    styled: bool,
    failed: bool,
    done: bool,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W, config: RcConfig) -> Self {
        Self {
            editor: Editor::new(),
            input,
            output,
            config,
            filename: None,
            last_error: None,
            last_shell: None,
            warned: None,
            armed: None,
            styled: false,
            failed: false,
            done: false,
        }
    }

    /// Highlight the error marker. Only worth doing on a terminal.
    pub fn with_styling(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Load the file named on the command line. A missing file is reported
    /// but still becomes the default filename.
    pub fn open_initial(&mut self, path: PathBuf) -> io::Result<()> {
        let name = path.to_string_lossy().into_owned();
        self.filename = Some(path);
        match self.load_named(&name) {
            Ok(()) => Ok(()),
            Err(err) => self.report(err),
        }
    }

    /// Run commands until `q`/`Q` or end of input. Returns `false` if any
    /// command failed along the way.
    pub fn run(&mut self) -> io::Result<bool> {
        while !self.done {
            self.show_prompt()?;
            // End of input acts like `q`, so unsaved changes get one warning.
            let line = self.read_line()?.unwrap_or_else(|| "q".to_string());
            if let Err(err) = self.execute(&line) {
                self.report(err)?;
            }
        }
        self.output.flush()?;
        Ok(!self.failed)
    }

    /// Run one command line.
    pub fn execute(&mut self, line: &str) -> EdResult<()> {
        self.armed = self.warned.take();
        debug!(line, "command");
        self.dispatch(line, false)
    }

    fn dispatch(&mut self, line: &str, global: bool) -> EdResult<()> {
        let (addr, rest) = self.editor.resolve(line)?;
        let mut chars = rest.chars();
        let Some(cmd) = chars.next() else {
            return self.null_command(addr);
        };
        let args = chars.as_str();

        if global {
            match cmd {
                'g' | 'v' => return Err(EdError::NestedGlobal),
                'a' | 'i' | 'c' | 'u' | 'U' | 'e' | 'E' | 'q' | 'Q' => {
                    return Err(EdError::NotInGlobal);
                }
                _ => {}
            }
        }

        match cmd {
            'a' => self.append_text(addr, args),
            'i' => self.insert_text(addr, args),
            'c' => self.change_text(addr, args),
            'd' => self.delete_lines(addr, args),
            'm' => self.move_lines(addr, args),
            't' => self.transfer_lines(addr, args),
            'j' => self.join_lines(addr, args),
            's' => self.substitute(addr, args, global),
            'g' => self.global(addr, args, false),
            'v' => self.global(addr, args, true),
            'k' => self.mark_line(addr, args),
            'y' => self.yank_lines(addr, args),
            'x' => self.paste_lines(addr, args),
            'u' => self.undo(addr, args),
            'U' => self.redo(addr, args),
            'p' => self.print_range(addr, args, PrintMode::Plain),
            'n' => self.print_range(addr, args, PrintMode::Numbered),
            'l' => self.print_range(addr, args, PrintMode::Unambiguous),
            '=' => self.line_number(addr, args),
            'e' => self.edit(addr, args, false),
            'E' => self.edit(addr, args, true),
            'f' => self.set_filename(addr, args),
            'r' => self.read_file(addr, args),
            'w' => self.write_file(addr, args, false),
            'W' => self.write_file(addr, args, true),
            'q' => self.quit(addr, args, false),
            'Q' => self.quit(addr, args, true),
            'P' => self.toggle_prompt(addr, args),
            'h' => self.explain(addr, args),
            'H' => self.toggle_verbose(addr, args),
            '!' => self.shell(addr, args),
            '#' => Ok(()),
            other => Err(EdError::UnknownCommand(other)),
        }
    }

    fn report(&mut self, err: EdError) -> io::Result<()> {
        debug!(error = %err, "command failed");
        self.failed = true;
        if self.styled {
            writeln!(self.output, "{}", "?".bold().red())?;
        } else {
            writeln!(self.output, "?")?;
        }
        let message = err.to_string();
        if self.config.verbose {
            writeln!(self.output, "{message}")?;
        }
        self.last_error = Some(message);
        Ok(())
    }

    /// Refuse `cmd` once while the buffer has unsaved changes.
    fn guard_unsaved(&mut self, cmd: char, force: char) -> EdResult<()> {
        if self.editor.is_modified() && self.armed != Some(cmd) {
            self.warned = Some(cmd);
            return Err(EdError::UnsavedChanges(force));
        }
        Ok(())
    }

    fn show_prompt(&mut self) -> io::Result<()> {
        if self.config.show_prompt {
            write!(self.output, "{}", self.config.prompt)?;
            self.output.flush()?;
        }
        Ok(())
    }

    /// One command line. Commands are text; stray non-UTF-8 bytes in them
    /// are replaced rather than rejected.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Text for `a`, `i` and `c`: raw lines up to a lone `.` or end of input.
    fn read_text(&mut self) -> EdResult<Vec<Vec<u8>>> {
        let mut lines = Vec::new();
        loop {
            let mut buf = Vec::new();
            if self.input.read_until(b'\n', &mut buf)? == 0 || buf == b".\n" || buf == b"." {
                break;
            }
            lines.push(terminated(buf));
        }
        Ok(lines)
    }
}
