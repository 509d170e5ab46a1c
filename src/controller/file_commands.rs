use super::Session;
use super::command::{no_address, parse_filename};
use crate::address::Address;
use crate::document_model::{LoadReport, read_lines, write_lines};
use crate::error::{EdError, EdResult};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;
use tracing::debug;

fn load_file(name: &str) -> EdResult<LoadReport> {
    let file = File::open(name)?;
    read_lines(BufReader::new(file))
}

fn run_shell(command: &str) -> EdResult<Output> {
    if command.trim().is_empty() {
        return Err(EdError::Shell("empty command".to_string()));
    }
    debug!(command, "shell");
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()?;
    Ok(output)
}

impl<R: BufRead, W: Write> Session<R, W> {
    /// Read `name` (or the output of `!command`) without touching the
    /// document.
    fn fetch(&mut self, name: &str) -> EdResult<LoadReport> {
        match name.strip_prefix('!') {
            Some(command) => {
                let command = self.expand_filename(command);
                let output = run_shell(&command)?;
                read_lines(Cursor::new(output.stdout))
            }
            None => load_file(name),
        }
    }

    fn default_filename(&self) -> EdResult<String> {
        self.filename
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned())
            .ok_or(EdError::NoFilename)
    }

    fn report_load(&mut self, report: &LoadReport) -> EdResult<()> {
        if !self.config.silent {
            writeln!(self.output, "{}", report.bytes)?;
            if report.newline_appended {
                writeln!(self.output, "newline appended")?;
            }
        }
        Ok(())
    }

    /// Replace the buffer with a file's contents.
    pub(super) fn load_named(&mut self, name: &str) -> EdResult<()> {
        let report = self.fetch(name)?;
        self.report_load(&report)?;
        self.editor.load(report.lines);
        debug!(name, "edit");
        Ok(())
    }

    pub(super) fn edit(&mut self, addr: Address, args: &str, force: bool) -> EdResult<()> {
        no_address(&addr)?;
        let target = parse_filename(args)?;
        if !force {
            self.guard_unsaved('e', 'E')?;
        }
        match target {
            Some(name) => {
                self.load_named(name)?;
                if !name.starts_with('!') {
                    self.filename = Some(PathBuf::from(name));
                }
            }
            None => {
                let name = self.default_filename()?;
                self.load_named(&name)?;
            }
        }
        Ok(())
    }

    pub(super) fn set_filename(&mut self, addr: Address, args: &str) -> EdResult<()> {
        no_address(&addr)?;
        if let Some(name) = parse_filename(args)? {
            if name.starts_with('!') {
                return Err(EdError::InvalidSuffix);
            }
            self.filename = Some(PathBuf::from(name));
        }
        let name = self.default_filename()?;
        writeln!(self.output, "{name}")?;
        Ok(())
    }

    /// `r`: read after the addressed line, the last line by default.
    pub(super) fn read_file(&mut self, addr: Address, args: &str) -> EdResult<()> {
        let after = if addr.is_explicit() {
            addr.to
        } else {
            self.editor.document().last()
        };
        let name = match parse_filename(args)? {
            Some(name) => name.to_string(),
            None => self.default_filename()?,
        };
        let report = self.fetch(&name)?;
        if self.filename.is_none() && !name.starts_with('!') {
            self.filename = Some(PathBuf::from(&name));
        }
        self.report_load(&report)?;
        self.editor.read_in(after, report.lines);
        Ok(())
    }

    /// `w`, `W` and `wq`. Writing the whole buffer to a file clears the
    /// modified flag.
    pub(super) fn write_file(&mut self, addr: Address, args: &str, append: bool) -> EdResult<()> {
        let (quit, args) = match args.strip_prefix('q') {
            Some(rest) if !append => (true, rest),
            _ => (false, args),
        };
        let name = match parse_filename(args)? {
            Some(name) => name.to_string(),
            None => self.default_filename()?,
        };

        let doc = self.editor.document();
        let whole = !addr.is_explicit() || (addr.from == doc.first() && addr.to == doc.last());
        let texts = if addr.is_explicit() {
            self.editor.texts(addr.from, addr.to)?
        } else {
            doc.contents()
        };

        let bytes = match name.strip_prefix('!') {
            Some(command) => {
                let command = self.expand_filename(command);
                self.pipe_to_shell(&command, &texts)?
            }
            None => {
                let file = if append {
                    OpenOptions::new().append(true).create(true).open(&name)?
                } else {
                    File::create(&name)?
                };
                let bytes = write_lines(BufWriter::new(file), texts.iter().map(Vec::as_slice))?;
                if self.filename.is_none() {
                    self.filename = Some(PathBuf::from(&name));
                }
                if whole {
                    self.editor.set_modified(false);
                }
                bytes
            }
        };
        debug!(name, bytes, "write");
        if !self.config.silent {
            writeln!(self.output, "{bytes}")?;
        }

        if quit {
            self.guard_unsaved('q', 'Q')?;
            self.done = true;
        }
        Ok(())
    }

    /// Feed `texts` to `command` and copy what it prints. The child's stdin
    /// is written from its own thread while stdout is drained here.
    fn pipe_to_shell(&mut self, command: &str, texts: &[Vec<u8>]) -> EdResult<usize> {
        debug!(command, "shell pipe");
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        let stdin = child.stdin.take();
        let (written, output) = thread::scope(|scope| {
            let feeder = scope.spawn(move || match stdin {
                Some(stdin) => write_lines(stdin, texts.iter().map(Vec::as_slice)),
                None => Ok(0),
            });
            let output = child.wait_with_output();
            (feeder.join(), output)
        });
        let output = output?;
        self.output.write_all(&output.stdout)?;

        let total: usize = texts.iter().map(Vec::len).sum();
        match written {
            Ok(Ok(bytes)) => Ok(bytes),
            // The command stopped reading early; everything was offered.
            Ok(Err(EdError::Io(err))) if err.kind() == io::ErrorKind::BrokenPipe => Ok(total),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(EdError::Shell("writer thread panicked".to_string())),
        }
    }

    pub(super) fn quit(&mut self, addr: Address, args: &str, force: bool) -> EdResult<()> {
        no_address(&addr)?;
        if !args.is_empty() {
            return Err(EdError::InvalidSuffix);
        }
        if !force {
            self.guard_unsaved('q', 'Q')?;
        }
        self.done = true;
        Ok(())
    }

    /// `!command`. `!!` repeats the previous command, with anything after
    /// it appended. An unescaped `%` stands for the current filename.
    pub(super) fn shell(&mut self, addr: Address, args: &str) -> EdResult<()> {
        no_address(&addr)?;
        let command = match args.strip_prefix('!') {
            Some(more) => {
                let last = self
                    .last_shell
                    .clone()
                    .ok_or_else(|| EdError::Shell("no previous command".to_string()))?;
                format!("{last}{more}")
            }
            None => self.expand_filename(args),
        };
        let output = run_shell(&command)?;
        self.output.write_all(&output.stdout)?;
        if !self.config.silent {
            writeln!(self.output, "!")?;
        }
        self.last_shell = Some(command);
        Ok(())
    }

    fn expand_filename(&self, command: &str) -> String {
        let filename = self
            .filename
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut out = String::with_capacity(command.len());
        let mut chars = command.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&'%') => {
                    out.push('%');
                    chars.next();
                }
                '%' => out.push_str(&filename),
                _ => out.push(c),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RcConfig;
    use crate::controller::Session;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn run_in(script: String) -> (bool, String) {
        let mut session = Session::new(Cursor::new(script.into_bytes()), Vec::new(), RcConfig::default());
        let clean = session.run().unwrap();
        (clean, String::from_utf8(session.into_output()).unwrap())
    }

    #[test]
    fn test_edit_substitute_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "a\nb\n").unwrap();

        let (clean, out) = run_in(format!("e {}\n,s/a/A/\nw\nq\n", path.display()));
        assert!(clean);
        assert_eq!(out, "4\n4\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "A\nb\n");
    }

    #[test]
    fn test_open_initial_and_wq() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("start.txt");
        fs::write(&path, "one\ntwo").unwrap();

        let mut session = Session::new(Cursor::new(b"$d\nwq\n".to_vec()), Vec::new(), RcConfig::default());
        session.open_initial(path.clone()).unwrap();
        assert_eq!(session.filename(), Some(path.as_path()));
        assert!(session.run().unwrap());
        let out = String::from_utf8(session.into_output()).unwrap();
        assert_eq!(out, "7\nnewline appended\n4\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\n");
    }

    #[test]
    fn test_missing_initial_file_keeps_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.txt");

        let mut session = Session::new(Cursor::new(b"a\nhello\n.\nw\nq\n".to_vec()), Vec::new(), RcConfig::default());
        session.open_initial(path.clone()).unwrap();
        session.run().unwrap();
        let out = String::from_utf8(session.into_output()).unwrap();
        assert_eq!(out, "?\n6\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_partial_write_keeps_modified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("part.txt");

        let script = format!("a\n1\n2\n.\n1w {}\nq\nQ\n", path.display());
        let (clean, out) = run_in(script);
        assert!(!clean);
        assert_eq!(out, "2\n?\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "1\n");
    }

    #[test]
    fn test_append_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "old\n").unwrap();

        let (_, out) = run_in(format!("a\nnew\n.\nW {}\nQ\n", path.display()));
        assert_eq!(out, "4\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn test_read_file_and_undo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("more.txt");
        fs::write(&path, "x\ny\n").unwrap();

        let script = format!("a\nfirst\n.\nr {}\n,p\nu\n,p\nQ\n", path.display());
        let (_, out) = run_in(script);
        assert_eq!(out, "4\nfirst\nx\ny\nfirst\n");
    }

    #[test]
    fn test_edit_refuses_unsaved_then_yields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.txt");
        fs::write(&path, "other\n").unwrap();

        let script = format!("a\nx\n.\ne {0}\ne {0}\n,p\nu\nq\n", path.display());
        let (_, out) = run_in(script);
        // history does not survive e
        assert_eq!(out, "?\n6\nother\n?\n");
    }

    #[test]
    fn test_filename_command() {
        let (_, out) = run_in("f\nf notes\nf\nQ\n".to_string());
        assert_eq!(out, "?\nnotes\nnotes\n");
    }

    #[test]
    fn test_write_without_filename() {
        let (_, out) = run_in("a\nx\n.\nH\nw\nQ\n".to_string());
        assert_eq!(out, "?\nno current filename\n");
    }

    #[test]
    fn test_shell_commands() {
        let (_, out) = run_in("!echo hi\n!!\nQ\n".to_string());
        assert_eq!(out, "hi\n!\nhi\n!\n");
    }

    #[test]
    fn test_read_command_output() {
        let (_, out) = run_in("r !echo hello\n,p\nQ\n".to_string());
        assert_eq!(out, "6\nhello\n");
    }

    #[test]
    fn test_write_to_command() {
        let (_, out) = run_in("a\nb\na\n.\nw !sort\nQ\n".to_string());
        assert_eq!(out, "a\nb\n4\n");
    }

    #[test]
    fn test_write_to_command_larger_than_a_pipe() {
        let lines: String = (0..20_000).map(|i| format!("line {i}\n")).collect();
        let script = format!("a\n{lines}.\nw !cat\nQ\n");
        let (_, out) = run_in(script);
        assert_eq!(out, format!("{lines}{}\n", lines.len()));
    }

    #[test]
    fn test_latin1_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("l1.txt");
        fs::write(&path, b"caf\xe9\nok\n").unwrap();

        let script = format!("e {}\n,p\n1s/caf/tea/\nw\nq\n", path.display());
        let mut session = Session::new(Cursor::new(script.into_bytes()), Vec::new(), RcConfig::default());
        assert!(session.run().unwrap());
        assert_eq!(session.into_output(), b"8\ncaf\xe9\nok\n8\n");
        assert_eq!(fs::read(&path).unwrap(), b"tea\xe9\nok\n");
    }
}
