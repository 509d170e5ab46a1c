use crate::error::EdResult;
use std::io::{BufRead, Write};
use tracing::debug;

/// What a load produced, before any of it touches a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub lines: Vec<Vec<u8>>,
    pub bytes: usize,
    /// The input's last line had no newline and one was supplied.
    pub newline_appended: bool,
}

/// Read every line of `reader` as raw bytes. Each returned line ends with
/// `\n`. The byte count is of the input as read, so a supplied newline is
/// not counted.
pub fn read_lines<R: BufRead>(mut reader: R) -> EdResult<LoadReport> {
    let mut report = LoadReport::default();
    loop {
        let mut buf = Vec::new();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        report.bytes += n;
        if buf.last() != Some(&b'\n') {
            buf.push(b'\n');
            report.newline_appended = true;
        }
        report.lines.push(buf);
    }
    debug!(lines = report.lines.len(), bytes = report.bytes, "read");
    Ok(report)
}

/// Write line texts verbatim and return the number of bytes written.
pub fn write_lines<'a, W, I>(mut writer: W, lines: I) -> EdResult<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut bytes = 0;
    for line in lines {
        writer.write_all(line)?;
        bytes += line.len();
    }
    writer.flush()?;
    debug!(bytes, "wrote");
    Ok(bytes)
}
