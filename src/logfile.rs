use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use chrono::Local;

pub const DEFAULT_LOG_FILE: &str = "scan_results.txt";

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Append-only, timestamped record of a run.
///
/// Owns its writer; the file is flushed and closed when the log is dropped.
pub struct ResultLog<W: Write = BufWriter<File>> {
    writer: W,
}

impl ResultLog {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self { writer: BufWriter::new(file) })
    }
}

impl<W: Write> ResultLog<W> {
    pub fn from_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one line prefixed with the local time. Empty text writes a bare timestamp.
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        let stamp = Local::now().format(TIMESTAMP_FORMAT);
        if text.is_empty() {
            writeln!(self.writer, "{}", stamp)
        } else {
            writeln!(self.writer, "{} {}", stamp, text)
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
