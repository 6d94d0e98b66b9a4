//! Line-oriented telemetry transport
//!
//! The real console writes the telemetry line to its USB serial port; here the
//! line goes to any `Write` (stdout, a file, a pseudo-terminal).

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{self, Write};
use tracing::info;

use super::TelemetrySink;

/// Writes each telemetry line followed by a newline
pub struct LineSink<W: Write> {
    writer: W,
    lines_sent: u64,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines_sent: 0,
        }
    }

    pub fn lines_sent(&self) -> u64 {
        self.lines_sent
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for LineSink<W> {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        self.lines_sent += 1;
        Ok(())
    }
}

/// Open the telemetry output named in the config: `stdout`, `off`, or a file path
pub fn open_telemetry(target: &str) -> Result<LineSink<Box<dyn Write + Send>>> {
    let writer: Box<dyn Write + Send> = match target {
        "stdout" | "-" => Box::new(io::stdout()),
        "off" | "none" => Box::new(io::sink()),
        path => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open telemetry output: {}", path))?;
            info!("Telemetry written to {}", path);
            Box::new(file)
        }
    };
    Ok(LineSink::new(writer))
}
