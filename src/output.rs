use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use colored::*;

use crate::logfile::ResultLog;
use crate::scanner::results::{HostResult, PortResult, PortState, ScanResult};

/// Counts of what a report actually printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub hosts: usize,
    pub ports: usize,
    pub open_ports: usize,
}

/// Writes run output to the console (colorized) and mirrors every line, uncolored,
/// into the result log.
pub struct Reporter<C: Write, L: Write> {
    console: C,
    log: ResultLog<L>,
}

impl Reporter<Stdout, BufWriter<File>> {
    pub fn stdout(log: ResultLog) -> Self {
        Self::new(io::stdout(), log)
    }
}

impl<C: Write, L: Write> Reporter<C, L> {
    pub fn new(console: C, log: ResultLog<L>) -> Self {
        Self { console, log }
    }

    pub fn progress(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.console, "{}", message)?;
        self.log.line(message)
    }

    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.console)?;
        self.log.line("")
    }

    pub fn warn(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.console, "{}", message.yellow())?;
        self.log.line(message)
    }

    /// Records a fatal condition in the log. The console side is left to the caller,
    /// which reports it on stderr.
    pub fn fatal(&mut self, message: &str) -> io::Result<()> {
        self.log.line(&format!("Fatal: {}", message))?;
        self.log.flush()
    }

    /// Prints one block per host that has an address: `Host: <addr>`, then one line
    /// per port, then a blank line.
    pub fn report(&mut self, result: &ScanResult) -> io::Result<ReportSummary> {
        let mut summary = ReportSummary::default();

        for host in &result.hosts {
            if self.host(host)? {
                summary.hosts += 1;
                summary.ports += host.ports.len();
                summary.open_ports +=
                    host.ports.iter().filter(|p| p.state == PortState::Open).count();
            }
        }

        self.console.flush()?;
        self.log.flush()?;
        Ok(summary)
    }

    fn host(&mut self, host: &HostResult) -> io::Result<bool> {
        let Some(address) = host.primary_address() else {
            return Ok(false);
        };

        self.progress(&format!("Host: {}", address))?;
        for port in &host.ports {
            let line = format_port_line(port);
            writeln!(self.console, "{}", colorize(&port.state, &line))?;
            self.log.line(&line)?;
        }
        self.blank()?;
        Ok(true)
    }

    pub fn into_parts(self) -> (C, ResultLog<L>) {
        (self.console, self.log)
    }
}

pub fn format_port_line(port: &PortResult) -> String {
    format!("  Port {}/{}: {} ({})", port.id, port.protocol, port.state, port.service)
}

/// Open is green, closed is red, every other state is yellow.
pub fn colorize(state: &PortState, line: &str) -> ColoredString {
    match state {
        PortState::Open => line.green(),
        PortState::Closed => line.red(),
        _ => line.yellow(),
    }
}
