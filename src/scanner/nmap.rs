use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
use lazy_static::lazy_static;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use super::results::{HostResult, PortResult, PortState, ScanResult};
use super::{ScanError, ScanOutcome, ScanRequest, Scanner};

lazy_static! {
    // Host: 192.168.1.1 (router.lan)\t<fields...>
    static ref HOST_LINE: Regex = Regex::new(r"^Host:\s+(\S+)\s+\(([^)]*)\)\s*(.*)$").unwrap();
    // port/state/protocol/owner/service/rpc_info/version/
    static ref PORT_RECORD: Regex =
        Regex::new(r"^(\d+)/([^/,]*)/([^/,]*)/([^/,]*)/([^/,]*)/([^/,]*)/([^/]*)/").unwrap();
}

/// Drives a locally installed `nmap` binary and reads its greppable output.
pub struct NmapScanner {
    program: PathBuf,
}

impl Default for NmapScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl NmapScanner {
    pub fn new() -> Self {
        Self::with_program("nmap")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    fn build_args(&self, request: &ScanRequest) -> Vec<String> {
        let mut args = vec![
            "-oG".to_string(),
            "-".to_string(),
            "--host-timeout".to_string(),
            format!("{}s", request.deadline.as_secs().max(1)),
        ];
        if !request.ports.is_empty() {
            args.push("-p".to_string());
            args.push(request.ports.join(","));
        }
        args.extend(request.targets.iter().cloned());
        args
    }
}

#[async_trait]
impl Scanner for NmapScanner {
    fn name(&self) -> &str {
        "Nmap"
    }

    async fn scan(&self, request: &ScanRequest) -> Result<ScanOutcome, ScanError> {
        let args = self.build_args(request);
        debug!(program = %self.program.display(), ?args, "launching scan engine");

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ScanError::Start {
                program: self.program.display().to_string(),
                source,
            })?;

        let spinner = ProgressBar::new_spinner().with_finish(ProgressFinish::AndClear);
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("⟦{spinner:.bright_magenta}⟧ [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("scanning {} targets", request.targets.len()));
        spinner.enable_steady_tick(Duration::from_millis(120));

        let output = child.wait_with_output().await;
        spinner.finish_and_clear();
        let output = output?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(ScanError::Engine {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let result = parse_greppable(&String::from_utf8_lossy(&output.stdout));
        debug!(hosts = result.hosts.len(), ports = result.total_ports(), "scan engine finished");

        Ok(ScanOutcome {
            result,
            warnings: collect_warnings(&stderr),
        })
    }
}

/// Parses `nmap -oG` output. A host may span several lines (status, ports);
/// they are merged by address in first-seen order.
pub fn parse_greppable(text: &str) -> ScanResult {
    let mut hosts: Vec<HostResult> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for line in text.lines() {
        let Some(caps) = HOST_LINE.captures(line) else {
            continue;
        };
        let address = caps[1].to_string();
        let hostname = caps[2].trim().to_string();
        let fields = caps.get(3).map_or("", |m| m.as_str());

        let mut ports = Vec::new();
        let mut down = false;
        for field in fields.split('\t') {
            let field = field.trim();
            if let Some(status) = field.strip_prefix("Status:") {
                down = status.trim().eq_ignore_ascii_case("down");
            } else if let Some(records) = field.strip_prefix("Ports:") {
                ports.extend(parse_port_records(records));
            }
        }

        if down {
            debug!(host = %address, "host reported down");
            continue;
        }

        let slot = *index.entry(address.clone()).or_insert_with(|| {
            hosts.push(HostResult {
                addresses: vec![address.clone()],
                ..HostResult::default()
            });
            hosts.len() - 1
        });
        let host = &mut hosts[slot];
        if !hostname.is_empty() && !host.hostnames.contains(&hostname) {
            host.hostnames.push(hostname);
        }
        host.ports.extend(ports);
    }

    ScanResult { hosts }
}

fn parse_port_records(records: &str) -> Vec<PortResult> {
    let mut ports = Vec::new();
    for record in records.split(", ") {
        let record = record.trim();
        if record.is_empty() {
            continue;
        }
        let Some(caps) = PORT_RECORD.captures(record) else {
            warn!(record, "unrecognised port record in engine output");
            continue;
        };
        let Ok(id) = caps[1].parse::<u16>() else {
            warn!(record, "port number out of range in engine output");
            continue;
        };
        ports.push(PortResult {
            id,
            protocol: caps[3].to_string(),
            state: PortState::from(&caps[2]),
            service: caps[5].to_string(),
        });
    }
    ports
}

fn collect_warnings(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.to_ascii_lowercase().starts_with("warning:"))
        .map(str::to_string)
        .collect()
}
