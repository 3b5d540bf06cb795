use std::io::{self, Write};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::network::{collect_hosts, resolve_targets, ResolvedTarget, TargetError};
use crate::output::Reporter;
use crate::ports::count_ports;
use crate::scanner::{scan_with_deadline, ScanError, ScanRequest, Scanner};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no scan targets remain after resolving the configuration")]
    NoTargets,
    #[error("failed to run scan: {0}")]
    Scan(#[from] ScanError),
    #[error("failed to write scan output: {0}")]
    Report(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub targets: usize,
    pub skipped_entries: usize,
    pub warnings: usize,
    pub hosts_reported: usize,
    pub ports_reported: usize,
    pub open_ports: usize,
}

/// Resolves the configured targets, runs one bounded scan and reports the results.
///
/// Bad CIDR entries are reported and skipped. Scan failures, including deadline
/// expiry, end the run without partial output.
pub async fn run<C: Write, L: Write>(
    config: &Config,
    scanner: &dyn Scanner,
    reporter: &mut Reporter<C, L>,
    deadline: Duration,
) -> Result<RunSummary, PipelineError> {
    let mut summary = RunSummary::default();

    reporter.progress("Loading and processing targets...")?;
    let resolved = resolve_targets(&config.targets);
    for target in &resolved {
        match target {
            ResolvedTarget::Expanded { cidr, .. } => {
                reporter.progress(&format!("Expanding CIDR range: {}", cidr))?;
            }
            ResolvedTarget::Skipped { entry, error } => {
                summary.skipped_entries += 1;
                let message = match error {
                    TargetError::Empty => "Skipping empty target entry".to_string(),
                    TargetError::Cidr(e) => format!("Failed to expand CIDR {}: {}", entry, e),
                };
                warn!(entry = entry.as_str(), "{}", message);
                reporter.warn(&message)?;
            }
            ResolvedTarget::Literal(_) => {}
        }
    }

    let targets = collect_hosts(&resolved);
    if targets.is_empty() {
        return Err(PipelineError::NoTargets);
    }
    summary.targets = targets.len();

    reporter.blank()?;
    reporter.progress("Scan configuration:")?;
    reporter.progress(&format!("Total targets to scan: {}", targets.len()))?;
    reporter.progress(&format!("Ports to scan: {}", config.ports.join(", ")))?;
    match count_ports(&config.ports) {
        Ok(port_count) => {
            debug!(port_count, targets = summary.targets, "scan size");
        }
        Err(e) => {
            let message = format!("Port list may be rejected by the scan engine: {}", e);
            warn!("{}", message);
            reporter.warn(&message)?;
            summary.warnings += 1;
        }
    }
    reporter.blank()?;
    reporter.progress("Initiating scan...")?;
    reporter.progress(&format!(
        "Starting {} scan (timeout: {} seconds)...",
        scanner.name(),
        deadline.as_secs()
    ))?;
    reporter.blank()?;

    let request = ScanRequest {
        targets,
        ports: config.ports.clone(),
        deadline,
    };
    let outcome = scan_with_deadline(scanner, &request).await?;
    debug!(
        hosts = outcome.result.hosts.len(),
        ports = outcome.result.total_ports(),
        open = outcome.result.open_ports(),
        "scan engine returned"
    );

    if !outcome.warnings.is_empty() {
        summary.warnings += outcome.warnings.len();
        reporter.warn(&format!("Warnings: {}", outcome.warnings.join("; ")))?;
    }

    let report = reporter.report(&outcome.result)?;
    summary.hosts_reported = report.hosts;
    summary.ports_reported = report.ports;
    summary.open_ports = report.open_ports;

    info!(
        targets = summary.targets,
        hosts = summary.hosts_reported,
        open = summary.open_ports,
        "scan run complete"
    );
    Ok(summary)
}
