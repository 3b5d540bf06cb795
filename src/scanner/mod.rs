pub mod nmap;
pub mod results;

use std::io;
use std::time::Duration;
use async_trait::async_trait;
use thiserror::Error;

pub use nmap::NmapScanner;
pub use results::{HostResult, PortResult, PortState, ScanResult};

pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub targets: Vec<String>,
    pub ports: Vec<String>,
    pub deadline: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub result: ScanResult,
    /// Non-fatal diagnostics reported by the engine.
    pub warnings: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to start scan engine '{program}': {source}")]
    Start {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("scan engine exited with {status}: {stderr}")]
    Engine { status: String, stderr: String },
    #[error("scan did not finish within {} seconds", .0.as_secs())]
    Timeout(Duration),
    #[error("scan engine I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// An external engine that probes hosts and reports per-port state.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Human-readable engine name used in progress messages.
    fn name(&self) -> &str;

    async fn scan(&self, request: &ScanRequest) -> Result<ScanOutcome, ScanError>;
}

/// Runs a scan bounded by the request deadline. Expiry drops the in-flight
/// scan and yields `ScanError::Timeout`.
pub async fn scan_with_deadline(
    scanner: &dyn Scanner,
    request: &ScanRequest,
) -> Result<ScanOutcome, ScanError> {
    match tokio::time::timeout(request.deadline, scanner.scan(request)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ScanError::Timeout(request.deadline)),
    }
}
