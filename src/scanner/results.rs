use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub hosts: Vec<HostResult>,
}

impl ScanResult {
    pub fn total_ports(&self) -> usize {
        self.hosts.iter().map(|h| h.ports.len()).sum()
    }

    pub fn open_ports(&self) -> usize {
        self.hosts
            .iter()
            .flat_map(|h| h.ports.iter())
            .filter(|p| p.state == PortState::Open)
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostResult {
    pub addresses: Vec<String>,
    pub hostnames: Vec<String>,
    pub ports: Vec<PortResult>,
}

impl HostResult {
    pub fn primary_address(&self) -> Option<&str> {
        self.addresses.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortResult {
    pub id: u16,
    pub protocol: String,
    pub state: PortState,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortState {
    Open,
    Closed,
    Filtered,
    Unfiltered,
    OpenFiltered,
    ClosedFiltered,
    Other(String),
}

impl From<&str> for PortState {
    fn from(s: &str) -> Self {
        match s.trim() {
            "open" => PortState::Open,
            "closed" => PortState::Closed,
            "filtered" => PortState::Filtered,
            "unfiltered" => PortState::Unfiltered,
            "open|filtered" => PortState::OpenFiltered,
            "closed|filtered" => PortState::ClosedFiltered,
            other => PortState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortState::Open => write!(f, "open"),
            PortState::Closed => write!(f, "closed"),
            PortState::Filtered => write!(f, "filtered"),
            PortState::Unfiltered => write!(f, "unfiltered"),
            PortState::OpenFiltered => write!(f, "open|filtered"),
            PortState::ClosedFiltered => write!(f, "closed|filtered"),
            PortState::Other(state) => write!(f, "{}", state),
        }
    }
}
