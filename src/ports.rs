use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortSpecError {
    #[error("empty port specifier")]
    Empty,
    #[error("invalid port '{0}'")]
    InvalidPort(String),
    #[error("invalid port range '{0}': start must not exceed end")]
    InvertedRange(String),
    #[error("unknown protocol prefix in '{0}'")]
    UnknownProtocol(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortProtocol {
    Tcp,
    Udp,
    Sctp,
}

/// One token of a port specifier such as `22`, `8000-8100` or `U:53`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub protocol: Option<PortProtocol>,
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// A parsed specifier token. Service names and wildcards (`ssh`, `http*`) are
/// looked up by the scan engine, so they are kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortItem {
    Range(PortRange),
    Name {
        protocol: Option<PortProtocol>,
        pattern: String,
    },
}

impl PortItem {
    /// Ports covered by a numeric range; names count as zero.
    pub fn len(&self) -> usize {
        match self {
            PortItem::Range(range) => range.len(),
            PortItem::Name { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parses a comma-separated port specifier in the syntax nmap accepts for `-p`.
///
/// A `T:`/`U:`/`S:` prefix applies to the token it is on and every token after
/// it. Ranges may be open-ended (`-1024`, `1024-`, `-`) and wrapped in brackets.
pub fn parse_port_spec(spec: &str) -> Result<Vec<PortItem>, PortSpecError> {
    let mut items = Vec::new();
    let mut protocol = None;

    for token in spec.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let body = match token.split_once(':') {
            Some((prefix, body)) => {
                protocol = Some(match prefix.trim() {
                    "T" | "t" => PortProtocol::Tcp,
                    "U" | "u" => PortProtocol::Udp,
                    "S" | "s" => PortProtocol::Sctp,
                    _ => return Err(PortSpecError::UnknownProtocol(token.to_string())),
                });
                body.trim()
            }
            None => token,
        };

        let body = body
            .strip_prefix('[')
            .and_then(|b| b.strip_suffix(']'))
            .unwrap_or(body)
            .trim();

        if !body.is_empty() && body.chars().all(|c| c.is_ascii_digit() || c == '-') {
            items.push(PortItem::Range(parse_range(body, protocol, token)?));
        } else if is_service_pattern(body) {
            items.push(PortItem::Name { protocol, pattern: body.to_string() });
        } else {
            return Err(PortSpecError::InvalidPort(token.to_string()));
        }
    }

    if items.is_empty() {
        return Err(PortSpecError::Empty);
    }

    Ok(items)
}

fn parse_range(
    body: &str,
    protocol: Option<PortProtocol>,
    token: &str,
) -> Result<PortRange, PortSpecError> {
    let (start, end) = match body.split_once('-') {
        Some((start, end)) => {
            let start = if start.is_empty() { 1 } else { parse_port(start, token)? };
            let end = if end.is_empty() { u16::MAX } else { parse_port(end, token)? };
            (start, end)
        }
        None => {
            let port = parse_port(body, token)?;
            (port, port)
        }
    };

    if start > end {
        return Err(PortSpecError::InvertedRange(token.to_string()));
    }

    Ok(PortRange { protocol, start, end })
}

fn parse_port(text: &str, token: &str) -> Result<u16, PortSpecError> {
    text.parse::<u16>().map_err(|_| PortSpecError::InvalidPort(token.to_string()))
}

fn is_service_pattern(text: &str) -> bool {
    !text.is_empty()
        && text.chars().any(|c| c.is_ascii_alphabetic() || c == '*' || c == '?')
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '*' | '?'))
}

/// Total number of ports named numerically by a list of specifiers. Overlaps
/// count twice; service names are resolved by the engine and not counted.
pub fn count_ports<S: AsRef<str>>(specs: &[S]) -> Result<usize, PortSpecError> {
    let mut total = 0;
    for spec in specs {
        total += parse_port_spec(spec.as_ref())?.iter().map(PortItem::len).sum::<usize>();
    }
    Ok(total)
}
