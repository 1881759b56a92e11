//! Rule model: typed rule entries and their identity keys.
//!
//! Every keyed rule kind is a [`RuleEntry`] variant. The fields of a variant
//! are its identity: two entries that compare equal address the same rule
//! on a plane. Entries are normalized at construction so that the key used
//! for a presence query is exactly the key used for the following mutation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keyed rule kinds, in reconciliation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Service,
    Port,
    SourcePort,
    ForwardPort,
    RichRule,
    Source,
    Interface,
    IcmpBlock,
}

impl RuleKind {
    /// Option name as used in requests and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Port => "port",
            Self::SourcePort => "source_port",
            Self::ForwardPort => "forward_port",
            Self::RichRule => "rich_rule",
            Self::Source => "source",
            Self::Interface => "interface",
            Self::IcmpBlock => "icmp_block",
        }
    }

    /// Whether runtime additions of this kind accept a timeout.
    pub fn supports_timeout(&self) -> bool {
        !matches!(self, Self::Source | Self::Interface)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A port or port range with its protocol, e.g. `8080-8090/tcp`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortSpec {
    pub port: String,
    pub protocol: String,
}

impl PortSpec {
    pub fn new(port: impl Into<String>, protocol: impl Into<String>) -> Self {
        Self {
            port: port.into().trim().to_string(),
            protocol: protocol.into().trim().to_lowercase(),
        }
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

/// A forward port: source port/protocol plus optional destination port and address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForwardPortSpec {
    pub port: String,
    pub protocol: String,
    pub to_port: Option<String>,
    pub to_addr: Option<String>,
}

impl ForwardPortSpec {
    /// Build a forward port, mapping blank optional fields to `None`.
    pub fn new(
        port: impl Into<String>,
        protocol: impl Into<String>,
        to_port: Option<&str>,
        to_addr: Option<&str>,
    ) -> Self {
        Self {
            port: port.into().trim().to_string(),
            protocol: protocol.into().trim().to_lowercase(),
            to_port: non_blank(to_port),
            to_addr: non_blank(to_addr),
        }
    }
}

impl fmt::Display for ForwardPortSpec {
    /// Renders in the backend's own `port=..:proto=..:toport=..:toaddr=..` form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "port={}:proto={}:toport={}:toaddr={}",
            self.port,
            self.protocol,
            self.to_port.as_deref().unwrap_or_default(),
            self.to_addr.as_deref().unwrap_or_default()
        )
    }
}

/// A keyed rule entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RuleEntry {
    Service(String),
    Port(PortSpec),
    SourcePort(PortSpec),
    ForwardPort(ForwardPortSpec),
    /// Canonicalized rich rule string
    RichRule(String),
    Source(String),
    Interface(String),
    IcmpBlock(String),
}

impl RuleEntry {
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Service(_) => RuleKind::Service,
            Self::Port(_) => RuleKind::Port,
            Self::SourcePort(_) => RuleKind::SourcePort,
            Self::ForwardPort(_) => RuleKind::ForwardPort,
            Self::RichRule(_) => RuleKind::RichRule,
            Self::Source(_) => RuleKind::Source,
            Self::Interface(_) => RuleKind::Interface,
            Self::IcmpBlock(_) => RuleKind::IcmpBlock,
        }
    }

    /// The identity key rendered as the backend expects it.
    pub fn key(&self) -> String {
        match self {
            Self::Service(s)
            | Self::RichRule(s)
            | Self::Source(s)
            | Self::Interface(s)
            | Self::IcmpBlock(s) => s.clone(),
            Self::Port(p) | Self::SourcePort(p) => p.to_string(),
            Self::ForwardPort(fp) => fp.to_string(),
        }
    }
}

impl fmt::Display for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.key())
    }
}

/// Whole-zone boolean settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarToggle {
    Masquerade,
    IcmpBlockInversion,
}

impl ScalarToggle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Masquerade => "masquerade",
            Self::IcmpBlockInversion => "icmp_block_inversion",
        }
    }

    /// Whether runtime enabling of this toggle accepts a timeout.
    pub fn supports_timeout(&self) -> bool {
        matches!(self, Self::Masquerade)
    }
}

impl fmt::Display for ScalarToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zone-wide policy for otherwise unmatched traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ZoneTarget {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "ACCEPT", alias = "accept")]
    Accept,
    #[serde(rename = "DROP", alias = "drop")]
    Drop,
    #[serde(rename = "%%REJECT%%", alias = "REJECT", alias = "reject")]
    Reject,
}

impl ZoneTarget {
    /// Backend spelling of the target.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Accept => "ACCEPT",
            Self::Drop => "DROP",
            Self::Reject => "%%REJECT%%",
        }
    }
}

impl fmt::Display for ZoneTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEFAULT" => Ok(Self::Default),
            "ACCEPT" => Ok(Self::Accept),
            "DROP" => Ok(Self::Drop),
            "REJECT" | "%%REJECT%%" => Ok(Self::Reject),
            other => Err(format!(
                "invalid target '{other}', expected one of: default, ACCEPT, DROP, %%REJECT%%"
            )),
        }
    }
}

/// Split `port[-port]/protocol` on the last `/`.
///
/// ```
/// let spec = zonekit::parse_port("80-82/tcp").unwrap();
/// assert_eq!((spec.port.as_str(), spec.protocol.as_str()), ("80-82", "tcp"));
/// assert!(zonekit::parse_port("80").is_err());
/// ```
pub fn parse_port(item: &str) -> Result<PortSpec> {
    parse_port_as("port", item)
}

pub(crate) fn parse_port_as(kind: &'static str, item: &str) -> Result<PortSpec> {
    let (port, protocol) = item
        .rsplit_once('/')
        .ok_or_else(|| Error::format(kind, item, Some("missing protocol?")))?;
    if port.trim().is_empty() {
        return Err(Error::format(kind, item, Some("missing port?")));
    }
    if protocol.trim().is_empty() {
        return Err(Error::format(kind, item, Some("missing protocol?")));
    }
    Ok(PortSpec::new(port, protocol))
}

/// Parse `port[-port]/protocol;[to-port];[to-addr]`.
///
/// Exactly three `;`-separated segments are required; empty optional
/// segments become `None`.
pub fn parse_forward_port(item: &str) -> Result<ForwardPortSpec> {
    let segments: Vec<&str> = item.split(';').collect();
    let [port_proto, to_port, to_addr] = segments.as_slice() else {
        return Err(Error::format("forward_port", item, None));
    };
    let spec = parse_port_as("forward_port", port_proto)?;
    Ok(ForwardPortSpec::new(
        spec.port,
        spec.protocol,
        Some(*to_port),
        Some(*to_addr),
    ))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
