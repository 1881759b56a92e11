//! Request, desired-state and result types.

use crate::error::{Result, ValidationError};
use crate::model::{
    RuleEntry, RuleKind, ScalarToggle, ZoneTarget, parse_forward_port, parse_port_as,
};
use crate::rich_rule::RichRuleCanonicalizer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Whether requested entries should be present or absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    Enabled,
    Disabled,
}

impl PresenceState {
    pub fn should_be_present(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => f.write_str("enabled"),
            Self::Disabled => f.write_str("disabled"),
        }
    }
}

impl FromStr for PresenceState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            other => Err(format!(
                "invalid state '{other}', expected one of: enabled, disabled"
            )),
        }
    }
}

/// Configuration plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    /// Live state, may hold expiring entries
    Runtime,
    /// Persisted configuration, changed through a committed settings object
    Permanent,
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime => f.write_str("runtime"),
            Self::Permanent => f.write_str("permanent"),
        }
    }
}

/// Plane selectors exactly as the caller gave them.
///
/// `None` means "not specified"; [`PlaneFlags::resolve`] applies defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaneFlags {
    pub permanent: Option<bool>,
    pub runtime: Option<bool>,
    pub offline: Option<bool>,
}

impl PlaneFlags {
    /// Effective planes before any environment-driven override.
    ///
    /// An unset `permanent` means runtime-only, whatever `runtime` says.
    /// Once `permanent` is given, `runtime` is off unless requested.
    pub fn resolve(&self) -> ActivePlanes {
        match self.permanent {
            None => ActivePlanes {
                runtime: true,
                permanent: false,
            },
            Some(permanent) => ActivePlanes {
                runtime: self.runtime.unwrap_or(false),
                permanent,
            },
        }
    }

    /// Whether the caller allows falling back to offline operation.
    pub fn offline_allowed(&self) -> bool {
        self.offline.unwrap_or(false)
    }
}

/// Planes a reconciliation will touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePlanes {
    pub runtime: bool,
    pub permanent: bool,
}

impl ActivePlanes {
    pub fn none(&self) -> bool {
        !self.runtime && !self.permanent
    }
}

/// Raw request as it arrives from a request file or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleRequest {
    pub service: Vec<String>,
    pub port: Vec<String>,
    pub source_port: Vec<String>,
    pub forward_port: Vec<String>,
    pub masquerade: Option<bool>,
    pub rich_rule: Vec<String>,
    pub source: Vec<String>,
    pub interface: Vec<String>,
    pub icmp_block: Vec<String>,
    pub icmp_block_inversion: Option<bool>,
    pub timeout: Option<u32>,
    pub target: Option<ZoneTarget>,
    pub zone: Option<String>,
    pub permanent: Option<bool>,
    #[serde(alias = "immediate")]
    pub runtime: Option<bool>,
    pub offline: Option<bool>,
    pub state: Option<PresenceState>,
}

impl RuleRequest {
    /// Merge `other` on top of `self`: lists are appended, set scalars win.
    pub fn merge(&mut self, other: RuleRequest) {
        self.service.extend(other.service);
        self.port.extend(other.port);
        self.source_port.extend(other.source_port);
        self.forward_port.extend(other.forward_port);
        self.rich_rule.extend(other.rich_rule);
        self.source.extend(other.source);
        self.interface.extend(other.interface);
        self.icmp_block.extend(other.icmp_block);

        self.masquerade = other.masquerade.or(self.masquerade);
        self.icmp_block_inversion = other.icmp_block_inversion.or(self.icmp_block_inversion);
        self.timeout = other.timeout.or(self.timeout);
        self.target = other.target.or(self.target);
        self.zone = other.zone.or(self.zone.take());
        self.permanent = other.permanent.or(self.permanent);
        self.runtime = other.runtime.or(self.runtime);
        self.offline = other.offline.or(self.offline);
        self.state = other.state.or(self.state);
    }
}

/// The full, normalized request for one reconciliation.
///
/// Built once from a [`RuleRequest`] and immutable afterwards. Entries are
/// held in reconciliation kind order with duplicates removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredState {
    entries: Vec<RuleEntry>,
    masquerade: Option<bool>,
    icmp_block_inversion: Option<bool>,
    target: Option<ZoneTarget>,
    zone: Option<String>,
    state: PresenceState,
    timeout: u32,
    planes: PlaneFlags,
}

impl DesiredState {
    /// Parse and normalize a raw request.
    ///
    /// Malformed ports and rejected rich rules fail here, before validation.
    pub fn from_request(
        request: &RuleRequest,
        rich_rules: &dyn RichRuleCanonicalizer,
    ) -> Result<Self> {
        let state = request.state.ok_or(ValidationError::MissingState)?;

        let mut entries = Vec::new();
        entries.extend(names(&request.service).map(RuleEntry::Service));
        for item in names(&request.port) {
            entries.push(RuleEntry::Port(parse_port_as("port", &item)?));
        }
        for item in names(&request.source_port) {
            entries.push(RuleEntry::SourcePort(parse_port_as("source_port", &item)?));
        }
        for item in names(&request.forward_port) {
            entries.push(RuleEntry::ForwardPort(parse_forward_port(&item)?));
        }
        for item in names(&request.rich_rule) {
            entries.push(RuleEntry::RichRule(rich_rules.canonicalize(&item)?));
        }
        entries.extend(names(&request.source).map(RuleEntry::Source));
        entries.extend(names(&request.interface).map(RuleEntry::Interface));
        entries.extend(names(&request.icmp_block).map(RuleEntry::IcmpBlock));

        let mut seen = HashSet::new();
        entries.retain(|entry| seen.insert(entry.clone()));

        Ok(Self {
            entries,
            masquerade: request.masquerade,
            icmp_block_inversion: request.icmp_block_inversion,
            target: request.target,
            zone: request
                .zone
                .as_deref()
                .map(str::trim)
                .filter(|z| !z.is_empty())
                .map(str::to_string),
            state,
            timeout: request.timeout.unwrap_or(0),
            planes: PlaneFlags {
                permanent: request.permanent,
                runtime: request.runtime,
                offline: request.offline,
            },
        })
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn entries_of(&self, kind: RuleKind) -> impl Iterator<Item = &RuleEntry> {
        self.entries.iter().filter(move |e| e.kind() == kind)
    }

    pub fn count(&self, kind: RuleKind) -> usize {
        self.entries_of(kind).count()
    }

    pub fn toggle(&self, toggle: ScalarToggle) -> Option<bool> {
        match toggle {
            ScalarToggle::Masquerade => self.masquerade,
            ScalarToggle::IcmpBlockInversion => self.icmp_block_inversion,
        }
    }

    pub fn target(&self) -> Option<ZoneTarget> {
        self.target
    }

    /// Explicitly requested zone; `None` means the backend default zone.
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    pub fn timeout(&self) -> u32 {
        self.timeout
    }

    pub fn planes(&self) -> PlaneFlags {
        self.planes
    }
}

fn names(items: &[String]) -> impl Iterator<Item = String> + '_ {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A single mutation against one plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Add {
        entry: RuleEntry,
        timeout: Option<u32>,
    },
    Remove {
        entry: RuleEntry,
    },
    Enable {
        toggle: ScalarToggle,
        timeout: Option<u32>,
    },
    Disable {
        toggle: ScalarToggle,
    },
    SetTarget {
        from: ZoneTarget,
        to: ZoneTarget,
    },
}

/// An operation scheduled for a plane and zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub plane: Plane,
    pub zone: String,
    #[serde(flatten)]
    pub operation: Operation,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.plane)?;
        match &self.operation {
            Operation::Add { entry, timeout } => {
                write!(f, "add {entry}")?;
                if let Some(secs) = timeout {
                    write!(f, " (timeout {secs}s)")?;
                }
                Ok(())
            }
            Operation::Remove { entry } => write!(f, "remove {entry}"),
            Operation::Enable { toggle, timeout } => {
                write!(f, "enable {toggle}")?;
                if let Some(secs) = timeout {
                    write!(f, " (timeout {secs}s)")?;
                }
                Ok(())
            }
            Operation::Disable { toggle } => write!(f, "disable {toggle}"),
            Operation::SetTarget { from, to } => write!(f, "set target {from} -> {to}"),
        }
    }
}

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub changed: bool,
    pub zone: String,
    pub dry_run: bool,
    /// Actions taken, or that would be taken under dry-run
    pub actions: Vec<Action>,
}
