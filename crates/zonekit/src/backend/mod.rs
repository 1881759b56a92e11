//! Backend abstraction for firewalld operations.
//!
//! The [`FirewallBackend`] trait is the connector the rest of the crate is
//! written against. It exposes the live (runtime) zone operations of a
//! running service and a settings snapshot loader/storer for persisted
//! configuration, reachable either through the running service or, when it
//! is down, directly on disk.

pub mod firewall_cmd;

use crate::error::Result;
use crate::model::{RuleEntry, ScalarToggle};
use crate::settings::ZoneSettings;

pub use firewall_cmd::FirewallCmd;

/// Where persisted zone configuration is read from and written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Through the running service
    Daemon,
    /// Directly, with the service stopped
    Offline,
}

/// Backend trait for firewalld.
///
/// Every method maps to one backend round trip and reports failures as
/// [`crate::BackendError`]; implementations never retry.
pub trait FirewallBackend: Send + Sync {
    /// Whether the service is running and reachable.
    fn is_running(&self) -> Result<bool>;

    /// Installed backend version string, e.g. `1.3.4`.
    fn version(&self, source: ConfigSource) -> Result<String>;

    /// The configured default zone.
    fn default_zone(&self, source: ConfigSource) -> Result<String>;

    /// Zones active in the running service.
    fn runtime_zones(&self) -> Result<Vec<String>>;

    /// Zones defined in persisted configuration.
    fn permanent_zones(&self, source: ConfigSource) -> Result<Vec<String>>;

    fn query_runtime(&self, zone: &str, entry: &RuleEntry) -> Result<bool>;

    fn add_runtime(&self, zone: &str, entry: &RuleEntry, timeout: Option<u32>) -> Result<()>;

    fn remove_runtime(&self, zone: &str, entry: &RuleEntry) -> Result<()>;

    fn query_runtime_toggle(&self, zone: &str, toggle: ScalarToggle) -> Result<bool>;

    fn set_runtime_toggle(
        &self,
        zone: &str,
        toggle: ScalarToggle,
        enabled: bool,
        timeout: Option<u32>,
    ) -> Result<()>;

    /// Load a zone's persisted settings into a mutable snapshot.
    fn load_settings(&self, zone: &str, source: ConfigSource) -> Result<ZoneSettings>;

    /// Persist `updated`, given the snapshot `base` it was derived from.
    fn store_settings(
        &self,
        zone: &str,
        source: ConfigSource,
        base: &ZoneSettings,
        updated: &ZoneSettings,
    ) -> Result<()>;
}
