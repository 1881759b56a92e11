//! # zonekit
//!
//! Idempotent reconciliation of firewalld zones.
//!
//! This crate provides functionality for:
//! - Parsing port, forward-port and rich rule requests into typed entries
//! - Validating option combinations before anything is touched
//! - Comparing a desired state with the runtime and permanent planes
//! - Applying only the differences, with a dry-run preview and a single
//!   commit of persisted configuration
//! - Falling back to offline operation when the service is stopped
//!
//! ## Example
//!
//! ```no_run
//! use zonekit::{Client, PresenceState, RuleRequest};
//!
//! let request = RuleRequest {
//!     service: vec!["https".into()],
//!     port: vec!["8443/tcp".into()],
//!     permanent: Some(true),
//!     state: Some(PresenceState::Enabled),
//!     ..Default::default()
//! };
//!
//! let result = Client::new().apply(&request, false).expect("reconcile failed");
//! for action in &result.actions {
//!     println!("{action}");
//! }
//! println!("changed: {}", result.changed);
//! ```

#![warn(clippy::all)]

pub mod apply;
pub mod backend;
pub mod error;
pub mod model;
pub mod plane;
pub mod reconcile;
pub mod rich_rule;
pub mod runner;
pub mod session;
pub mod settings;
pub mod types;
pub mod validate;

#[cfg(test)]
mod test_support;

pub use backend::{ConfigSource, FirewallBackend, FirewallCmd};
pub use error::{BackendError, Error, ErrorCategory, Result, ValidationError};
pub use model::{
    ForwardPortSpec, PortSpec, RuleEntry, RuleKind, ScalarToggle, ZoneTarget, parse_forward_port,
    parse_port,
};
pub use plane::{PermanentPlane, PlaneAccessor, RuntimePlane};
pub use rich_rule::{BasicRichRules, RichRuleCanonicalizer};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use session::{Mode, Session};
pub use settings::ZoneSettings;
pub use types::{
    Action, ActivePlanes, DesiredState, Operation, Plane, PlaneFlags, PresenceState,
    ReconciliationResult, RuleRequest,
};
pub use validate::validate;

/// Reconcile `desired` against an opened session.
///
/// Validation runs first; a failing request never reaches a plane. Under
/// `dry_run` the result lists the same actions and `changed` value a real
/// run would produce, but nothing is added, removed or committed.
pub fn reconcile(
    desired: &DesiredState,
    session: &Session,
    dry_run: bool,
) -> Result<ReconciliationResult> {
    session.reconcile(desired, dry_run)
}

/// High-level client for zone reconciliation.
///
/// The client wraps a backend and a rich rule canonicalizer and runs the
/// whole flow: build the desired state, validate it, probe the backend and
/// reconcile.
pub struct Client {
    backend: Box<dyn FirewallBackend>,
    rich_rules: Box<dyn RichRuleCanonicalizer>,
}

impl Client {
    /// Create a client driving the firewalld command line tools.
    pub fn new() -> Self {
        Self::with_backend(Box::new(FirewallCmd::new()))
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn FirewallBackend>) -> Self {
        Self {
            backend,
            rich_rules: Box::new(BasicRichRules),
        }
    }

    /// Replace the rich rule canonicalizer.
    pub fn with_rich_rules(mut self, rich_rules: Box<dyn RichRuleCanonicalizer>) -> Self {
        self.rich_rules = rich_rules;
        self
    }

    /// Parse and validate a raw request without touching the backend.
    pub fn desired_state(&self, request: &RuleRequest) -> Result<DesiredState> {
        let desired = DesiredState::from_request(request, self.rich_rules.as_ref())?;
        validate(&desired)?;
        Ok(desired)
    }

    /// Probe the backend for a validated desired state.
    pub fn connect(self, desired: &DesiredState) -> Result<Session> {
        Session::open(self.backend, desired.planes(), desired.zone())
    }

    /// Build, validate, connect and reconcile in one call.
    pub fn apply(self, request: &RuleRequest, dry_run: bool) -> Result<ReconciliationResult> {
        let desired = self.desired_state(request)?;
        let session = self.connect(&desired)?;
        reconcile(&desired, &session, dry_run)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
