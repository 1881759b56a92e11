//! Error types for zone reconciliation.
//!
//! Errors are categorized so callers can pick an exit status and a hint
//! without matching every variant. Nothing in this crate retries: every
//! error is terminal and carries the detail of the check or backend call
//! that failed.

use crate::types::Plane;
use thiserror::Error;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input (port strings, rich rules)
    Input,
    /// The request is well-formed but not a legal combination
    Validation,
    /// The firewall backend failed or refused the operation
    Backend,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Input => "Malformed request",
            Self::Validation => "Invalid option combination",
            Self::Backend => "Firewall backend error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Input => "Check the port, forward-port and rich rule formats",
            Self::Validation => "Adjust the requested options; nothing was changed",
            Self::Backend => {
                "Check that firewalld is installed and running, or allow offline mode"
            }
        }
    }
}

/// Pre-flight validation failures.
///
/// These are raised before any plane is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Neither runtime, permanent nor offline operation is enabled
    #[error("one of permanent, runtime or offline needs to be enabled")]
    NoPlaneSelected,

    /// The request did not say whether entries should be enabled or disabled
    #[error("state needs to be set (enabled or disabled)")]
    MissingState,

    /// Nothing to reconcile
    #[error(
        "one of service, port, source_port, forward_port, masquerade, rich_rule, source, \
         interface, icmp_block, icmp_block_inversion, target or zone needs to be set"
    )]
    EmptyRequest,

    /// Option cannot be combined with state `disabled`
    #[error("{option} can not be used with state: disabled")]
    IncompatibleWithDisabled {
        /// Name of the offending option
        option: &'static str,
    },

    /// Timeout was given but the only requested kinds cannot expire
    #[error("timeout can not be used with {option} only")]
    TimeoutNotApplicable {
        /// Name of the option that was the only timeout candidate
        option: &'static str,
    },
}

/// Failures reported by the firewall backend or while connecting to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend tool could not be started at all
    #[error("firewall backend unavailable: {0}")]
    Unavailable(String),

    /// The service is not running and offline operation was not requested
    #[error("firewalld is not running and offline operation is declined")]
    OfflineDeclined,

    /// The service is not running (connected operation was required)
    #[error("firewalld is not running")]
    NotRunning,

    /// Installed backend is too old for the requested mode
    #[error("unsupported firewalld version {version}, {mode} operation requires >= {required}")]
    UnsupportedVersion {
        /// Reported backend version
        version: String,
        /// Minimum version for the mode
        required: String,
        /// "connected" or "offline"
        mode: &'static str,
    },

    /// The zone is not known on the given plane
    #[error("{plane} zone '{zone}' does not exist")]
    UnknownZone {
        /// Requested zone
        zone: String,
        /// Plane where the lookup failed
        plane: Plane,
    },

    /// A backend command exited unsuccessfully
    #[error("command failed: {command}: {stderr}")]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// The plane has no way to perform the operation
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The backend answered with something we cannot interpret
    #[error("unexpected backend output: {0}")]
    UnexpectedOutput(String),
}

/// Errors that can occur while building, validating or applying a request.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed port or forward-port string
    #[error("improper {kind} format: {input}{}", hint.map(|h| format!(" ({h})")).unwrap_or_default())]
    Format {
        /// Option being parsed ("port", "source_port", "forward_port")
        kind: &'static str,
        /// The raw input
        input: String,
        /// Extra hint for the user
        hint: Option<&'static str>,
    },

    /// The request failed pre-flight validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The firewall backend failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A rich rule was rejected by the canonicalizer
    #[error("Rich Rule '{rule}' is not valid: {message}")]
    RuleSyntax {
        /// The raw rule string
        rule: String,
        /// Why it was rejected
        message: String,
    },
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Format { .. } | Error::RuleSyntax { .. } => ErrorCategory::Input,
            Error::Validation(_) => ErrorCategory::Validation,
            Error::Backend(_) => ErrorCategory::Backend,
        }
    }

    pub(crate) fn format(kind: &'static str, input: &str, hint: Option<&'static str>) -> Self {
        Error::Format {
            kind,
            input: input.to_string(),
            hint,
        }
    }
}

/// Result type for zone reconciliation.
pub type Result<T> = std::result::Result<T, Error>;
