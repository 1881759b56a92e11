use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::Deserialize;
use std::path::PathBuf;
use zonekit::{PresenceState, RuleRequest, ZoneTarget};

#[derive(Parser)]
#[command(name = "fwconverge")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Converge firewalld zones to a declared state", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Application config file
    #[arg(long, global = true, env = "FWCONVERGE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reconcile a zone with the requested state
    Apply(ApplyArgs),

    /// Check a request without contacting firewalld
    Validate(RequestArgs),

    /// Show the persisted settings of a zone
    Show(ShowArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// ============================================================================
// Request
// ============================================================================

/// Every option of a reconciliation request.
#[derive(Args, Debug, Default)]
pub struct RequestArgs {
    /// Load the request from a TOML or JSON file; flags below are merged on top
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<String>,

    /// Service name (repeatable, comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "NAME")]
    pub service: Vec<String>,

    /// Port or range with protocol, e.g. 8080/tcp or 60000-61000/udp
    #[arg(long, value_delimiter = ',', value_name = "PORT/PROTO")]
    pub port: Vec<String>,

    /// Source port or range with protocol
    #[arg(long, value_delimiter = ',', value_name = "PORT/PROTO")]
    pub source_port: Vec<String>,

    /// Forward port as PORT/PROTO;TOPORT;TOADDR (either target may be empty)
    #[arg(long, value_delimiter = ',', value_name = "SPEC")]
    pub forward_port: Vec<String>,

    /// Masquerading on or off
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    pub masquerade: Option<bool>,

    /// Rich rule (repeatable)
    #[arg(long, value_name = "RULE")]
    pub rich_rule: Vec<String>,

    /// Source address or network
    #[arg(long, value_delimiter = ',', value_name = "ADDR")]
    pub source: Vec<String>,

    /// Interface bound to the zone
    #[arg(long, value_delimiter = ',', value_name = "IFACE")]
    pub interface: Vec<String>,

    /// ICMP type to block
    #[arg(long, value_delimiter = ',', value_name = "TYPE")]
    pub icmp_block: Vec<String>,

    /// ICMP block inversion on or off
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    pub icmp_block_inversion: Option<bool>,

    /// Seconds before runtime additions expire
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u32>,

    /// Zone target: default, ACCEPT, DROP or REJECT
    #[arg(long)]
    pub target: Option<ZoneTarget>,

    /// Zone to reconcile (default: the backend's default zone)
    #[arg(short, long)]
    pub zone: Option<String>,

    /// Apply to persisted configuration
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    pub permanent: Option<bool>,

    /// Apply to the running configuration
    #[arg(long, visible_alias = "immediate", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    pub runtime: Option<bool>,

    /// Allow offline operation when firewalld is not running
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    pub offline: Option<bool>,

    /// Whether the requested entries should be enabled or disabled
    #[arg(short, long)]
    pub state: Option<PresenceState>,
}

impl RequestArgs {
    /// The command line part of the request, without the file.
    pub fn to_request(&self) -> RuleRequest {
        RuleRequest {
            service: self.service.clone(),
            port: self.port.clone(),
            source_port: self.source_port.clone(),
            forward_port: self.forward_port.clone(),
            masquerade: self.masquerade,
            rich_rule: self.rich_rule.clone(),
            source: self.source.clone(),
            interface: self.interface.clone(),
            icmp_block: self.icmp_block.clone(),
            icmp_block_inversion: self.icmp_block_inversion,
            timeout: self.timeout,
            target: self.target,
            zone: self.zone.clone(),
            permanent: self.permanent,
            runtime: self.runtime,
            offline: self.offline,
            state: self.state,
        }
    }
}

// ============================================================================
// Apply / Show
// ============================================================================

#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Show what would change without changing anything
    #[arg(short = 'n', long, visible_alias = "check")]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Output format (default from config, else text)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Zone to show (default: the backend's default zone)
    #[arg(short, long)]
    pub zone: Option<String>,

    /// Read configuration with firewall-offline-cmd if firewalld is stopped
    #[arg(long)]
    pub offline: bool,

    /// Output format (default from config, else text)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::parse_from([
            "fwconverge",
            "apply",
            "--service",
            "http,https",
            "--port",
            "8080/tcp",
            "--forward-port",
            "80/tcp;8080;",
            "--permanent",
            "--immediate",
            "false",
            "--target",
            "reject",
            "--state",
            "enabled",
            "--check",
        ]);
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert!(args.dry_run);

        let request = args.request.to_request();
        assert_eq!(request.service, vec!["http", "https"]);
        assert_eq!(request.forward_port, vec!["80/tcp;8080;"]);
        assert_eq!(request.permanent, Some(true));
        assert_eq!(request.runtime, Some(false));
        assert_eq!(request.target, Some(ZoneTarget::Reject));
        assert_eq!(request.state, Some(PresenceState::Enabled));
    }

    #[test]
    fn test_unset_flags_stay_unset() {
        let cli = Cli::parse_from(["fwconverge", "validate", "--service", "ssh"]);
        let Command::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        let request = args.to_request();
        assert_eq!(request.permanent, None);
        assert_eq!(request.masquerade, None);
        assert_eq!(request.timeout, None);
    }
}
