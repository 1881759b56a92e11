//! Backend driving the `firewall-cmd` and `firewall-offline-cmd` tools.

use crate::backend::{ConfigSource, FirewallBackend};
use crate::error::{BackendError, Result};
use crate::model::{ForwardPortSpec, PortSpec, RuleEntry, RuleKind, ScalarToggle};
use crate::runner::{CommandOutput, CommandRunner, SystemRunner, display_command};
use crate::settings::ZoneSettings;
use crate::types::Operation;

/// Exit code firewall-cmd uses when the service is not running.
const NOT_RUNNING: i32 = 252;

/// Backend that executes the firewalld command line tools.
pub struct FirewallCmd {
    firewall_cmd: String,
    offline_cmd: String,
    runner: Box<dyn CommandRunner>,
}

impl FirewallCmd {
    /// Create a backend using the tools found on `PATH`.
    pub fn new() -> Self {
        Self::with_runner("firewall-cmd", "firewall-offline-cmd", Box::new(SystemRunner))
    }

    /// Create a backend with custom tool paths and runner (useful for testing).
    pub fn with_runner(
        firewall_cmd: impl Into<String>,
        offline_cmd: impl Into<String>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            firewall_cmd: firewall_cmd.into(),
            offline_cmd: offline_cmd.into(),
            runner,
        }
    }

    fn program(&self, source: ConfigSource) -> &str {
        match source {
            ConfigSource::Daemon => &self.firewall_cmd,
            ConfigSource::Offline => &self.offline_cmd,
        }
    }

    /// Arguments addressing a zone's persisted configuration.
    fn permanent_args(source: ConfigSource, zone: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(2);
        if source == ConfigSource::Daemon {
            args.push("--permanent".to_string());
        }
        args.push(format!("--zone={zone}"));
        args
    }

    fn exec(&self, program: &str, args: Vec<String>) -> Result<(CommandOutput, String)> {
        let command = display_command(program, &args);
        log::debug!("{command}");
        let output = self.runner.run(program, &args)?;
        Ok((output, command))
    }

    /// Run and require success, returning trimmed stdout.
    fn run_checked(&self, program: &str, args: Vec<String>) -> Result<String> {
        let (output, command) = self.exec(program, args)?;
        if !output.success() {
            return Err(command_failed(command, &output));
        }
        Ok(output.stdout_str().trim().to_string())
    }

    /// Run a `--query-*` command: exit 0 is yes, exit 1 is no.
    fn run_query(&self, program: &str, args: Vec<String>) -> Result<bool> {
        let (output, command) = self.exec(program, args)?;
        match output.code {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(command_failed(command, &output)),
        }
    }

    fn list(&self, source: ConfigSource, zone: &str, option: &str) -> Result<String> {
        let mut args = Self::permanent_args(source, zone);
        args.push(option.to_string());
        self.run_checked(self.program(source), args)
    }

    fn runtime_args(zone: &str, option: String) -> Vec<String> {
        vec![format!("--zone={zone}"), option]
    }
}

impl Default for FirewallCmd {
    fn default() -> Self {
        Self::new()
    }
}

impl FirewallBackend for FirewallCmd {
    fn is_running(&self) -> Result<bool> {
        let (output, command) = self.exec(&self.firewall_cmd, vec!["--state".to_string()])?;
        match output.code {
            Some(0) => Ok(true),
            Some(NOT_RUNNING) => Ok(false),
            _ => {
                log::debug!("{command}: {}", output.stderr_str().trim());
                Ok(false)
            }
        }
    }

    fn version(&self, source: ConfigSource) -> Result<String> {
        self.run_checked(self.program(source), vec!["--version".to_string()])
    }

    fn default_zone(&self, source: ConfigSource) -> Result<String> {
        let zone = self.run_checked(self.program(source), vec!["--get-default-zone".to_string()])?;
        if zone.is_empty() {
            return Err(BackendError::UnexpectedOutput("empty default zone".to_string()).into());
        }
        Ok(zone)
    }

    fn runtime_zones(&self) -> Result<Vec<String>> {
        let out = self.run_checked(&self.firewall_cmd, vec!["--get-zones".to_string()])?;
        Ok(words(&out))
    }

    fn permanent_zones(&self, source: ConfigSource) -> Result<Vec<String>> {
        let mut args = Vec::new();
        if source == ConfigSource::Daemon {
            args.push("--permanent".to_string());
        }
        args.push("--get-zones".to_string());
        let out = self.run_checked(self.program(source), args)?;
        Ok(words(&out))
    }

    fn query_runtime(&self, zone: &str, entry: &RuleEntry) -> Result<bool> {
        self.run_query(
            &self.firewall_cmd,
            Self::runtime_args(zone, entry_option("query", entry)),
        )
    }

    fn add_runtime(&self, zone: &str, entry: &RuleEntry, timeout: Option<u32>) -> Result<()> {
        let mut args = Self::runtime_args(zone, entry_option("add", entry));
        if let Some(secs) = timeout.filter(|_| entry.kind().supports_timeout()) {
            args.push(format!("--timeout={secs}"));
        }
        self.run_checked(&self.firewall_cmd, args).map(|_| ())
    }

    fn remove_runtime(&self, zone: &str, entry: &RuleEntry) -> Result<()> {
        self.run_checked(
            &self.firewall_cmd,
            Self::runtime_args(zone, entry_option("remove", entry)),
        )
        .map(|_| ())
    }

    fn query_runtime_toggle(&self, zone: &str, toggle: ScalarToggle) -> Result<bool> {
        self.run_query(
            &self.firewall_cmd,
            Self::runtime_args(zone, toggle_option("query", toggle)),
        )
    }

    fn set_runtime_toggle(
        &self,
        zone: &str,
        toggle: ScalarToggle,
        enabled: bool,
        timeout: Option<u32>,
    ) -> Result<()> {
        let verb = if enabled { "add" } else { "remove" };
        let mut args = Self::runtime_args(zone, toggle_option(verb, toggle));
        if enabled && let Some(secs) = timeout.filter(|_| toggle.supports_timeout()) {
            args.push(format!("--timeout={secs}"));
        }
        self.run_checked(&self.firewall_cmd, args).map(|_| ())
    }

    fn load_settings(&self, zone: &str, source: ConfigSource) -> Result<ZoneSettings> {
        let mut settings = ZoneSettings::new();

        for name in words(&self.list(source, zone, "--list-services")?) {
            settings.add(RuleEntry::Service(name));
        }
        for item in words(&self.list(source, zone, "--list-ports")?) {
            settings.add(RuleEntry::Port(parse_listed_port(&item)?));
        }
        for item in words(&self.list(source, zone, "--list-source-ports")?) {
            settings.add(RuleEntry::SourcePort(parse_listed_port(&item)?));
        }
        for line in lines(&self.list(source, zone, "--list-forward-ports")?) {
            settings.add(RuleEntry::ForwardPort(parse_listed_forward_port(&line)?));
        }
        for rule in lines(&self.list(source, zone, "--list-rich-rules")?) {
            settings.add(RuleEntry::RichRule(rule));
        }
        for addr in words(&self.list(source, zone, "--list-sources")?) {
            settings.add(RuleEntry::Source(addr));
        }
        for iface in words(&self.list(source, zone, "--list-interfaces")?) {
            settings.add(RuleEntry::Interface(iface));
        }
        for icmp in words(&self.list(source, zone, "--list-icmp-blocks")?) {
            settings.add(RuleEntry::IcmpBlock(icmp));
        }

        for toggle in [ScalarToggle::Masquerade, ScalarToggle::IcmpBlockInversion] {
            let mut args = Self::permanent_args(source, zone);
            args.push(toggle_option("query", toggle));
            let value = self.run_query(self.program(source), args)?;
            settings.set_toggle(toggle, value);
        }

        let target = self.list(source, zone, "--get-target")?;
        settings.target = target
            .parse()
            .map_err(|e: String| BackendError::UnexpectedOutput(e))?;

        Ok(settings)
    }

    fn store_settings(
        &self,
        zone: &str,
        source: ConfigSource,
        base: &ZoneSettings,
        updated: &ZoneSettings,
    ) -> Result<()> {
        let ops = updated.changes_since(base);
        if ops.is_empty() {
            log::debug!("zone {zone}: no persisted changes to write");
            return Ok(());
        }

        let mut args = Self::permanent_args(source, zone);
        let mut target = None;
        for op in &ops {
            match op {
                Operation::Add { entry, .. } => args.push(entry_option("add", entry)),
                Operation::Remove { entry } => args.push(entry_option("remove", entry)),
                Operation::Enable { toggle, .. } => args.push(toggle_option("add", *toggle)),
                Operation::Disable { toggle } => args.push(toggle_option("remove", *toggle)),
                Operation::SetTarget { to, .. } => target = Some(*to),
            }
        }

        let program = self.program(source);
        if args.len() > Self::permanent_args(source, zone).len() {
            self.run_checked(program, args)?;
        }
        // --set-target cannot be combined with other zone options.
        if let Some(to) = target {
            let mut args = Self::permanent_args(source, zone);
            args.push(format!("--set-target={}", to.as_str()));
            self.run_checked(program, args)?;
        }
        Ok(())
    }
}

fn command_failed(command: String, output: &CommandOutput) -> crate::Error {
    let stderr = output.stderr_str().trim().to_string();
    let stderr = if stderr.is_empty() {
        output.stdout_str().trim().to_string()
    } else {
        stderr
    };
    BackendError::CommandFailed { command, stderr }.into()
}

/// `--{verb}-{kind}={key}` in firewall-cmd syntax.
fn entry_option(verb: &str, entry: &RuleEntry) -> String {
    let value = match entry {
        RuleEntry::ForwardPort(fp) => forward_port_arg(fp),
        other => other.key(),
    };
    let option = match entry.kind() {
        RuleKind::Service => "service",
        RuleKind::Port => "port",
        RuleKind::SourcePort => "source-port",
        RuleKind::ForwardPort => "forward-port",
        RuleKind::RichRule => "rich-rule",
        RuleKind::Source => "source",
        RuleKind::Interface => "interface",
        RuleKind::IcmpBlock => "icmp-block",
    };
    format!("--{verb}-{option}={value}")
}

fn toggle_option(verb: &str, toggle: ScalarToggle) -> String {
    match toggle {
        ScalarToggle::Masquerade => format!("--{verb}-masquerade"),
        ScalarToggle::IcmpBlockInversion => format!("--{verb}-icmp-block-inversion"),
    }
}

/// Forward port argument with absent parts omitted.
fn forward_port_arg(fp: &ForwardPortSpec) -> String {
    let mut arg = format!("port={}:proto={}", fp.port, fp.protocol);
    if let Some(to_port) = &fp.to_port {
        arg.push_str(&format!(":toport={to_port}"));
    }
    if let Some(to_addr) = &fp.to_addr {
        arg.push_str(&format!(":toaddr={to_addr}"));
    }
    arg
}

fn parse_listed_port(item: &str) -> Result<PortSpec> {
    let (port, protocol) = item
        .rsplit_once('/')
        .ok_or_else(|| BackendError::UnexpectedOutput(format!("port without protocol: {item}")))?;
    Ok(PortSpec::new(port, protocol))
}

/// Parse a `--list-forward-ports` line.
///
/// `toaddr` is split off first since IPv6 addresses contain `:`.
fn parse_listed_forward_port(line: &str) -> Result<ForwardPortSpec> {
    let (head, to_addr) = match line.split_once(":toaddr=") {
        Some((head, addr)) => (head, Some(addr)),
        None => (line, None),
    };

    let (mut port, mut proto, mut to_port) = (None, None, None);
    for pair in head.split(':') {
        match pair.split_once('=') {
            Some(("port", v)) => port = Some(v),
            Some(("proto", v)) => proto = Some(v),
            Some(("toport", v)) => to_port = Some(v),
            _ => {
                return Err(
                    BackendError::UnexpectedOutput(format!("forward port: {line}")).into(),
                );
            }
        }
    }

    match (port, proto) {
        (Some(port), Some(proto)) => Ok(ForwardPortSpec::new(port, proto, to_port, to_addr)),
        _ => Err(BackendError::UnexpectedOutput(format!("forward port: {line}")).into()),
    }
}

fn words(out: &str) -> Vec<String> {
    out.split_whitespace().map(str::to_string).collect()
}

fn lines(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
