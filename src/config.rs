use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use zonekit::{FirewallCmd, RuleRequest, SystemRunner};

use crate::cli::{OutputFormat, RequestArgs};

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("fwconverge"))
}

// ============================================================================
// Application Config
// ============================================================================

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Path or name of the firewall-cmd tool
    pub firewall_cmd: String,
    /// Path or name of the firewall-offline-cmd tool
    pub offline_cmd: String,
    /// Allow offline operation unless a request says otherwise
    pub offline: Option<bool>,
    pub output: OutputFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            firewall_cmd: "firewall-cmd".to_string(),
            offline_cmd: "firewall-offline-cmd".to_string(),
            offline: None,
            output: OutputFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load config.toml from `path`, or from the config directory.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (expand(p), true),
            None => (config_dir()?.join("config.toml"), false),
        };
        if !explicit && !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Backend configured with this config's tool paths.
    pub fn backend(&self) -> FirewallCmd {
        FirewallCmd::with_runner(
            self.firewall_cmd.as_str(),
            self.offline_cmd.as_str(),
            Box::new(SystemRunner),
        )
    }
}

// ============================================================================
// Request Files
// ============================================================================

/// Load a request file, choosing the format by extension.
pub fn load_request_file(path: &Path) -> Result<RuleRequest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML request {}", path.display())),
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON request {}", path.display())),
        _ => bail!(
            "Unsupported request file {}: expected a .toml or .json extension",
            path.display()
        ),
    }
}

/// Assemble the full request: file first, command line on top, then
/// config defaults for anything still unset.
pub fn build_request(args: &RequestArgs, config: &AppConfig) -> Result<RuleRequest> {
    let mut request = match &args.file {
        Some(file) => load_request_file(&expand(Path::new(file)))?,
        None => RuleRequest::default(),
    };
    request.merge(args.to_request());
    if request.offline.is_none() {
        request.offline = config.offline;
    }
    Ok(request)
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zonekit::{PresenceState, ZoneTarget};

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            "firewall_cmd = \"/usr/bin/firewall-cmd\"\noffline = true\noutput = \"json\"\n",
        );

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.firewall_cmd, "/usr/bin/firewall-cmd");
        assert_eq!(config.offline_cmd, "firewall-offline-cmd");
        assert_eq!(config.offline, Some(true));
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_unknown_config_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "config.toml", "firewal_cmd = \"x\"\n");
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_toml_and_json_requests() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = write(
            &dir,
            "web.toml",
            "service = [\"http\"]\ntarget = \"DROP\"\nimmediate = true\nstate = \"enabled\"\n",
        );
        let json_path = write(
            &dir,
            "web.json",
            r#"{"port": ["8080/tcp"], "state": "disabled", "zone": "internal"}"#,
        );

        let from_toml = load_request_file(&toml_path).unwrap();
        assert_eq!(from_toml.service, vec!["http"]);
        assert_eq!(from_toml.target, Some(ZoneTarget::Drop));
        assert_eq!(from_toml.runtime, Some(true));

        let from_json = load_request_file(&json_path).unwrap();
        assert_eq!(from_json.port, vec!["8080/tcp"]);
        assert_eq!(from_json.state, Some(PresenceState::Disabled));
        assert_eq!(from_json.zone.as_deref(), Some("internal"));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "web.yaml", "service: [http]\n");
        assert!(load_request_file(&path).is_err());
    }

    #[test]
    fn test_command_line_merges_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "base.toml",
            "service = [\"http\"]\nzone = \"public\"\nstate = \"enabled\"\n",
        );
        let args = RequestArgs {
            file: Some(path.to_string_lossy().into_owned()),
            service: vec!["https".into()],
            zone: Some("internal".into()),
            ..Default::default()
        };
        let config = AppConfig {
            offline: Some(true),
            ..Default::default()
        };

        let request = build_request(&args, &config).unwrap();
        assert_eq!(request.service, vec!["http", "https"]);
        assert_eq!(request.zone.as_deref(), Some("internal"));
        assert_eq!(request.state, Some(PresenceState::Enabled));
        assert_eq!(request.offline, Some(true));
    }
}
