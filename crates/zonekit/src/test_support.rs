//! Test doubles shared by unit tests.

use crate::backend::{ConfigSource, FirewallBackend};
use crate::error::{BackendError, Result};
use crate::model::{RuleEntry, ScalarToggle, ZoneTarget};
use crate::plane::PlaneAccessor;
use crate::runner::{CommandOutput, CommandRunner, display_command};
use crate::settings::ZoneSettings;
use crate::types::Plane;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Runner answering from a table of exact command lines.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    responses: Arc<Mutex<BTreeMap<String, CommandOutput>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, command: &str, code: i32, stdout: &str) {
        self.responses.lock().unwrap().insert(
            command.to_string(),
            CommandOutput {
                stdout: stdout.as_bytes().to_vec(),
                stderr: Vec::new(),
                code: Some(code),
            },
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let command = display_command(program, args);
        self.calls.lock().unwrap().push(command.clone());
        self.responses
            .lock()
            .unwrap()
            .get(&command)
            .cloned()
            .ok_or_else(|| BackendError::Unavailable(format!("unscripted: {command}")).into())
    }
}

#[derive(Default)]
struct FakeState {
    running: bool,
    version: String,
    default_zone: String,
    runtime: BTreeMap<String, ZoneSettings>,
    permanent: BTreeMap<String, ZoneSettings>,
    loads: usize,
    stores: usize,
    runtime_calls: Vec<String>,
}

/// In-memory firewalld with zones `public` (ssh enabled) and `internal`.
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn running() -> Self {
        let mut public = ZoneSettings::new();
        public.add(RuleEntry::Service("ssh".into()));

        let mut state = FakeState {
            running: true,
            version: "1.3.4".into(),
            default_zone: "public".into(),
            ..Default::default()
        };
        for (name, settings) in [("public", public), ("internal", ZoneSettings::new())] {
            state.runtime.insert(name.into(), settings.clone());
            state.permanent.insert(name.into(), settings);
        }
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn stopped() -> Self {
        let fake = Self::running();
        {
            let mut state = fake.state.lock().unwrap();
            state.running = false;
            state.runtime.clear();
        }
        fake
    }

    pub fn with_version(self, version: &str) -> Self {
        self.state.lock().unwrap().version = version.into();
        self
    }

    pub fn runtime(&self, zone: &str) -> ZoneSettings {
        self.state.lock().unwrap().runtime[zone].clone()
    }

    pub fn permanent(&self, zone: &str) -> ZoneSettings {
        self.state.lock().unwrap().permanent[zone].clone()
    }

    pub fn loads(&self) -> usize {
        self.state.lock().unwrap().loads
    }

    pub fn stores(&self) -> usize {
        self.state.lock().unwrap().stores
    }

    /// Runtime mutations issued, e.g. `add service http timeout=Some(30)`.
    pub fn runtime_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().runtime_calls.clone()
    }

    fn with_runtime<T>(&self, zone: &str, f: impl FnOnce(&mut ZoneSettings) -> T) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        if !state.running {
            return Err(BackendError::NotRunning.into());
        }
        let settings = state
            .runtime
            .get_mut(zone)
            .ok_or_else(|| BackendError::CommandFailed {
                command: format!("--zone={zone}"),
                stderr: "INVALID_ZONE".into(),
            })?;
        Ok(f(settings))
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().runtime_calls.push(call);
    }
}

impl FirewallBackend for FakeBackend {
    fn is_running(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().running)
    }

    fn version(&self, _source: ConfigSource) -> Result<String> {
        Ok(self.state.lock().unwrap().version.clone())
    }

    fn default_zone(&self, _source: ConfigSource) -> Result<String> {
        Ok(self.state.lock().unwrap().default_zone.clone())
    }

    fn runtime_zones(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().runtime.keys().cloned().collect())
    }

    fn permanent_zones(&self, _source: ConfigSource) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().permanent.keys().cloned().collect())
    }

    fn query_runtime(&self, zone: &str, entry: &RuleEntry) -> Result<bool> {
        self.with_runtime(zone, |s| s.query(entry))
    }

    fn add_runtime(&self, zone: &str, entry: &RuleEntry, timeout: Option<u32>) -> Result<()> {
        self.with_runtime(zone, |s| s.add(entry.clone()))?;
        self.record(format!("add {entry} timeout={timeout:?}"));
        Ok(())
    }

    fn remove_runtime(&self, zone: &str, entry: &RuleEntry) -> Result<()> {
        self.with_runtime(zone, |s| s.remove(entry))?;
        self.record(format!("remove {entry}"));
        Ok(())
    }

    fn query_runtime_toggle(&self, zone: &str, toggle: ScalarToggle) -> Result<bool> {
        self.with_runtime(zone, |s| s.query_toggle(toggle))
    }

    fn set_runtime_toggle(
        &self,
        zone: &str,
        toggle: ScalarToggle,
        enabled: bool,
        timeout: Option<u32>,
    ) -> Result<()> {
        self.with_runtime(zone, |s| s.set_toggle(toggle, enabled))?;
        self.record(format!("set {toggle}={enabled} timeout={timeout:?}"));
        Ok(())
    }

    fn load_settings(&self, zone: &str, _source: ConfigSource) -> Result<ZoneSettings> {
        let mut state = self.state.lock().unwrap();
        state.loads += 1;
        state.permanent.get(zone).cloned().ok_or_else(|| {
            BackendError::UnknownZone {
                zone: zone.to_string(),
                plane: Plane::Permanent,
            }
            .into()
        })
    }

    fn store_settings(
        &self,
        zone: &str,
        _source: ConfigSource,
        _base: &ZoneSettings,
        updated: &ZoneSettings,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.stores += 1;
        state.permanent.insert(zone.to_string(), updated.clone());
        Ok(())
    }
}

/// Lets a test keep a handle on a backend that a session owns.
impl FirewallBackend for Arc<FakeBackend> {
    fn is_running(&self) -> Result<bool> {
        self.as_ref().is_running()
    }

    fn version(&self, source: ConfigSource) -> Result<String> {
        self.as_ref().version(source)
    }

    fn default_zone(&self, source: ConfigSource) -> Result<String> {
        self.as_ref().default_zone(source)
    }

    fn runtime_zones(&self) -> Result<Vec<String>> {
        self.as_ref().runtime_zones()
    }

    fn permanent_zones(&self, source: ConfigSource) -> Result<Vec<String>> {
        self.as_ref().permanent_zones(source)
    }

    fn query_runtime(&self, zone: &str, entry: &RuleEntry) -> Result<bool> {
        self.as_ref().query_runtime(zone, entry)
    }

    fn add_runtime(&self, zone: &str, entry: &RuleEntry, timeout: Option<u32>) -> Result<()> {
        self.as_ref().add_runtime(zone, entry, timeout)
    }

    fn remove_runtime(&self, zone: &str, entry: &RuleEntry) -> Result<()> {
        self.as_ref().remove_runtime(zone, entry)
    }

    fn query_runtime_toggle(&self, zone: &str, toggle: ScalarToggle) -> Result<bool> {
        self.as_ref().query_runtime_toggle(zone, toggle)
    }

    fn set_runtime_toggle(
        &self,
        zone: &str,
        toggle: ScalarToggle,
        enabled: bool,
        timeout: Option<u32>,
    ) -> Result<()> {
        self.as_ref()
            .set_runtime_toggle(zone, toggle, enabled, timeout)
    }

    fn load_settings(&self, zone: &str, source: ConfigSource) -> Result<ZoneSettings> {
        self.as_ref().load_settings(zone, source)
    }

    fn store_settings(
        &self,
        zone: &str,
        source: ConfigSource,
        base: &ZoneSettings,
        updated: &ZoneSettings,
    ) -> Result<()> {
        self.as_ref().store_settings(zone, source, base, updated)
    }
}

/// Single-zone accessor that counts every call.
pub struct RecordingPlane {
    plane: Plane,
    pub settings: ZoneSettings,
    has_target: bool,
    pub queries: usize,
    pub mutations: usize,
    pub commits: usize,
}

impl RecordingPlane {
    pub fn new(plane: Plane) -> Self {
        Self {
            plane,
            settings: ZoneSettings::new(),
            has_target: plane == Plane::Permanent,
            queries: 0,
            mutations: 0,
            commits: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.queries + self.mutations + self.commits
    }
}

impl PlaneAccessor for RecordingPlane {
    fn plane(&self) -> Plane {
        self.plane
    }

    fn query(&mut self, _zone: &str, entry: &RuleEntry) -> Result<bool> {
        self.queries += 1;
        Ok(self.settings.query(entry))
    }

    fn add(&mut self, _zone: &str, entry: &RuleEntry, _timeout: Option<u32>) -> Result<()> {
        self.mutations += 1;
        self.settings.add(entry.clone());
        Ok(())
    }

    fn remove(&mut self, _zone: &str, entry: &RuleEntry) -> Result<()> {
        self.mutations += 1;
        self.settings.remove(entry);
        Ok(())
    }

    fn query_toggle(&mut self, _zone: &str, toggle: ScalarToggle) -> Result<bool> {
        self.queries += 1;
        Ok(self.settings.query_toggle(toggle))
    }

    fn enable_toggle(
        &mut self,
        _zone: &str,
        toggle: ScalarToggle,
        _timeout: Option<u32>,
    ) -> Result<()> {
        self.mutations += 1;
        self.settings.set_toggle(toggle, true);
        Ok(())
    }

    fn disable_toggle(&mut self, _zone: &str, toggle: ScalarToggle) -> Result<()> {
        self.mutations += 1;
        self.settings.set_toggle(toggle, false);
        Ok(())
    }

    fn target(&mut self, _zone: &str) -> Result<Option<ZoneTarget>> {
        self.queries += 1;
        Ok(self.has_target.then_some(self.settings.target))
    }

    fn set_target(&mut self, _zone: &str, target: ZoneTarget) -> Result<()> {
        self.mutations += 1;
        self.settings.target = target;
        Ok(())
    }

    fn commit(&mut self, _zone: &str) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}
