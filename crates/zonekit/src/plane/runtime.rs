use crate::backend::FirewallBackend;
use crate::error::{BackendError, Result};
use crate::model::{RuleEntry, ScalarToggle, ZoneTarget};
use crate::plane::PlaneAccessor;
use crate::types::Plane;

/// Live state of a running service. Every call goes straight to the backend.
pub struct RuntimePlane<'a> {
    backend: &'a dyn FirewallBackend,
}

impl<'a> RuntimePlane<'a> {
    pub fn new(backend: &'a dyn FirewallBackend) -> Self {
        Self { backend }
    }
}

impl PlaneAccessor for RuntimePlane<'_> {
    fn plane(&self) -> Plane {
        Plane::Runtime
    }

    fn query(&mut self, zone: &str, entry: &RuleEntry) -> Result<bool> {
        self.backend.query_runtime(zone, entry)
    }

    fn add(&mut self, zone: &str, entry: &RuleEntry, timeout: Option<u32>) -> Result<()> {
        self.backend.add_runtime(zone, entry, timeout)
    }

    fn remove(&mut self, zone: &str, entry: &RuleEntry) -> Result<()> {
        self.backend.remove_runtime(zone, entry)
    }

    fn query_toggle(&mut self, zone: &str, toggle: ScalarToggle) -> Result<bool> {
        self.backend.query_runtime_toggle(zone, toggle)
    }

    fn enable_toggle(
        &mut self,
        zone: &str,
        toggle: ScalarToggle,
        timeout: Option<u32>,
    ) -> Result<()> {
        self.backend.set_runtime_toggle(zone, toggle, true, timeout)
    }

    fn disable_toggle(&mut self, zone: &str, toggle: ScalarToggle) -> Result<()> {
        self.backend.set_runtime_toggle(zone, toggle, false, None)
    }

    fn target(&mut self, _zone: &str) -> Result<Option<ZoneTarget>> {
        Ok(None)
    }

    fn set_target(&mut self, zone: &str, target: ZoneTarget) -> Result<()> {
        Err(BackendError::Unsupported(format!(
            "setting target {target} on runtime zone {zone}"
        ))
        .into())
    }

    fn commit(&mut self, _zone: &str) -> Result<()> {
        Ok(())
    }
}
