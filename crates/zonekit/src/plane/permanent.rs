use crate::backend::{ConfigSource, FirewallBackend};
use crate::error::Result;
use crate::model::{RuleEntry, ScalarToggle, ZoneTarget};
use crate::plane::PlaneAccessor;
use crate::settings::ZoneSettings;
use crate::types::Plane;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Snapshot as loaded, plus the copy being edited.
struct Buffered {
    base: ZoneSettings,
    edited: ZoneSettings,
}

/// Persisted configuration, edited through per-zone settings buffers.
///
/// Each zone's settings are loaded on first use. Mutations only touch the
/// buffer; [`PlaneAccessor::commit`] writes the zone back in one step.
pub struct PermanentPlane<'a> {
    backend: &'a dyn FirewallBackend,
    source: ConfigSource,
    zones: BTreeMap<String, Buffered>,
}

impl<'a> PermanentPlane<'a> {
    pub fn new(backend: &'a dyn FirewallBackend, source: ConfigSource) -> Self {
        Self {
            backend,
            source,
            zones: BTreeMap::new(),
        }
    }

    /// The edited settings of a zone, loading the snapshot if needed.
    pub fn settings(&mut self, zone: &str) -> Result<&mut ZoneSettings> {
        let buffered = match self.zones.entry(zone.to_string()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                let base = self.backend.load_settings(zone, self.source)?;
                slot.insert(Buffered {
                    edited: base.clone(),
                    base,
                })
            }
        };
        Ok(&mut buffered.edited)
    }

    /// Whether a zone has buffered edits not yet committed.
    pub fn is_dirty(&self, zone: &str) -> bool {
        self.zones
            .get(zone)
            .is_some_and(|b| b.base != b.edited)
    }
}

impl PlaneAccessor for PermanentPlane<'_> {
    fn plane(&self) -> Plane {
        Plane::Permanent
    }

    fn query(&mut self, zone: &str, entry: &RuleEntry) -> Result<bool> {
        Ok(self.settings(zone)?.query(entry))
    }

    fn add(&mut self, zone: &str, entry: &RuleEntry, _timeout: Option<u32>) -> Result<()> {
        self.settings(zone)?.add(entry.clone());
        Ok(())
    }

    fn remove(&mut self, zone: &str, entry: &RuleEntry) -> Result<()> {
        self.settings(zone)?.remove(entry);
        Ok(())
    }

    fn query_toggle(&mut self, zone: &str, toggle: ScalarToggle) -> Result<bool> {
        Ok(self.settings(zone)?.query_toggle(toggle))
    }

    fn enable_toggle(
        &mut self,
        zone: &str,
        toggle: ScalarToggle,
        _timeout: Option<u32>,
    ) -> Result<()> {
        self.settings(zone)?.set_toggle(toggle, true);
        Ok(())
    }

    fn disable_toggle(&mut self, zone: &str, toggle: ScalarToggle) -> Result<()> {
        self.settings(zone)?.set_toggle(toggle, false);
        Ok(())
    }

    fn target(&mut self, zone: &str) -> Result<Option<ZoneTarget>> {
        Ok(Some(self.settings(zone)?.target))
    }

    fn set_target(&mut self, zone: &str, target: ZoneTarget) -> Result<()> {
        self.settings(zone)?.target = target;
        Ok(())
    }

    fn commit(&mut self, zone: &str) -> Result<()> {
        if self.is_dirty(zone) {
            log::info!("committing permanent settings for zone {zone}");
        } else {
            log::debug!("permanent settings for zone {zone} unchanged");
        }
        let Some(buffered) = self.zones.get_mut(zone) else {
            return Ok(());
        };
        self.backend
            .store_settings(zone, self.source, &buffered.base, &buffered.edited)?;
        buffered.base = buffered.edited.clone();
        Ok(())
    }
}
