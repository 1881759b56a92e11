//! In-memory zone settings for the permanent plane.
//!
//! A [`ZoneSettings`] is loaded from persisted configuration, mutated in
//! place, and only becomes durable when the owning plane commits it.

use crate::model::{RuleEntry, RuleKind, ScalarToggle, ZoneTarget};
use crate::types::Operation;
use serde::{Deserialize, Serialize};

/// Snapshot of one zone's persisted configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSettings {
    entries: Vec<RuleEntry>,
    pub masquerade: bool,
    pub icmp_block_inversion: bool,
    pub target: ZoneTarget,
}

impl ZoneSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self, entry: &RuleEntry) -> bool {
        self.entries.contains(entry)
    }

    /// Add an entry; adding a present entry is a no-op.
    pub fn add(&mut self, entry: RuleEntry) {
        if !self.query(&entry) {
            self.entries.push(entry);
        }
    }

    /// Remove an entry; removing an absent entry is a no-op.
    pub fn remove(&mut self, entry: &RuleEntry) {
        self.entries.retain(|e| e != entry);
    }

    pub fn query_toggle(&self, toggle: ScalarToggle) -> bool {
        match toggle {
            ScalarToggle::Masquerade => self.masquerade,
            ScalarToggle::IcmpBlockInversion => self.icmp_block_inversion,
        }
    }

    pub fn set_toggle(&mut self, toggle: ScalarToggle, value: bool) {
        match toggle {
            ScalarToggle::Masquerade => self.masquerade = value,
            ScalarToggle::IcmpBlockInversion => self.icmp_block_inversion = value,
        }
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn entries_of(&self, kind: RuleKind) -> impl Iterator<Item = &RuleEntry> {
        self.entries.iter().filter(move |e| e.kind() == kind)
    }

    /// Operations that turn `base` into `self`, removals first.
    pub fn changes_since(&self, base: &ZoneSettings) -> Vec<Operation> {
        let mut ops: Vec<Operation> = base
            .entries
            .iter()
            .filter(|e| !self.query(e))
            .map(|e| Operation::Remove { entry: e.clone() })
            .collect();

        ops.extend(
            self.entries
                .iter()
                .filter(|e| !base.query(e))
                .map(|e| Operation::Add {
                    entry: e.clone(),
                    timeout: None,
                }),
        );

        for toggle in [ScalarToggle::Masquerade, ScalarToggle::IcmpBlockInversion] {
            match (base.query_toggle(toggle), self.query_toggle(toggle)) {
                (false, true) => ops.push(Operation::Enable {
                    toggle,
                    timeout: None,
                }),
                (true, false) => ops.push(Operation::Disable { toggle }),
                _ => {}
            }
        }

        if base.target != self.target {
            ops.push(Operation::SetTarget {
                from: base.target,
                to: self.target,
            });
        }

        ops
    }
}
