//! Plane accessors.
//!
//! A [`PlaneAccessor`] answers "is this present on my plane for zone Z" and
//! performs the matching add/remove. The reconciler is written only against
//! this trait; which backend mode sits behind it is decided once, when a
//! [`crate::Session`] is opened.

mod permanent;
mod runtime;

pub use permanent::PermanentPlane;
pub use runtime::RuntimePlane;

use crate::error::Result;
use crate::model::{RuleEntry, ScalarToggle, ZoneTarget};
use crate::types::Plane;

/// Capability interface over one configuration plane.
pub trait PlaneAccessor {
    /// Which plane this accessor reads and writes.
    fn plane(&self) -> Plane;

    fn query(&mut self, zone: &str, entry: &RuleEntry) -> Result<bool>;

    /// Add an entry. `timeout` is only honored by planes that expire entries.
    fn add(&mut self, zone: &str, entry: &RuleEntry, timeout: Option<u32>) -> Result<()>;

    fn remove(&mut self, zone: &str, entry: &RuleEntry) -> Result<()>;

    fn query_toggle(&mut self, zone: &str, toggle: ScalarToggle) -> Result<bool>;

    fn enable_toggle(&mut self, zone: &str, toggle: ScalarToggle, timeout: Option<u32>)
    -> Result<()>;

    fn disable_toggle(&mut self, zone: &str, toggle: ScalarToggle) -> Result<()>;

    /// Current zone target, or `None` if this plane does not carry one.
    fn target(&mut self, zone: &str) -> Result<Option<ZoneTarget>>;

    fn set_target(&mut self, zone: &str, target: ZoneTarget) -> Result<()>;

    /// Make buffered changes durable. No-op for planes that apply immediately.
    fn commit(&mut self, zone: &str) -> Result<()>;
}
