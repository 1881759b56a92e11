//! Apply driver: runs the reconciler over each active plane and executes
//! the resulting plans.

use crate::error::Result;
use crate::plane::PlaneAccessor;
use crate::reconcile::{Coverage, Plan, plan_plane};
use crate::types::{DesiredState, Operation, ReconciliationResult};
use crate::validate::validate;

/// Accessors taking part in one invocation.
#[derive(Default)]
pub struct Planes<'a> {
    /// Runtime accessor and which steps it covers.
    pub runtime: Option<(&'a mut dyn PlaneAccessor, Coverage)>,
    pub permanent: Option<&'a mut dyn PlaneAccessor>,
}

/// Validate, plan and (unless `dry_run`) execute against every plane.
///
/// Runtime actions are executed before the permanent plane is touched. The
/// permanent plane is committed exactly once, after all of its actions, and
/// never under dry-run.
pub fn run(
    desired: &DesiredState,
    zone: &str,
    planes: Planes<'_>,
    dry_run: bool,
) -> Result<ReconciliationResult> {
    validate(desired)?;

    let mut actions = Vec::new();

    if let Some((accessor, coverage)) = planes.runtime {
        let plan = plan_plane(desired, zone, accessor, coverage)?;
        if !dry_run {
            execute(&plan, accessor)?;
        }
        actions.extend(plan.actions);
    }

    if let Some(accessor) = planes.permanent {
        let plan = plan_plane(desired, zone, accessor, Coverage::All)?;
        if !dry_run {
            execute(&plan, accessor)?;
            accessor.commit(zone)?;
        }
        actions.extend(plan.actions);
    }

    Ok(ReconciliationResult {
        changed: !actions.is_empty(),
        zone: zone.to_string(),
        dry_run,
        actions,
    })
}

/// Issue every action of a plan, stopping at the first failure.
pub fn execute(plan: &Plan, accessor: &mut dyn PlaneAccessor) -> Result<()> {
    for action in &plan.actions {
        log::debug!("applying {action}");
        let zone = action.zone.as_str();
        match &action.operation {
            Operation::Add { entry, timeout } => accessor.add(zone, entry, *timeout)?,
            Operation::Remove { entry } => accessor.remove(zone, entry)?,
            Operation::Enable { toggle, timeout } => {
                accessor.enable_toggle(zone, *toggle, *timeout)?;
            }
            Operation::Disable { toggle } => accessor.disable_toggle(zone, *toggle)?,
            Operation::SetTarget { to, .. } => accessor.set_target(zone, *to)?,
        }
    }
    Ok(())
}
