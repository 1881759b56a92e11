//! Reconciler: compares desired state with one plane and schedules actions.

use crate::error::Result;
use crate::model::{RuleKind, ScalarToggle};
use crate::plane::PlaneAccessor;
use crate::types::{Action, DesiredState, Operation, Plane};

/// One step of the per-plane walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Entries(RuleKind),
    Toggle(ScalarToggle),
    Target,
}

/// Fixed reconciliation order.
pub const STEPS: [Step; 11] = [
    Step::Entries(RuleKind::Service),
    Step::Entries(RuleKind::Port),
    Step::Entries(RuleKind::SourcePort),
    Step::Entries(RuleKind::ForwardPort),
    Step::Toggle(ScalarToggle::Masquerade),
    Step::Entries(RuleKind::RichRule),
    Step::Entries(RuleKind::Source),
    Step::Entries(RuleKind::Interface),
    Step::Entries(RuleKind::IcmpBlock),
    Step::Toggle(ScalarToggle::IcmpBlockInversion),
    Step::Target,
];

/// Actions scheduled for one plane, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub plane: Plane,
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Which steps a plane walk covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Every step.
    All,
    /// Only runtime source entries, which are reconciled even when the
    /// runtime plane was not selected.
    SourcesOnly,
}

impl Coverage {
    fn includes(self, step: Step) -> bool {
        match self {
            Self::All => true,
            Self::SourcesOnly => step == Step::Entries(RuleKind::Source),
        }
    }
}

/// Query `accessor` for every requested item and schedule what differs.
///
/// Only read methods of the accessor are called.
pub fn plan_plane(
    desired: &DesiredState,
    zone: &str,
    accessor: &mut dyn PlaneAccessor,
    coverage: Coverage,
) -> Result<Plan> {
    let plane = accessor.plane();
    let present = desired.state().should_be_present();
    let mut operations = Vec::new();

    for step in STEPS.into_iter().filter(|s| coverage.includes(*s)) {
        match step {
            Step::Entries(kind) => {
                let timeout = timeout_for(desired, plane, kind.supports_timeout());
                for entry in desired.entries_of(kind) {
                    let found = accessor.query(zone, entry)?;
                    if present && !found {
                        operations.push(Operation::Add {
                            entry: entry.clone(),
                            timeout,
                        });
                    } else if !present && found {
                        operations.push(Operation::Remove {
                            entry: entry.clone(),
                        });
                    }
                }
            }
            Step::Toggle(toggle) => {
                let Some(wanted) = desired.toggle(toggle) else {
                    continue;
                };
                let enabled = accessor.query_toggle(zone, toggle)?;
                if wanted && !enabled {
                    operations.push(Operation::Enable {
                        toggle,
                        timeout: timeout_for(desired, plane, toggle.supports_timeout()),
                    });
                } else if !wanted && enabled {
                    operations.push(Operation::Disable { toggle });
                }
            }
            Step::Target => {
                let Some(wanted) = desired.target() else {
                    continue;
                };
                if let Some(current) = accessor.target(zone)?
                    && current != wanted
                {
                    operations.push(Operation::SetTarget {
                        from: current,
                        to: wanted,
                    });
                }
            }
        }
    }

    let actions = operations
        .into_iter()
        .map(|operation| Action {
            plane,
            zone: zone.to_string(),
            operation,
        })
        .inspect(|action| log::debug!("scheduled {action}"))
        .collect();

    Ok(Plan { plane, actions })
}

fn timeout_for(desired: &DesiredState, plane: Plane, supported: bool) -> Option<u32> {
    (plane == Plane::Runtime && supported && desired.timeout() > 0).then_some(desired.timeout())
}
