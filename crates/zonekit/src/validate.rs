//! Pre-flight validation of a desired state.
//!
//! Pure checks on option combinations; nothing here touches a plane.

use crate::error::ValidationError;
use crate::model::{RuleKind, ScalarToggle};
use crate::types::{DesiredState, PresenceState};

/// Kinds whose runtime additions can carry a timeout.
const TIMEOUT_KINDS: [RuleKind; 6] = [
    RuleKind::Service,
    RuleKind::Port,
    RuleKind::SourcePort,
    RuleKind::ForwardPort,
    RuleKind::RichRule,
    RuleKind::IcmpBlock,
];

/// Check the whole request; the first failing rule wins.
pub fn validate(desired: &DesiredState) -> Result<(), ValidationError> {
    check_planes(desired)?;
    check_not_empty(desired)?;
    if desired.state() == PresenceState::Disabled {
        check_disabled(desired)?;
    }
    if desired.timeout() > 0 {
        check_timeout(desired)?;
    }
    Ok(())
}

fn check_planes(desired: &DesiredState) -> Result<(), ValidationError> {
    let flags = desired.planes();
    if flags.resolve().none() && !flags.offline_allowed() {
        return Err(ValidationError::NoPlaneSelected);
    }
    Ok(())
}

fn check_not_empty(desired: &DesiredState) -> Result<(), ValidationError> {
    let nothing_requested = desired.entries().is_empty()
        && desired.toggle(ScalarToggle::Masquerade).is_none()
        && desired.toggle(ScalarToggle::IcmpBlockInversion).is_none()
        && desired.target().is_none()
        && desired.zone().is_none();
    if nothing_requested {
        return Err(ValidationError::EmptyRequest);
    }
    Ok(())
}

fn check_disabled(desired: &DesiredState) -> Result<(), ValidationError> {
    if desired.timeout() > 0 {
        return Err(ValidationError::IncompatibleWithDisabled { option: "timeout" });
    }
    for toggle in [ScalarToggle::Masquerade, ScalarToggle::IcmpBlockInversion] {
        if desired.toggle(toggle) == Some(true) {
            return Err(ValidationError::IncompatibleWithDisabled {
                option: toggle.as_str(),
            });
        }
    }
    Ok(())
}

fn check_timeout(desired: &DesiredState) -> Result<(), ValidationError> {
    let expiring = desired.toggle(ScalarToggle::Masquerade) == Some(true)
        || TIMEOUT_KINDS.iter().any(|kind| desired.count(*kind) > 0);
    if expiring {
        return Ok(());
    }

    let lone = if desired.toggle(ScalarToggle::IcmpBlockInversion).is_some() {
        Some("icmp_block_inversion")
    } else if desired.count(RuleKind::Source) > 0 {
        Some("source")
    } else if desired.count(RuleKind::Interface) > 0 {
        Some("interface")
    } else if desired.target().is_some() {
        Some("target")
    } else {
        None
    };

    match lone {
        Some(option) => Err(ValidationError::TimeoutNotApplicable { option }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ZoneTarget;
    use crate::rich_rule::BasicRichRules;
    use crate::types::RuleRequest;

    fn desired(req: RuleRequest) -> DesiredState {
        DesiredState::from_request(&req, &BasicRichRules).unwrap()
    }

    fn enabled() -> RuleRequest {
        RuleRequest {
            state: Some(PresenceState::Enabled),
            ..Default::default()
        }
    }

    fn disabled() -> RuleRequest {
        RuleRequest {
            state: Some(PresenceState::Disabled),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_request() {
        let d = desired(RuleRequest {
            service: vec!["https".into()],
            timeout: Some(60),
            ..enabled()
        });
        assert_eq!(validate(&d), Ok(()));
    }

    #[test]
    fn test_no_plane_selected() {
        let d = desired(RuleRequest {
            service: vec!["ssh".into()],
            permanent: Some(false),
            runtime: Some(false),
            offline: Some(false),
            ..enabled()
        });
        assert_eq!(validate(&d), Err(ValidationError::NoPlaneSelected));
    }

    #[test]
    fn test_unset_permanent_runs_on_runtime() {
        let d = desired(RuleRequest {
            service: vec!["ssh".into()],
            runtime: Some(false),
            ..enabled()
        });
        assert_eq!(validate(&d), Ok(()));
    }

    #[test]
    fn test_permanent_false_without_runtime_or_offline() {
        let d = desired(RuleRequest {
            service: vec!["ssh".into()],
            permanent: Some(false),
            ..enabled()
        });
        assert_eq!(validate(&d), Err(ValidationError::NoPlaneSelected));
    }

    #[test]
    fn test_offline_counts_as_a_plane() {
        let d = desired(RuleRequest {
            service: vec!["ssh".into()],
            permanent: Some(false),
            runtime: Some(false),
            offline: Some(true),
            ..enabled()
        });
        assert_eq!(validate(&d), Ok(()));
    }

    #[test]
    fn test_empty_request() {
        assert_eq!(
            validate(&desired(enabled())),
            Err(ValidationError::EmptyRequest)
        );
    }

    #[test]
    fn test_zone_alone_is_not_empty() {
        let d = desired(RuleRequest {
            zone: Some("internal".into()),
            ..enabled()
        });
        assert_eq!(validate(&d), Ok(()));
    }

    #[test]
    fn test_disabled_with_timeout() {
        let d = desired(RuleRequest {
            service: vec!["ssh".into()],
            timeout: Some(5),
            ..disabled()
        });
        assert_eq!(
            validate(&d),
            Err(ValidationError::IncompatibleWithDisabled { option: "timeout" })
        );
    }

    #[test]
    fn test_disabled_with_true_toggles() {
        let d = desired(RuleRequest {
            masquerade: Some(true),
            ..disabled()
        });
        assert_eq!(
            validate(&d),
            Err(ValidationError::IncompatibleWithDisabled {
                option: "masquerade"
            })
        );

        let d = desired(RuleRequest {
            icmp_block_inversion: Some(true),
            ..disabled()
        });
        assert_eq!(
            validate(&d),
            Err(ValidationError::IncompatibleWithDisabled {
                option: "icmp_block_inversion"
            })
        );
    }

    #[test]
    fn test_disabled_with_false_toggles_is_fine() {
        let d = desired(RuleRequest {
            masquerade: Some(false),
            icmp_block_inversion: Some(false),
            ..disabled()
        });
        assert_eq!(validate(&d), Ok(()));
    }

    #[test]
    fn test_timeout_with_non_expiring_kinds_only() {
        let cases = [
            (
                RuleRequest {
                    icmp_block_inversion: Some(true),
                    ..enabled()
                },
                "icmp_block_inversion",
            ),
            (
                RuleRequest {
                    source: vec!["192.168.1.0/24".into()],
                    ..enabled()
                },
                "source",
            ),
            (
                RuleRequest {
                    interface: vec!["eth1".into()],
                    ..enabled()
                },
                "interface",
            ),
            (
                RuleRequest {
                    target: Some(ZoneTarget::Drop),
                    ..enabled()
                },
                "target",
            ),
        ];

        for (req, option) in cases {
            let d = desired(RuleRequest { timeout: Some(10), ..req });
            assert_eq!(
                validate(&d),
                Err(ValidationError::TimeoutNotApplicable { option })
            );
        }
    }

    #[test]
    fn test_timeout_with_masquerade_and_source() {
        let d = desired(RuleRequest {
            masquerade: Some(true),
            source: vec!["10.1.0.0/16".into()],
            timeout: Some(10),
            ..enabled()
        });
        assert_eq!(validate(&d), Ok(()));
    }
}
