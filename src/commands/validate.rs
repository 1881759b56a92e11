//! `fwconverge validate` - check a request offline.

use anyhow::Result;
use zonekit::{BasicRichRules, DesiredState, RuleKind, ScalarToggle, validate};

use crate::Context;
use crate::cli::RequestArgs;
use crate::config;
use crate::ui;

const KINDS: [RuleKind; 8] = [
    RuleKind::Service,
    RuleKind::Port,
    RuleKind::SourcePort,
    RuleKind::ForwardPort,
    RuleKind::RichRule,
    RuleKind::Source,
    RuleKind::Interface,
    RuleKind::IcmpBlock,
];

pub fn run(ctx: &Context, args: RequestArgs) -> Result<()> {
    let request = config::build_request(&args, &ctx.config)?;
    let desired = DesiredState::from_request(&request, &BasicRichRules)?;
    validate(&desired)?;

    if !ctx.quiet {
        summarize(&desired);
        println!();
    }
    ui::success("Request is valid");
    Ok(())
}

fn summarize(desired: &DesiredState) {
    ui::header("Request");
    ui::kv("state", &desired.state().to_string());
    ui::kv("zone", desired.zone().unwrap_or("(default)"));

    let planes = desired.planes().resolve();
    let mut selected = Vec::new();
    if planes.runtime {
        selected.push("runtime".to_string());
    }
    if planes.permanent {
        selected.push("permanent".to_string());
    }
    if desired.planes().offline_allowed() {
        selected.push("offline allowed".to_string());
    }
    ui::kv("planes", &ui::list(&selected));

    for kind in KINDS {
        let keys: Vec<String> = desired.entries_of(kind).map(|e| e.key()).collect();
        if !keys.is_empty() {
            ui::kv(kind.as_str(), &ui::list(&keys));
        }
    }
    for toggle in [ScalarToggle::Masquerade, ScalarToggle::IcmpBlockInversion] {
        if let Some(value) = desired.toggle(toggle) {
            ui::kv(toggle.as_str(), &value.to_string());
        }
    }
    if let Some(target) = desired.target() {
        ui::kv("target", target.as_str());
    }
    if desired.timeout() > 0 {
        ui::kv("timeout", &format!("{}s", desired.timeout()));
    }
}
