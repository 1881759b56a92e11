//! `fwconverge show` - print a zone's persisted settings.

use anyhow::Result;
use serde::Serialize;
use zonekit::{Mode, PlaneFlags, RuleKind, Session, ZoneSettings};

use crate::Context;
use crate::cli::{OutputFormat, ShowArgs};
use crate::ui;

#[derive(Serialize)]
struct ZoneView<'a> {
    zone: &'a str,
    offline: bool,
    services: Vec<String>,
    ports: Vec<String>,
    source_ports: Vec<String>,
    forward_ports: Vec<String>,
    masquerade: bool,
    rich_rules: Vec<String>,
    sources: Vec<String>,
    interfaces: Vec<String>,
    icmp_blocks: Vec<String>,
    icmp_block_inversion: bool,
    target: &'a str,
}

impl<'a> ZoneView<'a> {
    fn new(zone: &'a str, offline: bool, settings: &'a ZoneSettings) -> Self {
        let keys = |kind: RuleKind| -> Vec<String> {
            settings.entries_of(kind).map(|e| e.key()).collect()
        };
        Self {
            zone,
            offline,
            services: keys(RuleKind::Service),
            ports: keys(RuleKind::Port),
            source_ports: keys(RuleKind::SourcePort),
            forward_ports: keys(RuleKind::ForwardPort),
            masquerade: settings.masquerade,
            rich_rules: keys(RuleKind::RichRule),
            sources: keys(RuleKind::Source),
            interfaces: keys(RuleKind::Interface),
            icmp_blocks: keys(RuleKind::IcmpBlock),
            icmp_block_inversion: settings.icmp_block_inversion,
            target: settings.target.as_str(),
        }
    }
}

pub fn run(ctx: &Context, args: ShowArgs) -> Result<()> {
    let output = args.output.unwrap_or(ctx.config.output);
    let flags = PlaneFlags {
        permanent: Some(true),
        runtime: Some(false),
        offline: Some(args.offline || ctx.config.offline.unwrap_or(false)),
    };

    let session = Session::open(
        Box::new(ctx.config.backend()),
        flags,
        args.zone.as_deref(),
    )?;
    let settings = session.snapshot()?;
    let view = ZoneView::new(session.zone(), session.mode() == Mode::Offline, &settings);

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Text => print_view(&view),
    }
    Ok(())
}

fn print_view(view: &ZoneView<'_>) {
    let title = if view.offline {
        format!("Zone {} (permanent, offline)", view.zone)
    } else {
        format!("Zone {} (permanent)", view.zone)
    };
    ui::header(&title);
    ui::kv("target", view.target);
    ui::kv("services", &ui::list(&view.services));
    ui::kv("ports", &ui::list(&view.ports));
    ui::kv("source ports", &ui::list(&view.source_ports));
    ui::kv("forward ports", &ui::list(&view.forward_ports));
    ui::kv("masquerade", yes_no(view.masquerade));
    ui::kv("sources", &ui::list(&view.sources));
    ui::kv("interfaces", &ui::list(&view.interfaces));
    ui::kv("icmp blocks", &ui::list(&view.icmp_blocks));
    ui::kv("icmp block inversion", yes_no(view.icmp_block_inversion));
    if view.rich_rules.is_empty() {
        ui::kv("rich rules", &ui::list(&view.rich_rules));
    } else {
        ui::section("Rich rules");
        for rule in &view.rich_rules {
            ui::dim(rule);
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonekit::{RuleEntry, ZoneTarget};

    #[test]
    fn test_view_groups_entries_by_kind() {
        let mut settings = ZoneSettings::new();
        settings.add(RuleEntry::Service("ssh".into()));
        settings.add(RuleEntry::Port(zonekit::parse_port("8080/tcp").unwrap()));
        settings.add(RuleEntry::Interface("eth0".into()));
        settings.target = ZoneTarget::Drop;

        let view = ZoneView::new("public", false, &settings);
        assert_eq!(view.services, vec!["ssh"]);
        assert_eq!(view.ports, vec!["8080/tcp"]);
        assert_eq!(view.interfaces, vec!["eth0"]);
        assert!(view.sources.is_empty());
        assert_eq!(view.target, "DROP");
    }
}
