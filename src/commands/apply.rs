//! `fwconverge apply` - make a zone match the request.

use anyhow::Result;
use colored::Colorize;
use std::io::IsTerminal;
use zonekit::{Client, Mode, ReconciliationResult, Session};

use crate::Context;
use crate::cli::{ApplyArgs, OutputFormat};
use crate::config;
use crate::ui;

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let output = args.output.unwrap_or(ctx.config.output);
    let request = config::build_request(&args.request, &ctx.config)?;

    let client = Client::with_backend(Box::new(ctx.config.backend()));
    let desired = client.desired_state(&request)?;
    let session = client.connect(&desired)?;
    if output == OutputFormat::Text && session.mode() == Mode::Offline {
        ui::warn("firewalld is not running, only permanent configuration will be changed");
    }

    let preview = zonekit::reconcile(&desired, &session, true)?;
    if !preview.changed {
        let converged = ReconciliationResult {
            dry_run: args.dry_run,
            ..preview
        };
        report(ctx, output, &session, &converged);
        return Ok(());
    }
    if args.dry_run {
        report(ctx, output, &session, &preview);
        return Ok(());
    }

    if output == OutputFormat::Text {
        describe(&session, &preview);
        let interactive = std::io::stdin().is_terminal();
        if !args.yes && interactive && !confirm_proceed()? {
            println!();
            println!("  {} Aborted", "✗".red());
            return Ok(());
        }
    }

    let result = zonekit::reconcile(&desired, &session, false)?;
    report(ctx, output, &session, &result);
    Ok(())
}

fn report(ctx: &Context, output: OutputFormat, session: &Session, result: &ReconciliationResult) {
    match output {
        OutputFormat::Json => match serde_json::to_string_pretty(result) {
            Ok(json) => println!("{json}"),
            Err(e) => ui::error(&format!("Could not render result: {e}")),
        },
        OutputFormat::Text => {
            if result.dry_run && result.changed {
                describe(session, result);
                println!();
                ui::info(&format!(
                    "Dry run - {} change(s) pending, nothing applied",
                    result.actions.len()
                ));
            } else if result.changed {
                println!();
                ui::success(&format!(
                    "Applied {} change(s) to zone {}",
                    result.actions.len(),
                    result.zone
                ));
            } else if !ctx.quiet {
                ui::success(&format!("Zone {} already converged", result.zone));
            }
        }
    }
}

fn describe(session: &Session, result: &ReconciliationResult) {
    ui::header(&format!("Zone {}", result.zone));
    ui::kv("mode", mode_label(session.mode()));
    ui::kv("firewalld", session.version());
    println!();
    for action in &result.actions {
        ui::action(action);
    }
}

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Connected => "connected",
        Mode::Offline => "offline (permanent configuration only)",
    }
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    println!();
    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}
