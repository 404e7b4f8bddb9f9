//! Resolve command: show the effective configuration without touching the build.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use crate::commands::BindingsArgs;
use crate::domain::config::{self, ResolvedConfig};
use crate::output::OutputContext;

/// Arguments for the resolve command.
#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub bindings: BindingsArgs,
}

/// Run the resolve command.
///
/// # Errors
///
/// Returns an error if the JSON report cannot be serialized.
pub fn run(ctx: &OutputContext, args: &ResolveArgs, json: bool) -> Result<()> {
    let version = args.bindings.buildpack_version.as_deref();
    let resolved = config::resolve(args.bindings.document(), || config::tool_name(version));

    if json {
        let report = match &resolved {
            Some(config) => json!({
                "configured": true,
                "downloadUrl": config.download_url(),
                "warnings": config.warnings().iter().map(ToString::to_string).collect::<Vec<_>>(),
                "config": config.redacted(),
            }),
            None => json!({ "configured": false }),
        };
        let rendered =
            serde_json::to_string_pretty(&report).context("serializing configuration")?;
        println!("{rendered}");
        return Ok(());
    }

    match resolved {
        Some(config) => print_human(ctx, &config),
        None => println!("not configured"),
    }
    Ok(())
}

fn print_human(ctx: &OutputContext, config: &ResolvedConfig) {
    let shown = config.redacted();
    let unset = "-";

    ctx.kv("Download URL:", &shown.download_url());
    ctx.kv("Version:", shown.version.as_deref().unwrap_or(unset));
    ctx.kv("Verb:", shown.verb.as_deref().unwrap_or(unset));
    ctx.kv("Use PIC:", if shown.use_pic { "yes" } else { "no" });
    ctx.kv(
        "Custom command:",
        shown.custom_command.as_deref().unwrap_or(unset),
    );
    ctx.kv("Proxy:", shown.proxy.as_deref().unwrap_or(unset));
    for (key, value) in &shown.arguments {
        ctx.kv(&format!("{key}:"), value);
    }
    for (key, value) in &shown.environment {
        ctx.kv(&format!("env {key}:"), value);
    }
    for warning in config.warnings() {
        ctx.kv("Warning:", &warning.to_string());
    }
}
