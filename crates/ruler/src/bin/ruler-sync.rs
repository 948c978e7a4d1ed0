//! ruler-sync — push one alert definition to the ruler and verify it.
//!
//! Reads a rule template from disk, applies the given overrides, renders the
//! single-rule group named after the definition id, then pushes it and reads
//! it back. `--dry-run` prints the group instead; `--delete` removes it.

use std::time::Duration;

use alertsync_core::{AlertDefinitionRow, Config, ParameterOverrides};
use alertsync_ruler::Reconciler;
use anyhow::Context;
use clap::Parser;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

// ── CLI ─────────────────────────────────────────────────────────────

/// Sync one alert definition to the ruler.
#[derive(Parser, Debug)]
#[command(name = "ruler-sync", version, about)]
struct Cli {
    /// Path to the rule template YAML.
    #[arg(long)]
    template: Option<String>,

    /// Definition id; also the rule group name.
    #[arg(long)]
    id: Uuid,

    /// Tenant that owns the definition.
    #[arg(long, env = "ALERTSYNC_TENANT")]
    tenant: String,

    /// Evaluation interval in seconds.
    #[arg(long, default_value_t = 60)]
    interval: u64,

    /// Threshold override.
    #[arg(long, allow_negative_numbers = true)]
    threshold: Option<i64>,

    /// Duration override in seconds.
    #[arg(long)]
    duration: Option<u64>,

    /// Push the rule in its disabled form.
    #[arg(long)]
    disabled: bool,

    /// Print the rendered group and exit without contacting the ruler.
    #[arg(long, conflicts_with = "delete")]
    dry_run: bool,

    /// Remove the definition's group instead of pushing it.
    #[arg(long)]
    delete: bool,

    /// Give up after this many seconds.
    #[arg(long, env = "RULER_SYNC_DEADLINE_SECS", default_value_t = 30)]
    deadline_secs: u64,
}

impl Cli {
    fn overrides(&self) -> ParameterOverrides {
        ParameterOverrides {
            threshold: self.threshold,
            duration_secs: self.duration,
            enabled: self.disabled.then_some(false),
        }
    }

    fn row(&self) -> anyhow::Result<AlertDefinitionRow> {
        let path = self
            .template
            .as_deref()
            .context("--template is required unless --delete is given")?;
        let template = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read template {path}"))?;
        let row = AlertDefinitionRow::new(self.id, &self.tenant, template, self.interval);
        Ok(row.with_overrides(self.overrides()))
    }
}

// ── Main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    alertsync_core::config::load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    let reconciler = Reconciler::from_config(&config).context("failed to build ruler client")?;

    let deadline = Instant::now() + Duration::from_secs(cli.deadline_secs);

    if cli.delete {
        reconciler
            .remove_definition_config_by(cli.id, &cli.tenant, deadline)
            .await?;
        info!(definition_id = %cli.id, "group removed");
        return Ok(());
    }

    let row = cli.row()?;

    if cli.dry_run {
        let group = reconciler.build_group(&row)?;
        print!("{}", group.to_yaml()?);
        return Ok(());
    }

    let group = reconciler.update_definition_config_by(&row, deadline).await?;
    info!(
        group = %group.name,
        namespace = %reconciler.client().namespace(),
        "group pushed and verified"
    );
    Ok(())
}
