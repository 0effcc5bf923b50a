use std::sync::Arc;

use anyhow::Context;
use clap::{Arg, Command};
use tracing_subscriber::EnvFilter;

use cutover_core::{
    ChangeRequest, CutoverConfig, HttpCatalogSource, JsonlAuditLog, MutationOrchestrator,
    StatusReader,
};
use cutover_core::catalog::CatalogSource;
use cutover_runtime::ComposeController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Command::new("cutover")
        .version(cutover_core::VERSION)
        .about("Switch an active configuration value and restart the managed service")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Path to the cutover config TOML (defaults apply when omitted)"),
        )
        .subcommand(
            Command::new("apply")
                .about("Patch the managed key, restart the service, verify, roll back on failure")
                .arg(
                    Arg::new("value")
                        .long("value")
                        .required(true)
                        .help("New value for the managed key"),
                )
                .arg(
                    Arg::new("actor")
                        .long("actor")
                        .default_value("operator")
                        .help("Actor identity recorded in the annotation and audit log"),
                ),
        )
        .subcommand(
            Command::new("current")
                .about("Show the currently active value from the status file"),
        )
        .subcommand(
            Command::new("catalog")
                .about("Fetch and print the catalog of selectable values"),
        );

    let matches = cli.get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => CutoverConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => CutoverConfig::new(),
    };

    match matches.subcommand() {
        Some(("apply", args)) => {
            let value = args.get_one::<String>("value").cloned().unwrap_or_default();
            let actor = args.get_one::<String>("actor").cloned().unwrap_or_default();

            let controller = Arc::new(
                ComposeController::new(
                    &config.service.compose_dir,
                    &config.service.container_name,
                )
                .with_command_timeout(config.service.command_timeout()),
            );
            let audit = Arc::new(JsonlAuditLog::new(&config.audit_log_path));
            let orchestrator = MutationOrchestrator::new(config, controller, audit);

            println!("Applying {value}...");
            let outcome = orchestrator
                .apply_change(ChangeRequest::now(value, actor))
                .outcome()
                .await;
            println!("{outcome}");
            std::process::exit(if outcome.is_success() { 0 } else { 1 });
        }
        Some(("current", _)) => {
            let reader = StatusReader::from_config(&config.status);
            let value = reader.read_current_value()?;

            // Best effort: decorate with the catalog label when reachable.
            let label = fetch_catalog(&config)
                .await
                .ok()
                .and_then(|catalog| catalog.label_for_value(&value).map(str::to_string));
            match label {
                Some(label) => println!("{label} ({value})"),
                None => println!("{value}"),
            }
        }
        Some(("catalog", _)) => {
            let catalog = fetch_catalog(&config).await?;
            if catalog.is_empty() {
                println!("Catalog is empty");
            }
            for (key, entry) in catalog.iter() {
                println!("{key}: {} -> {}", entry.label, entry.value);
            }
        }
        _ => {}
    }

    Ok(())
}

async fn fetch_catalog(config: &CutoverConfig) -> anyhow::Result<cutover_core::Catalog> {
    anyhow::ensure!(
        !config.catalog.url.is_empty(),
        "catalog.url is not configured"
    );
    let source = HttpCatalogSource::new(config.catalog.url.as_str(), config.catalog.fetch_timeout());
    source.fetch().await.context("fetching catalog")
}
