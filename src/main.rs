use anyhow::Context;
use clap::Parser;
use cwagent_confgen::cli::{Cli, Commands, ConfigAction};
use cwagent_confgen::document::{parse_document, to_pretty_json, DocumentFormat};
use cwagent_confgen::{
    event, logging, parse_control_text, BaselineConfig, BatchOrchestrator, ConfigMerger,
    FsObjectStore, MissingSectionPolicy, RuntimeConfig,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(opts) => {
            let config = RuntimeConfig::load(opts.config.as_deref())?;
            logging::init(&config.log_level);
            info!(
                "Starting cwagent-confgen batch run (container '{}', config file {:?})",
                config.container, opts.config
            );

            let payload = tokio::fs::read_to_string(&opts.events)
                .await
                .with_context(|| format!("Failed to read events '{}'", opts.events.display()))?;
            let notifications = event::decode_event(&payload)?;

            let store = Arc::new(FsObjectStore::new(&opts.root));
            let orchestrator = BatchOrchestrator::new(store, config);
            let report = orchestrator.process_batch(&notifications).await.into_result()?;

            for outcome in &report.outcomes {
                println!("{}", serde_json::to_string(&outcome.documents)?);
            }
        }
        Commands::Merge(opts) => {
            logging::init("warn");
            let content = std::fs::read_to_string(&opts.baseline).with_context(|| {
                format!("Failed to read baseline '{}'", opts.baseline.display())
            })?;
            let format = DocumentFormat::from_key(&opts.baseline.to_string_lossy());
            let value = parse_document(&content, format)?;
            let baseline = BaselineConfig::new(opts.os, value)
                .map_err(|_| anyhow::anyhow!("Baseline root must be an object"))?;

            let control = std::fs::read_to_string(&opts.control).with_context(|| {
                format!("Failed to read control file '{}'", opts.control.display())
            })?;
            let directives = parse_control_text(&control)?;

            let policy = if opts.create_missing {
                MissingSectionPolicy::Create
            } else {
                MissingSectionPolicy::Skip
            };
            let resolved = ConfigMerger::new(policy).merge(&baseline, &directives)?;
            println!("{}", to_pretty_json(&resolved.document)?);
        }
        Commands::Config(opts) => {
            let config = RuntimeConfig::load(opts.config.as_deref())?;
            logging::init(&config.log_level);
            match opts.action {
                ConfigAction::Show => {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                ConfigAction::Validate => {
                    info!("Configuration is valid");
                }
            }
        }
        Commands::Version => {
            println!("cwagent-confgen {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
