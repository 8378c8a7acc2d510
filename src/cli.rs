use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{self, AppConfig};
use crate::export::IssueExporter;
use crate::importer;
use crate::mapping::MappingRegistry;
use crate::model::document::Document;
use crate::source::JsonFileSource;
use crate::store::{DocumentStore, JsonFileStore};
use crate::trackers::{self, TrackerKind};

#[derive(Parser, Debug)]
#[command(name = "rtc2tracker")]
#[command(about = "Migrate RTC work items into Jira and GitHub")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.rtc2tracker/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Transform source work items into normalized documents
    Import,
    /// Export normalized documents to the configured trackers
    Export {
        /// Only export to this tracker
        #[arg(long, value_enum)]
        tracker: Option<TrackerKind>,
    },
    /// Import, then export
    Run {
        #[arg(long, value_enum)]
        tracker: Option<TrackerKind>,
    },
    /// Show how many documents each tracker has linked
    Status,
    /// List source attributes that have no mapping
    Attributes,
}

pub async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.unwrap_or_else(config::default_config_path);
    let config = config::load_config(&path)?;

    match cli.command {
        Command::Import => handle_import(&config),
        Command::Export { tracker } => handle_export(&config, tracker).await,
        Command::Run { tracker } => {
            handle_import(&config)?;
            handle_export(&config, tracker).await
        }
        Command::Status => handle_status(&config),
        Command::Attributes => handle_attributes(&config),
    }
}

fn source(config: &AppConfig) -> Result<JsonFileSource> {
    let cfg = config
        .source
        .as_ref()
        .context("No [source] path configured. Point it at the extracted work items JSON")?;
    Ok(JsonFileSource::new(&cfg.path))
}

fn handle_import(config: &AppConfig) -> Result<()> {
    let source = source(config)?;
    let mut store = JsonFileStore::open(&config.store_path())?;
    let mut registry = MappingRegistry::with_defaults();

    let report = importer::import_all(&source, &mut registry, &mut store)?;
    println!("Imported {} work items", report.imported);
    if !report.failed.is_empty() {
        println!("  {} failed: {}", report.failed.len(), report.failed.join(", "));
    }
    Ok(())
}

async fn handle_export(config: &AppConfig, only: Option<TrackerKind>) -> Result<()> {
    let mut store = JsonFileStore::open(&config.store_path())?;

    for kind in selected(only) {
        let Some(client) = trackers::create_tracker(kind, config)? else {
            tracing::warn!(tracker = %kind, "Not configured, skipping export");
            println!("{kind}: not configured");
            continue;
        };

        let exporter = IssueExporter::new(client);
        if let Err(e) = exporter.is_configured().await {
            tracing::warn!(error = %e, "Skipping export");
            println!("{e}");
            continue;
        }

        let report = exporter.export(&mut store).await;
        println!(
            "{kind}: {} created, {} already linked, {} found by title, {} failed",
            report.created,
            report.linked,
            report.discovered,
            report.failed.len()
        );
        if !report.failed.is_empty() {
            println!("  failed: {}", report.failed.join(", "));
        }
    }
    Ok(())
}

fn handle_status(config: &AppConfig) -> Result<()> {
    let store = JsonFileStore::open(&config.store_path())?;
    println!("{} documents in {}", store.len(), config.store_path().display());

    for kind in TrackerKind::ALL {
        let field = kind.link_field();
        let linked = store.select(&|d: &Document| d.link(field).is_some()).count();
        println!(
            "  {kind}: {linked} exported, {} pending",
            store.len() - linked
        );
    }
    Ok(())
}

fn handle_attributes(config: &AppConfig) -> Result<()> {
    let source = source(config)?;
    let unmapped = importer::unmapped_attributes(&source, &MappingRegistry::with_defaults())?;
    if unmapped.is_empty() {
        println!("All source attributes have a mapping");
        return Ok(());
    }
    println!("Attributes without a mapping:");
    for identifier in unmapped {
        println!("  {identifier}");
    }
    Ok(())
}

fn selected(only: Option<TrackerKind>) -> Vec<TrackerKind> {
    match only {
        Some(kind) => vec![kind],
        None => TrackerKind::ALL.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rtc2tracker").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_export_with_tracker() {
        let cli = parse(&["export", "--tracker", "jira"]);
        assert_eq!(
            cli.command,
            Command::Export {
                tracker: Some(TrackerKind::Jira)
            }
        );
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = parse(&["status", "--config", "/tmp/c.toml", "-v"]);
        assert_eq!(cli.command, Command::Status);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(cli.verbose);
    }

    #[test]
    fn unknown_tracker_is_rejected() {
        let result = Cli::try_parse_from(["rtc2tracker", "export", "--tracker", "trello"]);
        assert!(result.is_err());
    }

    #[test]
    fn selected_defaults_to_all_trackers() {
        assert_eq!(selected(None), TrackerKind::ALL.to_vec());
        assert_eq!(selected(Some(TrackerKind::Github)), vec![TrackerKind::Github]);
    }

    #[test]
    fn import_without_source_fails_with_hint() {
        let err = handle_import(&AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("[source]"));
    }
}
