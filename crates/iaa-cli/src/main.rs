//! iaa CLI: inspect and maintain investigations auto-assigner artifacts
//!
//! Commands: path, show, record, stats

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use tracing::Level;

use iaa_core::{ArtifactsBuild, AssignerConfig, ResponsibilityRecord, StaticServerSettings};
use iaa_store::{
    ArtifactPathResolver, StatisticsReporter, StatisticsStore, SuggestionsArtifact,
    SuggestionsStore,
};

#[derive(Parser)]
#[command(name = "iaa")]
#[command(version)]
#[command(about = "Investigations auto-assigner artifact tool")]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SettingsArgs {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server UUID, overrides the configuration file
    #[arg(long, global = true)]
    server_uuid: Option<String>,

    /// Plugin data directory, overrides the configuration file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the suggestions file path for a build
    Path {
        /// The build's artifacts directory
        #[arg(long)]
        artifacts_dir: PathBuf,
        /// Create the plugin directory if it is missing
        #[arg(long)]
        create: bool,
    },
    /// Print stored suggestions for a build as JSON
    Show {
        #[arg(long)]
        artifacts_dir: PathBuf,
        /// Only the suggestion for this test name id
        #[arg(long)]
        test: Option<String>,
    },
    /// Add a suggestion to a build's suggestions file
    Record {
        #[arg(long)]
        artifacts_dir: PathBuf,
        #[arg(long, default_value_t = 0)]
        build_id: u64,
        #[arg(long)]
        test: String,
        #[arg(long)]
        investigator: String,
        #[arg(long)]
        reason: String,
    },
    /// Print plugin usage statistics
    Stats,
}

#[derive(Serialize)]
struct PathOutput {
    path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli { settings, command, .. } = cli;

    match command {
        Commands::Path {
            artifacts_dir,
            create,
        } => {
            let build = ArtifactsBuild::new(0, artifacts_dir);
            let resolver = ArtifactPathResolver::new();
            let path = if create {
                Some(resolver.resolve(&build)?)
            } else {
                resolver.resolve_if_exists(&build)
            };
            print_json(&PathOutput { path })
        }
        Commands::Show {
            artifacts_dir,
            test,
        } => {
            let config = load_config(&settings)?;
            let build = ArtifactsBuild::new(0, artifacts_dir);
            let artifact = open_artifact(&config, Arc::new(StatisticsReporter::in_memory()));
            match test {
                Some(test) => print_json(&artifact.find_for_test(&build, &test)),
                None => {
                    let records = match ArtifactPathResolver::new().resolve_if_exists(&build) {
                        Some(path) => artifact.store().read(&path)?,
                        None => Vec::new(),
                    };
                    print_json(&records)
                }
            }
        }
        Commands::Record {
            artifacts_dir,
            build_id,
            test,
            investigator,
            reason,
        } => {
            let config = load_config(&settings)?;
            let build = ArtifactsBuild::new(build_id, artifacts_dir);
            let statistics = Arc::new(open_statistics(&config)?);
            let artifact = open_artifact(&config, Arc::clone(&statistics));
            let outcome = artifact
                .append_results(
                    &build,
                    vec![ResponsibilityRecord::new(test, investigator, reason)],
                )
                .with_context(|| format!("failed to record suggestion for build {build_id}"))?;
            statistics.save().context("failed to save statistics")?;
            print_json(&outcome)
        }
        Commands::Stats => {
            let config = load_config(&settings)?;
            if config.plugin_data_dir.is_none() {
                bail!("no plugin data directory; pass --data-dir or set plugin_data_dir");
            }
            let statistics = open_statistics(&config)?;
            print!("{}", statistics.generate_report());
            Ok(())
        }
    }
}

fn load_config(args: &SettingsArgs) -> anyhow::Result<AssignerConfig> {
    let mut config = match (&args.config, &args.server_uuid) {
        (Some(path), _) => AssignerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        (None, Some(uuid)) => AssignerConfig::new(uuid.clone()),
        (None, None) => bail!("either --config or --server-uuid is required"),
    };
    if let Some(uuid) = &args.server_uuid {
        config.server_uuid = uuid.clone();
    }
    if let Some(dir) = &args.data_dir {
        config.plugin_data_dir = Some(dir.clone());
    }
    Ok(config)
}

fn open_statistics(config: &AssignerConfig) -> anyhow::Result<StatisticsReporter> {
    match config.plugin_data_dir.as_deref() {
        Some(dir) => Ok(StatisticsReporter::new(
            StatisticsStore::new(dir),
            config.statistics_enabled,
        )?),
        None => Ok(StatisticsReporter::in_memory()),
    }
}

fn open_artifact(
    config: &AssignerConfig,
    statistics: Arc<StatisticsReporter>,
) -> SuggestionsArtifact<StaticServerSettings> {
    SuggestionsArtifact::new(
        ArtifactPathResolver::new(),
        SuggestionsStore::new(StaticServerSettings::new(config.server_identity())),
        statistics,
    )
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
