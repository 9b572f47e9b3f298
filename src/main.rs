use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};

use thumbnail_repair::config::STORE_ENV_VAR;
use thumbnail_repair::reference::{PlaceholderFilter, classify, episode_artwork, is_displayable};
use thumbnail_repair::report::inspect;
use thumbnail_repair::{
    EpisodeCategory, EpisodeSelection, EpisodeStore, JsonFileStore, RepairConfig, RepairError,
    RepairJob, RepairOptions,
};

#[derive(Parser, Debug)]
#[command(
    name = "thumbnail-repair",
    version,
    about = "Inspect and repair podcast episode thumbnails"
)]
struct Cli {
    /// Configuration file; defaults to thumbnail-repair.config.json in the working directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON export of the episodes collection.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Repair every selected episode.
    Repair {
        /// Only episodes in this listing (repeatable).
        #[arg(long = "category", value_enum)]
        categories: Vec<CategoryArg>,
        /// Only these episode numbers (repeatable).
        #[arg(long = "episode")]
        episodes: Vec<u32>,
        /// Skip these episode numbers (repeatable).
        #[arg(long = "exclude")]
        exclude: Vec<u32>,
        /// Selection file with categories/include/exclude lists.
        #[arg(long)]
        selection: Option<PathBuf>,
        #[command(flatten)]
        run: RunArgs,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Repair a single episode.
    Fix {
        /// Episode number.
        episode: u32,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Show the image state of one episode.
    Inspect {
        /// Episode number.
        episode: u32,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Classify a raw image reference.
    Classify {
        /// Stored reference value.
        value: String,
    },
    /// Show the image source the site would render for a reference.
    Render {
        /// Stored reference value.
        value: String,
        /// Fallback image source; defaults to the configured placeholder.
        #[arg(long)]
        placeholder: Option<String>,
        /// Episode video link used when the reference is not renderable.
        #[arg(long)]
        youtube: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Decide and report without writing.
    #[arg(long)]
    dry_run: bool,
    /// Re-encode existing /uploads files as data URIs before falling back.
    #[arg(long)]
    inline_uploads: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CategoryArg {
    Upcoming,
    Past,
}

impl From<CategoryArg> for EpisodeCategory {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::Upcoming => EpisodeCategory::Upcoming,
            CategoryArg::Past => EpisodeCategory::Past,
        }
    }
}

/// How a command finished, mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success,
    /// At least one record could not be repaired.
    RecordsFailed,
    /// The requested episode does not exist.
    MissingEpisode,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::RecordsFailed => ExitCode::FAILURE,
            Status::MissingEpisode => ExitCode::from(2),
        }
    }
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();
    let env_store = env::var(STORE_ENV_VAR).ok();
    execute(cli, env_store.as_deref()).map(ExitCode::from)
}

fn execute(cli: Cli, env_store: Option<&str>) -> Result<Status> {
    let (config, config_dir) = match &cli.config {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            (RepairConfig::from_path(path)?, dir.to_path_buf())
        }
        None => (RepairConfig::discover(Path::new(".")), PathBuf::from(".")),
    };
    let store_path = cli.store.as_deref();

    match cli.command {
        Command::Repair {
            categories,
            episodes,
            exclude,
            selection,
            run,
            json,
        } => {
            let store = open_store(&config, store_path, env_store)?;
            let selection_file = selection.unwrap_or_else(|| config.selection_path(&config_dir));
            let selection = EpisodeSelection::load_from_path(&selection_file)?
                .with_categories(categories.into_iter().map(EpisodeCategory::from))
                .with_episodes(episodes)
                .excluding(exclude);

            let job = RepairJob::new(&store, run_options(&config, &run));
            let summary = job
                .run(&selection)
                .with_context(|| format!("failed to read {}", store.path().display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                let mode = if summary.dry_run { " (dry run)" } else { "" };
                println!("Summary{mode}:");
                println!("  scanned:        {}", summary.scanned);
                println!("  repaired:       {}", summary.repaired);
                println!("  inlined:        {}", summary.inlined);
                println!("  cleared:        {}", summary.cleared);
                println!("  already valid:  {}", summary.already_valid);
                println!("  unresolved:     {}", summary.unresolved);
                println!("  failed:         {}", summary.failed.len());
                for failure in &summary.failed {
                    println!("    {}: {}", failure.record_id, failure.error);
                }
            }

            Ok(if summary.is_clean() {
                Status::Success
            } else {
                Status::RecordsFailed
            })
        }
        Command::Fix { episode, run } => {
            let store = open_store(&config, store_path, env_store)?;
            let job = RepairJob::new(&store, run_options(&config, &run));
            match job.repair_episode(episode) {
                Ok(repair) => {
                    info!("episode {} outcome: {:?}", episode, repair.outcome);
                    println!(
                        "Episode {} ({}): {}{}",
                        episode,
                        repair.record_id,
                        repair.outcome.as_str(),
                        if repair.dry_run { " (dry run)" } else { "" }
                    );
                    Ok(Status::Success)
                }
                Err(err @ RepairError::MissingRecord(_)) => {
                    error!("{err}");
                    Ok(Status::MissingEpisode)
                }
                Err(err) => Err(err.into()),
            }
        }
        Command::Inspect { episode, json } => {
            let store = open_store(&config, store_path, env_store)?;
            let Some(record) = store.find_by_number(episode)? else {
                error!("episode {episode} not found");
                return Ok(Status::MissingEpisode);
            };
            let report = inspect(&record, &config.placeholder_filter()?, &config.placeholder);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
            Ok(Status::Success)
        }
        Command::Classify { value } => {
            let kind = classify(Some(value.as_str()));
            println!(
                "{kind}{}",
                if is_displayable(Some(value.as_str())) {
                    " (displayable)"
                } else {
                    ""
                }
            );
            Ok(Status::Success)
        }
        Command::Render {
            value,
            placeholder,
            youtube,
        } => {
            let placeholder = placeholder.unwrap_or_else(|| config.placeholder.clone());
            let filter: PlaceholderFilter = config.placeholder_filter()?;
            let source = match youtube.as_deref() {
                Some(url) => {
                    episode_artwork(&filter, Some(value.as_str()), None, Some(url), &placeholder)
                }
                None => filter
                    .renderable_url(Some(value.as_str()))
                    .unwrap_or(&placeholder)
                    .to_string(),
            };
            println!("{source}");
            Ok(Status::Success)
        }
    }
}

fn open_store(
    config: &RepairConfig,
    explicit: Option<&Path>,
    env_store: Option<&str>,
) -> Result<JsonFileStore> {
    let path = config.resolve_store_path(explicit, env_store)?;
    Ok(JsonFileStore::open(&path)?)
}

fn run_options(config: &RepairConfig, run: &RunArgs) -> RepairOptions {
    let inline_root = if run.inline_uploads {
        Some(config.uploads_dir.clone())
    } else {
        config.inline_root().map(Path::to_path_buf)
    };
    RepairOptions {
        dry_run: run.dry_run,
        inline_root,
    }
}
