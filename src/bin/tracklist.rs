use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use tracklist::cuefile::{cue_path_for, generate_cue_sheet, is_settled, write_cue_file};
use tracklist::logging::init_logging;
use tracklist::normalize::parse_cue_timestamp;
use tracklist::report::generate_report;
use tracklist::service::{FileService, HttpService, TracklistService};
use tracklist::{reconcile, Config, Error, IdentificationRecord, Performance, PerformanceMetadata, Result, Tracklist};

/// Reconcile crowd-sourced identifications into one tracklist per DJ set
#[derive(Parser, Debug)]
#[command(name = "tracklist", version)]
struct Cli {
    /// Config file (default: ~/.state/tracklist/defaults.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of performance JSON files
    #[arg(long, global = true)]
    store: Option<String>,

    /// Base URL of the remote tracklist API (takes precedence over --store)
    #[arg(long, global = true)]
    api: Option<String>,

    /// Records closer than this many seconds share a time slot
    #[arg(long, global = true)]
    min_track_gap: Option<f64>,

    /// Reject records below this confidence
    #[arg(long, global = true)]
    min_confidence: Option<f64>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile a performance stored in a JSON file
    Reconcile {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Audio file name for the CUE sheet
        #[arg(long)]
        audio: Option<String>,
        /// Write the CUE sheet next to the audio file instead of printing it
        #[arg(long, requires = "audio")]
        write: bool,
    },
    /// Fetch a performance from the store or API and reconcile it
    Show {
        performance_id: String,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Submit a manual identification
    Submit {
        performance_id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        /// Position in the set, e.g. 1:23:45 or 47:30
        #[arg(long)]
        at: Option<String>,
    },
    /// Vote for a candidate in an open conflict
    Vote { conflict_id: String, record_id: String },
    /// Re-run identification from a source and merge the result
    Reidentify {
        performance_id: String,
        source_url: String,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Print the effective configuration
    Config {
        /// Persist the effective configuration
        #[arg(long)]
        save: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Json,
    Cue,
}

impl Cli {
    /// Saved config with command-line overrides applied on top.
    fn effective_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        let cmdline = Config {
            api_url: self.api.clone(),
            store_dir: self.store.clone(),
            min_track_gap: self.min_track_gap,
            min_confidence: self.min_confidence,
            ..Default::default()
        };
        config.merge(&cmdline);
        config.validate()?;
        Ok(config)
    }
}

fn service_for(config: &Config) -> Result<Box<dyn TracklistService>> {
    if let Some(url) = &config.api_url {
        return Ok(Box::new(HttpService::new(url)));
    }
    if let Some(dir) = &config.store_dir {
        return Ok(Box::new(FileService::new(dir)));
    }
    Err(Error::Config("no data source: pass --api or --store, or set api_url/store_dir".to_string()))
}

/// Read a performance file.  A bare array of records is accepted too and
/// named after the file.
fn read_performance(path: &Path) -> Result<Performance> {
    let content = fs::read_to_string(path)?;
    if let Ok(performance) = serde_json::from_str::<Performance>(&content) {
        return Ok(performance);
    }
    let records: Vec<IdentificationRecord> = serde_json::from_str(&content)?;
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("performance")
        .to_string();
    Ok(Performance {
        id,
        metadata: PerformanceMetadata::default(),
        records,
    })
}

fn render(format: Format, id: &str, metadata: &PerformanceMetadata, tracklist: &Tracklist, audio: &str) -> Result<String> {
    Ok(match format {
        Format::Text => generate_report(id, metadata, tracklist),
        Format::Json => serde_json::to_string_pretty(tracklist)? + "\n",
        Format::Cue => generate_cue_sheet(metadata, audio, tracklist),
    })
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.effective_config()?;
    let thresholds = config.thresholds();

    match cli.command {
        Command::Reconcile {
            file,
            format,
            audio,
            write,
        } => {
            let performance = read_performance(&file)?;
            let tracklist = reconcile(&performance.records, &performance.metadata, &thresholds);
            let audio = audio.unwrap_or_else(|| format!("{}.mp3", performance.id));

            if write {
                let content = generate_cue_sheet(&performance.metadata, &audio, &tracklist);
                let path = cue_path_for(Path::new(&audio), is_settled(&tracklist));
                write_cue_file(&path, &content)?;
                println!("{}", path.display());
            } else {
                print!("{}", render(format, &performance.id, &performance.metadata, &tracklist, &audio)?);
            }
        }
        Command::Show { performance_id, format } => {
            let service = service_for(&config)?;
            let performance = service.fetch_performance(&performance_id)?;
            let tracklist = reconcile(&performance.records, &performance.metadata, &thresholds);
            let audio = format!("{}.mp3", performance.id);
            print!("{}", render(format, &performance.id, &performance.metadata, &tracklist, &audio)?);
        }
        Command::Submit {
            performance_id,
            title,
            artist,
            at,
        } => {
            let timestamp = at.as_deref().map(parse_cue_timestamp).transpose()?;
            let record = IdentificationRecord::manual(&title, &artist, timestamp);
            let service = service_for(&config)?;
            service.submit_record(&performance_id, &record)?;
            println!("Submitted {} to {}", record.id, service.name());
        }
        Command::Vote { conflict_id, record_id } => {
            let service = service_for(&config)?;
            let outcome = service.vote(&conflict_id, &record_id);
            if !outcome.success {
                println!("Vote was not recorded");
                process::exit(1);
            }
            match (outcome.resolved, outcome.winner_id.as_deref()) {
                (Some(true), Some(winner)) if outcome.earns_reward(&record_id) => {
                    println!("Conflict resolved in your favour ({}), reward earned", winner)
                }
                (Some(true), Some(winner)) => println!("Conflict resolved, winner {}", winner),
                _ => println!("Vote recorded, conflict still open"),
            }
        }
        Command::Reidentify {
            performance_id,
            source_url,
            format,
        } => {
            let service = service_for(&config)?;
            let metadata = service.fetch_performance(&performance_id)?.metadata;
            let records = service.refresh_from_source(&performance_id, &source_url)?;
            let tracklist = reconcile(&records, &metadata, &thresholds);
            let audio = format!("{}.mp3", performance_id);
            print!("{}", render(format, &performance_id, &metadata, &tracklist, &audio)?);
        }
        Command::Config { save } => {
            config.print("Effective configuration");
            if save {
                let path = match &cli.config {
                    Some(path) => {
                        config.save_to(path)?;
                        path.clone()
                    }
                    None => config.save()?,
                };
                println!("Saved to {}", path.display());
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
