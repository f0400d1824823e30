mod config;
mod directory;
mod print;
mod record;
mod search;
mod selection;
mod store;
mod translit;
mod ui;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, Source};
use directory::{Directory, Settings};
use print::PrintSink;
use store::RecordStore;

const LOG_ENV: &str = "MATDAR_LOG";

#[derive(Parser, Debug)]
#[command(name = "matdar", about = "Search a voter list from the terminal")]
struct Cli {
    /// Configuration file (defaults to ~/.config/matdar/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Voter list to load: a JSON file path or an http(s) URL
    #[arg(long, value_name = "PATH|URL", global = true)]
    source: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the voter list and print compact results
    Search(SearchArgs),
    /// Show every field of one voter by EPIC id
    Show(ShowArgs),
    /// Render matching voters for printing
    Print(PrintArgs),
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// List every voter instead of filtering
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Emit matching records as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Search term (matches name, relative's name, house number, id)
    query: Option<String>,
}

#[derive(Args, Debug)]
struct ShowArgs {
    id: String,
}

#[derive(Args, Debug)]
struct PrintArgs {
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Write to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    query: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;
    if let Some(source) = cli.source.as_deref() {
        config.source.location = Source::parse(source);
    }

    match cli.command {
        Some(command) => {
            init_cli_logging();
            log_config(&config);
            let store = store::load(&config.source)?;
            let mut directory = Directory::new(store, Settings::from_config(&config));
            match command {
                Command::Search(args) => handle_search(args, &mut directory),
                Command::Show(args) => handle_show(args, &mut directory),
                Command::Print(args) => handle_print(args, &mut directory),
            }
        }
        None => run_tui(&config),
    }
}

fn init_cli_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// The TUI owns the terminal, so events go to a log file instead.
fn init_tui_logging() -> Result<PathBuf> {
    let dir = config::data_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory at {}", dir.display()))?;
    let path = dir.join(format!("{}.log", config::APP_NAME));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file at {}", path.display()))?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(path)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn log_config(config: &Config) {
    match &config.config_path {
        Some(path) => tracing::info!(path = %path.display(), "loaded configuration"),
        None => tracing::info!("no configuration file, using defaults"),
    }
    tracing::debug!(source = %config.source.location.display(), mode = ?config.search.mode, "settings");
}

fn run_tui(config: &Config) -> Result<()> {
    match init_tui_logging() {
        Ok(path) => tracing::debug!(path = %path.display(), "logging to file"),
        Err(err) => eprintln!("warning: logging disabled: {:#}", err),
    }
    log_config(config);

    let (store, load_error) = match store::load(&config.source) {
        Ok(store) => (store, None),
        Err(err) => {
            let err = anyhow::Error::new(err);
            tracing::error!(error = %format!("{err:#}"), "initial load failed");
            (RecordStore::empty(), Some(format!("{:#}", err)))
        }
    };

    let directory = Directory::new(store, Settings::from_config(config));
    let mut app = ui::app::App::new(config, directory, load_error);
    app.run()
}

fn run_listing(directory: &mut Directory, all: bool, query: Option<&str>) {
    if all {
        directory.show_all();
    } else {
        directory.set_query(query.unwrap_or_default());
        directory.search();
    }
}

fn handle_search(args: SearchArgs, directory: &mut Directory) -> Result<()> {
    run_listing(directory, args.all, args.query.as_deref());
    let results = directory.results();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No matches");
        return Ok(());
    }

    let labels = directory.labels();
    for record in results {
        let card = print::compact_card(record, labels);
        println!("{}", card.title);
        println!("  {}", card.subtitle);
    }

    Ok(())
}

fn handle_show(args: ShowArgs, directory: &mut Directory) -> Result<()> {
    let found = directory.select_id(&args.id);
    let Some(record) = directory.selected().filter(|_| found) else {
        bail!("no voter with id \"{}\"", args.id);
    };

    let labels = directory.labels();
    let fields = print::detail_fields(record, labels);
    let width = fields
        .iter()
        .map(|field| field.label.chars().count())
        .max()
        .unwrap_or(0);

    println!("{}", record.full_name);
    for field in fields {
        let pad = width - field.label.chars().count();
        println!("  {}:{} {}", field.label, " ".repeat(pad), field.value);
    }

    Ok(())
}

fn handle_print(args: PrintArgs, directory: &mut Directory) -> Result<()> {
    run_listing(directory, args.all, args.query.as_deref());
    let Some(document) = directory.print_document() else {
        println!("No matches");
        return Ok(());
    };

    match args.output {
        Some(path) => {
            let sink = print::FileSink::new(path);
            sink.print(&document)?;
            eprintln!("Wrote {} record(s) to {}", document.len(), sink.describe());
        }
        None => print!("{}", document.to_text()),
    }

    Ok(())
}
