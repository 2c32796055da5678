use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use std::sync::Mutex;
use tibiawiki_core::http::HttpWikiClient;
use tibiawiki_core::pipeline::{self, ProgressHook};
use tibiawiki_core::{GenerationOptions, Pipeline};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(
    name = "tibiawiki",
    version,
    about = "Generates a single-file SQLite database from TibiaWiki articles",
    long_about = None
)]
struct Cli {
    /// Path to log file
    #[arg(long, global = true, default_value = "/tmp/tibiawiki-sql.log")]
    log_file: std::path::PathBuf,

    /// Verbosity level (repeat for more verbose output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all wiki categories and build the database
    Generate {
        /// Output database file; an existing file is replaced
        #[arg(long, default_value = "tibia_database.db")]
        db_name: std::path::PathBuf,

        /// Directory for the on-disk image cache
        #[arg(long, default_value = "images")]
        images_dir: std::path::PathBuf,

        /// Do not fetch any images
        #[arg(long, default_value_t = false)]
        skip_images: bool,

        /// Drop articles listed in the wiki's Deprecated category
        #[arg(long, default_value_t = false)]
        skip_deprecated: bool,

        /// Category keys to leave out; dependents are disabled too
        #[arg(long, value_delimiter = ',')]
        skip_categories: Vec<String>,

        /// Wiki api.php endpoint
        #[arg(long, env = "TIBIAWIKI_ENDPOINT", default_value = tibiawiki_core::http::DEFAULT_ENDPOINT)]
        endpoint: String,
    },

    /// List the category keys accepted by --skip-categories
    Categories,
}

fn setup_logging(
    verbose: u8,
    log_file: &std::path::Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter_level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(filter_level.into());

    let file_appender = tracing_appender::rolling::never(
        log_file.parent().unwrap_or(std::path::Path::new(".")),
        log_file
            .file_name()
            .unwrap_or(std::ffi::OsStr::new("tibiawiki-sql.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().with_writer(std::io::stderr).with_ansi(true))
        .with(fmt::Layer::new().with_writer(non_blocking).with_ansi(false));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

/// One indicatif bar per pipeline stage.
struct ConsoleProgress {
    current: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    fn new() -> Self {
        ConsoleProgress {
            current: Mutex::new(None),
        }
    }
}

impl ProgressHook for ConsoleProgress {
    fn stage_started(&self, stage: &str, total: u64) {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template("{msg:>16} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_message(stage.to_string());
        if let Ok(mut current) = self.current.lock() {
            *current = Some(bar);
        }
    }

    fn advance(&self) {
        if let Ok(current) = self.current.lock() {
            if let Some(bar) = current.as_ref() {
                bar.inc(1);
            }
        }
    }

    fn stage_finished(&self, _stage: &str) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(bar) = current.take() {
                bar.finish_and_clear();
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(cli.verbose, &cli.log_file)?;

    match cli.command {
        Commands::Generate {
            db_name,
            images_dir,
            skip_images,
            skip_deprecated,
            skip_categories,
            endpoint,
        } => {
            if db_name.exists() {
                info!("Removing previous database {:?}", db_name);
                std::fs::remove_file(&db_name)?;
            }
            let conn = Connection::open(&db_name)?;
            let client = HttpWikiClient::with_endpoint(&endpoint)?;
            let options = GenerationOptions {
                skip_images,
                skip_deprecated,
                skip_categories,
                images_root: images_dir,
            };
            let pipeline = Pipeline::new(conn, client, options);
            pipeline.run(&ConsoleProgress::new())?;
            info!("Database written to {:?}", db_name);
        }
        Commands::Categories => {
            for key in pipeline::category_keys() {
                println!("{key}");
            }
        }
    }

    Ok(())
}
