use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

use tvguide_core::time::parse_compact_date;
use tvguide_etl::{Config, SourceKind};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "tvguide", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Harvest listings and write the XMLTV guide
    ///
    /// Fetches one day of listings for every channel in the source's lineup
    /// and writes them as an XMLTV document (e.xml by default).
    ///
    /// Channels are fetched in lineup order. Transient failures (timeouts,
    /// 5xx responses, rate limiting) are retried with exponential backoff;
    /// a channel that still fails is left out of the guide and reported at
    /// the end. The output file is replaced atomically, so a web server
    /// publishing it never serves a half-written guide.
    ///
    /// Sources:
    /// - erw:   the erw.cc JSON listing API (fast, 3s timeout per channel)
    /// - tvmao: TVMao schedule pages (slower, weekday-based pages)
    Fetch {
        /// Listing source (default: from config, else erw)
        #[arg(long, short)]
        source: Option<SourceKind>,

        /// Day to harvest as YYYYMMDD (default: today in UTC+8)
        #[arg(long, short, value_parser = parse_compact_date)]
        date: Option<NaiveDate>,

        /// Output file (default: from config, else ./e.xml)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Only harvest these channels (repeatable)
        #[arg(long = "channel", short = 'c')]
        channels: Vec<String>,

        /// Also print the harvested guide as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// List the channels a source provides
    Channels {
        /// Listing source (default: from config, else erw)
        #[arg(long, short)]
        source: Option<SourceKind>,
    },
    /// Print the public URL of the guide or of a channel logo
    Url {
        /// Print the logo URL for this channel name instead
        #[arg(long)]
        logo: Option<String>,
    },
    /// Inspect or edit configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print one setting, or the whole config file when no key is given
    Get { key: Option<String> },
    /// Set a value in the config file
    Set { key: String, value: String },
    /// Print the config file path
    Path,
    /// Create the config file with defaults
    Init,
    /// Print an example config file
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            source,
            date,
            output,
            channels,
            json,
        } => {
            let config = match output {
                Some(path) => Config::load_with_output_path(path)?,
                None => Config::load()?,
            };
            let kind = source.unwrap_or(config.source);
            commands::run_fetch(&config, kind, date, channels, json).await?;
        }
        Commands::Channels { source } => {
            let config = Config::load()?;
            commands::list_channels(&config, source.unwrap_or(config.source))?;
        }
        Commands::Url { logo } => {
            let config = Config::load()?;
            commands::show_url(&config, logo.as_deref())?;
        }
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config::show_config()?,
            ConfigAction::Get { key } => commands::config::get_config(key)?,
            ConfigAction::Set { key, value } => commands::config::set_config(key, value)?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Init => commands::config::init_config()?,
            ConfigAction::Example => commands::config::show_example()?,
        },
    }

    Ok(())
}
