use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod dataset_file;
mod session;

use session::HeadlessSession;

#[derive(Parser)]
#[command(name = "contactview")]
#[command(about = "Drive the contact-map navigation engine without a canvas")]
struct Cli {
    /// Viewer configuration (TOML); defaults apply when omitted
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Print the resulting state as JSON instead of a bookmark
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Navigate to a locus such as `chr1:1,000,000-2,000,000` or `chr2 chr3`
    Goto {
        #[arg(long, short)]
        dataset: PathBuf,

        #[arg(long, short)]
        locus: String,
    },
    /// Validate a bookmark against a dataset and print its normalised form
    Bookmark {
        #[arg(long, short)]
        dataset: PathBuf,

        #[arg(long, short)]
        state: String,
    },
    /// Replay a burst of wheel ticks starting from a locus
    Wheel {
        #[arg(long, short)]
        dataset: PathBuf,

        #[arg(long, short)]
        locus: String,

        /// Scale factor of each tick, in arrival order
        #[arg(long = "factor", short, required = true)]
        factors: Vec<f64>,

        #[arg(long, default_value = "400")]
        anchor_x: f64,

        #[arg(long, default_value = "400")]
        anchor_y: f64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => shared::AppConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => shared::AppConfig::default(),
    };

    let session = match &cli.command {
        Commands::Goto { dataset, locus } => {
            let session = HeadlessSession::open(&config.viewer, dataset).await?;
            session
                .viewer()
                .goto_locus(locus)
                .await
                .with_context(|| format!("Cannot navigate to `{locus}`"))?;
            session
        }
        Commands::Bookmark { dataset, state } => {
            let session = HeadlessSession::open(&config.viewer, dataset).await?;
            session
                .viewer()
                .set_state_from_bookmark(state)
                .await
                .with_context(|| format!("Bookmark `{state}` is not valid for this dataset"))?;
            session
        }
        Commands::Wheel {
            dataset,
            locus,
            factors,
            anchor_x,
            anchor_y,
        } => {
            let session = HeadlessSession::open(&config.viewer, dataset).await?;
            session
                .viewer()
                .goto_locus(locus)
                .await
                .with_context(|| format!("Cannot navigate to `{locus}`"))?;
            session.replay_wheel(factors, *anchor_x, *anchor_y).await?;
            session
        }
    };

    let report = session.report()?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.bookmark);
    }
    Ok(())
}
