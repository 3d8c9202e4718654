use anyhow::Context;
use clap::{Parser, Subcommand};
use radar_engine::{RadarEngine, RunOptions, MAX_COMPETITORS};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "radar-cli")]
#[command(about = "Competitive radar: compare a site against its competitors")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze a subject site against 1 to 5 competitors and print the report
    Analyze {
        /// Subject site (bare domain or URL)
        subject: String,

        /// Competitor site; repeat for each competitor
        #[arg(short, long = "competitor", required = true)]
        competitors: Vec<String>,

        /// Skip the search-presence and performance providers
        #[arg(long)]
        quick: bool,

        /// Keyword hint for the search-presence provider; repeatable
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,

        /// Print only the summary fields instead of the full report
        #[arg(long)]
        summary_only: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = radar_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?config, "configuration loaded");

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Analyze {
            subject,
            competitors,
            quick,
            keywords,
            summary_only,
        }) => {
            if competitors.len() > MAX_COMPETITORS {
                anyhow::bail!("at most {MAX_COMPETITORS} competitors can be compared per run");
            }
            let engine =
                RadarEngine::from_config(&config).context("failed to build radar engine")?;
            let report = engine
                .run_analysis(&subject, &competitors, &RunOptions { quick, keywords })
                .await?;

            let summary = serde_json::to_string_pretty(&report.summary())?;
            if summary_only {
                println!("{summary}");
            } else {
                println!("{}", serde_json::to_string_pretty(&report)?);
                eprintln!("{summary}");
            }
        }
        None => println!("radar-cli: run `radar-cli analyze --help` to get started"),
    }

    Ok(())
}
