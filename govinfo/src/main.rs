use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use docsift_govinfo::{spawn_schedule, GovInfoClient, GovInfoConfig};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "docsift-govinfo")]
#[command(about = "Fetch documents from the GovInfo API (key from GOVINFO_API_KEY)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one document and print or save its JSON
    Fetch {
        #[arg(long)]
        collection: String,
        #[arg(long)]
        id: String,
        /// Write the response here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Keep re-fetching a document on a fixed interval until interrupted
    Watch {
        #[arg(long)]
        collection: String,
        #[arg(long)]
        id: String,
        #[arg(long, default_value_t = 60)]
        interval_minutes: u64,
        /// Directory for timestamped snapshots; stdout when omitted
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    let client = GovInfoClient::new(GovInfoConfig::from_env())?;

    match cli.command {
        Commands::Fetch { collection, id, output } => {
            let body = client.fetch_document(&collection, &id).await?;
            let json = serde_json::to_string_pretty(&body)?;
            match output {
                Some(path) => {
                    if let Some(dir) = path.parent() {
                        fs::create_dir_all(dir)?;
                    }
                    fs::write(&path, json)?;
                    tracing::info!(path = %path.display(), "saved document");
                }
                None => println!("{json}"),
            }
        }
        Commands::Watch { collection, id, interval_minutes, output_dir } => {
            if interval_minutes == 0 {
                bail!("--interval-minutes must be at least 1");
            }
            if let Some(dir) = &output_dir {
                fs::create_dir_all(dir)?;
            }
            let (tx, mut rx) = mpsc::channel(4);
            let every = Duration::from_secs(interval_minutes * 60);
            let handle = spawn_schedule(client, collection, id, every, tx)?;
            tracing::info!(interval_minutes, "watching document");

            loop {
                tokio::select! {
                    doc = rx.recv() => {
                        let Some(doc) = doc else { break };
                        let json = serde_json::to_string_pretty(&doc)?;
                        match &output_dir {
                            Some(dir) => {
                                let name = format!("{}-{}-{}.json", doc.collection, doc.doc_id, doc.fetched_at.replace(':', ""));
                                fs::write(dir.join(name), json)?;
                            }
                            None => println!("{json}"),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("interrupted");
                        break;
                    }
                }
            }
            drop(rx);
            handle.abort();
        }
    }
    Ok(())
}
