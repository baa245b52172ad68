use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsift_core::entities::EntityModel;
use docsift_core::{Rag, SemanticSearch, DEFAULT_TOP_K};
use docsift_ingest::{ingest, load_dir, IngestedDocument};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "docsift-ingest")]
#[command(about = "Extract text from PDF/DOCX/TXT files and search it in memory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the extracted text and metadata of one file as JSON
    Extract {
        #[arg(long)]
        input: String,
    },
    /// Rank the documents of a directory against a query
    Query {
        /// Directory of documents
        #[arg(long)]
        input: String,
        #[arg(long)]
        q: String,
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        k: usize,
    },
    /// Print the best matching document of a directory for a question
    Ask {
        #[arg(long)]
        input: String,
        #[arg(long)]
        question: String,
    },
    /// Extract named entities from one file
    Entities {
        #[arg(long)]
        input: String,
        /// JSON pattern file; the builtin rules are used when omitted
        #[arg(long)]
        patterns: Option<String>,
    },
}

#[derive(Serialize)]
struct QueryHit<'a> {
    rank: usize,
    doc_id: usize,
    score: f32,
    title: String,
    path: &'a std::path::Path,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { input } => {
            let doc = ingest(&input).with_context(|| format!("extracting {input}"))?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Commands::Query { input, q, k } => {
            let docs = load_dir(&input)?;
            let search = SemanticSearch::new(texts(&docs))?;
            for (rank, (doc_id, score)) in search.query(&q, k).into_iter().enumerate() {
                let doc = &docs[doc_id];
                let hit = QueryHit { rank: rank + 1, doc_id, score, title: doc.title(), path: &doc.path };
                println!("{}", serde_json::to_string(&hit)?);
            }
        }
        Commands::Ask { input, question } => {
            let docs = load_dir(&input)?;
            let rag = Rag::new(texts(&docs));
            println!("{}", rag.ask(&question)?);
        }
        Commands::Entities { input, patterns } => {
            let model = match patterns {
                Some(p) => EntityModel::load(p)?,
                None => EntityModel::builtin(),
            };
            let doc = ingest(&input).with_context(|| format!("extracting {input}"))?;
            for mention in model.extract(&doc.text) {
                println!("{}", serde_json::to_string(&mention)?);
            }
        }
    }
    Ok(())
}

fn texts(docs: &[IngestedDocument]) -> Vec<String> {
    docs.iter().map(|d| d.text.clone()).collect()
}
