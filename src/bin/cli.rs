//! vectordb CLI.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::*;
use std::io::BufRead;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vectordb::config::StoreConfig;
use vectordb::demo::{self, PREVIEW_CHARS};
use vectordb::embeddings;
use vectordb::filter::{DocumentFilter, Predicate};
use vectordb::{Document, SearchRequest, VectorStore};

#[derive(Parser)]
#[command(name = "vectordb")]
#[command(about = "Document vector store - RocksDB + embeddings + metadata filters", long_about = None)]
struct Cli {
    /// Config file (default: ~/.vectordb/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Persist directory
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    /// Collection name
    #[arg(long, global = true)]
    collection: Option<String>,

    /// Embedding model (e.g. sentence-transformers/all-MiniLM-L6-v2, text-embedding-3-small, hashing)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the sample documents and run the three example queries
    Demo {
        /// Delete the persist directory first
        #[arg(long)]
        reset: bool,
    },

    /// Ingest documents from a JSONL file ({"page_content": ..., "metadata": {...}} per line)
    Ingest {
        #[arg(long)]
        file: PathBuf,
    },

    /// Similarity search
    Search {
        /// Search query
        query: String,

        /// Number of results
        #[arg(long, short, default_value = "4")]
        k: usize,

        /// Metadata filter, e.g. '{"access_level": "Executive"}'
        #[arg(long)]
        filter: Option<String>,

        /// Only documents whose content contains this text
        #[arg(long)]
        contains: Option<String>,

        /// Minimum relevance score
        #[arg(long)]
        min_score: Option<f32>,

        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show a document by ID
    Get { id: Uuid },

    /// Delete documents by ID
    Delete {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },

    /// Count documents in the collection
    Count,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vectordb={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = StoreConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.path {
        config.persist_directory = path.clone();
    }
    if let Some(collection) = &cli.collection {
        config.collection = collection.clone();
    }
    if let Some(model) = &cli.model {
        config.embedding_model = model.clone();
    }
    Ok(config)
}

async fn open_store(config: &StoreConfig) -> anyhow::Result<VectorStore> {
    let embedder = embeddings::provider_for_model(&config.embedding_model)
        .await
        .with_context(|| format!("loading embedding model {}", config.embedding_model))?;
    let store = VectorStore::from_config(config, embedder)
        .with_context(|| format!("opening {}", config.persist_directory.display()))?;
    Ok(store)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Demo { reset } => {
            if reset && config.persist_directory.exists() {
                std::fs::remove_dir_all(&config.persist_directory)?;
            }

            let store = open_store(&config).await?;

            println!("{}", "1. Indexing documents with metadata...".cyan());
            let documents = demo::sample_documents();
            let count = documents.len();
            store.add_documents(documents).await?;
            store.persist()?;
            println!(
                "   {} Indexed {} documents into {}",
                "✓".green(),
                count,
                config.persist_directory.display()
            );

            for result in demo::run_scenarios(&store).await? {
                println!(
                    "\n{}",
                    format!("--- Scenario {}: {} ---", result.scenario.label, result.scenario.title).bold()
                );
                println!("Query: '{}'", result.scenario.query);
                for line in demo::render(&result) {
                    println!("{}", line);
                }
            }
        }

        Commands::Ingest { file } => {
            let reader = std::io::BufReader::new(
                std::fs::File::open(&file).with_context(|| format!("opening {}", file.display()))?,
            );

            let mut documents = Vec::new();
            for (lineno, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let doc: Document = serde_json::from_str(&line)
                    .with_context(|| format!("{}:{}: invalid document", file.display(), lineno + 1))?;
                documents.push(doc);
            }

            let store = open_store(&config).await?;
            let ids = store.add_documents(documents).await?;
            store.persist()?;

            println!(
                "{} Ingested {} documents ({} in collection '{}')",
                "✓".green(),
                ids.len(),
                store.count()?,
                store.collection().name
            );
        }

        Commands::Search { query, k, filter, contains, min_score, format } => {
            let mut request = SearchRequest::new(k);
            if let Some(filter) = filter {
                let clause: serde_json::Value =
                    serde_json::from_str(&filter).context("--filter must be JSON")?;
                request = request.filter(Predicate::from_where(&clause)?);
            }
            if let Some(text) = contains {
                request = request.document_filter(DocumentFilter::Contains(text));
            }
            if let Some(min) = min_score {
                request = request.min_relevance(min);
            }

            let store = open_store(&config).await?;
            let hits = store.search(&query, &request).await?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else if hits.is_empty() {
                println!("{}", "No documents found matching the filter criteria.".yellow());
            } else {
                println!("{} Found {} results:", "✓".green(), hits.len());
                for (i, hit) in hits.iter().enumerate() {
                    println!(
                        "  {}. [{:.3}] {}: {}...",
                        i + 1,
                        hit.relevance,
                        hit.document.metadata_str("source").unwrap_or_else(|| hit.id.to_string()),
                        demo::preview(&hit.document.page_content, PREVIEW_CHARS)
                    );
                }
            }
        }

        Commands::Get { id } => {
            let store = open_store(&config).await?;
            match store.get(id)? {
                Some(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
                None => bail!("Document not found: {}", id),
            }
        }

        Commands::Delete { ids } => {
            let store = open_store(&config).await?;
            let deleted = store.delete(&ids)?;
            store.persist()?;
            println!("{} Deleted {} of {} documents", "✓".green(), deleted, ids.len());
        }

        Commands::Count => {
            let store = open_store(&config).await?;
            println!("{}", store.count()?);
        }
    }

    Ok(())
}
