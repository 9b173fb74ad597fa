/// rolo: contact recommendation engine CLI
///
/// Commands:
/// - embed: regenerate embeddings for all profiles and upsert them
/// - recommend: paginated recommendations for a user
/// - search: quota-charged external people search
/// - quota: remaining searches for a user today
/// - import: load profiles from a JSON file into the directory
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rolo::api::RoloEngine;
use rolo::config::{RoloConfig, StoreBackend};
use rolo::directory::{ContactDirectory, SqliteDirectory};
use rolo::embeddings::{EmbeddingEngine, HttpEmbeddingProvider};
use rolo::profile::Profile;
use rolo::search::cache::SqliteCache;
use rolo::search::quota::QuotaStore;
use rolo::search::{ExternalSearch, HttpPeopleSearch, SearchFilters};
use rolo::store::{HnswStore, RelationalStore, VectorStore};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "rolo")]
#[command(about = "Contact recommendation engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file path (TOML)
    #[arg(long, default_value = ".rolo/config.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate and upsert embeddings for all users and connections
    Embed,

    /// Paginated contact recommendations for a user
    Recommend {
        #[arg(long)]
        user: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Recommend other users instead of connections
        #[arg(long)]
        people: bool,
    },

    /// Quota-charged external people search
    Search {
        #[arg(long)]
        user: String,

        #[arg(long)]
        query: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// School filters (repeatable)
        #[arg(long)]
        school: Vec<String>,

        /// Company filters (repeatable)
        #[arg(long)]
        company: Vec<String>,
    },

    /// Remaining external searches for a user today
    Quota {
        #[arg(long)]
        user: String,
    },

    /// Load profiles from a JSON file into the contact directory
    Import {
        /// JSON array of profiles
        #[arg(long)]
        file: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("rolo=info"))
        .unwrap();

    let logs_dir = ".rolo/logs";
    fs::create_dir_all(logs_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create logs directory: {}", e);
    });

    let file_appender = rolling::daily(logs_dir, "rolo.log");
    let (non_blocking_file, file_guard) = non_blocking(file_appender);
    let (non_blocking_console, console_guard) = non_blocking(std::io::stderr());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking_console)
                .with_target(false)
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking_file)
                .with_target(true)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    // Guards must outlive main; leak them for the process lifetime
    std::mem::forget(file_guard);
    std::mem::forget(console_guard);
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn api_key_from_env(var: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| {
        warn!("{} is not set; API calls will be unauthenticated", var);
        String::new()
    })
}

fn build_engine(config: &RoloConfig) -> Result<RoloEngine<HttpEmbeddingProvider>> {
    ensure_parent_dir(&config.directory_db)?;
    ensure_parent_dir(&config.store.path)?;

    let provider = HttpEmbeddingProvider::new(
        &config.embedding.endpoint,
        &api_key_from_env(&config.embedding.api_key_env),
        &config.embedding.model,
        config.embedding.dimensions,
    );
    let engine = EmbeddingEngine::with_max_batch_size(provider, config.embedding.max_batch_size);

    let store: Arc<Mutex<dyn VectorStore>> = match config.store.backend {
        StoreBackend::Hnsw => Arc::new(Mutex::new(HnswStore::new(config.embedding.dimensions))),
        StoreBackend::Sqlite => Arc::new(Mutex::new(RelationalStore::open(
            &config.store.path,
            config.embedding.dimensions,
        )?)),
    };

    let directory: Arc<Mutex<dyn ContactDirectory>> =
        Arc::new(Mutex::new(SqliteDirectory::open(&config.directory_db)?));

    let search_api = Arc::new(HttpPeopleSearch::new(
        &config.search.endpoint,
        &api_key_from_env(&config.search.api_key_env),
    ));
    let quota = QuotaStore::open(&config.directory_db)?;
    let cache = Arc::new(SqliteCache::open(&config.directory_db)?);
    let search = ExternalSearch::new(search_api, quota, cache, config.search.daily_limit)
        .with_cache_ttl(chrono::Duration::hours(config.search.cache_ttl_hours));

    Ok(RoloEngine::new(engine, store, directory, search))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = RoloConfig::load(&cli.config).context("Failed to load config")?;

    match cli.command {
        Commands::Embed => {
            let engine = build_engine(&config)?;
            let response = engine.run_embedding_pipeline().await;
            print_json(&response)?;
        }
        Commands::Recommend {
            user,
            limit,
            offset,
            people,
        } => {
            let engine = build_engine(&config)?;
            let response = if people {
                engine.get_people_recommendations(&user, limit, offset)
            } else {
                engine.get_recommendations(&user, limit, offset)
            };
            print_json(&response)?;
        }
        Commands::Search {
            user,
            query,
            limit,
            school,
            company,
        } => {
            let engine = build_engine(&config)?;
            let filters = SearchFilters {
                school,
                company,
                threshold: None,
            };
            let response = engine.search_external(&user, &query, limit, &filters).await;
            print_json(&response)?;
        }
        Commands::Quota { user } => {
            let engine = build_engine(&config)?;
            let response = engine.queries_left(&user);
            print_json(&response)?;
        }
        Commands::Import { file } => {
            ensure_parent_dir(&config.directory_db)?;
            let contents = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file))?;
            let profiles: Vec<Profile> =
                serde_json::from_str(&contents).context("Failed to parse profiles")?;

            let directory = SqliteDirectory::open(&config.directory_db)?;
            for profile in &profiles {
                directory.upsert_contact(profile)?;
            }
            info!("Imported {} profiles into {}", profiles.len(), config.directory_db);
            println!("{{\"success\": true, \"imported\": {}}}", profiles.len());
        }
    }

    Ok(())
}
