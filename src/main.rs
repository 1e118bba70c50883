use clap::Parser;
use domainmap_api::{DomainService, RestApi};
use domainmap_semantic::{DistanceEngine, EngineConfig, HashingVectorSource, OllamaVectorSource, VectorSource};
use domainmap_storage::DomainStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// News topic tree with semantic distances between sibling domains
#[derive(Parser, Debug)]
#[command(name = "domainmap")]
#[command(about = "Hierarchical news domains with semantic distances", long_about = None)]
struct Args {
    /// Address to bind the HTTP API to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// HTTP API port
    #[arg(long, default_value_t = 5001)]
    http_port: u16,

    /// JSON data file; created from the built-in taxonomy if missing.
    /// Without it the store lives in memory only.
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Embedding dimension
    #[arg(long, default_value_t = 256)]
    embedding_dim: usize,

    /// Deadline for one wave of embedding calls, in milliseconds
    #[arg(long, default_value_t = 2000)]
    embed_timeout_ms: u64,

    /// Embedding calls in flight at once
    #[arg(long, default_value_t = 16)]
    embed_concurrency: usize,

    /// Largest level that gets every pair computed
    #[arg(long, default_value_t = 200)]
    exhaustive_limit: usize,

    /// Neighbours kept per domain on larger levels
    #[arg(long, default_value_t = 8)]
    nearest_k: usize,

    /// Ollama server for embeddings; hashed text embeddings are used otherwise
    #[arg(long)]
    ollama_url: Option<String>,

    /// Ollama embedding model
    #[arg(long, default_value = "nomic-embed-text")]
    ollama_model: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting domainmap v{}", env!("CARGO_PKG_VERSION"));

    let store = match &args.data_file {
        Some(path) => {
            info!("Data file: {:?}", path);
            DomainStore::open(path)?
        }
        None => {
            info!("No data file given, using the built-in taxonomy in memory");
            DomainStore::with_default_seed()?
        }
    };
    if let Err(e) = store.check_integrity() {
        warn!("Domain tree has integrity problems, affected paths will fail: {}", e);
    }
    info!("Store initialized with {} domains", store.len());

    let embed_timeout = Duration::from_millis(args.embed_timeout_ms);
    let source: Arc<dyn VectorSource> = match &args.ollama_url {
        Some(url) => Arc::new(OllamaVectorSource::new(url, &args.ollama_model, args.embedding_dim, embed_timeout)?),
        None => Arc::new(HashingVectorSource::new(args.embedding_dim)),
    };

    let config = EngineConfig {
        exhaustive_limit: args.exhaustive_limit,
        nearest_k: args.nearest_k,
        embed_timeout,
        embed_concurrency: args.embed_concurrency,
        ..EngineConfig::default()
    };
    let engine = DistanceEngine::new(source, config)?;
    info!(
        "Distance engine ready: source={}, dimension={}",
        engine.source_name(),
        args.embedding_dim
    );

    let service = Arc::new(DomainService::new(Arc::new(store), Arc::new(engine)));

    // The blocking reqwest client must never be dropped inside a runtime;
    // only the actix system thread and the signal runtime below use one.
    let host = args.host.clone();
    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(service, &host, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("domainmap started successfully");
    info!("HTTP API: http://{}:{}/domains", args.host, args.http_port);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
            }
            _ = tokio::task::spawn_blocking(move || {
                http_handle.join().ok();
            }) => {
                info!("HTTP server stopped");
            }
        }
    });
    runtime.shutdown_background();

    info!("Shutting down...");
    Ok(())
}
