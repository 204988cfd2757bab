use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phrasebook_core::{
    create_audio_service, create_sentence_generator, load_config, validate_config,
    ContentPipeline, Database, DictionaryAnnotator, GenerationQueue, GenerationWorker,
    MemoryDictionary, SqliteJobStore, SqliteVocabularyStore, StatusNotifier,
};

use phrasebook_server::api::{create_router, WsBroadcaster};
use phrasebook_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("PHRASEBOOK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Sentence provider: {}", config.generator.provider.as_str());

    // Open the shared database
    let db = Database::open(&config.database.path).context("Failed to open database")?;
    let vocabulary = Arc::new(SqliteVocabularyStore::new(db.clone()));
    let jobs = Arc::new(
        SqliteJobStore::new(db).with_backoff_gate(config.worker.enforce_backoff_gate),
    );
    info!("Stores initialized");

    // Collaborators
    let generator =
        create_sentence_generator(&config.generator).context("Failed to create sentence generator")?;
    let audio = create_audio_service(&config.audio);
    info!(
        "Using sentence generator '{}' and audio service '{}'",
        generator.name(),
        audio.name()
    );

    // WebSocket broadcaster doubles as the status notifier
    let ws_broadcaster = WsBroadcaster::default();
    let notifier: Arc<dyn StatusNotifier> = Arc::new(ws_broadcaster.clone());

    let pipeline = ContentPipeline::new(
        vocabulary.clone(),
        generator,
        audio,
        Arc::new(DictionaryAnnotator::new()),
        Arc::new(MemoryDictionary::new()),
        Arc::clone(&notifier),
    );

    let queue = Arc::new(GenerationQueue::new(
        jobs.clone(),
        vocabulary.clone(),
        Arc::clone(&notifier),
        config.worker.default_sentence_count,
    ));

    let worker = Arc::new(GenerationWorker::new(
        config.worker.clone(),
        jobs,
        vocabulary,
        pipeline,
        notifier,
    ));

    if config.worker.enabled {
        worker.start().await.context("Failed to start generation worker")?;
    } else {
        info!("Worker disabled in config");
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        queue,
        Arc::clone(&worker),
        ws_broadcaster,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let the current job finish before exiting
    info!("Server shutting down...");
    if worker.is_running() {
        worker.stop().await;
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
