//! Voice Interviewer Server entry point

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use interviewer_config::{load_settings, Settings};
use interviewer_llm::GeminiBackend;
use interviewer_persistence::{PersistenceLayer, ScyllaConfig};
use interviewer_pipeline::SpeechSynthesizer;
use interviewer_server::{create_router, AppState};
use interviewer_transport::ChannelPublisher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env}.toml > config/default.toml > defaults
    let env = std::env::var("INTERVIEWER_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        },
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing();

    tracing::info!("Starting Voice Interviewer Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    // Service handles are constructed once here and injected; no lazy
    // first-use initialization anywhere downstream
    let reasoning = Arc::new(GeminiBackend::new(config.reasoning.clone())?);
    tracing::info!(model = %config.reasoning.model, "Reasoning backend initialized");

    let tts = Arc::new(SpeechSynthesizer::new(config.speech.tts.clone())?);
    tracing::info!(voice = %config.speech.tts.voice, "TTS engine initialized");

    let publisher = Arc::new(ChannelPublisher::new(config.channel.clone())?);
    tracing::info!(api_url = %config.channel.api_url, "Channel publisher initialized");

    let persistence = if config.persistence.enabled {
        tracing::info!("Initializing ScyllaDB persistence layer...");
        let scylla_config = ScyllaConfig {
            hosts: config.persistence.scylla_hosts.clone(),
            keyspace: config.persistence.keyspace.clone(),
            replication_factor: config.persistence.replication_factor,
        };
        match interviewer_persistence::init(scylla_config).await {
            Ok(layer) => {
                tracing::info!(
                    hosts = ?config.persistence.scylla_hosts,
                    keyspace = %config.persistence.keyspace,
                    "ScyllaDB persistence initialized"
                );
                layer
            },
            Err(e) => {
                tracing::error!("Failed to initialize ScyllaDB: {}. Falling back to in-memory.", e);
                PersistenceLayer::in_memory()
            },
        }
    } else {
        tracing::info!("Persistence disabled, using in-memory stores");
        PersistenceLayer::in_memory()
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(
        config,
        reasoning,
        tts,
        publisher,
        persistence.metrics,
        persistence.evidence,
    );

    // Sweep expired sessions in the background
    let _cleanup_shutdown = state.sessions.start_cleanup_task();

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,interviewer=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
