use mushroom::cache::{CacheConfig, CacheGroup, RoutingTable};
use mushroom::config::{NodeConfig, USAGE};
use mushroom::coord::{CoordinationStore, HttpStoreClient, MemoryStore};
use mushroom::loader::FileImageLoader;
use mushroom::membership::MembershipService;
use std::sync::Arc;
use std::time::Duration;

const GROUP_NAME: &str = "images";
const STATS_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    if std::env::args().any(|arg| arg == "--help" || arg == "-h") {
        eprintln!("{}", USAGE);
        std::process::exit(0);
    }

    let config = match NodeConfig::from_env_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting node on {} as {}", config.listen, config.advertise);

    // 1. Coordination store:
    let mut embedded: Option<Arc<MemoryStore>> = None;
    let store: Arc<dyn CoordinationStore> = match &config.store {
        Some(address) => match HttpStoreClient::connect(address).await {
            Ok(client) => Arc::new(client),
            Err(e) => {
                tracing::error!("Cannot run without a membership authority: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("Using embedded coordination store");
            let memory = MemoryStore::new();
            embedded = Some(memory.clone());
            memory
        }
    };

    // 2. Cache group:
    let routing = RoutingTable::new(config.advertise.clone());
    let loader = Arc::new(FileImageLoader::new(config.image_src.clone()));
    let group = CacheGroup::new(
        GROUP_NAME,
        loader,
        routing.clone(),
        CacheConfig {
            main_cache_bytes: config.cache_bytes,
            hot_cache_bytes: config.hot_cache_bytes,
            ..CacheConfig::default()
        },
    );

    // 3. Membership:
    let membership = MembershipService::new(store, routing, &config.peers_path);
    let state = membership.start().await;
    tracing::info!("Membership state: {:?}", state);

    // 4. Spawn stats reporter:
    let stats_group = group.clone();
    let stats_membership = membership.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATS_INTERVAL);

        loop {
            interval.tick().await;
            let stats = stats_group.snapshot();
            let view = stats_membership.view();
            tracing::info!(
                "Cache stats: gets={} hits={} local_loads={} peer_loads={} deduped={} served={}B",
                stats.group.gets,
                stats.group.cache_hits,
                stats.group.local_loads,
                stats.group.peer_loads,
                stats.group.loads_deduped,
                stats.group.bytes_served
            );
            tracing::info!(
                "  main: {} item(s) {}B, hot: {} item(s) {}B",
                stats.main_cache.items,
                stats.main_cache.bytes,
                stats.hot_cache.items,
                stats.hot_cache.bytes
            );
            tracing::info!(
                "Cluster: {} peer(s) at revision {} ({:?}, watch {:?})",
                view.peers.len(),
                view.revision,
                view.state,
                view.watch
            );
        }
    });

    // 5. HTTP Router:
    let mut app = mushroom::server::router(group.clone(), membership.clone())
        .merge(mushroom::cache::handlers::router(group));

    let mut served_store: Option<Arc<MemoryStore>> = None;
    if config.serve_store
        && let Some(memory) = embedded
    {
        tracing::info!("Serving embedded coordination store to peers");
        app = app.merge(mushroom::coord::handlers::router(memory.clone()));
        served_store = Some(memory);
    }

    // 6. Start HTTP server:
    tracing::info!("HTTP server listening on {}", config.listen);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    // Deregister before draining: open store watches would otherwise hold the drain.
    let shutdown = async move {
        shutdown_signal().await;
        mushroom::server::prepare_shutdown(membership, served_store).await;
    };
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received, leaving cluster");
}
