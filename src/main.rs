use anyhow::{bail, Context};
use frame_heartbeat::chain::{ChainReader, RpcChainReader, RpcSigner, RpcTransport, Signer};
use frame_heartbeat::orchestration::{ClaimExecutor, Collector};
use frame_heartbeat::registry::load_registry_dir;
use frame_heartbeat::{api, config::Config, db::init_db, Heartbeat, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        eprintln!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    // Initialize database and registry
    let pool = init_db(&config.database_path)
        .await
        .with_context(|| format!("failed to initialize database at {}", config.database_path))?;
    let repo = Arc::new(Repository::new(pool));

    if let Some(dir) = &config.registry_dir {
        let entities = load_registry_dir(dir, config.chain_id).context("failed to load registry")?;
        let written = repo
            .upsert_entities(&entities)
            .await
            .context("failed to import registry")?;
        tracing::info!("Imported {} registry records from {}", written, dir.display());
    }

    // Chain access
    let transport = Arc::new(
        RpcTransport::new(config.rpc_url.clone(), config.rpc_timeout)
            .context("failed to build RPC client")?,
    );
    let remote_chain_id = transport
        .chain_id()
        .await
        .with_context(|| format!("failed to query chain id from {}", config.rpc_url))?;
    if remote_chain_id != config.chain_id {
        bail!(
            "RPC endpoint reports chain {} but CHAIN_ID is {}",
            remote_chain_id,
            config.chain_id
        );
    }

    let reader: Arc<dyn ChainReader> = Arc::new(RpcChainReader::new(
        transport.clone(),
        config.pool_initializer.clone(),
    ));
    let signer: Arc<dyn Signer> = Arc::new(RpcSigner::new(
        transport,
        config.wallet_address.clone(),
        config.receipt_timeout,
        config.receipt_poll_interval,
    ));

    let heartbeat = Arc::new(Heartbeat::new(
        repo.clone(),
        Collector::new(reader, config.wallet_address.clone(), config.max_concurrency),
        ClaimExecutor::new(
            signer,
            config.pool_initializer.clone(),
            config.max_concurrency,
        ),
        config.history_retention,
    ));

    // Create router
    let app = api::create_router(api::AppState::new(repo, heartbeat));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!(
        "Server listening on {} (chain {}, wallet {})",
        addr,
        config.chain_id,
        config.wallet_address
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
