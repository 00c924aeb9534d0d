use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use alertbot::{
    config::{self, StoreBackend},
    routes,
    services::{
        alert_engine::{AlertEngine, EngineOptions},
        alert_store::{AlertStore, MemoryAlertStore},
        coingecko::CoinGeckoClient,
        db_init,
        dispatcher::CommandDispatcher,
        market_data::MarketData,
        mongo_store::MongoAlertStore,
        scheduler::{self, SchedulerConfig},
        telegram::{self, TelegramClient},
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::load();

    if settings.telegram_token.trim().is_empty() {
        anyhow::bail!("TELEGRAM_TOKEN is missing in .env");
    }

    let store: Arc<dyn AlertStore> = match settings.store_backend {
        StoreBackend::Mongo => {
            let client = mongodb::Client::with_uri_str(&settings.mongodb_uri)
                .await
                .context("failed to connect to MongoDB")?;
            let db = client.database(&settings.mongodb_db);
            db_init::ensure_indexes(&db)
                .await
                .context("failed to create MongoDB indexes")?;
            Arc::new(MongoAlertStore::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store, users and alerts are lost on exit");
            Arc::new(MemoryAlertStore::new())
        }
    };

    let market: Arc<dyn MarketData> = Arc::new(
        CoinGeckoClient::new(
            &settings.coingecko_api_url,
            &settings.vs_currency,
            settings.fetch_timeout,
        )
        .context("failed to build market data client")?,
    );

    let telegram_client = Arc::new(TelegramClient::new(
        &settings.telegram_api_url,
        settings.telegram_token.clone(),
        settings.send_timeout,
    ));

    let engine = Arc::new(AlertEngine::new(
        store.clone(),
        market.clone(),
        telegram_client.clone(),
        EngineOptions {
            fetch_timeout: settings.fetch_timeout,
            send_timeout: settings.send_timeout,
            fetch_concurrency: settings.fetch_concurrency,
        },
    ));

    let timers = scheduler::spawn(
        engine,
        SchedulerConfig {
            sweep_every: settings.sweep_interval,
            digest_at: settings.digest_time,
        },
    );
    tracing::info!(
        sweep_secs = settings.sweep_interval.as_secs(),
        digest_at = %settings.digest_time,
        "scheduler started"
    );

    let dispatcher = Arc::new(CommandDispatcher::new(store.clone(), market));
    let bot = tokio::spawn(telegram::run_command_loop(
        telegram_client,
        dispatcher,
        settings.telegram_poll_timeout_secs,
    ));

    let ip = settings
        .host
        .parse::<std::net::IpAddr>()
        .context("HOST is not an IP address")?;
    let addr = SocketAddr::from((ip, settings.port));
    tracing::info!("health endpoint on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, routes::app(AppState { store }))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("health server failed")?;

    timers.shutdown();
    bot.abort();
    tracing::info!("shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
    }
}
