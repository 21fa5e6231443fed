use chrono::{Duration, Utc};
use std::sync::Arc;
use uniassist::{
    build_router, config::AppConfig, db, gemini_client::GeminiClient, services::bootstrap::bootstrap,
    store::PgStore, AppState,
};

/// Finished speech tasks are kept this long so the page can still fetch the audio.
const SPEECH_RETENTION_MINUTES: i64 = 30;
/// Live chat contexts untouched this long are dropped; the registry row stays.
const SESSION_IDLE_HOURS: i64 = 2;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match db::create_pool(&config.database_url, config.db_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Failed to connect to the database: {}", e);
            std::process::exit(1);
        }
    };
    let store = Arc::new(PgStore::new(pool));

    tracing::info!("Initializing Gemini client ({})...", config.gemini_model);
    let gemini = Arc::new(GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone()));

    let state = Arc::new(AppState::new(store.clone(), gemini.clone(), gemini, config.gemini_model.clone()));

    if let Err(e) = bootstrap(store.as_ref(), &state.admin_auth, &config).await {
        tracing::error!("❌ Startup provisioning failed: {}", e);
        std::process::exit(1);
    }

    let cleanup_state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(300)).await;
            let removed = cleanup_state
                .speech
                .cleanup_finished(Duration::minutes(SPEECH_RETENTION_MINUTES), Utc::now())
                .await;
            if removed > 0 {
                tracing::debug!("🧹 Dropped {} finished speech tasks", removed);
            }

            let evicted = cleanup_state
                .sessions
                .evict_idle(Duration::hours(SESSION_IDLE_HOURS), Utc::now())
                .await;
            if evicted > 0 {
                tracing::debug!("🧹 Evicted {} idle session contexts", evicted);
            }
        }
    });

    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("❌ Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("listening on {}", config.bind_addr);

    // ConnectInfo feeds the per-IP login rate limit
    if let Err(e) = axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,uniassist=trace,sqlx=info,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,uniassist=info,sqlx=warn,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer().with_target(true).with_file(true).with_line_number(true).boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();

    tracing::info!("🎓 UniAssist starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Log level: {}", log_level);

    Ok(())
}
