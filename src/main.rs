use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storesync::config::Config;
use storesync::db::{AppState, create_pool, init_db, queries};
use storesync::handlers;
use storesync::models::CreateShopSession;

#[derive(Parser, Debug)]
#[command(name = "storesync")]
#[command(about = "Mirrors Shopify customers, orders and payments into Salesforce")]
struct Cli {
    /// Store an offline admin session for a shop, then exit (dev mode only).
    /// Usage: --import-session <shop> <access-token>
    #[arg(long, num_args = 2, value_names = ["SHOP", "TOKEN"])]
    import_session: Option<Vec<String>>,

    /// Delete webhook ledger entries older than this many days, then exit
    #[arg(long, value_name = "DAYS")]
    purge_deliveries: Option<i64>,
}

fn import_session(state: &AppState, shop: &str, token: &str) {
    let conn = state.db.get().expect("Failed to get db connection");
    let session = queries::upsert_offline_session(
        &conn,
        &CreateShopSession {
            shop: shop.to_string(),
            access_token: token.to_string(),
            scope: None,
        },
    )
    .expect("Failed to store session");

    tracing::info!("Stored offline session {} for {}", session.id, session.shop);
}

fn purge_deliveries(state: &AppState, days: i64) {
    if days <= 0 {
        tracing::warn!("--purge-deliveries needs a positive number of days, got {}", days);
        return;
    }

    let conn = state.db.get().expect("Failed to get db connection");
    match queries::purge_old_webhook_deliveries(&conn, days) {
        Ok(count) => tracing::info!("Purged {} webhook deliveries older than {} days", count, days),
        Err(e) => tracing::warn!("Failed to purge webhook deliveries: {}", e),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storesync=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState::new(&config, db_pool).expect("Failed to build application state");

    if let Some(args) = cli.import_session.as_deref() {
        if !config.dev_mode {
            tracing::warn!("--import-session ignored: not in dev mode (set STORESYNC_ENV=dev)");
        } else if let [shop, token] = args {
            import_session(&state, shop, token);
        }
        return;
    }

    if let Some(days) = cli.purge_deliveries {
        purge_deliveries(&state, days);
        return;
    }

    if state.admin_api_key.is_none() {
        tracing::info!("ADMIN_API_KEY not set; /api metaobject endpoints disabled");
    }

    let app = handlers::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Storesync listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
