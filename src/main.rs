mod api;
mod config;
mod db;
mod error;
mod routes;
mod utils;

use axum::extract::FromRef;
use jsonwebtoken::{DecodingKey, EncodingKey};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::{
    net::TcpListener,
    signal::{
        ctrl_c,
        unix::{signal, SignalKind},
    },
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> PgPool {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for EncodingKey {
    fn from_ref(app_state: &AppState) -> EncodingKey {
        app_state.encoding_key.clone()
    }
}

impl FromRef<AppState> for DecodingKey {
    fn from_ref(app_state: &AppState) -> DecodingKey {
        app_state.decoding_key.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    db::prepare_db(&pool).await?;

    let app = routes::generate_routes(pool, &config.jwt_secret);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let terminate = async {
        #[cfg(unix)]
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        #[cfg(not(unix))]
        std::future::pending::<()>().await;

        info!("Received terminate signal, shutting down");
    };

    tokio::select! {
        _ = async {
            ctrl_c().await.expect("Failed to install Ctrl+C handler");
            info!("Received Ctrl+C, shutting down");
        } => {},
        _ = terminate => {},
    }
}
