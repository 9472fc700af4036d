use axum::{ServiceExt, extract::Request};
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;

use portal_backend::{
    AppState, config::Config, db::DBClient, routes, tracing_config::init_tracing,
};

#[tokio::main]
async fn main() {
    let _guard = init_tracing();

    dotenv().ok();

    let config = Config::init();

    let db_client = match config.database_url.as_deref() {
        Some(url) => {
            let pool = match PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
            {
                Ok(pool) => {
                    tracing::info!("Connection to the database is successful");
                    pool
                }
                Err(err) => {
                    tracing::error!("Failed to connect to the database: {:?}", err);
                    std::process::exit(1);
                }
            };
            let db_client = DBClient::new(pool);
            if let Err(err) = db_client.migrate().await {
                tracing::error!("Failed to run migrations: {}", err);
                std::process::exit(1);
            }
            db_client
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            DBClient::in_memory()
        }
    };

    let port = config.port;
    tracing::info!(backend = db_client.backend_name(), "Storage ready");

    let app = routes::create_app(AppState::new(config, db_client));

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {}", port, err);
            std::process::exit(1);
        }
    };
    tracing::info!("Server is running on http://localhost:{}", port);

    if let Err(err) = axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await {
        tracing::error!("Server error: {}", err);
    }
}
