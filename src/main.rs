use dotenvy::dotenv;
use estore::{
    config::{catalog, database, server::ServerConfig},
    errors::Result,
    web::{self, AppState},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env file so RUST_LOG and friends apply to tracing
    dotenv().ok(); // Non-fatal, env vars can be set externally

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 3. Server settings
    let server_config = ServerConfig::from_env()
        .inspect_err(|e| error!("Invalid server configuration: {}", e))?;

    // 4. Database and schema
    let db = database::create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Seed the catalog; a missing seed file only means an empty shop
    match catalog::load_config(&server_config.catalog_path) {
        Ok(seed) => {
            catalog::seed_catalog(&db, &seed)
                .await
                .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
        }
        Err(e) => warn!("Skipping catalog seed: {}", e),
    }

    // 6. Serve
    let app = web::router(AppState::new(db, &server_config.identity_header));
    let listener = tokio::net::TcpListener::bind(server_config.bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
