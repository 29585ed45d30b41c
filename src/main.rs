use foodgram_api::config;
use foodgram_api::database::DatabaseManager;
use foodgram_api::services::MediaStorage;
use foodgram_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, MEDIA_ROOT, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Foodgram API in {:?} mode", config.environment);
    if config.security.jwt_secret.is_empty() {
        tracing::warn!("SECURITY_JWT_SECRET is empty; tokens are signed with an empty key");
    }

    let pool = if config.database.run_migrations {
        let pool = DatabaseManager::connect().await?;
        DatabaseManager::migrate(&pool).await?;
        let pruned = DatabaseManager::prune_revoked_tokens(&pool).await?;
        tracing::info!("{} expired revoked tokens pruned", pruned);
        pool
    } else {
        DatabaseManager::connect_lazy()?
    };

    let media = MediaStorage::from_config();
    tokio::fs::create_dir_all(media.root()).await?;

    let app = foodgram_api::app(AppState::new(pool, media));

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Foodgram API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
