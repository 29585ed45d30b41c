use serde_json::json;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;
    DatabaseManager::migrate(&pool).await?;
    let pruned = DatabaseManager::prune_revoked_tokens(&pool).await?;

    output_success(
        output_format,
        "Database migrations applied",
        Some(json!({ "pruned_revoked_tokens": pruned })),
    )
}
