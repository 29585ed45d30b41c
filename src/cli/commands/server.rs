use std::time::Duration;

use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health status from the API /health endpoint")]
    Health {
        #[arg(help = "Server base URL", default_value = "http://localhost:8000")]
        url: String,
        #[arg(long, help = "Request timeout in seconds", default_value = "5")]
        timeout: u64,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Health { url, timeout } => handle_health(&url, timeout, output_format).await,
    }
}

async fn handle_health(url: &str, timeout: u64, output_format: OutputFormat) -> anyhow::Result<()> {
    let endpoint = health_url(url);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()?;

    let response = match client.get(&endpoint).send().await {
        Ok(response) => response,
        Err(e) => {
            output_error(output_format, &format!("{} unreachable: {}", endpoint, e), Some("UNREACHABLE"))?;
            anyhow::bail!("server unreachable");
        }
    };

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if status.is_success() {
        output_success(
            output_format,
            &format!("{} is healthy", url.trim_end_matches('/')),
            Some(json!({ "status": status.as_u16(), "health": body })),
        )
    } else {
        output_error(
            output_format,
            &format!("{} answered {}: {}", endpoint, status, body),
            Some("UNHEALTHY"),
        )?;
        anyhow::bail!("server unhealthy")
    }
}

fn health_url(base: &str) -> String {
    format!("{}/health", base.trim_end_matches('/'))
}
