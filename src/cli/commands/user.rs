use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::error::ApiError;
use crate::services::user_service::RegisterRequest;
use crate::services::UserService;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user account (optionally a superuser)")]
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, env = "FOODGRAM_USER_PASSWORD", help = "Password (or FOODGRAM_USER_PASSWORD)")]
        password: String,
        #[arg(long, help = "Grant superuser rights")]
        superuser: bool,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create {
            email,
            username,
            first_name,
            last_name,
            password,
            superuser,
        } => {
            let request = RegisterRequest {
                email: Some(email),
                username: Some(username),
                first_name: Some(first_name),
                last_name: Some(last_name),
                password: Some(password),
            };
            let mut new_user = request.into_new_user().map_err(describe)?;
            new_user.is_superuser = superuser;

            let pool = connect().await?;
            let user = UserService::new(pool).create(new_user).await.map_err(describe)?;

            output_success(
                output_format,
                &format!("Created user {} (id {})", user.username, user.id),
                Some(json!({ "id": user.id, "username": user.username, "is_superuser": user.is_superuser })),
            )
        }
    }
}

fn describe(err: ApiError) -> anyhow::Error {
    match err {
        ApiError::ValidationError(errors) => anyhow::anyhow!("Invalid user: {}", errors.to_json()),
        other => anyhow::anyhow!("{}", other.message()),
    }
}
