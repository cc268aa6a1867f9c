use anyhow::bail;
use clap::Subcommand;
use serde_json::json;

use crate::auth::{sha256_hex, Role, TokenKeys};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a session token signed with JWT_SECRET")]
    Issue {
        #[arg(help = "Subject: customer UUID, or admin email")]
        subject: String,
        #[arg(long, help = "Email claim (defaults to the subject)")]
        email: Option<String>,
        #[arg(long, default_value = "customer", help = "Role: customer or admin")]
        role: String,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },

    #[command(about = "Print the SHA-256 hex digest to use as ADMIN_PASSWORD_SHA256")]
    HashPassword {
        #[arg(help = "Admin password")]
        password: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue {
            subject,
            email,
            role,
            hours,
        } => {
            let config = AppConfig::from_env();
            let role = parse_role(&role)?;
            let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
            let keys = TokenKeys::new(&config.security.jwt_secret, hours)?;

            let email = email.unwrap_or_else(|| subject.clone());
            let token = keys.issue(&subject, &email, role)?;

            match output_format {
                OutputFormat::Json => output_success(
                    output_format,
                    "Token issued",
                    Some(json!({ "token": token, "role": role.as_str(), "expiresInHours": hours })),
                ),
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
        TokenCommands::HashPassword { password } => {
            let digest = sha256_hex(&password);
            match output_format {
                OutputFormat::Json => output_success(output_format, "Password hashed", Some(json!({ "sha256": digest }))),
                OutputFormat::Text => {
                    println!("{}", digest);
                    Ok(())
                }
            }
        }
    }
}

fn parse_role(raw: &str) -> anyhow::Result<Role> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "customer" => Ok(Role::Customer),
        "admin" => Ok(Role::Admin),
        other => bail!("Unknown role '{}' (expected customer or admin)", other),
    }
}
