pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "waghl")]
#[command(about = "waghl - operator CLI for the WhatsApp to GHL entitlement API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Mint session tokens with the configured JWT secret")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Evaluate entitlement rules offline")]
    Entitlement {
        #[command(subcommand)]
        cmd: commands::entitlement::EntitlementCommands,
    },

    #[command(about = "Customer administration against a running server")]
    Customer {
        #[command(subcommand)]
        cmd: commands::customer::CustomerCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Token { cmd } => commands::token::handle(cmd, output_format).await,
        Commands::Entitlement { cmd } => commands::entitlement::handle(cmd, output_format).await,
        Commands::Customer { cmd } => commands::customer::handle(cmd, output_format).await,
    }
}
