use clap::Subcommand;
use reqwest::Method;
use serde_json::{json, Map, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_fields, output_success, output_table};
use crate::cli::OutputFormat;

const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(clap::Args)]
pub struct Connection {
    #[arg(long, help = "API base URL (default: $WAGHL_SERVER or localhost:3000)")]
    pub server: Option<String>,
    #[arg(long, help = "Admin token (default: $WAGHL_TOKEN)")]
    pub token: Option<String>,
}

impl Connection {
    fn client(self) -> anyhow::Result<ApiClient> {
        let server = self
            .server
            .or_else(|| std::env::var("WAGHL_SERVER").ok())
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        let token = self.token.or_else(|| std::env::var("WAGHL_TOKEN").ok());
        ApiClient::new(&server, token)
    }
}

#[derive(Subcommand)]
pub enum CustomerCommands {
    #[command(about = "List customers, optionally filtered")]
    List {
        #[arg(long)]
        plan: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[command(flatten)]
        conn: Connection,
    },

    #[command(about = "Show one customer with entitlement and subaccounts")]
    Show {
        id: String,
        #[command(flatten)]
        conn: Connection,
    },

    #[command(about = "Change plan, status or expiry")]
    Plan {
        id: String,
        #[arg(long)]
        plan: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, help = "RFC 3339, or 'none' to clear")]
        trial_ends_at: Option<String>,
        #[arg(long, help = "RFC 3339, or 'none' to clear")]
        subscription_ends_at: Option<String>,
        #[command(flatten)]
        conn: Connection,
    },

    #[command(about = "Raise the subaccount limit")]
    Quota {
        id: String,
        #[arg(long)]
        increment: i64,
        #[command(flatten)]
        conn: Connection,
    },

    #[command(about = "Platform-wide customer statistics")]
    Stats {
        #[command(flatten)]
        conn: Connection,
    },
}

pub async fn handle(cmd: CustomerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        CustomerCommands::List { plan, status, conn } => {
            let client = conn.client()?;
            let query = list_query(plan.as_deref(), status.as_deref());
            let data = client.get(&format!("/api/admin/customers{}", query)).await?;
            let rows = data.as_array().cloned().unwrap_or_default();
            output_table(
                output_format,
                &rows,
                &["id", "email", "plan", "status", "state", "entitlement.daysRemaining"],
            )
        }
        CustomerCommands::Show { id, conn } => {
            let data = conn.client()?.get(&format!("/api/admin/customers/{}", id)).await?;
            output_fields(output_format, &data)
        }
        CustomerCommands::Plan {
            id,
            plan,
            status,
            trial_ends_at,
            subscription_ends_at,
            conn,
        } => {
            let body = plan_body(plan, status, trial_ends_at, subscription_ends_at);
            let data = conn
                .client()?
                .send(Method::PATCH, &format!("/api/admin/customers/{}/plan", id), Some(&body))
                .await?;
            output_success(output_format, &format!("Customer {} updated", id), Some(data))
        }
        CustomerCommands::Quota { id, increment, conn } => {
            let data = conn
                .client()?
                .send(
                    Method::POST,
                    &format!("/api/admin/customers/{}/subaccounts/increase", id),
                    Some(&json!({ "increment": increment })),
                )
                .await?;
            output_success(output_format, &format!("Subaccount limit raised for {}", id), Some(data))
        }
        CustomerCommands::Stats { conn } => {
            let data = conn.client()?.get("/api/admin/stats").await?;
            output_fields(output_format, &data)
        }
    }
}

fn list_query(plan: Option<&str>, status: Option<&str>) -> String {
    let pairs: Vec<String> = [("plan", plan), ("status", status)]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| format!("{}={}", key, v)))
        .collect();
    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

// Omitted flags stay out of the body; "none" becomes an explicit null.
fn plan_body(
    plan: Option<String>,
    status: Option<String>,
    trial_ends_at: Option<String>,
    subscription_ends_at: Option<String>,
) -> Value {
    let mut body = Map::new();
    if let Some(plan) = plan {
        body.insert("plan".into(), json!(plan));
    }
    if let Some(status) = status {
        body.insert("status".into(), json!(status));
    }
    for (key, value) in [("trialEndsAt", trial_ends_at), ("subscriptionEndsAt", subscription_ends_at)] {
        if let Some(value) = value {
            let value = if value.eq_ignore_ascii_case("none") { Value::Null } else { json!(value) };
            body.insert(key.into(), value);
        }
    }
    Value::Object(body)
}
