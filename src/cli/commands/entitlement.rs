use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_error, output_fields};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::entitlement::{
    check_subaccount_quota, classify, describe_entitlement, Entitlement, Gate, Plan, PlanStatus,
};

#[derive(Subcommand)]
pub enum EntitlementCommands {
    #[command(about = "Run a gate against a hypothetical customer")]
    Check {
        #[arg(long, help = "Plan name (trial, basic, pro, enterprise, admin)")]
        plan: String,
        #[arg(long, default_value = "active")]
        status: String,
        #[arg(long, help = "RFC 3339 trial expiry")]
        trial_ends_at: Option<String>,
        #[arg(long, help = "RFC 3339 subscription expiry")]
        subscription_ends_at: Option<String>,
        #[arg(long, default_value_t = 1)]
        max_subaccounts: u32,
        #[arg(long, default_value_t = 0)]
        total_subaccounts: u32,
        #[arg(
            long,
            default_value = "active",
            help = "active, trial, paid, a plan name for a minimum tier, or quota"
        )]
        gate: String,
        #[arg(long, help = "Evaluate at this RFC 3339 instant instead of now")]
        now: Option<String>,
    },
}

pub async fn handle(cmd: EntitlementCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        EntitlementCommands::Check {
            plan,
            status,
            trial_ends_at,
            subscription_ends_at,
            max_subaccounts,
            total_subaccounts,
            gate,
            now,
        } => {
            let snapshot = Entitlement {
                plan: Plan::parse(&plan),
                status: PlanStatus::parse(&status),
                trial_ends_at: trial_ends_at.as_deref().map(parse_instant).transpose()?,
                subscription_ends_at: subscription_ends_at.as_deref().map(parse_instant).transpose()?,
                max_subaccounts,
                total_subaccounts,
            };
            let now = now.as_deref().map(parse_instant).transpose()?.unwrap_or_else(Utc::now);
            let links = AppConfig::from_env().remediation_links()?;

            let verdict = match parse_check(&gate)? {
                Check::Gate(gate) => gate.check(&snapshot, now, &links),
                Check::Quota => check_subaccount_quota(&snapshot, 1, &links),
            };

            output_fields(
                output_format,
                &json!({
                    "state": classify(&snapshot, now),
                    "summary": describe_entitlement(&snapshot, now),
                    "gate": gate,
                    "allowed": verdict.is_ok(),
                }),
            )?;

            if let Err(denial) = verdict {
                output_error(output_format, &denial.message, Some(denial.code.as_str()))?;
            }
            Ok(())
        }
    }
}

enum Check {
    Gate(Gate),
    Quota,
}

fn parse_check(raw: &str) -> anyhow::Result<Check> {
    let check = match raw.trim().to_ascii_lowercase().as_str() {
        "active" => Check::Gate(Gate::Active),
        "trial" => Check::Gate(Gate::ActiveTrial),
        "paid" => Check::Gate(Gate::PaidSubscription),
        "quota" => Check::Quota,
        other => {
            let plan = Plan::parse(other);
            if !plan.is_recognized() {
                bail!("Unknown gate '{}'", raw);
            }
            Check::Gate(Gate::MinimumPlan(plan))
        }
    };
    Ok(check)
}

fn parse_instant(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("'{}' is not an RFC 3339 timestamp", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_names_resolve() {
        assert!(matches!(parse_check("trial").unwrap(), Check::Gate(Gate::ActiveTrial)));
        assert!(matches!(parse_check("professional").unwrap(), Check::Gate(Gate::MinimumPlan(Plan::Pro))));
        assert!(matches!(parse_check("quota").unwrap(), Check::Quota));
        assert!(parse_check("platinum").is_err());
    }

    #[test]
    fn instants_must_be_rfc3339() {
        assert!(parse_instant("2024-01-01T00:00:00Z").is_ok());
        assert!(parse_instant("2024-01-01T02:00:00+02:00").is_ok());
        assert!(parse_instant("yesterday").is_err());
    }
}
