use serde::{Deserialize, Serialize};
use std::fmt;

/// Plan tier stored on the customer row.
///
/// Ordered by entitlement power through [`Plan::rank`]. Values that do not
/// name a known tier are kept verbatim in [`Plan::Unrecognized`] so they can be
/// reported back and logged instead of silently falling through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Plan {
    Trial,
    Basic,
    Pro,
    Enterprise,
    Admin,
    Unrecognized(String),
}

impl Plan {
    /// Every recognized tier, lowest first.
    pub const RECOGNIZED: [Plan; 5] = [Plan::Trial, Plan::Basic, Plan::Pro, Plan::Enterprise, Plan::Admin];

    /// Parse a stored plan name. Accepts the legacy aliases `starter` and
    /// `professional`; matching is case-insensitive and ignores surrounding
    /// whitespace.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trial" => Plan::Trial,
            "basic" | "starter" => Plan::Basic,
            "pro" | "professional" => Plan::Pro,
            "enterprise" => Plan::Enterprise,
            "admin" => Plan::Admin,
            _ => Plan::Unrecognized(raw.to_string()),
        }
    }

    /// Canonical name written back to storage and API payloads.
    pub fn as_str(&self) -> &str {
        match self {
            Plan::Trial => "trial",
            Plan::Basic => "basic",
            Plan::Pro => "pro",
            Plan::Enterprise => "enterprise",
            Plan::Admin => "admin",
            Plan::Unrecognized(raw) => raw,
        }
    }

    /// Position in the tier hierarchy. Unrecognized plans rank 0 (no access).
    pub fn rank(&self) -> u8 {
        match self {
            Plan::Unrecognized(_) => 0,
            Plan::Trial => 1,
            Plan::Basic => 2,
            Plan::Pro => 3,
            Plan::Enterprise => 4,
            Plan::Admin => 5,
        }
    }

    /// `true` when this plan is at least as powerful as `required`.
    pub fn meets_minimum(&self, required: &Plan) -> bool {
        self.rank() >= required.rank()
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Plan::Unrecognized(_))
    }

    pub fn is_trial(&self) -> bool {
        matches!(self, Plan::Trial)
    }

    /// Non-trial recognized tiers. These are governed by `subscription_ends_at`.
    pub fn is_paid(&self) -> bool {
        matches!(self, Plan::Basic | Plan::Pro | Plan::Enterprise | Plan::Admin)
    }
}

impl From<String> for Plan {
    fn from(raw: String) -> Self {
        Plan::parse(&raw)
    }
}

impl From<Plan> for String {
    fn from(plan: Plan) -> Self {
        plan.as_str().to_string()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-function form of [`Plan::meets_minimum`] for call sites that hold raw
/// plan names, e.g. values read straight from a token or a query string.
pub fn meets_minimum(customer_plan: &str, required_plan: &str) -> bool {
    Plan::parse(customer_plan).meets_minimum(&Plan::parse(required_plan))
}

/// Lifecycle status stored next to the plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlanStatus {
    Trial,
    Active,
    Expired,
    Cancelled,
    Unrecognized(String),
}

impl PlanStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trial" | "trialing" => PlanStatus::Trial,
            "active" => PlanStatus::Active,
            "expired" => PlanStatus::Expired,
            "cancelled" | "canceled" => PlanStatus::Cancelled,
            _ => PlanStatus::Unrecognized(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PlanStatus::Trial => "trial",
            PlanStatus::Active => "active",
            PlanStatus::Expired => "expired",
            PlanStatus::Cancelled => "cancelled",
            PlanStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, PlanStatus::Unrecognized(_))
    }
}

impl From<String> for PlanStatus {
    fn from(raw: String) -> Self {
        PlanStatus::parse(&raw)
    }
}

impl From<PlanStatus> for String {
    fn from(status: PlanStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_strictly_increasing() {
        let ranks: Vec<u8> = Plan::RECOGNIZED.iter().map(Plan::rank).collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]), "ranks: {:?}", ranks);
        assert_eq!(Plan::parse("unknown_tier").rank(), 0);
    }

    #[test]
    fn aliases_collapse_to_canonical_tiers() {
        assert_eq!(Plan::parse("starter"), Plan::Basic);
        assert_eq!(Plan::parse("Professional"), Plan::Pro);
        assert_eq!(Plan::parse(" ENTERPRISE "), Plan::Enterprise);
        assert_eq!(Plan::parse("gold"), Plan::Unrecognized("gold".into()));
    }

    #[test]
    fn meets_minimum_matches_rank_order() {
        let tiers = [Plan::Trial, Plan::Basic, Plan::Pro, Plan::Enterprise];
        for have in &tiers {
            for need in &tiers {
                assert_eq!(
                    have.meets_minimum(need),
                    have.rank() >= need.rank(),
                    "{} vs {}",
                    have,
                    need
                );
            }
        }
        assert!(meets_minimum("professional", "basic"));
        assert!(!meets_minimum("", "trial"));
        assert!(!meets_minimum("trial", "pro"));
    }

    #[test]
    fn serde_uses_plain_strings() {
        let plan: Plan = serde_json::from_str("\"starter\"").unwrap();
        assert_eq!(plan, Plan::Basic);
        assert_eq!(serde_json::to_string(&Plan::Pro).unwrap(), "\"pro\"");
        assert_eq!(
            serde_json::to_string(&Plan::Unrecognized("legacy".into())).unwrap(),
            "\"legacy\""
        );
        let status: PlanStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(status, PlanStatus::Cancelled);
    }
}
