use serde::Serialize;
use url::Url;

use super::plan::Plan;

/// Stable machine-readable reasons for refusing an entitled operation.
///
/// Clients switch on these strings to render remediation UI, so the wire
/// names must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialCode {
    TrialExpired,
    SubscriptionExpired,
    InvalidPlan,
    PlanUpgradeRequired,
    TrialOnlyFeature,
    PaidSubscriptionRequired,
    SubaccountLimitReached,
}

impl DenialCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialCode::TrialExpired => "TRIAL_EXPIRED",
            DenialCode::SubscriptionExpired => "SUBSCRIPTION_EXPIRED",
            DenialCode::InvalidPlan => "INVALID_PLAN",
            DenialCode::PlanUpgradeRequired => "PLAN_UPGRADE_REQUIRED",
            DenialCode::TrialOnlyFeature => "TRIAL_ONLY_FEATURE",
            DenialCode::PaidSubscriptionRequired => "PAID_SUBSCRIPTION_REQUIRED",
            DenialCode::SubaccountLimitReached => "SUBACCOUNT_LIMIT_REACHED",
        }
    }
}

impl std::fmt::Display for DenialCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A refused entitlement check together with everything the client needs to
/// fix it. Rendered as the `403` body by `ApiError::Entitlement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Denial {
    pub code: DenialCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renew_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_subaccounts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_subaccounts: Option<u32>,
}

impl Denial {
    fn new(code: DenialCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            upgrade_url: None,
            renew_url: None,
            current_plan: None,
            required_plan: None,
            current_subaccounts: None,
            max_subaccounts: None,
        }
    }

    pub fn trial_expired(links: &RemediationLinks) -> Self {
        Self {
            upgrade_url: Some(links.upgrade_url()),
            ..Self::new(
                DenialCode::TrialExpired,
                "Your free trial has ended. Upgrade to a paid plan to keep using this feature.",
            )
        }
    }

    pub fn subscription_expired(links: &RemediationLinks) -> Self {
        Self {
            renew_url: Some(links.renew_url()),
            ..Self::new(
                DenialCode::SubscriptionExpired,
                "Your subscription has expired. Renew it to restore access.",
            )
        }
    }

    pub fn invalid_plan(plan: &Plan, links: &RemediationLinks) -> Self {
        Self {
            current_plan: Some(plan.to_string()),
            ..Self::new(
                DenialCode::InvalidPlan,
                format!(
                    "Your account has an unrecognized plan. Please contact support at {}.",
                    links.support_email()
                ),
            )
        }
    }

    pub fn plan_upgrade_required(current: &Plan, required: &Plan, links: &RemediationLinks) -> Self {
        Self {
            upgrade_url: Some(links.upgrade_url()),
            current_plan: Some(current.to_string()),
            required_plan: Some(required.to_string()),
            ..Self::new(
                DenialCode::PlanUpgradeRequired,
                format!("This feature requires the {} plan or higher.", required),
            )
        }
    }

    pub fn trial_only_feature(current: &Plan) -> Self {
        Self {
            current_plan: Some(current.to_string()),
            ..Self::new(
                DenialCode::TrialOnlyFeature,
                "This feature is only available during the free trial.",
            )
        }
    }

    pub fn paid_subscription_required(current: &Plan, links: &RemediationLinks) -> Self {
        Self {
            upgrade_url: Some(links.upgrade_url()),
            current_plan: Some(current.to_string()),
            ..Self::new(
                DenialCode::PaidSubscriptionRequired,
                "This feature requires a paid subscription.",
            )
        }
    }

    pub fn subaccount_limit_reached(current: u32, max: u32, links: &RemediationLinks) -> Self {
        Self {
            upgrade_url: Some(links.upgrade_url()),
            current_subaccounts: Some(current),
            max_subaccounts: Some(max),
            ..Self::new(
                DenialCode::SubaccountLimitReached,
                format!(
                    "Subaccount limit reached ({} of {}). Upgrade your plan or contact support to add more.",
                    current, max
                ),
            )
        }
    }
}

/// Where denied customers are sent to fix their entitlement.
///
/// Built once from configuration; the base URL is never hardcoded.
#[derive(Debug, Clone)]
pub struct RemediationLinks {
    upgrade: Url,
    renew: Url,
    support_email: String,
}

impl RemediationLinks {
    pub fn new(
        base_url: &Url,
        upgrade_path: &str,
        renew_path: &str,
        support_email: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            upgrade: base_url.join(upgrade_path)?,
            renew: base_url.join(renew_path)?,
            support_email: support_email.into(),
        })
    }

    pub fn upgrade_url(&self) -> String {
        self.upgrade.to_string()
    }

    pub fn renew_url(&self) -> String {
        self.renew.to_string()
    }

    pub fn support_email(&self) -> &str {
        &self.support_email
    }
}

#[cfg(test)]
pub(crate) fn test_links() -> RemediationLinks {
    let base = Url::parse("https://app.example.com").unwrap();
    RemediationLinks::new(&base, "/dashboard/upgrade", "/dashboard/billing", "support@example.com").unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn links_join_onto_configured_base() {
        let links = test_links();
        assert_eq!(links.upgrade_url(), "https://app.example.com/dashboard/upgrade");
        assert_eq!(links.renew_url(), "https://app.example.com/dashboard/billing");
    }

    #[test]
    fn absent_fields_are_not_serialized() {
        let denial = Denial::trial_expired(&test_links());
        let body = serde_json::to_value(&denial).unwrap();
        assert_eq!(body["code"], json!("TRIAL_EXPIRED"));
        assert_eq!(body["upgradeUrl"], json!("https://app.example.com/dashboard/upgrade"));
        assert!(body.get("renewUrl").is_none());
        assert!(body.get("currentPlan").is_none());
    }

    #[test]
    fn invalid_plan_points_at_support_without_url() {
        let denial = Denial::invalid_plan(&Plan::parse("unknown_tier"), &test_links());
        assert!(denial.message.contains("support@example.com"));
        assert!(denial.upgrade_url.is_none());
        assert!(denial.renew_url.is_none());
        assert_eq!(denial.current_plan.as_deref(), Some("unknown_tier"));
    }
}
