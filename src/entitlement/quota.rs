use super::denial::{Denial, RemediationLinks};
use super::snapshot::Entitlement;

/// Allow linking `delta` more subaccounts only if the total stays within the
/// quota. Over-quota requests are rejected, never clamped.
pub fn check_subaccount_quota(snapshot: &Entitlement, delta: u32, links: &RemediationLinks) -> Result<(), Denial> {
    let requested = snapshot.total_subaccounts.saturating_add(delta);
    if requested <= snapshot.max_subaccounts {
        Ok(())
    } else {
        Err(Denial::subaccount_limit_reached(
            snapshot.total_subaccounts,
            snapshot.max_subaccounts,
            links,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuotaIncreaseError {
    #[error("increment must be at least 1, got {0}")]
    NotPositive(i64),
    #[error("increment of {increment} would push the limit past {ceiling}")]
    Overflow { increment: i64, ceiling: i64 },
}

/// Validate an administrative quota increase against the current limit and
/// return the increment as the store's counter type.
pub fn validate_quota_increase(current_max: i32, increment: i64) -> Result<i32, QuotaIncreaseError> {
    if increment < 1 {
        return Err(QuotaIncreaseError::NotPositive(increment));
    }
    let ceiling = i64::from(i32::MAX);
    if i64::from(current_max) + increment > ceiling {
        return Err(QuotaIncreaseError::Overflow { increment, ceiling });
    }
    // Bounded by the ceiling check above.
    Ok(increment as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::denial::{test_links, DenialCode};
    use crate::entitlement::plan::{Plan, PlanStatus};

    fn usage(total: u32, max: u32) -> Entitlement {
        Entitlement {
            plan: Plan::Basic,
            status: PlanStatus::Active,
            trial_ends_at: None,
            subscription_ends_at: None,
            max_subaccounts: max,
            total_subaccounts: total,
        }
    }

    #[test]
    fn full_quota_is_rejected() {
        let denial = check_subaccount_quota(&usage(3, 3), 1, &test_links()).unwrap_err();
        assert_eq!(denial.code, DenialCode::SubaccountLimitReached);
        assert_eq!(denial.current_subaccounts, Some(3));
        assert_eq!(denial.max_subaccounts, Some(3));
    }

    #[test]
    fn last_free_slot_is_allowed() {
        assert!(check_subaccount_quota(&usage(2, 3), 1, &test_links()).is_ok());
        assert!(check_subaccount_quota(&usage(0, 0), 0, &test_links()).is_ok());
        assert!(check_subaccount_quota(&usage(1, 3), 3, &test_links()).is_err());
    }

    #[test]
    fn huge_delta_does_not_wrap() {
        assert!(check_subaccount_quota(&usage(5, u32::MAX), u32::MAX, &test_links()).is_err());
    }

    #[test]
    fn increase_must_be_positive_and_bounded() {
        assert_eq!(validate_quota_increase(3, 2), Ok(2));
        assert_eq!(validate_quota_increase(3, 0), Err(QuotaIncreaseError::NotPositive(0)));
        assert_eq!(validate_quota_increase(3, -4), Err(QuotaIncreaseError::NotPositive(-4)));
        assert!(matches!(
            validate_quota_increase(i32::MAX, 1),
            Err(QuotaIncreaseError::Overflow { .. })
        ));
    }
}
