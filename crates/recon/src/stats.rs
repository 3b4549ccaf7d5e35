use serde::Serialize;

use crate::engine::round2;
use crate::model::{EnrollmentAccount, EnrollmentStatus, PaymentStatus};

/// Summary statistics over a set of reconciled accounts.
///
/// `recovery_rate` is sum-based (total paid over total due), not an
/// average of per-account percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuitionStats {
    pub total_accounts: usize,
    pub pending_count: usize,
    pub partial_count: usize,
    pub complete_count: usize,
    pub pre_enrolled_count: usize,
    pub enrolled_count: usize,
    pub total_due: i64,
    pub total_paid: i64,
    pub recovery_rate: f64,
}

/// Full recomputation every time; stats are never patched incrementally.
pub fn compute_stats(accounts: &[EnrollmentAccount]) -> TuitionStats {
    let mut pending_count = 0;
    let mut partial_count = 0;
    let mut complete_count = 0;
    let mut pre_enrolled_count = 0;
    let mut enrolled_count = 0;
    let mut total_due: i64 = 0;
    let mut total_paid: i64 = 0;

    for account in accounts {
        match account.status {
            PaymentStatus::Pending => pending_count += 1,
            PaymentStatus::Partial => partial_count += 1,
            PaymentStatus::Complete => complete_count += 1,
        }
        match account.enrollment_status {
            EnrollmentStatus::PreEnrolled => pre_enrolled_count += 1,
            EnrollmentStatus::Enrolled => enrolled_count += 1,
        }
        total_due += account.total_due;
        total_paid += account.total_paid;
    }

    let recovery_rate = if total_due > 0 {
        round2(total_paid as f64 / total_due as f64 * 100.0)
    } else {
        0.0
    };

    TuitionStats {
        total_accounts: accounts.len(),
        pending_count,
        partial_count,
        complete_count,
        pre_enrolled_count,
        enrolled_count,
        total_due,
        total_paid,
        recovery_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountOrigin;

    fn account(id: i64, due: i64, paid: i64, status: PaymentStatus) -> EnrollmentAccount {
        EnrollmentAccount {
            child_id: id,
            full_name: format!("Child {id}"),
            class_name: "6eme A".into(),
            class_id: Some(1),
            enrollment_status: EnrollmentStatus::Enrolled,
            school_year: "2025-2026".into(),
            total_due: due,
            total_paid: paid,
            remaining: (due - paid).max(0),
            percentage_paid: 0.0,
            status,
            eligible_for_validation: false,
            ledger_id: Some(id),
            origin: AccountOrigin::Matched,
        }
    }

    #[test]
    fn sums_and_counts() {
        let accounts = vec![
            account(1, 200_000, 0, PaymentStatus::Pending),
            account(2, 200_000, 75_000, PaymentStatus::Partial),
            account(3, 100_000, 100_000, PaymentStatus::Complete),
        ];
        let stats = compute_stats(&accounts);
        assert_eq!(stats.total_accounts, 3);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.partial_count, 1);
        assert_eq!(stats.complete_count, 1);
        assert_eq!(stats.total_due, 500_000);
        assert_eq!(stats.total_paid, 175_000);
        assert_eq!(stats.recovery_rate, 35.0);
    }

    #[test]
    fn recovery_rate_is_sum_based_not_mean_of_percentages() {
        // 100% of a tiny bill and 0% of a huge one is nowhere near 50%.
        let accounts = vec![
            account(1, 10_000, 10_000, PaymentStatus::Complete),
            account(2, 990_000, 0, PaymentStatus::Pending),
        ];
        let stats = compute_stats(&accounts);
        assert_eq!(stats.recovery_rate, 1.0);
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_accounts, 0);
        assert_eq!(stats.total_due, 0);
        assert_eq!(stats.recovery_rate, 0.0);
    }
}
