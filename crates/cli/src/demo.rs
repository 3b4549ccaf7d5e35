//! Built-in demo dataset.
//!
//! Used when no live feed is reachable, so `reconcile` and `stats` can
//! still show a complete (clearly labeled) view. The dataset goes
//! through the real engine: it ships as raw feeds, not pre-derived
//! accounts.

use scolaris_recon::{ChildRecord, EnrollmentStatus, LedgerEntry, TariffEntry, TariffTable};

pub(crate) fn demo_children() -> Vec<ChildRecord> {
    vec![
        child(1, "Aya Kouassi", 1, "6eme A", EnrollmentStatus::PreEnrolled, None),
        child(2, "Koffi Kouassi", 2, "5eme B", EnrollmentStatus::Enrolled, Some("Kouassi Ibrahim")),
        child(3, "Jean Kouame", 1, "6eme A", EnrollmentStatus::Enrolled, Some("Kouame Pierre")),
        child(4, "Marie Traore", 1, "6eme A", EnrollmentStatus::Enrolled, Some("Traore Salif")),
    ]
}

pub(crate) fn demo_ledger(school_year: &str) -> Vec<LedgerEntry> {
    vec![
        entry(1, 2, 220_000.0, 220_000.0, school_year),
        entry(7, 3, 200_000.0, 75_000.0, school_year),
        entry(4, 4, 200_000.0, 200_000.0, school_year),
    ]
}

pub(crate) fn demo_tariffs() -> TariffTable {
    TariffTable::new(vec![
        TariffEntry {
            tariff_id: 1,
            class_id: Some(1),
            class_name: Some("6eme A".into()),
            amount: 200_000,
        },
        TariffEntry {
            tariff_id: 2,
            class_id: Some(2),
            class_name: Some("5eme B".into()),
            amount: 220_000,
        },
    ])
}

fn child(
    child_id: i64,
    full_name: &str,
    class_id: i64,
    class_name: &str,
    enrollment_status: EnrollmentStatus,
    guardian_name: Option<&str>,
) -> ChildRecord {
    ChildRecord {
        child_id,
        full_name: full_name.into(),
        class_id: Some(class_id),
        class_name: class_name.into(),
        enrollment_status,
        tariff_hint: None,
        guardian_name: guardian_name.map(String::from),
    }
}

fn entry(ledger_id: i64, child_id: i64, due: f64, paid: f64, school_year: &str) -> LedgerEntry {
    LedgerEntry {
        ledger_id,
        child_id,
        total_due: due,
        total_paid: paid,
        school_year: school_year.into(),
        child_name: None,
        class_name: None,
        class_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scolaris_recon::{compute_stats, reconcile, AccountOrigin, PaymentStatus};

    #[test]
    fn demo_feeds_reconcile_cleanly() {
        let outcome = reconcile(
            &demo_children(),
            &demo_ledger("2025-2026"),
            &demo_tariffs(),
            "2025-2026",
        );
        assert_eq!(outcome.anomalous_amounts, 0);
        assert_eq!(outcome.duplicate_ledger_entries, 0);
        assert_eq!(outcome.accounts.len(), 4);

        // One of each payment status, plus one unbilled child.
        let stats = compute_stats(&outcome.accounts);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.partial_count, 1);
        assert_eq!(stats.complete_count, 2);

        let aya = &outcome.accounts[0];
        assert_eq!(aya.origin, AccountOrigin::ChildOnly);
        assert_eq!(aya.total_due, 200_000);
        assert_eq!(aya.status, PaymentStatus::Pending);

        let jean = &outcome.accounts[2];
        assert_eq!(jean.status, PaymentStatus::Partial);
        assert_eq!(jean.percentage_paid, 37.5);
        assert!(jean.eligible_for_validation);
    }
}
