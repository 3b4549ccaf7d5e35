use scolaris_recon::{
    compute_stats, plan_append, plan_create, reconcile, AccountOrigin, ChildRecord,
    EnrollmentAccount, EnrollmentStatus, LedgerEntry, PaymentStatus, TariffEntry, TariffTable,
};

const YEAR: &str = "2025-2026";

fn child(id: i64, name: &str, class_id: i64, class_name: &str) -> ChildRecord {
    ChildRecord {
        child_id: id,
        full_name: name.into(),
        class_id: Some(class_id),
        class_name: class_name.into(),
        enrollment_status: EnrollmentStatus::Enrolled,
        tariff_hint: None,
        guardian_name: None,
    }
}

fn entry(ledger_id: i64, child_id: i64, due: f64, paid: f64) -> LedgerEntry {
    LedgerEntry {
        ledger_id,
        child_id,
        total_due: due,
        total_paid: paid,
        school_year: YEAR.into(),
        child_name: None,
        class_name: None,
        class_id: None,
    }
}

fn tariffs() -> TariffTable {
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

fn assert_invariants(account: &EnrollmentAccount) {
    assert!(account.remaining >= 0, "remaining must never go negative");
    assert!(
        (0.0..=100.0).contains(&account.percentage_paid),
        "percentage out of range: {}",
        account.percentage_paid
    );
    match account.origin {
        AccountOrigin::ChildOnly => {
            assert_eq!(account.ledger_id, None);
            assert_eq!(account.total_paid, 0);
            assert_eq!(account.status, PaymentStatus::Pending);
        }
        AccountOrigin::Matched | AccountOrigin::LedgerOnly => {
            assert!(account.ledger_id.is_some());
        }
    }
    match account.status {
        PaymentStatus::Pending => assert_eq!(account.total_paid, 0),
        PaymentStatus::Partial => {
            assert!(account.total_paid > 0 && account.total_paid < account.total_due)
        }
        PaymentStatus::Complete => assert!(account.total_paid >= account.total_due),
    }
}

// -------------------------------------------------------------------------
// Scenario tests
// -------------------------------------------------------------------------

#[test]
fn partial_payment_over_threshold() {
    // 75 000 of 200 000: partial, 37.5%, eligible for validation.
    let outcome = reconcile(
        &[child(3, "Jean Kouame", 1, "6eme A")],
        &[entry(7, 3, 200_000.0, 75_000.0)],
        &tariffs(),
        YEAR,
    );
    let acc = &outcome.accounts[0];
    assert_eq!(acc.status, PaymentStatus::Partial);
    assert_eq!(acc.percentage_paid, 37.5);
    assert!(acc.eligible_for_validation);
    assert_eq!(acc.remaining, 125_000);
    assert_invariants(acc);
}

#[test]
fn unbilled_child_defaults_to_pending_tariff() {
    let outcome = reconcile(&[child(1, "Aya Kouassi", 1, "6eme A")], &[], &tariffs(), YEAR);
    let acc = &outcome.accounts[0];
    assert_eq!(acc.origin, AccountOrigin::ChildOnly);
    assert_eq!(acc.total_due, 200_000);
    assert_eq!(acc.percentage_paid, 0.0);
    assert!(!acc.eligible_for_validation);
    assert_invariants(acc);
}

#[test]
fn orphan_ledger_entry_surfaces_as_account() {
    let mut orphan = entry(12, 77, 150_000.0, 150_000.0);
    orphan.child_name = Some("Mariam Toure".into());
    orphan.class_name = Some("CM2".into());

    let outcome = reconcile(&[child(1, "Aya Kouassi", 1, "6eme A")], &[orphan], &tariffs(), YEAR);
    assert_eq!(outcome.accounts.len(), 2);
    let acc = &outcome.accounts[1];
    assert_eq!(acc.origin, AccountOrigin::LedgerOnly);
    assert_eq!(acc.full_name, "Mariam Toure");
    assert_eq!(acc.status, PaymentStatus::Complete);
    assert_eq!(acc.enrollment_status, EnrollmentStatus::Enrolled);
    assert_invariants(acc);
}

#[test]
fn mixed_statuses_roll_up_into_stats() {
    // One complete, one partial, one pending, one orphan.
    let children = vec![
        child(1, "Aya Kouassi", 1, "6eme A"),
        child(2, "Koffi Kouassi", 2, "5eme B"),
        child(3, "Jean Kouame", 1, "6eme A"),
    ];
    let ledger = vec![
        entry(1, 2, 220_000.0, 220_000.0),
        entry(7, 3, 200_000.0, 75_000.0),
        entry(9, 42, 100_000.0, 20_000.0),
    ];
    let outcome = reconcile(&children, &ledger, &tariffs(), YEAR);
    assert_eq!(outcome.accounts.len(), 4);
    for acc in &outcome.accounts {
        assert_invariants(acc);
    }

    let stats = compute_stats(&outcome.accounts);
    assert_eq!(stats.total_accounts, 4);
    assert_eq!(stats.pending_count, 1);
    assert_eq!(stats.partial_count, 2);
    assert_eq!(stats.complete_count, 1);
    assert_eq!(stats.total_due, 720_000);
    assert_eq!(stats.total_paid, 315_000);
    assert_eq!(stats.recovery_rate, 43.75);
}

#[test]
fn every_child_id_appears_exactly_once() {
    let children: Vec<ChildRecord> = (1..=20)
        .map(|i| child(i, &format!("Child {i}"), 1, "6eme A"))
        .collect();
    let ledger: Vec<LedgerEntry> = (5..=25)
        .map(|i| entry(1000 + i, i, 200_000.0, 10_000.0 * i as f64))
        .collect();

    let outcome = reconcile(&children, &ledger, &tariffs(), YEAR);
    // 20 roster children + orphans 21..=25.
    assert_eq!(outcome.accounts.len(), 25);
    let mut ids: Vec<i64> = outcome.accounts.iter().map(|a| a.child_id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 25, "coverage: one account per distinct child id");
    for acc in &outcome.accounts {
        assert_invariants(acc);
    }
}

#[test]
fn append_then_refetch_flips_status_to_complete() {
    let children = vec![child(3, "Jean Kouame", 1, "6eme A")];
    let mut ledger = vec![entry(7, 3, 200_000.0, 75_000.0)];

    let before = reconcile(&children, &ledger, &tariffs(), YEAR);
    let plan = plan_append(&before.accounts, 7, 125_000).unwrap();
    assert_eq!(plan.remaining_after, 0);

    // The mutation lands upstream; the caller re-fetches and re-reconciles.
    ledger[0].total_paid += plan.amount as f64;
    let after = reconcile(&children, &ledger, &tariffs(), YEAR);
    let acc = &after.accounts[0];
    assert_eq!(acc.status, PaymentStatus::Complete);
    assert_eq!(acc.remaining, 0);
    assert_eq!(acc.percentage_paid, 100.0);
}

#[test]
fn create_then_refetch_turns_child_only_into_matched() {
    let children = vec![child(1, "Aya Kouassi", 1, "6eme A")];
    let before = reconcile(&children, &[], &tariffs(), YEAR);
    let plan = plan_create(&before.accounts, 1, 50_000, YEAR).unwrap();
    assert_eq!(plan.class_id, Some(1));

    let after = reconcile(
        &children,
        &[entry(31, 1, 200_000.0, plan.amount as f64)],
        &tariffs(),
        YEAR,
    );
    let acc = &after.accounts[0];
    assert_eq!(acc.origin, AccountOrigin::Matched);
    assert_eq!(acc.status, PaymentStatus::Partial);
    assert_eq!(acc.percentage_paid, 25.0);
}

#[test]
fn create_refused_once_a_dossier_exists() {
    let children = vec![child(3, "Jean Kouame", 1, "6eme A")];
    let outcome = reconcile(&children, &[entry(7, 3, 200_000.0, 0.0)], &tariffs(), YEAR);
    assert!(matches!(
        plan_create(&outcome.accounts, 3, 10_000, YEAR),
        Err(scolaris_recon::PaymentError::AlreadyBilled { child_id: 3, ledger_id: 7 })
    ));
}

#[test]
fn reconcile_is_deterministic() {
    let children = vec![
        child(1, "Aya Kouassi", 1, "6eme A"),
        child(2, "Koffi Kouassi", 2, "5eme B"),
    ];
    let ledger = vec![
        entry(1, 2, 220_000.0, 100_000.0),
        entry(2, 9, 200_000.0, 0.0),
        entry(3, 4, 200_000.0, 50_000.0),
    ];
    let a = reconcile(&children, &ledger, &tariffs(), YEAR);
    let b = reconcile(&children, &ledger, &tariffs(), YEAR);
    let ids_a: Vec<i64> = a.accounts.iter().map(|x| x.child_id).collect();
    let ids_b: Vec<i64> = b.accounts.iter().map(|x| x.child_id).collect();
    assert_eq!(ids_a, ids_b);
    assert_eq!(ids_a, vec![1, 2, 4, 9]);
}

#[test]
fn account_json_uses_snake_case_tags() {
    let outcome = reconcile(
        &[child(3, "Jean Kouame", 1, "6eme A")],
        &[entry(7, 3, 200_000.0, 75_000.0)],
        &tariffs(),
        YEAR,
    );
    let json = serde_json::to_value(&outcome.accounts[0]).unwrap();
    assert_eq!(json["status"], "partial");
    assert_eq!(json["origin"], "matched");
    assert_eq!(json["enrollment_status"], "enrolled");
    assert_eq!(json["ledger_id"], 7);
}
