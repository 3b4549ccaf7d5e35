use std::collections::HashMap;

use crate::model::{
    AccountOrigin, ChildRecord, EnrollmentAccount, EnrollmentStatus, LedgerEntry, PaymentStatus,
    ReconOutcome, TariffTable,
};

/// Tuition charged when neither the roster hint nor the tariff table
/// resolves an amount for the child's class.
pub const DEFAULT_TUITION: i64 = 200_000;

/// Minimum percentage paid before an admission can be validated.
pub const ELIGIBILITY_THRESHOLD: f64 = 33.33;

/// Merge the roster and ledger feeds into one account per child.
///
/// Single pass over each feed: the ledger is indexed by child id, the
/// roster pass consumes matches, leftovers become orphan accounts. Pure
/// and total: malformed amounts are clamped to zero and counted, never
/// rejected.
pub fn reconcile(
    children: &[ChildRecord],
    ledger: &[LedgerEntry],
    tariffs: &TariffTable,
    school_year: &str,
) -> ReconOutcome {
    let mut duplicate_ledger_entries: u32 = 0;
    let mut by_child: HashMap<i64, &LedgerEntry> = HashMap::new();
    for entry in ledger {
        // Feed order is observation order: a later row replaces an earlier one.
        if by_child.insert(entry.child_id, entry).is_some() {
            duplicate_ledger_entries += 1;
        }
    }

    let mut anomalous_amounts: u32 = 0;
    let mut accounts = Vec::with_capacity(children.len() + by_child.len());

    for child in children {
        let account = match by_child.remove(&child.child_id) {
            Some(entry) => billed_account(child, entry, &mut anomalous_amounts),
            None => unbilled_account(child, tariffs, school_year),
        };
        accounts.push(account);
    }

    // Whatever is left in the index never matched a roster row.
    let mut orphans: Vec<&LedgerEntry> = by_child.into_values().collect();
    orphans.sort_by_key(|entry| entry.child_id);
    for entry in orphans {
        accounts.push(orphan_account(entry, &mut anomalous_amounts));
    }

    ReconOutcome {
        accounts,
        anomalous_amounts,
        duplicate_ledger_entries,
    }
}

/// Roster child with a ledger dossier.
fn billed_account(
    child: &ChildRecord,
    entry: &LedgerEntry,
    anomalies: &mut u32,
) -> EnrollmentAccount {
    let total_due = sanitize_amount(entry.total_due, anomalies);
    let total_paid = sanitize_amount(entry.total_paid, anomalies);
    let derived = derive_payment(total_due, total_paid);

    EnrollmentAccount {
        child_id: child.child_id,
        full_name: child.full_name.clone(),
        class_name: child.class_name.clone(),
        class_id: child.class_id,
        enrollment_status: child.enrollment_status,
        school_year: entry.school_year.clone(),
        total_due,
        total_paid,
        remaining: derived.remaining,
        percentage_paid: derived.percentage_paid,
        status: derived.status,
        eligible_for_validation: derived.eligible,
        ledger_id: Some(entry.ledger_id),
        origin: AccountOrigin::Matched,
    }
}

/// Roster child with no dossier: tuition resolves hint → tariff → default.
fn unbilled_account(
    child: &ChildRecord,
    tariffs: &TariffTable,
    school_year: &str,
) -> EnrollmentAccount {
    let total_due = child
        .tariff_hint
        .or_else(|| tariffs.amount_for_class(child.class_id, &child.class_name))
        .unwrap_or(DEFAULT_TUITION);

    EnrollmentAccount {
        child_id: child.child_id,
        full_name: child.full_name.clone(),
        class_name: child.class_name.clone(),
        class_id: child.class_id,
        enrollment_status: child.enrollment_status,
        school_year: school_year.to_string(),
        total_due,
        total_paid: 0,
        remaining: total_due,
        percentage_paid: 0.0,
        status: PaymentStatus::Pending,
        eligible_for_validation: false,
        ledger_id: None,
        origin: AccountOrigin::ChildOnly,
    }
}

/// Ledger dossier whose child is absent from the roster.
fn orphan_account(entry: &LedgerEntry, anomalies: &mut u32) -> EnrollmentAccount {
    let total_due = sanitize_amount(entry.total_due, anomalies);
    let total_paid = sanitize_amount(entry.total_paid, anomalies);
    let derived = derive_payment(total_due, total_paid);

    let full_name = match entry.child_name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => format!("Child {}", entry.child_id),
    };
    let class_name = match entry.class_name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => "Unknown class".to_string(),
    };
    // No roster record to consult: infer enrollment from payment progress.
    let enrollment_status = if derived.eligible {
        EnrollmentStatus::Enrolled
    } else {
        EnrollmentStatus::PreEnrolled
    };

    EnrollmentAccount {
        child_id: entry.child_id,
        full_name,
        class_name,
        class_id: entry.class_id,
        enrollment_status,
        school_year: entry.school_year.clone(),
        total_due,
        total_paid,
        remaining: derived.remaining,
        percentage_paid: derived.percentage_paid,
        status: derived.status,
        eligible_for_validation: derived.eligible,
        ledger_id: Some(entry.ledger_id),
        origin: AccountOrigin::LedgerOnly,
    }
}

struct DerivedPayment {
    remaining: i64,
    percentage_paid: f64,
    status: PaymentStatus,
    eligible: bool,
}

fn derive_payment(total_due: i64, total_paid: i64) -> DerivedPayment {
    let remaining = (total_due - total_paid).max(0);
    let percentage_paid = if total_due > 0 {
        round2((total_paid as f64 / total_due as f64) * 100.0).min(100.0)
    } else {
        0.0
    };
    let status = if total_paid == 0 {
        PaymentStatus::Pending
    } else if total_paid >= total_due {
        PaymentStatus::Complete
    } else {
        PaymentStatus::Partial
    };

    DerivedPayment {
        remaining,
        percentage_paid,
        status,
        eligible: percentage_paid >= ELIGIBILITY_THRESHOLD,
    }
}

/// Clamp non-finite and negative wire amounts to 0, counting each one.
fn sanitize_amount(raw: f64, anomalies: &mut u32) -> i64 {
    if !raw.is_finite() || raw < 0.0 {
        *anomalies += 1;
        return 0;
    }
    raw.round() as i64
}

/// Round to 2 decimals, half away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
