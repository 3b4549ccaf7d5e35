//! Rendering and client-side filtering of the reconciled view.
//!
//! Filters never re-fetch: they narrow the accounts already in memory,
//! the way the original screen's filter bar behaves.

use std::path::Path;

use scolaris_recon::{EnrollmentAccount, PaymentStatus, TuitionStats};
use serde::Serialize;

use crate::util::format_fcfa;
use crate::CliError;

/// Full JSON report for `--json` output.
#[derive(Debug, Serialize)]
pub(crate) struct ReconReport<'a> {
    pub school_year: &'a str,
    pub degraded: bool,
    pub anomalous_amounts: u32,
    pub duplicate_ledger_entries: u32,
    pub stats: TuitionStats,
    pub accounts: &'a [EnrollmentAccount],
}

pub(crate) fn apply_filters(
    accounts: &[EnrollmentAccount],
    class_id: Option<i64>,
    status: Option<PaymentStatus>,
    search: Option<&str>,
) -> Vec<EnrollmentAccount> {
    let needle = search.map(str::to_lowercase);
    accounts
        .iter()
        .filter(|a| class_id.is_none() || a.class_id == class_id)
        .filter(|a| status.is_none() || Some(a.status) == status)
        .filter(|a| match &needle {
            Some(n) => a.full_name.to_lowercase().contains(n),
            None => true,
        })
        .cloned()
        .collect()
}

pub(crate) fn render_table(accounts: &[EnrollmentAccount]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:<24} {:<10} {:<9} {:>14} {:>14} {:>14} {:>7} {:<4} {:<11}\n",
        "ID", "CHILD", "CLASS", "STATUS", "DUE", "PAID", "REMAINING", "PAID%", "ELIG", "ORIGIN"
    ));
    for acc in accounts {
        out.push_str(&format!(
            "{:<6} {:<24} {:<10} {:<9} {:>14} {:>14} {:>14} {:>6.2}% {:<4} {:<11}\n",
            acc.child_id,
            acc.full_name,
            acc.class_name,
            acc.status,
            format_fcfa(acc.total_due),
            format_fcfa(acc.total_paid),
            format_fcfa(acc.remaining),
            acc.percentage_paid,
            if acc.eligible_for_validation { "yes" } else { "no" },
            acc.origin,
        ));
    }
    out
}

pub(crate) fn render_account(acc: &EnrollmentAccount) -> String {
    let dossier = match acc.ledger_id {
        Some(id) => format!("#{}", id),
        None => "none".to_string(),
    };
    format!(
        "Child #{} — {} ({})\n\
         \x20 dossier:    {}\n\
         \x20 year:       {}\n\
         \x20 status:     {} ({:.2}% paid)\n\
         \x20 due:        {}\n\
         \x20 paid:       {}\n\
         \x20 remaining:  {}\n\
         \x20 eligible:   {}\n",
        acc.child_id,
        acc.full_name,
        acc.class_name,
        dossier,
        acc.school_year,
        acc.status,
        acc.percentage_paid,
        format_fcfa(acc.total_due),
        format_fcfa(acc.total_paid),
        format_fcfa(acc.remaining),
        if acc.eligible_for_validation { "yes" } else { "no" },
    )
}

pub(crate) fn render_stats(stats: &TuitionStats) -> String {
    format!(
        "Accounts:        {}\n\
         \x20 pending:       {}\n\
         \x20 partial:       {}\n\
         \x20 complete:      {}\n\
         Enrollment:      {} enrolled, {} pre-enrolled\n\
         Total due:       {}\n\
         Total paid:      {}\n\
         Recovery rate:   {:.2}%\n",
        stats.total_accounts,
        stats.pending_count,
        stats.partial_count,
        stats.complete_count,
        stats.enrolled_count,
        stats.pre_enrolled_count,
        format_fcfa(stats.total_due),
        format_fcfa(stats.total_paid),
        stats.recovery_rate,
    )
}

/// Write accounts as CSV, sorted by child id so two runs over the same
/// data produce byte-identical output.
pub(crate) fn write_csv(accounts: &[EnrollmentAccount], path: &Path) -> Result<(), CliError> {
    let mut sorted: Vec<&EnrollmentAccount> = accounts.iter().collect();
    sorted.sort_by_key(|a| a.child_id);

    let file = std::fs::File::create(path)
        .map_err(|e| CliError::io(format!("cannot create {}: {}", path.display(), e)))?;
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(std::io::BufWriter::new(file));

    writer
        .write_record([
            "child_id",
            "full_name",
            "class_name",
            "school_year",
            "enrollment_status",
            "status",
            "origin",
            "total_due",
            "total_paid",
            "remaining",
            "percentage_paid",
            "eligible_for_validation",
            "ledger_id",
        ])
        .map_err(|e| CliError::io(format!("CSV write error: {}", e)))?;

    for acc in sorted {
        writer
            .write_record([
                acc.child_id.to_string(),
                acc.full_name.clone(),
                acc.class_name.clone(),
                acc.school_year.clone(),
                acc.enrollment_status.to_string(),
                acc.status.to_string(),
                acc.origin.to_string(),
                acc.total_due.to_string(),
                acc.total_paid.to_string(),
                acc.remaining.to_string(),
                format!("{:.2}", acc.percentage_paid),
                acc.eligible_for_validation.to_string(),
                acc.ledger_id.map(|id| id.to_string()).unwrap_or_default(),
            ])
            .map_err(|e| CliError::io(format!("CSV write error: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| CliError::io(format!("CSV flush error: {}", e)))?;
    Ok(())
}
