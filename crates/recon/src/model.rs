use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Enrollment state of a child in the roster feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    PreEnrolled,
    Enrolled,
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreEnrolled => write!(f, "pre_enrolled"),
            Self::Enrolled => write!(f, "enrolled"),
        }
    }
}

/// A single child from the roster feed. Read-only input.
#[derive(Debug, Clone)]
pub struct ChildRecord {
    pub child_id: i64,
    pub full_name: String,
    pub class_id: Option<i64>,
    pub class_name: String,
    pub enrollment_status: EnrollmentStatus,
    /// Suggested tuition from the roster, when the school set one.
    pub tariff_hint: Option<i64>,
    pub guardian_name: Option<String>,
}

/// A tuition dossier from the ledger feed.
///
/// Amounts are raw wire values: upstream sends JSON numbers that may be
/// null, negative, or non-finite. The engine sanitizes instead of failing.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub ledger_id: i64,
    /// May reference a child absent from the roster (orphan entry).
    pub child_id: i64,
    pub total_due: f64,
    pub total_paid: f64,
    pub school_year: String,
    // Denormalized display fields carried by the feed.
    pub child_name: Option<String>,
    pub class_name: Option<String>,
    pub class_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Tariffs
// ---------------------------------------------------------------------------

/// One row of the tariff feed.
#[derive(Debug, Clone)]
pub struct TariffEntry {
    pub tariff_id: i64,
    pub class_id: Option<i64>,
    pub class_name: Option<String>,
    pub amount: i64,
}

/// Tuition charged per class, used when a child has no dossier yet.
#[derive(Debug, Clone, Default)]
pub struct TariffTable {
    entries: Vec<TariffEntry>,
}

impl TariffTable {
    pub fn new(entries: Vec<TariffEntry>) -> Self {
        Self { entries }
    }

    /// Tariff row for a class, matched by id first, then by name.
    pub fn row_for_class(&self, class_id: Option<i64>, class_name: &str) -> Option<&TariffEntry> {
        if let Some(id) = class_id {
            if let Some(row) = self.entries.iter().find(|t| t.class_id == Some(id)) {
                return Some(row);
            }
        }
        self.entries
            .iter()
            .find(|t| t.class_name.as_deref() == Some(class_name))
    }

    pub fn amount_for_class(&self, class_id: Option<i64>, class_name: &str) -> Option<i64> {
        self.row_for_class(class_id, class_name).map(|t| t.amount)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Derived accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Complete,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Partial => write!(f, "partial"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Which feed(s) an account was assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountOrigin {
    /// Roster child with a matching ledger dossier.
    Matched,
    /// Roster child with no dossier yet (unbilled).
    ChildOnly,
    /// Ledger dossier whose child is absent from the roster.
    LedgerOnly,
}

impl std::fmt::Display for AccountOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::ChildOnly => write!(f, "child_only"),
            Self::LedgerOnly => write!(f, "ledger_only"),
        }
    }
}

/// One reconciled tuition account per distinct child id across both feeds.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentAccount {
    pub child_id: i64,
    pub full_name: String,
    pub class_name: String,
    pub class_id: Option<i64>,
    pub enrollment_status: EnrollmentStatus,
    pub school_year: String,
    pub total_due: i64,
    pub total_paid: i64,
    /// Clamped at zero: overpayment never shows a negative balance.
    pub remaining: i64,
    /// In [0, 100], rounded to 2 decimals.
    pub percentage_paid: f64,
    pub status: PaymentStatus,
    pub eligible_for_validation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_id: Option<i64>,
    pub origin: AccountOrigin,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Reconciled accounts plus anomaly counters.
///
/// The engine never errors on data-shape problems; it clamps and counts.
#[derive(Debug, Clone, Serialize)]
pub struct ReconOutcome {
    pub accounts: Vec<EnrollmentAccount>,
    /// Non-finite or negative wire amounts clamped to 0.
    pub anomalous_amounts: u32,
    /// Extra ledger rows for a child that already had one (last row wins).
    pub duplicate_ledger_entries: u32,
}
