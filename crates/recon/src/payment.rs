use std::fmt;

use crate::model::{AccountOrigin, EnrollmentAccount};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Create was attempted for a child that already has a dossier.
    AlreadyBilled { child_id: i64, ledger_id: i64 },
    /// Amount is non-positive, or exceeds the remaining balance on append.
    InvalidAmount { amount: i64, remaining: i64 },
    /// No account carries the requested child or ledger id.
    NotFound(String),
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyBilled { child_id, ledger_id } => {
                write!(f, "child {child_id} already has dossier {ledger_id}")
            }
            Self::InvalidAmount { amount, remaining } => {
                write!(f, "invalid amount {amount} (remaining balance: {remaining})")
            }
            Self::NotFound(what) => write!(f, "not found: {what}"),
        }
    }
}

impl std::error::Error for PaymentError {}

/// Validated request to open a new dossier for an unbilled child.
///
/// Plans are pure descriptions; executing them over HTTP is the client's
/// job, and the caller re-fetches both feeds afterwards instead of
/// patching accounts in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePlan {
    pub child_id: i64,
    pub class_id: Option<i64>,
    pub class_name: String,
    pub amount: i64,
    pub school_year: String,
}

/// Validated request to append a payment to an existing dossier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendPlan {
    pub ledger_id: i64,
    pub amount: i64,
    /// Balance the dossier will show once the payment lands.
    pub remaining_after: i64,
}

/// Validate opening a dossier against the current reconciled view.
pub fn plan_create(
    accounts: &[EnrollmentAccount],
    child_id: i64,
    amount: i64,
    school_year: &str,
) -> Result<CreatePlan, PaymentError> {
    let account = accounts
        .iter()
        .find(|a| a.child_id == child_id)
        .ok_or_else(|| PaymentError::NotFound(format!("child {child_id}")))?;

    if account.origin != AccountOrigin::ChildOnly {
        // Matched and LedgerOnly accounts always carry a ledger id.
        let ledger_id = account.ledger_id.unwrap_or_default();
        return Err(PaymentError::AlreadyBilled { child_id, ledger_id });
    }
    if amount <= 0 {
        return Err(PaymentError::InvalidAmount {
            amount,
            remaining: account.remaining,
        });
    }

    Ok(CreatePlan {
        child_id,
        class_id: account.class_id,
        class_name: account.class_name.clone(),
        amount,
        school_year: school_year.to_string(),
    })
}

/// Validate appending a payment: positive and bounded by the balance.
pub fn plan_append(
    accounts: &[EnrollmentAccount],
    ledger_id: i64,
    amount: i64,
) -> Result<AppendPlan, PaymentError> {
    let account = accounts
        .iter()
        .find(|a| a.ledger_id == Some(ledger_id))
        .ok_or_else(|| PaymentError::NotFound(format!("dossier {ledger_id}")))?;

    if amount <= 0 || amount > account.remaining {
        return Err(PaymentError::InvalidAmount {
            amount,
            remaining: account.remaining,
        });
    }

    Ok(AppendPlan {
        ledger_id,
        amount,
        remaining_after: account.remaining - amount,
    })
}
