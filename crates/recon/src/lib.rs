//! `scolaris-recon` — Tuition-payment reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded roster and ledger records,
//! returns derived enrollment accounts. No CLI or IO dependencies.

pub mod engine;
pub mod model;
pub mod payment;
pub mod stats;

pub use engine::{reconcile, DEFAULT_TUITION, ELIGIBILITY_THRESHOLD};
pub use model::{
    AccountOrigin, ChildRecord, EnrollmentAccount, EnrollmentStatus, LedgerEntry, PaymentStatus,
    ReconOutcome, TariffEntry, TariffTable,
};
pub use payment::{plan_append, plan_create, AppendPlan, CreatePlan, PaymentError};
pub use stats::{compute_stats, TuitionStats};
