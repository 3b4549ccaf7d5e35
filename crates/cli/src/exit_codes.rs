//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 10-19   | feeds            | Feed fetch / credential codes            |
//! | 20-29   | pay              | Payment mutation codes                   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use scolaris_api_client::ApiError;
use scolaris_recon::PaymentError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Feeds (10-19)
// =============================================================================

/// No credentials saved and none in the environment.
pub const EXIT_FEED_NOT_AUTH: u8 = 10;

/// Token rejected by upstream (401).
pub const EXIT_FEED_SESSION_EXPIRED: u8 = 11;

/// Upstream error (5xx) or network failure after retries.
pub const EXIT_FEED_UPSTREAM: u8 = 12;

/// Request rejected by upstream validation (400/422).
pub const EXIT_FEED_VALIDATION: u8 = 13;

// =============================================================================
// Pay (20-29)
// =============================================================================

/// `pay create` for a child that already has a dossier.
pub const EXIT_PAY_ALREADY_BILLED: u8 = 20;

/// Amount non-positive, or above the remaining balance on append.
pub const EXIT_PAY_INVALID_AMOUNT: u8 = 21;

/// No account for the requested child or dossier.
pub const EXIT_PAY_NOT_FOUND: u8 = 22;

// =============================================================================
// Error mapping
// =============================================================================

/// Map an ApiError to its exit code.
pub fn api_exit_code(err: &ApiError) -> u8 {
    match err {
        ApiError::NotAuthenticated => EXIT_FEED_NOT_AUTH,
        ApiError::SessionExpired => EXIT_FEED_SESSION_EXPIRED,
        ApiError::Network(_) | ApiError::Http(_, _) | ApiError::Parse(_) => EXIT_FEED_UPSTREAM,
        ApiError::Validation(_) => EXIT_FEED_VALIDATION,
    }
}

/// Map a PaymentError to its exit code.
pub fn payment_exit_code(err: &PaymentError) -> u8 {
    match err {
        PaymentError::AlreadyBilled { .. } => EXIT_PAY_ALREADY_BILLED,
        PaymentError::InvalidAmount { .. } => EXIT_PAY_INVALID_AMOUNT,
        PaymentError::NotFound(_) => EXIT_PAY_NOT_FOUND,
    }
}
