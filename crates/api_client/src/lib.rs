//! `scolaris-api-client` — Blocking client for the school-management API.
//!
//! Covers the three read feeds (roster, tuition ledger, tariffs) and the
//! two payment mutations. No Tokio runtime required.

pub mod auth;
pub mod client;

pub use auth::{
    auth_file_path, delete_auth, load_auth, resolve_credentials, save_auth, AuthCredentials,
    DEFAULT_API_BASE,
};
pub use client::{ApiClient, ApiError};
