//! Token storage.
//!
//! Reads/writes ~/.config/scolaris/auth.json (0600 on Unix).
//! Environment variables take precedence, so CI and scripts can run
//! without a saved file: SCOLARIS_TOKEN, SCOLARIS_API_BASE,
//! SCOLARIS_ECOLE_ID.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://api.scolaris.app";

/// Authentication credentials stored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCredentials {
    /// Bearer token for the school-management API
    pub token: String,
    /// API base URL (e.g., "https://api.scolaris.app")
    pub api_base: String,
    /// School the token is scoped to
    pub ecole_id: i64,
    /// User name (for display)
    #[serde(default)]
    pub user_name: Option<String>,
}

impl AuthCredentials {
    pub fn new(token: String, api_base: String, ecole_id: i64) -> Self {
        Self {
            token,
            api_base,
            ecole_id,
            user_name: None,
        }
    }
}

/// Returns the path to the auth credentials file.
pub fn auth_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("scolaris/auth.json"))
}

/// Load saved auth credentials from disk.
/// Returns None if no credentials are saved or if the file is invalid.
pub fn load_auth() -> Option<AuthCredentials> {
    let path = auth_file_path()?;
    let contents = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Resolve credentials: environment first, then the saved file.
pub fn resolve_credentials() -> Option<AuthCredentials> {
    if let Ok(token) = std::env::var("SCOLARIS_TOKEN") {
        let token = token.trim().to_string();
        if !token.is_empty() {
            let api_base = std::env::var("SCOLARIS_API_BASE")
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
            let ecole_id = ecole_id_from_env(std::env::var("SCOLARIS_ECOLE_ID").ok());
            return Some(AuthCredentials::new(token, api_base, ecole_id));
        }
    }
    load_auth()
}

/// Parse the SCOLARIS_ECOLE_ID override. A garbage value would target
/// the wrong school's feeds, so it warns instead of failing silently.
fn ecole_id_from_env(raw: Option<String>) -> i64 {
    let Some(raw) = raw else { return 1 };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 1;
    }
    match trimmed.parse() {
        Ok(id) => id,
        Err(_) => {
            eprintln!(
                "warning: SCOLARIS_ECOLE_ID {:?} is not a number, using school 1",
                raw
            );
            1
        }
    }
}

/// Save auth credentials to disk.
/// Creates the parent directory if it doesn't exist.
/// Sets 0600 permissions on Unix.
pub fn save_auth(creds: &AuthCredentials) -> Result<(), String> {
    let path = auth_file_path().ok_or("Could not determine config directory")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let contents = serde_json::to_string_pretty(creds)
        .map_err(|e| format!("Failed to serialize credentials: {}", e))?;

    std::fs::write(&path, &contents).map_err(|e| format!("Failed to write auth file: {}", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, permissions)
            .map_err(|e| format!("Failed to set file permissions: {}", e))?;
    }

    Ok(())
}

/// Delete saved auth credentials.
pub fn delete_auth() -> Result<(), String> {
    let Some(path) = auth_file_path() else {
        return Ok(());
    };
    if path.exists() {
        std::fs::remove_file(&path).map_err(|e| format!("Failed to delete auth file: {}", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_credentials_roundtrip() {
        let creds = AuthCredentials {
            token: "test-token".into(),
            api_base: "https://api.scolaris.app".into(),
            ecole_id: 7,
            user_name: Some("Awa Diabate".into()),
        };

        let json = serde_json::to_string_pretty(&creds).unwrap();
        let parsed: AuthCredentials = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.token, "test-token");
        assert_eq!(parsed.api_base, "https://api.scolaris.app");
        assert_eq!(parsed.ecole_id, 7);
        assert_eq!(parsed.user_name.as_deref(), Some("Awa Diabate"));
    }

    #[test]
    fn test_auth_credentials_missing_optional_fields() {
        let json = r#"{"token":"tok","api_base":"https://api.scolaris.app","ecole_id":1}"#;
        let parsed: AuthCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.token, "tok");
        assert!(parsed.user_name.is_none());
    }

    #[test]
    fn test_ecole_id_env_override() {
        assert_eq!(ecole_id_from_env(None), 1);
        assert_eq!(ecole_id_from_env(Some("7".into())), 7);
        assert_eq!(ecole_id_from_env(Some(" 2 ".into())), 2);
        assert_eq!(ecole_id_from_env(Some("".into())), 1);
        assert_eq!(ecole_id_from_env(Some("abc".into())), 1);
    }

    #[test]
    fn test_auth_file_path_exists() {
        let path = auth_file_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("scolaris"));
        assert!(path.to_string_lossy().contains("auth.json"));
    }

    #[test]
    fn test_save_and_load_auth() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");

        // Manually write and read since save_auth uses the real config path
        let creds = AuthCredentials::new("tok123".into(), "https://api.test".into(), 2);
        let json = serde_json::to_string_pretty(&creds).unwrap();
        std::fs::write(&path, &json).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: AuthCredentials = serde_json::from_str(&contents).unwrap();
        assert_eq!(loaded.token, "tok123");
        assert_eq!(loaded.api_base, "https://api.test");
        assert_eq!(loaded.ecole_id, 2);
    }
}
