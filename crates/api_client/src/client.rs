//! School-management HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required).
//! Read feeds retry 429/5xx and network failures with exponential
//! backoff; payment mutations are sent exactly once, tagged with a
//! fresh idempotency key.

use std::thread;
use std::time::Duration;

use scolaris_recon::{
    AppendPlan, ChildRecord, CreatePlan, EnrollmentStatus, LedgerEntry, TariffEntry, TariffTable,
};
use serde::Deserialize;

use crate::auth::{resolve_credentials, AuthCredentials};

const MAX_RETRIES: u32 = 3;
const PAGE_SIZE: usize = 100;
/// Hard stop for the ledger pagination loop in case the server keeps
/// echoing full pages.
const MAX_PAGES: u32 = 1_000;

/// School-management API client (blocking).
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    api_base: String,
    ecole_id: i64,
    token: String,
}

/// Error type for API operations.
#[derive(Debug)]
pub enum ApiError {
    /// No auth credentials configured
    NotAuthenticated,
    /// Token rejected by upstream (401)
    SessionExpired,
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// Server returned a validation error (400/422 with message)
    Validation(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotAuthenticated => {
                write!(f, "Not authenticated — run `scolaris login` first")
            }
            ApiError::SessionExpired => {
                write!(f, "Session expired — run `scolaris login` again")
            }
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

// ── Wire DTOs ───────────────────────────────────────────────────────
//
// The upstream API speaks French camelCase. DTOs stay private; the
// public surface is the engine's model types.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnfantDto {
    id: i64,
    #[serde(default)]
    nom: Option<String>,
    #[serde(default)]
    prenom: Option<String>,
    #[serde(default)]
    classe_id: Option<i64>,
    #[serde(default)]
    classe_nom: Option<String>,
    #[serde(default)]
    statut: Option<String>,
    #[serde(default)]
    tarif_scolarite: Option<f64>,
    #[serde(default)]
    parent_nom: Option<String>,
}

impl EnfantDto {
    fn into_record(self) -> ChildRecord {
        let enrollment_status = match self.statut.as_deref() {
            Some("inscrit") => EnrollmentStatus::Enrolled,
            _ => EnrollmentStatus::PreEnrolled,
        };
        // The hint is advisory; garbage values fall through to the tariff table.
        let tariff_hint = self
            .tarif_scolarite
            .filter(|t| t.is_finite() && *t > 0.0)
            .map(|t| t.round() as i64);

        ChildRecord {
            child_id: self.id,
            full_name: join_name(self.prenom.as_deref(), self.nom.as_deref())
                .unwrap_or_else(|| format!("Child {}", self.id)),
            class_id: self.classe_id,
            class_name: self.classe_nom.unwrap_or_default(),
            enrollment_status,
            tariff_hint,
            guardian_name: self.parent_nom,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaiementDto {
    id: i64,
    enfant_id: i64,
    #[serde(default)]
    montant_total: Option<f64>,
    #[serde(default)]
    montant_paye: Option<f64>,
    #[serde(default)]
    annee_scolaire: Option<String>,
    #[serde(default)]
    enfant_prenom: Option<String>,
    #[serde(default)]
    enfant_nom: Option<String>,
    #[serde(default)]
    classe_nom: Option<String>,
    #[serde(default)]
    classe_id: Option<i64>,
}

impl PaiementDto {
    fn into_entry(self) -> LedgerEntry {
        LedgerEntry {
            ledger_id: self.id,
            child_id: self.enfant_id,
            // A missing amount is an anomaly; NaN lets the engine count it.
            total_due: self.montant_total.unwrap_or(f64::NAN),
            total_paid: self.montant_paye.unwrap_or(f64::NAN),
            school_year: self.annee_scolaire.unwrap_or_default(),
            child_name: join_name(self.enfant_prenom.as_deref(), self.enfant_nom.as_deref()),
            class_name: self.classe_nom,
            class_id: self.classe_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TarifDto {
    id: i64,
    #[serde(default)]
    classe_id: Option<i64>,
    #[serde(default)]
    classe_nom: Option<String>,
    #[serde(default)]
    tarif: Option<f64>,
}

fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let joined = format!(
        "{} {}",
        first.unwrap_or("").trim(),
        last.unwrap_or("").trim()
    );
    let joined = joined.trim().to_string();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

impl ApiClient {
    /// Create a new client using env vars or saved auth credentials.
    pub fn from_saved_auth() -> Result<Self, ApiError> {
        let creds = resolve_credentials().ok_or(ApiError::NotAuthenticated)?;
        Ok(Self::new(creds))
    }

    /// Create a new client with explicit credentials.
    pub fn new(creds: AuthCredentials) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("scolaris/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_base: creds.api_base,
            ecole_id: creds.ecole_id,
            token: creds.token,
        }
    }

    pub fn ecole_id(&self) -> i64 {
        self.ecole_id
    }

    /// Fetch the full roster for the school.
    pub fn fetch_roster(&self) -> Result<Vec<ChildRecord>, ApiError> {
        let url = self.ecole_url("enfants");
        let body = self.get_json(&url, &[])?;
        let items = extract_array(body, "enfants")?;
        items
            .into_iter()
            .map(|item| {
                serde_json::from_value::<EnfantDto>(item)
                    .map(EnfantDto::into_record)
                    .map_err(|e| ApiError::Parse(format!("bad roster row: {}", e)))
            })
            .collect()
    }

    /// Fetch every tuition dossier, walking the paginated endpoint until
    /// a short page signals the end.
    pub fn fetch_ledger(
        &self,
        school_year: Option<&str>,
        class_id: Option<i64>,
    ) -> Result<Vec<LedgerEntry>, ApiError> {
        let url = self.ecole_url("paiements-scolarite/tous");
        let mut entries = Vec::new();

        for page in 1..=MAX_PAGES {
            let mut query = vec![
                ("page".to_string(), page.to_string()),
                ("pageSize".to_string(), PAGE_SIZE.to_string()),
            ];
            if let Some(year) = school_year {
                query.push(("anneeScolaire".to_string(), year.to_string()));
            }
            if let Some(id) = class_id {
                query.push(("classeId".to_string(), id.to_string()));
            }

            let body = self.get_json(&url, &query)?;
            let items = extract_array(body, "paiements")?;
            let page_len = items.len();
            for item in items {
                let dto: PaiementDto = serde_json::from_value(item)
                    .map_err(|e| ApiError::Parse(format!("bad ledger row: {}", e)))?;
                entries.push(dto.into_entry());
            }

            if page_len < PAGE_SIZE {
                return Ok(entries);
            }
        }

        Err(ApiError::Parse(format!(
            "ledger pagination did not terminate within {} pages",
            MAX_PAGES
        )))
    }

    /// Fetch the per-class tariff table. Rows without a usable amount
    /// are dropped.
    pub fn fetch_tariffs(&self) -> Result<TariffTable, ApiError> {
        let url = self.ecole_url("tarifs");
        let body = self.get_json(&url, &[])?;
        let items = extract_array(body, "tarifs")?;

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let dto: TarifDto = serde_json::from_value(item)
                .map_err(|e| ApiError::Parse(format!("bad tariff row: {}", e)))?;
            let Some(amount) = dto.tarif.filter(|t| t.is_finite() && *t > 0.0) else {
                continue;
            };
            rows.push(TariffEntry {
                tariff_id: dto.id,
                class_id: dto.classe_id,
                class_name: dto.classe_nom,
                amount: amount.round() as i64,
            });
        }
        Ok(TariffTable::new(rows))
    }

    /// Fetch the roster and the ledger concurrently.
    ///
    /// Both feeds or neither: mixing a live roster with a stale ledger
    /// would make the merged view lie about orphans and unbilled
    /// children.
    pub fn fetch_feeds(
        &self,
        school_year: Option<&str>,
        class_id: Option<i64>,
    ) -> Result<(Vec<ChildRecord>, Vec<LedgerEntry>), ApiError> {
        let ledger_client = self.clone();
        let year = school_year.map(String::from);
        let handle = thread::spawn(move || ledger_client.fetch_ledger(year.as_deref(), class_id));

        let roster = self.fetch_roster();
        let ledger = handle
            .join()
            .map_err(|_| ApiError::Network("ledger feed worker panicked".into()))?;

        Ok((roster?, ledger?))
    }

    /// Open a tuition dossier with an initial payment.
    ///
    /// Returns the created dossier when the server echoes it back;
    /// callers re-fetch the feeds either way.
    pub fn create_dossier(
        &self,
        plan: &CreatePlan,
        tariff_id: i64,
        method: &str,
        comment: Option<&str>,
    ) -> Result<Option<LedgerEntry>, ApiError> {
        let url = self.ecole_url("paiements-scolarite");
        let body = serde_json::json!({
            "enfantId": plan.child_id,
            "tarifId": tariff_id,
            "anneeScolaire": plan.school_year,
            "montantPaiement": plan.amount,
            "modePaiement": method,
            "commentaire": comment.unwrap_or(""),
        });
        self.send_mutation(self.http.post(&url).json(&body))
    }

    /// Append a payment to an existing dossier.
    pub fn append_payment(
        &self,
        plan: &AppendPlan,
        method: &str,
        comment: Option<&str>,
    ) -> Result<Option<LedgerEntry>, ApiError> {
        let url = self.ecole_url(&format!("paiements-scolarite/{}/paiement", plan.ledger_id));
        let body = serde_json::json!({
            "montant": plan.amount,
            "modePaiement": method,
            "commentaire": comment.unwrap_or(""),
        });
        self.send_mutation(self.http.put(&url).json(&body))
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn ecole_url(&self, rest: &str) -> String {
        format!("{}/api/ecoles/{}/{}", self.api_base, self.ecole_id, rest)
    }

    /// GET with retry + exponential backoff. 401 and 4xx validation
    /// errors fail immediately; 429/5xx and network errors retry.
    fn get_json(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<serde_json::Value, ApiError> {
        let mut backoff_secs = 1u64;

        for attempt in 0..=MAX_RETRIES {
            let result = self
                .http
                .get(url)
                .query(query)
                .bearer_auth(&self.token)
                .send();

            match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    if status == 401 {
                        return Err(ApiError::SessionExpired);
                    }
                    if status == 400 || status == 422 {
                        return Err(ApiError::Validation(resp.text().unwrap_or_default()));
                    }
                    if status >= 400 && status < 500 && status != 429 {
                        return Err(ApiError::Http(status, resp.text().unwrap_or_default()));
                    }

                    if status == 429 || status >= 500 {
                        if attempt == MAX_RETRIES {
                            return Err(ApiError::Http(
                                status,
                                format!("upstream error after {} attempts", MAX_RETRIES),
                            ));
                        }
                        // Respect Retry-After for 429
                        let wait = if status == 429 {
                            resp.headers()
                                .get("retry-after")
                                .and_then(|v| v.to_str().ok())
                                .and_then(|v| v.parse::<u64>().ok())
                                .unwrap_or(backoff_secs)
                        } else {
                            backoff_secs
                        };
                        eprintln!(
                            "warning: retry {}/{} in {}s (HTTP {})",
                            attempt + 1,
                            MAX_RETRIES,
                            wait,
                            status,
                        );
                        thread::sleep(Duration::from_secs(wait));
                        backoff_secs *= 2;
                        continue;
                    }

                    return resp
                        .json::<serde_json::Value>()
                        .map_err(|e| ApiError::Parse(e.to_string()));
                }
                Err(e) => {
                    if attempt == MAX_RETRIES {
                        return Err(ApiError::Network(format!(
                            "upstream error after {} attempts: {}",
                            MAX_RETRIES, e
                        )));
                    }
                    eprintln!(
                        "warning: retry {}/{} in {}s ({})",
                        attempt + 1,
                        MAX_RETRIES,
                        backoff_secs,
                        e,
                    );
                    thread::sleep(Duration::from_secs(backoff_secs));
                    backoff_secs *= 2;
                }
            }
        }

        unreachable!()
    }

    /// Send a mutation exactly once. The idempotency key makes a manual
    /// re-run safe on servers that honor it.
    fn send_mutation(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> Result<Option<LedgerEntry>, ApiError> {
        let response = req
            .bearer_auth(&self.token)
            .header("X-Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 {
            return Err(ApiError::SessionExpired);
        }
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            if status == 400 || status == 422 {
                return Err(ApiError::Validation(body));
            }
            return Err(ApiError::Http(status, body));
        }

        // The payment route answers 204 on some deployments.
        let text = response.text().map_err(|e| ApiError::Network(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<PaiementDto>(&text)
            .map(|dto| Some(dto.into_entry()))
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// The API wraps some collections (`{"paiements": [...]}`) and returns
/// bare arrays for others, depending on the deployment.
fn extract_array(value: serde_json::Value, key: &str) -> Result<Vec<serde_json::Value>, ApiError> {
    match value {
        serde_json::Value::Array(items) => Ok(items),
        serde_json::Value::Object(mut map) => match map.remove(key) {
            Some(serde_json::Value::Array(items)) => Ok(items),
            _ => Err(ApiError::Parse(format!(
                "expected an array or an object with \"{}\"",
                key
            ))),
        },
        _ => Err(ApiError::Parse(format!(
            "expected an array or an object with \"{}\"",
            key
        ))),
    }
}
