// Scolaris CLI - tuition-payment reconciliation for school administrators

mod demo;
mod exit_codes;
mod report;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use scolaris_api_client::{
    delete_auth, save_auth, ApiClient, ApiError, AuthCredentials, DEFAULT_API_BASE,
};
use scolaris_recon::{
    compute_stats, plan_append, plan_create, reconcile, EnrollmentAccount, PaymentError,
    PaymentStatus, TariffTable,
};

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser, Debug)]
#[command(name = "scolaris")]
#[command(about = "Tuition-payment reconciliation for school administrators")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save API credentials for later commands
    #[command(after_help = "\
Examples:
  scolaris login --token eyJhbGci... --ecole 2
  SCOLARIS_TOKEN=eyJhbGci... scolaris login")]
    Login {
        /// Bearer token for the school-management API
        #[arg(long, env = "SCOLARIS_TOKEN")]
        token: String,

        /// API base URL
        #[arg(long, default_value = DEFAULT_API_BASE)]
        api_base: String,

        /// School id the token is scoped to
        #[arg(long, default_value_t = 1)]
        ecole: i64,
    },

    /// Remove saved credentials
    Logout,

    /// Fetch both feeds and print the reconciled tuition accounts
    #[command(after_help = "\
Filters (--class, --status, --search) narrow the fetched view without
re-fetching. If the feeds are unreachable the command falls back to the
built-in demo dataset and says so on stderr.

Examples:
  scolaris reconcile
  scolaris reconcile --year 2025-2026 --status partial
  scolaris reconcile --search kouassi --json
  scolaris reconcile -o report.csv")]
    Reconcile {
        /// School year (default: derived from today's date)
        #[arg(long)]
        year: Option<String>,

        /// Keep only accounts in this class
        #[arg(long = "class", value_name = "CLASS_ID")]
        class_id: Option<i64>,

        /// Keep only accounts with this payment status
        #[arg(long)]
        status: Option<StatusArg>,

        /// Keep only accounts whose child name contains this text
        #[arg(long)]
        search: Option<String>,

        /// Print the full report as JSON
        #[arg(long, conflicts_with = "out")]
        json: bool,

        /// Write the accounts as CSV to a file
        #[arg(long, short = 'o', value_name = "FILE")]
        out: Option<PathBuf>,

        /// Use the built-in demo dataset without touching the network
        #[arg(long)]
        demo: bool,
    },

    /// Print summary statistics for the reconciled accounts
    Stats {
        /// School year (default: derived from today's date)
        #[arg(long)]
        year: Option<String>,

        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,

        /// Use the built-in demo dataset without touching the network
        #[arg(long)]
        demo: bool,
    },

    /// Record tuition payments
    Pay {
        #[command(subcommand)]
        command: PayCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PayCommands {
    /// Open a dossier with an initial payment for an unbilled child
    #[command(after_help = "\
Examples:
  scolaris pay create 42 --amount 50000
  scolaris pay create 42 --amount 50000 --method virement --comment 'premier versement'")]
    Create {
        /// Child id from the reconciled view
        child_id: i64,

        /// Initial payment in FCFA
        #[arg(long)]
        amount: i64,

        /// School year (default: derived from today's date)
        #[arg(long)]
        year: Option<String>,

        /// Payment method recorded upstream
        #[arg(long, default_value = "especes")]
        method: String,

        /// Free-form note recorded upstream
        #[arg(long)]
        comment: Option<String>,
    },

    /// Append a payment to an existing dossier
    #[command(after_help = "\
Examples:
  scolaris pay append 7 --amount 125000
  scolaris pay append 7 --amount 125000 --method mobile_money")]
    Append {
        /// Dossier id from the reconciled view
        ledger_id: i64,

        /// Payment in FCFA (at most the remaining balance)
        #[arg(long)]
        amount: i64,

        /// School year (default: derived from today's date)
        #[arg(long)]
        year: Option<String>,

        /// Payment method recorded upstream
        #[arg(long, default_value = "especes")]
        method: String,

        /// Free-form note recorded upstream
        #[arg(long)]
        comment: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Pending,
    Partial,
    Complete,
}

impl From<StatusArg> for PaymentStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => PaymentStatus::Pending,
            StatusArg::Partial => PaymentStatus::Partial,
            StatusArg::Complete => PaymentStatus::Complete,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login { token, api_base, ecole } => cmd_login(token, api_base, ecole),
        Commands::Logout => cmd_logout(),
        Commands::Reconcile {
            year,
            class_id,
            status,
            search,
            json,
            out,
            demo,
        } => cmd_reconcile(year, class_id, status, search, json, out, demo),
        Commands::Stats { year, json, demo } => cmd_stats(year, json, demo),
        Commands::Pay { command } => match command {
            PayCommands::Create { child_id, amount, year, method, comment } => {
                cmd_pay_create(child_id, amount, year, method, comment)
            }
            PayCommands::Append { ledger_id, amount, year, method, comment } => {
                cmd_pay_append(ledger_id, amount, year, method, comment)
            }
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from an API error with the proper exit code.
    pub fn api(err: ApiError) -> Self {
        let hint = match &err {
            ApiError::NotAuthenticated => {
                Some("run `scolaris login --token <TOKEN>` first".to_string())
            }
            ApiError::SessionExpired => {
                Some("run `scolaris login` again with a fresh token".to_string())
            }
            _ => None,
        };
        Self {
            code: exit_codes::api_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }

    /// Create error from a payment validation error with the proper exit code.
    pub fn payment(err: PaymentError) -> Self {
        let hint = match &err {
            PaymentError::AlreadyBilled { ledger_id, .. } => Some(format!(
                "use `scolaris pay append {}` to add to the existing dossier",
                ledger_id
            )),
            PaymentError::InvalidAmount { remaining, .. } if *remaining > 0 => {
                Some(format!("the remaining balance is {}", crate::util::format_fcfa(*remaining)))
            }
            _ => None,
        };
        Self {
            code: exit_codes::payment_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }
}

// ── Commands ────────────────────────────────────────────────────────

fn cmd_login(token: String, api_base: String, ecole: i64) -> Result<(), CliError> {
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(CliError::args("token must not be empty"));
    }
    let api_base = api_base.trim_end_matches('/').to_string();
    let creds = AuthCredentials::new(token, api_base, ecole);
    save_auth(&creds).map_err(|e| CliError { code: EXIT_ERROR, message: e, hint: None })?;
    eprintln!("Credentials saved for school {} at {}", ecole, creds.api_base);
    Ok(())
}

fn cmd_logout() -> Result<(), CliError> {
    delete_auth().map_err(|e| CliError { code: EXIT_ERROR, message: e, hint: None })?;
    eprintln!("Credentials removed");
    Ok(())
}

fn cmd_reconcile(
    year: Option<String>,
    class_id: Option<i64>,
    status: Option<StatusArg>,
    search: Option<String>,
    json: bool,
    out: Option<PathBuf>,
    demo: bool,
) -> Result<(), CliError> {
    let view = load_view(year, demo)?;
    let accounts = report::apply_filters(
        &view.accounts,
        class_id,
        status.map(PaymentStatus::from),
        search.as_deref(),
    );

    if let Some(path) = out {
        report::write_csv(&accounts, &path)?;
        eprintln!("Wrote {} accounts to {}", accounts.len(), path.display());
        return Ok(());
    }

    if json {
        print_json_report(&view, &accounts)?;
        return Ok(());
    }

    print!("{}", report::render_table(&accounts));
    let stats = compute_stats(&accounts);
    println!();
    print!("{}", report::render_stats(&stats));
    print_anomaly_footer(&view);
    Ok(())
}

fn cmd_stats(year: Option<String>, json: bool, demo: bool) -> Result<(), CliError> {
    let view = load_view(year, demo)?;
    let stats = compute_stats(&view.accounts);

    if json {
        let report = report::ReconReport {
            school_year: &view.school_year,
            degraded: view.degraded,
            anomalous_amounts: view.anomalous_amounts,
            duplicate_ledger_entries: view.duplicate_ledger_entries,
            stats,
            accounts: &[],
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::io(format!("JSON encode error: {}", e)))?
        );
        return Ok(());
    }

    println!("School year {}", view.school_year);
    print!("{}", report::render_stats(&stats));
    print_anomaly_footer(&view);
    Ok(())
}

fn cmd_pay_create(
    child_id: i64,
    amount: i64,
    year: Option<String>,
    method: String,
    comment: Option<String>,
) -> Result<(), CliError> {
    let school_year = resolve_year(year);
    let client = ApiClient::from_saved_auth().map_err(CliError::api)?;

    eprintln!("Fetching roster and tuition ledger...");
    let (children, ledger) = client
        .fetch_feeds(Some(&school_year), None)
        .map_err(CliError::api)?;
    let tariffs = client.fetch_tariffs().map_err(CliError::api)?;
    let outcome = reconcile(&children, &ledger, &tariffs, &school_year);

    let plan =
        plan_create(&outcome.accounts, child_id, amount, &school_year).map_err(CliError::payment)?;
    // The create endpoint wants the tariff row id; fall back to the
    // school's first tariff when the class has no dedicated row.
    let tariff_id = tariffs
        .row_for_class(plan.class_id, &plan.class_name)
        .map(|t| t.tariff_id)
        .unwrap_or(1);

    client
        .create_dossier(&plan, tariff_id, &method, comment.as_deref())
        .map_err(CliError::api)?;
    eprintln!(
        "Recorded {} for child {}",
        util::format_fcfa(plan.amount),
        child_id
    );

    // Accounts are never patched in place: re-fetch and show the result.
    let (children, ledger) = client
        .fetch_feeds(Some(&school_year), None)
        .map_err(CliError::api)?;
    let outcome = reconcile(&children, &ledger, &tariffs, &school_year);
    if let Some(acc) = outcome.accounts.iter().find(|a| a.child_id == child_id) {
        print!("{}", report::render_account(acc));
    }
    Ok(())
}

fn cmd_pay_append(
    ledger_id: i64,
    amount: i64,
    year: Option<String>,
    method: String,
    comment: Option<String>,
) -> Result<(), CliError> {
    let school_year = resolve_year(year);
    let client = ApiClient::from_saved_auth().map_err(CliError::api)?;

    eprintln!("Fetching roster and tuition ledger...");
    let (children, ledger) = client
        .fetch_feeds(Some(&school_year), None)
        .map_err(CliError::api)?;
    let tariffs = client.fetch_tariffs().map_err(CliError::api)?;
    let outcome = reconcile(&children, &ledger, &tariffs, &school_year);

    let plan = plan_append(&outcome.accounts, ledger_id, amount).map_err(CliError::payment)?;
    client
        .append_payment(&plan, &method, comment.as_deref())
        .map_err(CliError::api)?;
    eprintln!(
        "Recorded {} on dossier {} ({} remaining)",
        util::format_fcfa(plan.amount),
        ledger_id,
        util::format_fcfa(plan.remaining_after),
    );

    let (children, ledger) = client
        .fetch_feeds(Some(&school_year), None)
        .map_err(CliError::api)?;
    let outcome = reconcile(&children, &ledger, &tariffs, &school_year);
    if let Some(acc) = outcome.accounts.iter().find(|a| a.ledger_id == Some(ledger_id)) {
        print!("{}", report::render_account(acc));
    }
    Ok(())
}

// ── View loading ────────────────────────────────────────────────────

#[derive(Debug)]
struct ReconView {
    accounts: Vec<EnrollmentAccount>,
    anomalous_amounts: u32,
    duplicate_ledger_entries: u32,
    degraded: bool,
    school_year: String,
}

fn resolve_year(year: Option<String>) -> String {
    year.unwrap_or_else(|| util::default_school_year(chrono::Utc::now().date_naive()))
}

/// Fetch and reconcile, falling back to the demo dataset when the live
/// feeds cannot be reached. An expired session is surfaced instead of
/// masked: the fix is a re-login, not stale data.
fn load_view(year: Option<String>, demo: bool) -> Result<ReconView, CliError> {
    let school_year = resolve_year(year);
    if demo {
        return Ok(demo_view(&school_year));
    }

    let client = match ApiClient::from_saved_auth() {
        Ok(client) => client,
        Err(err) => {
            eprintln!("warning: {}", err);
            eprintln!("warning: using the built-in demo dataset (degraded mode)");
            return Ok(demo_view(&school_year));
        }
    };

    match live_view(&client, &school_year) {
        Ok(view) => Ok(view),
        Err(err @ ApiError::SessionExpired) => Err(CliError::api(err)),
        Err(err) => {
            eprintln!("warning: {}", err);
            eprintln!("warning: using the built-in demo dataset (degraded mode)");
            Ok(demo_view(&school_year))
        }
    }
}

fn live_view(client: &ApiClient, school_year: &str) -> Result<ReconView, ApiError> {
    eprintln!("Fetching roster and tuition ledger...");
    let (children, ledger) = client.fetch_feeds(Some(school_year), None)?;
    let tariffs = match client.fetch_tariffs() {
        Ok(table) => table,
        // Tariffs only feed the unbilled-child estimate; the engine has
        // a default when the table is missing.
        Err(err) => {
            eprintln!("warning: tariff feed unavailable ({})", err);
            TariffTable::default()
        }
    };
    let outcome = reconcile(&children, &ledger, &tariffs, school_year);
    Ok(ReconView {
        accounts: outcome.accounts,
        anomalous_amounts: outcome.anomalous_amounts,
        duplicate_ledger_entries: outcome.duplicate_ledger_entries,
        degraded: false,
        school_year: school_year.to_string(),
    })
}

fn demo_view(school_year: &str) -> ReconView {
    let outcome = reconcile(
        &demo::demo_children(),
        &demo::demo_ledger(school_year),
        &demo::demo_tariffs(),
        school_year,
    );
    ReconView {
        accounts: outcome.accounts,
        anomalous_amounts: outcome.anomalous_amounts,
        duplicate_ledger_entries: outcome.duplicate_ledger_entries,
        degraded: true,
        school_year: school_year.to_string(),
    }
}

fn print_json_report(view: &ReconView, accounts: &[EnrollmentAccount]) -> Result<(), CliError> {
    let report = report::ReconReport {
        school_year: &view.school_year,
        degraded: view.degraded,
        anomalous_amounts: view.anomalous_amounts,
        duplicate_ledger_entries: view.duplicate_ledger_entries,
        stats: compute_stats(accounts),
        accounts,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON encode error: {}", e)))?
    );
    Ok(())
}

fn print_anomaly_footer(view: &ReconView) {
    if view.degraded {
        eprintln!("note: demo dataset (live feeds unavailable)");
    }
    if view.anomalous_amounts > 0 {
        eprintln!(
            "note: {} malformed amount(s) clamped to 0",
            view.anomalous_amounts
        );
    }
    if view.duplicate_ledger_entries > 0 {
        eprintln!(
            "note: {} duplicate ledger entr(ies) ignored (latest kept)",
            view.duplicate_ledger_entries
        );
    }
}
