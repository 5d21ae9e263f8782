//! Configuration management for the gatekeeper server.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Local SQLite database configuration
    pub database: DatabaseConfig,
    /// Gate verification configuration
    pub verification: VerificationConfig,
    /// Issuance workflow configuration
    pub issuance: IssuanceConfig,
    /// External Google Sheets ledger configuration
    pub ledger: LedgerConfig,
    /// Outgoing ticket mail configuration
    pub smtp: SmtpConfig,
    /// Event details shown in ticket emails
    pub event: EventConfig,
    /// Admin panel configuration
    pub admin: AdminConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Local database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path
    pub path: PathBuf,
}

/// Gate verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Hours before a used code re-admits
    pub reuse_window_hours: i64,
    /// Scan audit log file path
    pub scan_log_path: PathBuf,
}

/// Issuance workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuanceConfig {
    /// Scan URL prefix embedded in QR codes (token appended verbatim)
    pub url_prefix: String,
    /// Directory for rendered QR images
    pub qr_dir: PathBuf,
    /// Local CSV record of minted tokens
    pub csv_path: PathBuf,
    /// Random bytes per token
    pub token_bytes: usize,
    /// Seconds to pause between consecutive sends
    pub send_delay_secs: u64,
    /// Whether ticket emails are sent at all
    pub mail_enabled: bool,
}

/// External ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Spreadsheet id from the sheet URL
    pub spreadsheet_id: String,
    /// Pre-acquired OAuth 2.0 bearer token with spreadsheet scope
    pub access_token: String,
    /// Participant sheet name
    pub participants_sheet: String,
    /// Codes sheet name
    pub codes_sheet: String,
}

impl LedgerConfig {
    /// Whether enough is configured to talk to the ledger at all.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.spreadsheet_id.is_empty() && !self.access_token.is_empty()
    }
}

/// Outgoing mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay host
    pub server: String,
    /// SMTP relay port
    pub port: u16,
    /// SMTP username
    pub username: String,
    /// SMTP password or app password
    pub password: String,
    /// From address on ticket mail
    pub from_email: String,
    /// From display name on ticket mail
    pub from_name: String,
}

impl SmtpConfig {
    /// Whether enough is configured to send mail.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.from_email.is_empty()
    }
}

/// Event details configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Event name (mail subject and heading)
    pub name: String,
    /// Venue line in the mail body
    pub venue: String,
    /// Date/time line in the mail body, free text
    pub datetime: String,
}

/// Admin panel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Admin password for session issuance
    pub password: String,
    /// Minutes before an admin session expires
    pub session_ttl_minutes: i64,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    #[allow(clippy::too_many_lines)] // Config loading is naturally long but simple
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
            },
            database: DatabaseConfig {
                path: env::var("DATABASE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("data.db")),
            },
            verification: VerificationConfig {
                reuse_window_hours: env::var("REUSE_WINDOW_HOURS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(24),
                scan_log_path: env::var("SCAN_LOG_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("scan_log.txt")),
            },
            issuance: IssuanceConfig {
                url_prefix: env::var("SCAN_URL_PREFIX")
                    .unwrap_or_else(|_| "http://localhost:5000/scan?token=".to_string()),
                qr_dir: env::var("QR_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("output_qr")),
                csv_path: env::var("TICKETS_CSV")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("tickets.csv")),
                token_bytes: env::var("TOKEN_BYTES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(16),
                send_delay_secs: env::var("SEND_DELAY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
                mail_enabled: env::var("MAIL_ENABLED")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
            },
            ledger: LedgerConfig {
                spreadsheet_id: env::var("SPREADSHEET_ID").unwrap_or_default(),
                access_token: env::var("SHEETS_ACCESS_TOKEN").unwrap_or_default(),
                participants_sheet: env::var("PARTICIPANTS_SHEET")
                    .unwrap_or_else(|_| "Peserta".to_string()),
                codes_sheet: env::var("CODES_SHEET").unwrap_or_else(|_| "Codes".to_string()),
            },
            smtp: SmtpConfig {
                server: env::var("SMTP_SERVER").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(587),
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_email: env::var("FROM_EMAIL").unwrap_or_default(),
                from_name: env::var("FROM_NAME").unwrap_or_else(|_| "Ticketing".to_string()),
            },
            event: EventConfig {
                name: env::var("EVENT_NAME").unwrap_or_default(),
                venue: env::var("EVENT_VENUE").unwrap_or_default(),
                datetime: env::var("EVENT_DATETIME").unwrap_or_default(),
            },
            admin: AdminConfig {
                password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
                session_ttl_minutes: env::var("ADMIN_SESSION_TTL_MINUTES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            },
        }
    }
}
