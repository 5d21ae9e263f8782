//! Standalone code minting.
//!
//! Pre-mints admission codes with no participant attached: token, store
//! record, QR image, CSV line, best-effort codes-sheet push. Meant for
//! walk-in tickets sold at the door.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin mint          # one code
//! cargo run --bin mint -- 25    # a batch
//! ```

use chrono::Utc;
use gatekeeper_server::Config;
use gatekeeper_ticketing::providers::{
    CodeStore, Ledger, QrPngRenderer, QrRenderer, SheetsLedger,
};
use gatekeeper_ticketing::sync::CODES_SHEET_HEADER;
use gatekeeper_ticketing::{generate_token, CodeRecord, SqliteStore, TicketingError};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "info,gatekeeper_server=debug,gatekeeper_ticketing=debug,sqlx=warn".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let count: usize = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1);

    let config = Config::from_env();
    let store = SqliteStore::new(&config.database.path).await?;
    let ledger = config.ledger.is_configured().then(|| {
        SheetsLedger::new(
            config.ledger.spreadsheet_id.clone(),
            config.ledger.access_token.clone(),
        )
    });
    let renderer = QrPngRenderer::default();

    tokio::fs::create_dir_all(&config.issuance.qr_dir).await?;
    tracing::info!(count, "Minting standalone codes...");

    for _ in 0..count {
        let token = generate_token(config.issuance.token_bytes);
        let scan_url = format!("{}{}", config.issuance.url_prefix, token);
        let qr_file = config.issuance.qr_dir.join(format!("qr_{token}.png"));

        let png = renderer.render(&scan_url)?;
        tokio::fs::write(&qr_file, &png).await?;

        store.create(&CodeRecord::fresh(token.clone())).await?;
        append_csv(&config.issuance.csv_path, &token, &qr_file).await?;

        if let Some(ledger) = &ledger {
            if let Err(err) = push_code(ledger, &config.ledger.codes_sheet, &token).await {
                tracing::warn!(token, error = %err, "Codes sheet push failed");
            }
        }

        tracing::info!(token, file = %qr_file.display(), url = %scan_url, "Code minted");
    }

    Ok(())
}

/// Appends one line to the local CSV record, writing the header when the
/// file is new.
async fn append_csv(
    csv_path: &Path,
    token: &str,
    qr_file: &Path,
) -> gatekeeper_ticketing::Result<()> {
    let exists = tokio::fs::try_exists(csv_path).await?;
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)
        .await?;
    let mut lines = String::new();
    if !exists {
        lines.push_str("Token,File,CreatedAt\n");
    }
    let created_at = Utc::now().format("%Y-%m-%d %H:%M:%S");
    lines.push_str(&format!("{},{},{}\n", token, qr_file.display(), created_at));
    file.write_all(lines.as_bytes()).await?;
    Ok(())
}

/// Appends a walk-in code to the codes sheet, creating the sheet with its
/// header on first use. Walk-ins have no email, so that column stays empty.
async fn push_code(
    ledger: &SheetsLedger,
    sheet: &str,
    token: &str,
) -> gatekeeper_ticketing::Result<()> {
    let values: Vec<String> = [token, "TRUE", "FALSE", "", ""]
        .iter()
        .map(ToString::to_string)
        .collect();
    match ledger.append_row(sheet, &values).await {
        Err(TicketingError::SheetNotFound { .. }) => {
            let header: Vec<String> = CODES_SHEET_HEADER.iter().map(ToString::to_string).collect();
            ledger.create_sheet(sheet, &header).await?;
            ledger.append_row(sheet, &values).await
        }
        result => result,
    }
}
