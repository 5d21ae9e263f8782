//! Ticket issuance batch.
//!
//! Pulls the participant ledger into the local mirror, then mints and
//! delivers a ticket to every paid participant who does not have one:
//! token, QR image, CSV line, email, and best-effort ledger pushes.
//!
//! # Usage
//!
//! ```bash
//! # Configuration comes from the environment / .env
//! cargo run --bin issue
//! ```

use gatekeeper_server::Config;
use gatekeeper_ticketing::providers::{
    EventDetails, QrPngRenderer, SheetsLedger, SmtpMailer, SmtpMailerConfig,
};
use gatekeeper_ticketing::{
    sync_codes, sync_participants, IssuanceOptions, IssuanceWorkflow, SqliteStore,
};
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

    tracing::info!("Starting ticket issuance batch...");

    let config = Config::from_env();
    let store = SqliteStore::new(&config.database.path).await?;
    let ledger = SheetsLedger::new(
        config.ledger.spreadsheet_id.clone(),
        config.ledger.access_token.clone(),
    );

    // Pull the ledger into the local mirror first. An unreachable ledger
    // is not fatal: the batch then runs over whatever the mirror already
    // holds, and the has-code skip keeps re-runs from double-issuing.
    if config.ledger.is_configured() {
        match sync_participants(&store, &ledger, &config.ledger.participants_sheet).await {
            Ok(summary) => tracing::info!(
                upserted = summary.upserted,
                skipped = summary.skipped,
                "Participants synced"
            ),
            Err(err) => {
                tracing::warn!(error = %err, "Participant sync failed, issuing from the local mirror");
            }
        }

        match sync_codes(&store, &ledger, &config.ledger.codes_sheet).await {
            Ok(summary) => tracing::info!(
                upserted = summary.upserted,
                skipped = summary.skipped,
                "Codes synced"
            ),
            Err(err) => tracing::warn!(error = %err, "Code sync failed, continuing"),
        }
    } else {
        tracing::info!("Ledger not configured, issuing from the local mirror only");
    }

    let mut mail_enabled = config.issuance.mail_enabled;
    if mail_enabled && !config.smtp.is_configured() {
        tracing::warn!("SMTP not configured, ticket mail disabled for this run");
        mail_enabled = false;
    }

    let mailer = SmtpMailer::new(
        SmtpMailerConfig {
            server: config.smtp.server.clone(),
            port: config.smtp.port,
            username: config.smtp.username.clone(),
            password: config.smtp.password.clone(),
            from_email: config.smtp.from_email.clone(),
            from_name: config.smtp.from_name.clone(),
        },
        EventDetails {
            name: config.event.name.clone(),
            venue: config.event.venue.clone(),
            datetime: config.event.datetime.clone(),
        },
    );

    let options = IssuanceOptions::new(config.issuance.url_prefix.clone())
        .with_qr_dir(config.issuance.qr_dir.clone())
        .with_csv_path(config.issuance.csv_path.clone())
        .with_token_bytes(config.issuance.token_bytes)
        .with_send_delay(std::time::Duration::from_secs(
            config.issuance.send_delay_secs,
        ))
        .with_sheets(
            config.ledger.participants_sheet.clone(),
            config.ledger.codes_sheet.clone(),
        )
        .with_mail_enabled(mail_enabled);

    let workflow = IssuanceWorkflow::new(store, ledger, mailer, QrPngRenderer::default(), options);
    let summary = workflow.run().await?;

    tracing::info!(
        sent = summary.sent,
        skipped_unpaid = summary.skipped_unpaid,
        skipped_no_email = summary.skipped_no_email,
        skipped_has_code = summary.skipped_has_code,
        failed = summary.failed,
        mail_failed = summary.mail_failed,
        "Issuance batch finished"
    );

    Ok(())
}
