//! Batch ticket issuance.
//!
//! Walks the participant mirror in ledger order and, for every paid
//! participant without a code, mints a token, renders its QR, records it
//! locally, then mirrors it outward (CSV, codes sheet, participant sheet,
//! email). The local store writes are the commit point: once a code is
//! assigned, no downstream failure undoes it, and re-running the batch
//! skips everyone already holding a code.

use crate::error::{Result, TicketingError};
use crate::providers::{CodeStore, Ledger, ParticipantStore, QrRenderer, TicketMailer};
use crate::records::{CodeRecord, ParticipantRecord};
use crate::sync::CODES_SHEET_HEADER;
use crate::token::{generate_token, DEFAULT_TOKEN_BYTES};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Knobs for one issuance run.
#[derive(Debug, Clone)]
pub struct IssuanceOptions {
    /// Scan URL prefix; the token is appended verbatim.
    pub url_prefix: String,
    /// Directory for rendered `qr_{token}.png` files.
    pub qr_dir: PathBuf,
    /// Local CSV record of minted tokens.
    pub csv_path: PathBuf,
    /// Random bytes per token before encoding.
    pub token_bytes: usize,
    /// Pause between consecutive participants (mail rate shaping).
    pub send_delay: Duration,
    /// Participant sheet name in the external ledger.
    pub participants_sheet: String,
    /// Codes sheet name in the external ledger.
    pub codes_sheet: String,
    /// Whether to send ticket emails.
    pub mail_enabled: bool,
}

impl IssuanceOptions {
    /// Creates options with the stock directory and sheet names.
    #[must_use]
    pub fn new(url_prefix: String) -> Self {
        Self {
            url_prefix,
            qr_dir: PathBuf::from("output_qr"),
            csv_path: PathBuf::from("tickets.csv"),
            token_bytes: DEFAULT_TOKEN_BYTES,
            send_delay: Duration::from_secs(3),
            participants_sheet: "Peserta".to_string(),
            codes_sheet: "Codes".to_string(),
            mail_enabled: true,
        }
    }

    /// Sets the QR output directory.
    #[must_use]
    pub fn with_qr_dir(mut self, qr_dir: PathBuf) -> Self {
        self.qr_dir = qr_dir;
        self
    }

    /// Sets the CSV record path.
    #[must_use]
    pub fn with_csv_path(mut self, csv_path: PathBuf) -> Self {
        self.csv_path = csv_path;
        self
    }

    /// Sets the token entropy in bytes.
    #[must_use]
    pub const fn with_token_bytes(mut self, token_bytes: usize) -> Self {
        self.token_bytes = token_bytes;
        self
    }

    /// Sets the pause between participants.
    #[must_use]
    pub const fn with_send_delay(mut self, send_delay: Duration) -> Self {
        self.send_delay = send_delay;
        self
    }

    /// Sets the external sheet names.
    #[must_use]
    pub fn with_sheets(mut self, participants: String, codes: String) -> Self {
        self.participants_sheet = participants;
        self.codes_sheet = codes;
        self
    }

    /// Enables or disables the mail step.
    #[must_use]
    pub const fn with_mail_enabled(mut self, mail_enabled: bool) -> Self {
        self.mail_enabled = mail_enabled;
        self
    }
}

/// Counters from one issuance run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssuanceSummary {
    /// Participants issued a code. Mail failure does not subtract; see
    /// `mail_failed`.
    pub sent: u64,
    /// Skipped: status was not PAID.
    pub skipped_unpaid: u64,
    /// Skipped: no email on file.
    pub skipped_no_email: u64,
    /// Skipped: a code was already assigned (idempotent re-entry).
    pub skipped_has_code: u64,
    /// Eligible but not issued (QR, store, or assignment failure).
    pub failed: u64,
    /// Issued, but the ticket email did not go out.
    pub mail_failed: u64,
}

/// Sequential issuance over the participant mirror.
///
/// Strictly one participant at a time: each iteration leaves the store
/// consistent, so the process can be interrupted and re-run.
#[derive(Debug, Clone)]
pub struct IssuanceWorkflow<S, L, M, Q> {
    store: S,
    ledger: L,
    mailer: M,
    qr: Q,
    options: IssuanceOptions,
}

impl<S, L, M, Q> IssuanceWorkflow<S, L, M, Q>
where
    S: CodeStore + ParticipantStore,
    L: Ledger,
    M: TicketMailer,
    Q: QrRenderer,
{
    /// Wires a workflow over the store, ledger, mailer, and renderer.
    #[must_use]
    pub const fn new(store: S, ledger: L, mailer: M, qr: Q, options: IssuanceOptions) -> Self {
        Self {
            store,
            ledger,
            mailer,
            qr,
            options,
        }
    }

    /// Runs the batch and returns the closing counters.
    ///
    /// Per-participant failures are logged and counted, never fatal.
    ///
    /// # Errors
    ///
    /// Returns an error only when the run cannot start at all: the QR
    /// directory cannot be created or the participant mirror cannot be
    /// read.
    pub async fn run(&self) -> Result<IssuanceSummary> {
        tokio::fs::create_dir_all(&self.options.qr_dir).await?;
        let participants = self.store.list_participants().await?;
        tracing::info!(count = participants.len(), "starting issuance run");

        let mut summary = IssuanceSummary::default();
        for participant in participants {
            if !participant.is_paid() {
                tracing::debug!(name = %participant.name, status = %participant.status, "skipping: not paid");
                summary.skipped_unpaid += 1;
                continue;
            }
            if participant.email.trim().is_empty() {
                tracing::debug!(name = %participant.name, "skipping: no email");
                summary.skipped_no_email += 1;
                continue;
            }
            if participant.has_code() {
                summary.skipped_has_code += 1;
                continue;
            }

            if self.issue_one(&participant, &mut summary).await {
                // Rate shaping towards the mail and ledger services;
                // applies to every participant whose code went live.
                tokio::time::sleep(self.options.send_delay).await;
            }
        }

        tracing::info!(
            sent = summary.sent,
            skipped_unpaid = summary.skipped_unpaid,
            skipped_no_email = summary.skipped_no_email,
            skipped_has_code = summary.skipped_has_code,
            failed = summary.failed,
            mail_failed = summary.mail_failed,
            "issuance run finished"
        );
        Ok(summary)
    }

    /// Issues one ticket. Returns whether a code record was created (the
    /// signal for rate shaping).
    async fn issue_one(
        &self,
        participant: &ParticipantRecord,
        summary: &mut IssuanceSummary,
    ) -> bool {
        let token = generate_token(self.options.token_bytes);
        let scan_url = format!("{}{}", self.options.url_prefix, token);
        let qr_file = self.options.qr_dir.join(format!("qr_{token}.png"));

        // Nothing is recorded until the QR exists on disk.
        let png = match self.qr.render(&scan_url) {
            Ok(png) => png,
            Err(e) => {
                tracing::warn!(name = %participant.name, "QR render failed: {}", e);
                summary.failed += 1;
                return false;
            }
        };
        if let Err(e) = tokio::fs::write(&qr_file, &png).await {
            tracing::warn!(file = %qr_file.display(), "QR write failed: {}", e);
            summary.failed += 1;
            return false;
        }

        if let Err(e) = self.store.create(&CodeRecord::fresh(token.clone())).await {
            tracing::warn!(name = %participant.name, "code create failed: {}", e);
            summary.failed += 1;
            return false;
        }

        let sent_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        if let Err(e) = self.store.assign_code(participant.id, &token, &sent_at).await {
            // The code row exists but belongs to nobody; the next run
            // issues this participant a fresh one.
            tracing::warn!(name = %participant.name, "code assignment failed: {}", e);
            summary.failed += 1;
            return true;
        }

        // The issuance is committed. Everything below mirrors it outward
        // and is individually best-effort.
        if let Err(e) = self.append_csv(&token, &qr_file, &sent_at).await {
            tracing::warn!(csv = %self.options.csv_path.display(), "CSV record failed: {}", e);
        }
        if let Err(e) = self.push_code(&token, &participant.email).await {
            tracing::warn!(sheet = %self.options.codes_sheet, "codes sheet push failed: {}", e);
        }
        self.push_participant_update(participant, &token, &sent_at)
            .await;

        if self.options.mail_enabled {
            if let Err(e) = self
                .mailer
                .send_ticket(&participant.email, &participant.name, &token, &png)
                .await
            {
                tracing::warn!(email = %participant.email, "ticket mail failed: {}", e);
                summary.mail_failed += 1;
            }
        }

        tracing::info!(name = %participant.name, email = %participant.email, token, "ticket issued");
        summary.sent += 1;
        true
    }

    /// Appends one line to the local CSV record, writing the header when
    /// the file is new.
    async fn append_csv(&self, token: &str, qr_file: &Path, created_at: &str) -> Result<()> {
        let exists = tokio::fs::try_exists(&self.options.csv_path).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.options.csv_path)
            .await?;
        let mut lines = String::new();
        if !exists {
            lines.push_str("Token,File,CreatedAt\n");
        }
        lines.push_str(&format!("{},{},{}\n", token, qr_file.display(), created_at));
        file.write_all(lines.as_bytes()).await?;
        Ok(())
    }

    /// Appends the code to the external codes sheet, creating the sheet
    /// with its header on first use.
    async fn push_code(&self, token: &str, email: &str) -> Result<()> {
        let sheet = &self.options.codes_sheet;
        let values: Vec<String> = [token, "TRUE", "FALSE", "", email]
            .iter()
            .map(ToString::to_string)
            .collect();
        match self.ledger.append_row(sheet, &values).await {
            Err(TicketingError::SheetNotFound { .. }) => {
                let header: Vec<String> =
                    CODES_SHEET_HEADER.iter().map(ToString::to_string).collect();
                self.ledger.create_sheet(sheet, &header).await?;
                self.ledger.append_row(sheet, &values).await
            }
            result => result,
        }
    }

    /// Writes the code and sent time back to the participant sheet.
    ///
    /// The row is located by the recorded position first, then by email,
    /// then by name. Every step is best-effort: a participant the ledger
    /// cannot place anymore is logged and left alone.
    async fn push_participant_update(
        &self,
        participant: &ParticipantRecord,
        token: &str,
        sent_at: &str,
    ) {
        let sheet = &self.options.participants_sheet;
        let recorded = participant
            .sheet_row
            .filter(|row| *row > 1)
            .and_then(|row| u32::try_from(row).ok());
        let row = match recorded {
            Some(row) => Some(row),
            None => self.find_participant_row(participant).await,
        };
        let Some(row) = row else {
            tracing::warn!(name = %participant.name, "participant row not found in ledger, skipping push");
            return;
        };

        // Kode Unik lives in column E, Waktu Kirim in column F.
        if let Err(e) = self.ledger.update_cell(sheet, row, 5, token).await {
            tracing::warn!(row, "participant code push failed: {}", e);
        }
        if let Err(e) = self.ledger.update_cell(sheet, row, 6, sent_at).await {
            tracing::warn!(row, "participant sent-at push failed: {}", e);
        }
    }

    async fn find_participant_row(&self, participant: &ParticipantRecord) -> Option<u32> {
        let sheet = &self.options.participants_sheet;
        for query in [&participant.email, &participant.name] {
            if query.is_empty() {
                continue;
            }
            match self.ledger.find_row(sheet, query).await {
                Ok(Some(row)) => return Some(row),
                Ok(None) => {}
                Err(e) => tracing::warn!(sheet, "participant row lookup failed: {}", e),
            }
        }
        None
    }
}
