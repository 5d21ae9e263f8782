//! SMTP ticket mailer implementation using Lettre.

use crate::error::{Result, TicketingError};
use crate::providers::TicketMailer;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Body, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// SMTP connection settings.
#[derive(Debug, Clone)]
pub struct SmtpMailerConfig {
    /// SMTP server address (e.g., "smtp.gmail.com").
    pub server: String,
    /// SMTP server port (usually 587 for TLS, 465 for SSL).
    pub port: u16,
    /// SMTP authentication username.
    pub username: String,
    /// SMTP authentication password.
    pub password: String,
    /// Address mail is sent from.
    pub from_email: String,
    /// Display name shown next to the from address.
    pub from_name: String,
}

/// Event details rendered into every ticket email.
#[derive(Debug, Clone, Default)]
pub struct EventDetails {
    /// Event name, also used in the subject line.
    pub name: String,
    /// Venue line.
    pub venue: String,
    /// Date/time line, preformatted for display.
    pub datetime: String,
}

/// Ticket mailer sending real email via SMTP.
///
/// The QR image travels as an inline attachment referenced from the HTML
/// body as `cid:qrimage`, so it renders without remote-image permission.
#[derive(Clone)]
pub struct SmtpMailer {
    server: String,
    port: u16,
    credentials: Credentials,
    from_email: String,
    from_name: String,
    event: EventDetails,
}

impl SmtpMailer {
    /// Creates a new SMTP ticket mailer.
    #[must_use]
    pub fn new(config: SmtpMailerConfig, event: EventDetails) -> Self {
        Self {
            server: config.server,
            port: config.port,
            credentials: Credentials::new(config.username, config.password),
            from_email: config.from_email,
            from_name: config.from_name,
            event,
        }
    }

    /// Opens a relay transport for one message.
    ///
    /// Issuance spaces sends seconds apart, so transports are not reused
    /// across messages.
    fn transport(&self) -> Result<SmtpTransport> {
        let relay = SmtpTransport::relay(&self.server)
            .map_err(|e| TicketingError::Mail(format!("SMTP relay error: {e}")))?;
        Ok(relay
            .port(self.port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn sender(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    fn ticket_html(&self, name: &str, token: &str) -> String {
        let name = escape_html(name);
        let token = escape_html(token);
        let event = escape_html(&self.event.name);
        let venue = escape_html(&self.event.venue);
        let datetime = escape_html(&self.event.datetime);
        format!(
            r#"<html><head><style>
  body {{ margin:0; padding:0; font-family: Arial, sans-serif; background:#f4f6f8; }}
  .wrap {{ padding:18px; }}
  .card {{ max-width:520px; background:#fff; border-radius:12px; padding:20px; margin:10px auto; text-align:center; }}
  .when, .where {{ color:#6b7280; font-size:13px; }}
  .code {{ margin:10px auto; font-weight:700; background:#f8fafc; padding:8px 12px; display:inline-block; border-radius:8px; }}
  .qr {{ width:240px; height:240px; border:1px solid #e6eef9; border-radius:8px; display:block; margin:12px auto; }}
  .muted {{ color:#6b7280; font-size:13px; margin-top:8px; }}
</style></head>
<body><div class="wrap"><div class="card">
  <h2>{event}</h2>
  <div class="when">{datetime}</div>
  <div class="where">{venue}</div>
  <p>Hi <strong>{name}</strong>,</p>
  <p>Here is your digital ticket. Show the QR code at the gate.</p>
  <img src="cid:qrimage" alt="QR ticket" class="qr">
  <div class="code">{token}</div>
  <p class="muted">The code admits one person. Please do not share it.</p>
</div></div></body></html>
"#
        )
    }
}

impl TicketMailer for SmtpMailer {
    async fn send_ticket(&self, to: &str, name: &str, token: &str, qr_png: &[u8]) -> Result<()> {
        let from = self
            .sender()
            .parse()
            .map_err(|e| TicketingError::Mail(format!("Invalid from address: {e}")))?;
        let to = to
            .parse()
            .map_err(|e| TicketingError::Mail(format!("Invalid to address: {e}")))?;
        let png_type = ContentType::parse("image/png")
            .map_err(|e| TicketingError::Mail(format!("Invalid attachment type: {e}")))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(format!("Digital Ticket - {}", self.event.name))
            .multipart(
                MultiPart::related()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(self.ticket_html(name, token)),
                    )
                    .singlepart(
                        Attachment::new_inline("qrimage".to_string())
                            .body(Body::new(qr_png.to_vec()), png_type),
                    ),
            )
            .map_err(|e| TicketingError::Mail(format!("Failed to build email: {e}")))?;

        let transport = self.transport()?;
        tokio::task::spawn_blocking(move || {
            transport
                .send(&email)
                .map(|_| ())
                .map_err(|e| TicketingError::Mail(format!("Failed to send email: {e}")))
        })
        .await
        .map_err(|e| TicketingError::Mail(format!("Email task failed: {e}")))?
    }
}

/// Minimal HTML escaping for values interpolated into the ticket body.
///
/// Names and event details come from the registration sheet, so they are
/// untrusted text.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
