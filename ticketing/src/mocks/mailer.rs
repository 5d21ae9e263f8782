//! Mock ticket mailer for testing.

use crate::error::{Result, TicketingError};
use crate::providers::TicketMailer;
use std::sync::{Arc, Mutex};

/// One ticket email captured by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTicket {
    /// Recipient address.
    pub to: String,
    /// Participant name from the greeting.
    pub name: String,
    /// Admission token echoed in the body.
    pub token: String,
}

/// Mock mailer that records sent tickets instead of delivering them.
#[derive(Debug, Clone)]
pub struct MockMailer {
    sent: Arc<Mutex<Vec<SentTicket>>>,
    /// Whether sending should succeed.
    pub should_succeed: bool,
}

impl MockMailer {
    /// Create a new mock mailer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            should_succeed: true,
        }
    }

    /// Get all captured tickets (for testing).
    #[must_use]
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn sent(&self) -> Vec<SentTicket> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for MockMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketMailer for MockMailer {
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn send_ticket(&self, to: &str, name: &str, token: &str, _qr_png: &[u8]) -> Result<()> {
        if !self.should_succeed {
            return Err(TicketingError::Mail("mock mailer failure".to_string()));
        }
        self.sent.lock().unwrap().push(SentTicket {
            to: to.to_string(),
            name: name.to_string(),
            token: token.to_string(),
        });
        Ok(())
    }
}
