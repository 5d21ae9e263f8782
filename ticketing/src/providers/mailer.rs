//! Ticket mailer trait.

use crate::error::Result;

/// Ticket delivery by email.
///
/// Delivery is best-effort: the code is already live in the store when the
/// mailer runs, so a failure here is logged and counted, never rolled back.
pub trait TicketMailer: Send + Sync {
    /// Send one ticket email with the QR image attached inline.
    ///
    /// # Arguments
    ///
    /// - `to`: recipient address
    /// - `name`: participant name for the greeting
    /// - `token`: admission token echoed in the body
    /// - `qr_png`: rendered QR image, referenced from the HTML body as
    ///   `cid:qrimage`
    ///
    /// # Errors
    ///
    /// Returns `Mail` if the message cannot be built or delivered.
    fn send_ticket(
        &self,
        to: &str,
        name: &str,
        token: &str,
        qr_png: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
