//! Admission token generation.
//!
//! Tokens are random, URL-safe, and uppercased so they survive QR
//! alphanumeric encoding and case-insensitive manual entry at the gate.

/// Default number of random bytes drawn per token.
pub const DEFAULT_TOKEN_BYTES: usize = 16;

/// Generates a cryptographically random admission token.
///
/// Draws `byte_length` bytes from the thread-local CSPRNG, encodes them
/// with the URL-safe base64 alphabet without padding, and uppercases the
/// result. Callers must pass at least [`DEFAULT_TOKEN_BYTES`] for issued
/// tickets.
///
/// # Examples
///
/// ```
/// # use gatekeeper_ticketing::token::generate_token;
/// let token = generate_token(16);
/// assert_eq!(token.len(), 22);
/// assert!(token.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_'));
/// ```
#[must_use]
pub fn generate_token(byte_length: usize) -> String {
    use base64::Engine;
    use rand::RngCore;

    let mut rng = rand::thread_rng();
    let mut random_bytes = vec![0u8; byte_length];
    rng.fill_bytes(&mut random_bytes);

    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .encode(random_bytes)
        .to_uppercase()
}
