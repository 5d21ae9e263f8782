//! Mock QR renderer for testing.

use crate::error::{Result, TicketingError};
use crate::providers::QrRenderer;
use std::sync::{Arc, Mutex};

/// Mock renderer that returns a fixed PNG-tagged byte blob and records
/// every payload it was asked to render.
#[derive(Debug, Clone)]
pub struct MockQrRenderer {
    rendered: Arc<Mutex<Vec<String>>>,
    /// Whether rendering should succeed.
    pub should_succeed: bool,
}

impl MockQrRenderer {
    /// Create a new mock renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rendered: Arc::new(Mutex::new(Vec::new())),
            should_succeed: true,
        }
    }

    /// Get all rendered payloads (for testing).
    #[must_use]
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }
}

impl Default for MockQrRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl QrRenderer for MockQrRenderer {
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    fn render(&self, payload: &str) -> Result<Vec<u8>> {
        if !self.should_succeed {
            return Err(TicketingError::QrRender("mock renderer failure".to_string()));
        }
        self.rendered.lock().unwrap().push(payload.to_string());
        Ok(b"\x89PNG\r\n\x1a\nmock".to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn test_records_payloads() {
        let renderer = MockQrRenderer::new();
        let png = renderer.render("https://example.com/scan?token=X").unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(renderer.rendered(), vec!["https://example.com/scan?token=X"]);
    }

    #[test]
    fn test_failure_mode() {
        let mut renderer = MockQrRenderer::new();
        renderer.should_succeed = false;
        let err = renderer.render("anything").unwrap_err();
        assert_eq!(
            err,
            TicketingError::QrRender("mock renderer failure".to_string())
        );
    }
}
