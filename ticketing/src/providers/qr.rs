//! QR rendering.

use crate::error::{Result, TicketingError};

/// Renders a payload string into a PNG image.
///
/// Rendering is pure and synchronous; callers decide where the bytes go
/// (disk, email attachment, both).
pub trait QrRenderer: Send + Sync {
    /// Render `payload` into PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns `QrRender` when the payload cannot be encoded or the image
    /// cannot be serialized.
    fn render(&self, payload: &str) -> Result<Vec<u8>>;
}

/// QR renderer backed by the `qrcode` crate.
///
/// Encodes at error-correction level L (scan URLs are short-lived and
/// re-renderable, so density wins over damage tolerance), black on white.
#[derive(Debug, Clone, Copy)]
pub struct QrPngRenderer {
    /// Minimum output width and height in pixels.
    pub min_size: u32,
}

impl QrPngRenderer {
    /// Creates a renderer with the given minimum pixel dimensions.
    #[must_use]
    pub const fn new(min_size: u32) -> Self {
        Self { min_size }
    }
}

impl Default for QrPngRenderer {
    fn default() -> Self {
        Self::new(240)
    }
}

impl QrRenderer for QrPngRenderer {
    fn render(&self, payload: &str) -> Result<Vec<u8>> {
        use qrcode::{EcLevel, QrCode};

        let code = QrCode::with_error_correction_level(payload, EcLevel::L)
            .map_err(|e| TicketingError::QrRender(e.to_string()))?;
        let img = code
            .render::<image::Luma<u8>>()
            .min_dimensions(self.min_size, self.min_size)
            .build();

        let mut png = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut png),
                image::ImageFormat::Png,
            )
            .map_err(|e| TicketingError::QrRender(e.to_string()))?;
        Ok(png)
    }
}
