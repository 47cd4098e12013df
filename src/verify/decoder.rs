//! Adapter around an external QR decoding capability.

use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("decode failed: {0}")]
pub struct DecodeError(pub String);

/// Something that can find a machine-readable code in an RGBA8 pixel buffer.
///
/// `pixels` is row-major, four bytes per pixel, `width * height * 4` long.
pub trait DecodeCapability: Send + Sync {
    fn decode(&self, pixels: &[u8], width: u32, height: u32) -> Result<Option<String>, DecodeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    Found(String),
    NotFound,
    /// No capability is installed in this build.
    Unavailable,
}

#[derive(Clone, Default)]
pub struct RasterDecoderAdapter {
    capability: Option<Arc<dyn DecodeCapability>>,
}

impl RasterDecoderAdapter {
    pub fn new(capability: Arc<dyn DecodeCapability>) -> Self {
        Self {
            capability: Some(capability),
        }
    }

    pub fn unavailable() -> Self {
        Self { capability: None }
    }

    /// The decoder compiled into this build.
    #[cfg(feature = "qr-decode")]
    pub fn platform_default() -> Self {
        Self::new(Arc::new(qr::RqrrDecoder))
    }

    #[cfg(not(feature = "qr-decode"))]
    pub fn platform_default() -> Self {
        Self::unavailable()
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_some()
    }

    pub fn decode(&self, pixels: &[u8], width: u32, height: u32) -> Result<DecodeResult, DecodeError> {
        let Some(capability) = &self.capability else {
            return Ok(DecodeResult::Unavailable);
        };

        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(DecodeError(format!(
                "pixel buffer is {} bytes, expected {} for {}x{}",
                pixels.len(),
                expected,
                width,
                height
            )));
        }

        Ok(match capability.decode(pixels, width, height)? {
            Some(payload) => DecodeResult::Found(payload),
            None => DecodeResult::NotFound,
        })
    }
}

#[cfg(feature = "qr-decode")]
mod qr {
    use super::{DecodeCapability, DecodeError};

    pub struct RqrrDecoder;

    impl DecodeCapability for RqrrDecoder {
        fn decode(&self, pixels: &[u8], width: u32, height: u32) -> Result<Option<String>, DecodeError> {
            let width = width as usize;
            let height = height as usize;
            let luma: Vec<u8> = pixels
                .chunks_exact(4)
                .map(|px| {
                    let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
                    ((r * 299 + g * 587 + b * 114) / 1000) as u8
                })
                .collect();

            let mut prepared =
                rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| luma[y * width + x]);

            for grid in prepared.detect_grids() {
                if let Ok((_, content)) = grid.decode() {
                    return Ok(Some(content));
                }
            }
            Ok(None)
        }
    }
}
