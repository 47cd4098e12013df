pub mod decoder;
pub mod downsample;
pub mod identity;
mod task;

pub use decoder::{DecodeCapability, DecodeError, DecodeResult, RasterDecoderAdapter};
pub use identity::ExtractedIdentity;
pub use task::{VerificationFailure, VerificationOutcome, VerificationStatus, Verifier};
