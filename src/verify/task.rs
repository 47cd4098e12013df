//! Per-file verification: downsample, decode, extract, match, under a deadline.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::decoder::{DecodeResult, RasterDecoderAdapter};
use super::downsample::bounded_dimensions;
use super::identity::{self, ExtractedIdentity};
use crate::session::SessionIdentity;

/// Terminal state of a verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    NoCodeDetected,
    MalformedPayload,
    IdentityMismatch,
    IdentityMatched,
    VerificationError(VerificationFailure),
}

/// Why verification could not be completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    Timeout,
    CapabilityUnavailable,
    Failed(String),
}

/// Result of verifying one file. Created once by [`Verifier::verify_file`], never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub status: VerificationStatus,
    pub code_detected: bool,
    pub identity_matched: bool,
    pub decoded_payload: Option<String>,
    pub requires_confirmation: bool,
    pub message: Option<String>,
    pub extracted: Option<ExtractedIdentity>,
}

impl VerificationOutcome {
    fn no_code() -> Self {
        Self {
            status: VerificationStatus::NoCodeDetected,
            code_detected: false,
            identity_matched: false,
            decoded_payload: None,
            requires_confirmation: true,
            message: Some("No QR code was detected in the photo".to_string()),
            extracted: None,
        }
    }

    fn malformed(payload: String) -> Self {
        Self {
            status: VerificationStatus::MalformedPayload,
            code_detected: true,
            identity_matched: false,
            decoded_payload: Some(payload),
            requires_confirmation: true,
            message: Some("The QR code content is not a valid document link".to_string()),
            extracted: None,
        }
    }

    fn mismatch(payload: String, extracted: ExtractedIdentity) -> Self {
        Self {
            status: VerificationStatus::IdentityMismatch,
            code_detected: true,
            identity_matched: false,
            decoded_payload: Some(payload),
            requires_confirmation: true,
            message: Some("The QR code belongs to a different document".to_string()),
            extracted: Some(extracted),
        }
    }

    fn matched(payload: String, extracted: ExtractedIdentity) -> Self {
        Self {
            status: VerificationStatus::IdentityMatched,
            code_detected: true,
            identity_matched: true,
            decoded_payload: Some(payload),
            requires_confirmation: false,
            message: None,
            extracted: Some(extracted),
        }
    }

    fn error(failure: VerificationFailure) -> Self {
        let message = match &failure {
            VerificationFailure::Timeout => "QR recognition timed out; verification skipped".to_string(),
            VerificationFailure::CapabilityUnavailable => {
                "QR recognition is not available; verification skipped".to_string()
            }
            VerificationFailure::Failed(reason) => {
                format!("QR recognition failed ({}); verification skipped", reason)
            }
        };
        Self {
            status: VerificationStatus::VerificationError(failure),
            code_detected: false,
            identity_matched: false,
            decoded_payload: None,
            requires_confirmation: false,
            message: Some(message),
            extracted: None,
        }
    }

    /// Verification ran and could not be completed; the file is admitted
    /// without a dialog.
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, VerificationStatus::VerificationError(_))
    }
}

/// Inputs shared by every verification run of a session.
#[derive(Clone)]
pub struct Verifier {
    session: Arc<SessionIdentity>,
    decoder: RasterDecoderAdapter,
    max_dimension: u32,
    deadline: Duration,
}

impl Verifier {
    pub fn new(
        session: Arc<SessionIdentity>,
        decoder: RasterDecoderAdapter,
        max_dimension: u32,
        deadline: Duration,
    ) -> Self {
        Self {
            session,
            decoder,
            max_dimension,
            deadline,
        }
    }

    /// Runs the pipeline for one encoded image.
    ///
    /// The blocking stages run on the blocking pool and are raced against the
    /// deadline. On timeout the blocking work is left to finish on its own and
    /// its result is dropped.
    pub async fn verify_file(&self, name: &str, bytes: Arc<Vec<u8>>) -> VerificationOutcome {
        let verifier = self.clone();
        let work = tokio::task::spawn_blocking(move || verifier.run_stages(&bytes));

        let outcome = match timeout(self.deadline, work).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => VerificationOutcome::error(VerificationFailure::Failed(join_err.to_string())),
            Err(_) => VerificationOutcome::error(VerificationFailure::Timeout),
        };

        match &outcome.status {
            VerificationStatus::VerificationError(failure) => {
                warn!(file = name, ?failure, "verification skipped")
            }
            status => info!(file = name, ?status, "verification finished"),
        }
        outcome
    }

    fn run_stages(&self, bytes: &[u8]) -> VerificationOutcome {
        let decoded = match image::load_from_memory(bytes) {
            Ok(decoded) => decoded,
            Err(e) => return VerificationOutcome::error(VerificationFailure::Failed(e.to_string())),
        };

        let (width, height) = (decoded.width(), decoded.height());
        let (target_w, target_h) = bounded_dimensions(width, height, self.max_dimension);
        let bounded = if (target_w, target_h) != (width, height) {
            debug!(width, height, target_w, target_h, "downsampling before decode");
            decoded.resize_exact(target_w, target_h, image::imageops::FilterType::Triangle)
        } else {
            decoded
        };
        let rgba = bounded.to_rgba8();

        let payload = match self.decoder.decode(rgba.as_raw(), rgba.width(), rgba.height()) {
            Ok(DecodeResult::Found(payload)) => payload,
            Ok(DecodeResult::NotFound) => return VerificationOutcome::no_code(),
            Ok(DecodeResult::Unavailable) => {
                return VerificationOutcome::error(VerificationFailure::CapabilityUnavailable)
            }
            Err(e) => return VerificationOutcome::error(VerificationFailure::Failed(e.to_string())),
        };
        debug!(%payload, "decoded QR payload");

        match identity::extract(&payload) {
            None => VerificationOutcome::malformed(payload),
            Some(extracted) if identity::matches(&extracted, &self.session) => {
                VerificationOutcome::matched(payload, extracted)
            }
            Some(extracted) => VerificationOutcome::mismatch(payload, extracted),
        }
    }
}
