//! Drains one file-selection gesture through verification, one file at a time.

use derivative::Derivative;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::types::{AcceptedEntry, CandidateFile};
use crate::utils::file_size::FileSizeUtils;
use crate::verify::{VerificationOutcome, Verifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A transient, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Drop the whole gesture and pick again.
    Retake,
    AcceptWithWarning,
}

/// A pending user decision for one file. Resolving consumes the request, so
/// each request is answered at most once.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct DecisionRequest {
    pub file_name: String,
    pub outcome: VerificationOutcome,
    #[derivative(Debug = "ignore")]
    responder: oneshot::Sender<Decision>,
}

impl DecisionRequest {
    pub fn new(
        file_name: impl Into<String>,
        outcome: VerificationOutcome,
    ) -> (Self, oneshot::Receiver<Decision>) {
        let (responder, answer) = oneshot::channel();
        let request = Self {
            file_name: file_name.into(),
            outcome,
            responder,
        };
        (request, answer)
    }

    pub fn resolve(self, decision: Decision) {
        debug!(file = %self.file_name, ?decision, "decision resolved");
        // The queue may already be gone if the window closed.
        let _ = self.responder.send(decision);
    }
}

#[derive(Debug)]
pub enum QueueEvent {
    Progress { current: usize, total: usize },
    Notice(Notice),
    DecisionRequested(DecisionRequest),
}

#[derive(Debug)]
pub enum GestureOutcome {
    Completed { admitted: Vec<AcceptedEntry> },
    /// The user chose to retake; everything verified in this gesture is dropped.
    Retake { discarded: usize },
    /// The decision channel closed before an answer arrived.
    Abandoned,
}

pub struct BatchQueue {
    verifier: Verifier,
    max_file_size: u64,
    events: mpsc::UnboundedSender<QueueEvent>,
}

impl BatchQueue {
    pub fn new(verifier: Verifier, max_file_size: u64, events: mpsc::UnboundedSender<QueueEvent>) -> Self {
        Self {
            verifier,
            max_file_size,
            events,
        }
    }

    fn emit(&self, event: QueueEvent) {
        let _ = self.events.send(event);
    }

    fn notice(&self, notice: Notice) {
        self.emit(QueueEvent::Notice(notice));
    }

    /// Reads picked paths from disk and runs them as one gesture.
    pub async fn run_paths(&self, paths: Vec<PathBuf>, remaining_capacity: usize) -> GestureOutcome {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match CandidateFile::from_path(&path).await {
                Ok(file) => files.push(file),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read picked file");
                    self.notice(Notice::error(e.to_string()));
                }
            }
        }
        self.run_gesture(files, remaining_capacity).await
    }

    pub async fn run_gesture(&self, files: Vec<CandidateFile>, remaining_capacity: usize) -> GestureOutcome {
        let mut valid = self.screen(files);

        if valid.len() > remaining_capacity {
            let dropped = valid.split_off(remaining_capacity);
            warn!(dropped = dropped.len(), remaining_capacity, "selection exceeds batch capacity");
            self.notice(Notice::error(format!(
                "Only {} more photo(s) can be added; {} not added",
                remaining_capacity,
                dropped.len()
            )));
        }

        let total = valid.len();
        info!(total, "verifying selection");
        let mut admitted = Vec::with_capacity(total);

        for (index, file) in valid.into_iter().enumerate() {
            self.emit(QueueEvent::Progress {
                current: index + 1,
                total,
            });

            let outcome = self.verifier.verify_file(&file.name, file.data.clone()).await;

            if outcome.requires_confirmation {
                match self.ask(&file, outcome.clone()).await {
                    Some(Decision::AcceptWithWarning) => {
                        info!(file = %file.name, "accepted with warning");
                    }
                    Some(Decision::Retake) => {
                        info!(file = %file.name, discarded = admitted.len(), "retake requested");
                        return GestureOutcome::Retake {
                            discarded: admitted.len(),
                        };
                    }
                    None => {
                        warn!(file = %file.name, "decision dialog closed without an answer");
                        return GestureOutcome::Abandoned;
                    }
                }
            } else if outcome.is_skipped() {
                let message = outcome
                    .message
                    .clone()
                    .unwrap_or_else(|| "QR verification skipped".to_string());
                self.notice(Notice::warning(format!("{}: {}", file.name, message)));
            }

            admitted.push(AcceptedEntry { file, outcome });
        }

        GestureOutcome::Completed { admitted }
    }

    /// Rejects non-images and oversize files before any verification.
    fn screen(&self, files: Vec<CandidateFile>) -> Vec<CandidateFile> {
        files
            .into_iter()
            .filter(|file| {
                if !file.is_image() {
                    self.notice(Notice::error(format!("{} is not an image file", file.name)));
                    return false;
                }
                if file.size > self.max_file_size {
                    self.notice(Notice::error(format!(
                        "{} exceeds the {} limit",
                        file.name,
                        FileSizeUtils::format_size(self.max_file_size)
                    )));
                    return false;
                }
                true
            })
            .collect()
    }

    async fn ask(&self, file: &CandidateFile, outcome: VerificationOutcome) -> Option<Decision> {
        let (request, answer) = DecisionRequest::new(file.name.clone(), outcome);
        self.emit(QueueEvent::DecisionRequested(request));
        answer.await.ok()
    }
}
