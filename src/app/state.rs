use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

use tracing::{error, info};

use crate::config::UploaderConfig;
use crate::error::UploaderError;
use crate::upload::{
    AcceptedBatch, FileStatus, GestureOutcome, HistoryResponse, Notice, QueueEvent, SubmissionReport,
    SubmitGate, UploadStatus,
};

#[derive(Clone, Default)]
pub enum ActionProgress {
    #[default]
    NotStarted,
    Uploading {
        total: usize,
    },
    Completed {
        total: usize,
        succeeded: usize,
        failed: usize,
    },
}

pub struct ActiveNotice {
    pub notice: Notice,
    pub expires_at: Instant,
}

#[derive(Default)]
pub enum HistoryView {
    #[default]
    Hidden,
    Loading,
    Loaded(HistoryResponse),
}

#[derive(Default)]
pub struct UploadState {
    pub progress: ActionProgress,
    pub file_statuses: Vec<FileStatus>,
    /// `(current, total)` while a selection is being verified.
    pub verification: Option<(usize, usize)>,
    pub notices: Vec<ActiveNotice>,
    /// Shown until dismissed; used for submission failures.
    pub blocking_error: Option<String>,
    /// Warned-file count awaiting the pre-submission confirmation.
    pub confirm_submit: Option<usize>,
    pub clear_at: Option<Instant>,
    pub reopen_picker: bool,
    pub history: HistoryView,
    pub show_details: bool,
    pub queue_events: Option<UnboundedReceiver<QueueEvent>>,
    pub gesture_receiver: Option<Receiver<GestureOutcome>>,
    pub submission_receiver: Option<Receiver<Result<SubmissionReport, UploaderError>>>,
    pub history_receiver: Option<Receiver<Result<HistoryResponse, UploaderError>>>,
}

impl UploadState {
    pub fn is_verifying(&self) -> bool {
        self.gesture_receiver.is_some()
    }

    pub fn is_uploading(&self) -> bool {
        self.submission_receiver.is_some()
    }

    /// Selections and batch edits wait while an upload runs or a
    /// confirmation is on screen.
    pub fn batch_locked(&self) -> bool {
        self.is_uploading() || self.confirm_submit.is_some()
    }

    /// Whether a submission of `batch` may start now. A batch with warned
    /// files parks the warned count in `confirm_submit` instead.
    pub fn gate_submission(&mut self, batch: &AcceptedBatch) -> bool {
        if self.is_uploading() || self.is_verifying() || self.confirm_submit.is_some() {
            return false;
        }
        self.check_gate(batch, None)
    }

    /// Answers the pending confirmation. A batch whose warned count no longer
    /// matches the one shown is asked about again.
    pub fn resolve_confirmation(&mut self, batch: &AcceptedBatch, confirmed: bool) -> bool {
        let Some(shown) = self.confirm_submit.take() else {
            return false;
        };
        confirmed && self.check_gate(batch, Some(shown))
    }

    fn check_gate(&mut self, batch: &AcceptedBatch, confirmed_warned: Option<usize>) -> bool {
        match batch.submit_gate() {
            SubmitGate::Empty => false,
            SubmitGate::Ready => true,
            SubmitGate::NeedsConfirmation { warned } if confirmed_warned == Some(warned) => true,
            SubmitGate::NeedsConfirmation { warned } => {
                self.confirm_submit = Some(warned);
                false
            }
        }
    }

    /// Records a finished submission. A full success schedules the batch to be
    /// cleared; anything else leaves the batch for another attempt.
    pub fn apply_submission(
        &mut self,
        result: Result<SubmissionReport, UploaderError>,
        now: Instant,
        config: &UploaderConfig,
    ) {
        self.submission_receiver = None;
        match result {
            Ok(report) => {
                let (succeeded, failed) = (report.succeeded, report.failed());
                info!(succeeded, failed, "upload finished");
                let all_ok = report.all_succeeded();
                self.finish_upload(report);
                if all_ok {
                    self.push_notice(Notice::success("All photos uploaded"), config.notice_duration);
                    self.clear_at = Some(now + config.success_clear_delay);
                } else {
                    self.push_notice(
                        Notice::error(format!(
                            "Upload finished: {} succeeded, {} failed",
                            succeeded, failed
                        )),
                        config.notice_duration,
                    );
                }
            }
            Err(e) => {
                error!(error = %e, "upload failed");
                self.reset_progress();
                self.blocking_error = Some(e.to_string());
            }
        }
    }

    /// Empties `batch` once a scheduled clear is due.
    pub fn clear_if_due(&mut self, batch: &mut AcceptedBatch, now: Instant) -> bool {
        if !self.clear_at.is_some_and(|at| now >= at) {
            return false;
        }
        info!("clearing batch after successful upload");
        batch.clear();
        self.reset_progress();
        true
    }

    pub fn push_notice(&mut self, notice: Notice, lifetime: Duration) {
        self.notices.push(ActiveNotice {
            notice,
            expires_at: Instant::now() + lifetime,
        });
    }

    pub fn prune_notices(&mut self, now: Instant) {
        self.notices.retain(|n| n.expires_at > now);
    }

    pub fn reset_progress(&mut self) {
        self.progress = ActionProgress::NotStarted;
        self.file_statuses.clear();
        self.clear_at = None;
    }

    pub fn begin_upload(&mut self, names: impl IntoIterator<Item = String>) {
        self.file_statuses = names
            .into_iter()
            .map(|name| FileStatus {
                name,
                status: UploadStatus::Pending,
            })
            .collect();
        self.progress = ActionProgress::Uploading {
            total: self.file_statuses.len(),
        };
        self.clear_at = None;
        self.show_details = true;
    }

    pub fn finish_upload(&mut self, report: SubmissionReport) {
        self.progress = ActionProgress::Completed {
            total: report.total,
            succeeded: report.succeeded,
            failed: report.failed(),
        };
        self.file_statuses = report.rows;
    }

    pub fn get_progress_percentage(&self) -> f32 {
        match &self.progress {
            ActionProgress::NotStarted | ActionProgress::Uploading { .. } => 0.0,
            ActionProgress::Completed {
                total, succeeded, ..
            } => {
                if *total == 0 {
                    0.0
                } else {
                    (*succeeded as f32) / (*total as f32)
                }
            }
        }
    }

    pub fn get_status_text(&self) -> String {
        match &self.progress {
            ActionProgress::NotStarted => String::new(),
            ActionProgress::Uploading { total } => format!("Uploading {} file(s)...", total),
            ActionProgress::Completed {
                total,
                succeeded,
                failed,
            } => format!(
                "{}/{} | ✅ Success: {} | ❌ Failed: {}",
                succeeded, total, succeeded, failed
            ),
        }
    }
}
