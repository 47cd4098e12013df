mod dialog;
mod state;
mod ui;

use eframe::{egui, App};
use rfd::FileDialog;
use std::future::Future;
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::mpsc::TryRecvError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{error, info, warn};

use crate::config::UploaderConfig;
use crate::error::UploaderError;
use crate::session::SessionIdentity;
use crate::upload::{AcceptedBatch, BatchQueue, GestureOutcome, Notice, QueueEvent, UploadClient};
use crate::verify::{RasterDecoderAdapter, Verifier};
pub use dialog::DecisionDialog;
pub use state::{ActionProgress, HistoryView, UploadState};

pub const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "webp", "bmp", "heic", "heif"];

pub struct EvidenceUploader {
    session: Arc<SessionIdentity>,
    config: UploaderConfig,
    decoder: RasterDecoderAdapter,
    client: UploadClient,
    batch: AcceptedBatch,
    state: UploadState,
    dialog: DecisionDialog,
}

impl EvidenceUploader {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        session: SessionIdentity,
        config: UploaderConfig,
        decoder: RasterDecoderAdapter,
    ) -> Self {
        info!(
            business_id = %session.business_id,
            doc_number = %session.doc_number,
            decoder_available = decoder.is_available(),
            "initializing evidence uploader"
        );
        Self {
            client: UploadClient::new(config.server.clone()),
            batch: AcceptedBatch::new(config.max_files),
            session: Arc::new(session),
            config,
            decoder,
            state: UploadState::default(),
            dialog: DecisionDialog::default(),
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.state.push_notice(notice, self.config.notice_duration);
    }

    fn can_pick(&self) -> bool {
        !self.state.is_verifying() && !self.state.batch_locked() && self.batch.remaining_capacity() > 0
    }

    pub fn pick_files(&mut self) {
        if !self.can_pick() {
            return;
        }
        let picked = FileDialog::new()
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .add_filter("All files", &["*"])
            .pick_files();
        if let Some(paths) = picked {
            self.start_gesture(paths);
        }
    }

    pub fn start_gesture(&mut self, paths: Vec<PathBuf>) {
        if paths.is_empty() || self.state.is_verifying() || self.state.batch_locked() {
            return;
        }
        info!(files = paths.len(), "starting selection");

        let (event_sender, event_receiver) = tokio_mpsc::unbounded_channel();
        let (outcome_sender, outcome_receiver) = std_mpsc::channel();
        self.state.queue_events = Some(event_receiver);
        self.state.gesture_receiver = Some(outcome_receiver);

        let verifier = Verifier::new(
            self.session.clone(),
            self.decoder.clone(),
            self.config.max_decode_dimension,
            self.config.verify_timeout,
        );
        let queue = BatchQueue::new(verifier, self.config.max_file_size, event_sender);
        let remaining = self.batch.remaining_capacity();

        spawn_worker("selection", move || async move {
            let outcome = queue.run_paths(paths, remaining).await;
            let _ = outcome_sender.send(outcome);
        });
    }

    pub fn remove_file(&mut self, index: usize) {
        if self.state.batch_locked() {
            return;
        }
        if let Some(entry) = self.batch.remove(index) {
            info!(file = %entry.file.name, "removed from batch");
        }
    }

    pub fn clear_files(&mut self) {
        if self.state.batch_locked() {
            return;
        }
        self.batch.clear();
        self.state.reset_progress();
    }

    pub fn request_submit(&mut self) {
        if self.state.gate_submission(&self.batch) {
            self.start_submission();
        }
    }

    pub fn confirm_submission(&mut self, confirmed: bool) {
        if self.state.resolve_confirmation(&self.batch, confirmed) {
            self.start_submission();
        }
    }

    fn start_submission(&mut self) {
        let entries = self.batch.entries().to_vec();
        if entries.is_empty() {
            return;
        }
        self.state
            .begin_upload(entries.iter().map(|e| e.file.name.clone()));

        let (sender, receiver) = std_mpsc::channel();
        self.state.submission_receiver = Some(receiver);

        let client = self.client.clone();
        let session = self.session.clone();
        spawn_worker("submission", move || async move {
            let result = client.submit(&session, &entries).await;
            let _ = sender.send(result);
        });
    }

    pub fn show_history(&mut self) {
        if matches!(self.state.history, HistoryView::Loading) {
            return;
        }
        self.state.history = HistoryView::Loading;

        let (sender, receiver) = std_mpsc::channel();
        self.state.history_receiver = Some(receiver);

        let client = self.client.clone();
        let business_id = self.session.business_id.clone();
        spawn_worker("history", move || async move {
            let _ = sender.send(client.fetch_history(&business_id).await);
        });
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        ctx.request_repaint_after(Duration::from_millis(100));
        let now = Instant::now();
        self.state.prune_notices(now);

        self.drain_queue_events();
        self.poll_gesture();
        self.poll_submission();
        self.poll_history();

        self.state.clear_if_due(&mut self.batch, now);

        if std::mem::take(&mut self.state.reopen_picker) {
            self.pick_files();
        }
    }

    fn drain_queue_events(&mut self) {
        let Some(receiver) = self.state.queue_events.as_mut() else {
            return;
        };
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }

        for event in events {
            match event {
                QueueEvent::Progress { current, total } => {
                    self.state.verification = Some((current, total));
                }
                QueueEvent::Notice(notice) => self.notify(notice),
                QueueEvent::DecisionRequested(request) => self.dialog.open(request),
            }
        }
    }

    fn poll_gesture(&mut self) {
        let Some(receiver) = &self.state.gesture_receiver else {
            return;
        };
        let outcome = match receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                error!("selection worker stopped without a result");
                GestureOutcome::Abandoned
            }
        };

        // Pick up notices sent just before the outcome.
        self.drain_queue_events();
        self.state.gesture_receiver = None;
        self.state.queue_events = None;
        self.state.verification = None;

        match outcome {
            GestureOutcome::Completed { admitted } => {
                let overflow = self.batch.append(admitted);
                if !overflow.is_empty() {
                    warn!(dropped = overflow.len(), "batch full, dropping admitted files");
                }
                info!(batch_len = self.batch.len(), "selection finished");
            }
            GestureOutcome::Retake { discarded } => {
                info!(discarded, "selection discarded for retake");
                self.state.reopen_picker = true;
            }
            GestureOutcome::Abandoned => {}
        }
    }

    fn poll_submission(&mut self) {
        let Some(receiver) = &self.state.submission_receiver else {
            return;
        };
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(UploaderError::Runtime(
                "upload worker stopped without a result".to_string(),
            )),
        };
        self.state
            .apply_submission(result, Instant::now(), &self.config);
    }

    fn poll_history(&mut self) {
        let Some(receiver) = &self.state.history_receiver else {
            return;
        };
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(UploaderError::Runtime(
                "history worker stopped without a result".to_string(),
            )),
        };
        self.state.history_receiver = None;

        match result {
            Ok(history) => self.state.history = HistoryView::Loaded(history),
            Err(e) => {
                warn!(error = %e, "failed to load history");
                self.state.history = HistoryView::Hidden;
                self.notify(Notice::error(format!("Failed to load upload history: {}", e)));
            }
        }
    }
}

impl App for EvidenceUploader {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}

/// Shown instead of the uploader when the entry link is unusable.
pub struct BootstrapFailed {
    message: String,
}

impl BootstrapFailed {
    pub fn new(_cc: &eframe::CreationContext<'_>, error: UploaderError) -> Self {
        Self {
            message: error.to_string(),
        }
    }
}

impl App for BootstrapFailed {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::render_bootstrap_failure(ctx, &self.message);
    }
}

/// Runs background work on its own thread with a single-threaded runtime.
fn spawn_worker<F, Fut>(name: &'static str, make: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()>,
{
    std::thread::spawn(move || {
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(make()),
            Err(e) => error!(worker = name, error = %e, "failed to start runtime"),
        }
    });
}
