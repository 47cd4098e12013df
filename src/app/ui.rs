use super::{ActionProgress, EvidenceUploader, HistoryView};
use crate::upload::{NoticeLevel, UploadStatus};
use crate::utils::color::theme_color;
use crate::utils::datetime::format_timestamp;
use crate::utils::file_size::FileSizeUtils;
use eframe::egui::{self, Align2, Color32, RichText};

const SUCCESS: Color32 = Color32::from_rgb(0, 180, 0);
const FAILURE: Color32 = Color32::from_rgb(220, 50, 50);
const WARNING: Color32 = Color32::from_rgb(250, 140, 22);
const MUTED: Color32 = Color32::from_rgb(150, 150, 150);

enum UiAction {
    Pick,
    Remove(usize),
    Clear,
    Submit,
    ConfirmSubmit(bool),
    DismissError,
    ShowHistory,
    HideHistory,
}

impl EvidenceUploader {
    pub fn render(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();

        self.render_header(ctx, &mut actions);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                self.render_picker(ui, &mut actions);
                ui.add_space(10.0);
                self.render_preview(ui, &mut actions);

                if !matches!(self.state.progress, ActionProgress::NotStarted) {
                    ui.add_space(10.0);
                    self.render_progress(ui);
                }
            });
        });

        self.render_verification_overlay(ctx);
        self.dialog.show(ctx, &self.session);
        self.render_submit_confirmation(ctx, &mut actions);
        self.render_blocking_error(ctx, &mut actions);
        self.render_history(ctx, &mut actions);
        self.render_notices(ctx);

        for action in actions {
            match action {
                UiAction::Pick => self.pick_files(),
                UiAction::Remove(index) => self.remove_file(index),
                UiAction::Clear => self.clear_files(),
                UiAction::Submit => self.request_submit(),
                UiAction::ConfirmSubmit(confirmed) => self.confirm_submission(confirmed),
                UiAction::DismissError => self.state.blocking_error = None,
                UiAction::ShowHistory => self.show_history(),
                UiAction::HideHistory => self.state.history = HistoryView::Hidden,
            }
        }
    }

    fn render_header(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        egui::TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(theme_color(self.session.doc_type))
                    .inner_margin(12.0),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.heading(RichText::new("Photo Evidence Upload").color(Color32::WHITE));
                        ui.label(RichText::new(self.session.title()).color(Color32::WHITE));
                        if let Some(product_type) = &self.session.product_type {
                            ui.label(RichText::new(product_type).color(Color32::WHITE).small());
                        }
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🕘 History").clicked() {
                            actions.push(UiAction::ShowHistory);
                        }
                    });
                });
            });
    }

    fn render_picker(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.vertical_centered(|ui| {
            let button = egui::Button::new("📷 Take or choose photos").min_size(egui::vec2(220.0, 48.0));
            if ui.add_enabled(self.can_pick(), button).clicked() {
                actions.push(UiAction::Pick);
            }
            ui.label(
                RichText::new(format!(
                    "Up to {} photos, {} each",
                    self.config.max_files,
                    FileSizeUtils::format_size(self.config.max_file_size)
                ))
                .color(MUTED),
            );
        });
    }

    fn render_preview(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        if self.batch.is_empty() {
            return;
        }
        let uploading = self.state.is_uploading();
        let locked = self.state.batch_locked();

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("Selected {}/{}", self.batch.len(), self.config.max_files)).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.add_enabled(!locked, egui::Button::new("🗑 Clear")).clicked() {
                        actions.push(UiAction::Clear);
                    }
                });
            });
            ui.separator();

            for (index, entry) in self.batch.entries().iter().enumerate() {
                ui.horizontal(|ui| {
                    if entry.has_warning() {
                        let hint = entry
                            .outcome
                            .message
                            .as_deref()
                            .unwrap_or("QR verification warning");
                        ui.colored_label(WARNING, "⚠").on_hover_text(hint);
                    } else if entry.outcome.identity_matched {
                        ui.colored_label(SUCCESS, "✔");
                    } else {
                        ui.colored_label(MUTED, "•");
                    }
                    ui.label(&entry.file.name);
                    ui.label(RichText::new(FileSizeUtils::format_size(entry.file.size)).color(MUTED));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.add_enabled(!locked, egui::Button::new("✖")).clicked() {
                            actions.push(UiAction::Remove(index));
                        }
                    });
                });
            }

            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                let label = if uploading { "⏳ Uploading..." } else { "📤 Upload" };
                let button = egui::Button::new(label).min_size(egui::vec2(200.0, 40.0));
                if ui
                    .add_enabled(!locked && !self.state.is_verifying(), button)
                    .clicked()
                {
                    actions.push(UiAction::Submit);
                }
            });
        });
    }

    fn render_progress(&mut self, ui: &mut egui::Ui) {
        let fill = theme_color(self.session.doc_type);
        ui.group(|ui| {
            let bar = egui::ProgressBar::new(self.state.get_progress_percentage())
                .animate(matches!(self.state.progress, ActionProgress::Uploading { .. }))
                .fill(fill);
            ui.add(bar);
            ui.label(self.state.get_status_text());

            if ui
                .button(if self.state.show_details {
                    "Hide Details"
                } else {
                    "Show Details"
                })
                .clicked()
            {
                self.state.show_details = !self.state.show_details;
            }

            if self.state.show_details {
                for status in &self.state.file_statuses {
                    ui.horizontal(|ui| match &status.status {
                        UploadStatus::Pending => {
                            ui.label("⏳");
                            ui.colored_label(MUTED, &status.name);
                        }
                        UploadStatus::Success => {
                            ui.label("✅");
                            ui.colored_label(SUCCESS, &status.name);
                        }
                        UploadStatus::Error(err) => {
                            ui.label("❌");
                            ui.colored_label(FAILURE, format!("{} - {}", status.name, err));
                        }
                    });
                }
            }
        });
    }

    fn render_verification_overlay(&self, ctx: &egui::Context) {
        let Some((current, total)) = self.state.verification else {
            return;
        };
        if self.dialog.is_open() {
            return;
        }
        egui::Window::new("Checking QR codes")
            .collapsible(false)
            .resizable(false)
            .title_bar(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(format!("Recognising QR code... ({}/{})", current, total));
                });
            });
    }

    fn render_submit_confirmation(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let Some(warned) = self.state.confirm_submit else {
            return;
        };
        egui::Window::new("Confirm upload")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!(
                    "{} photo(s) have QR verification warnings. Upload anyway?",
                    warned
                ));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        actions.push(UiAction::ConfirmSubmit(false));
                    }
                    if ui.button("Upload").clicked() {
                        actions.push(UiAction::ConfirmSubmit(true));
                    }
                });
            });
    }

    fn render_blocking_error(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let Some(message) = &self.state.blocking_error else {
            return;
        };
        egui::Window::new("Upload failed")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.colored_label(FAILURE, message);
                ui.label("Your photos are still selected; you can try again.");
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    actions.push(UiAction::DismissError);
                }
            });
    }

    fn render_history(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        if matches!(self.state.history, HistoryView::Hidden) {
            return;
        }
        let mut open = true;
        egui::Window::new("Upload history")
            .collapsible(false)
            .open(&mut open)
            .default_width(420.0)
            .show(ctx, |ui| match &self.state.history {
                HistoryView::Hidden => {}
                HistoryView::Loading => {
                    ui.spinner();
                }
                HistoryView::Loaded(history) if history.total_count == 0 => {
                    ui.label(RichText::new("No uploads yet").color(MUTED));
                }
                HistoryView::Loaded(history) => {
                    ui.label(format!(
                        "{} uploads | ✅ {} | ❌ {}",
                        history.total_count, history.success_count, history.failed_count
                    ));
                    ui.separator();
                    egui::ScrollArea::vertical().max_height(360.0).show(ui, |ui| {
                        for record in &history.records {
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(&record.file_name).strong());
                                if record.is_success() {
                                    ui.colored_label(SUCCESS, "Success");
                                } else {
                                    ui.colored_label(FAILURE, "Failed");
                                }
                            });
                            ui.label(
                                RichText::new(format!(
                                    "Size: {}   Time: {}",
                                    FileSizeUtils::format_size(record.file_size),
                                    record
                                        .upload_time
                                        .as_deref()
                                        .map(format_timestamp)
                                        .unwrap_or_else(|| "-".to_string())
                                ))
                                .color(MUTED),
                            );
                            if let Some(err) = &record.error_message {
                                ui.colored_label(FAILURE, format!("Error: {}", err));
                            }
                            ui.add_space(6.0);
                        }
                    });
                }
            });
        if !open {
            actions.push(UiAction::HideHistory);
        }
    }

    fn render_notices(&self, ctx: &egui::Context) {
        if self.state.notices.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("notices"))
            .anchor(Align2::CENTER_BOTTOM, [0.0, -24.0])
            .show(ctx, |ui| {
                for active in &self.state.notices {
                    let fill = match active.notice.level {
                        NoticeLevel::Success => SUCCESS,
                        NoticeLevel::Warning => WARNING,
                        NoticeLevel::Error => FAILURE,
                    };
                    egui::Frame::none()
                        .fill(fill)
                        .rounding(6.0)
                        .inner_margin(8.0)
                        .show(ui, |ui| {
                            ui.label(RichText::new(&active.notice.message).color(Color32::WHITE));
                        });
                    ui.add_space(4.0);
                }
            });
    }
}

pub(super) fn render_bootstrap_failure(ctx: &egui::Context, message: &str) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("Cannot start upload");
            ui.add_space(10.0);
            ui.colored_label(FAILURE, message);
            ui.add_space(10.0);
            ui.label(RichText::new("Scan the document's QR code again to open a valid link.").color(MUTED));
        });
    });
}
