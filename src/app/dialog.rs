use eframe::egui::{self, Align2, Color32, RichText};

use crate::session::SessionIdentity;
use crate::upload::{Decision, DecisionRequest};

/// Holds the one open verification decision, if any.
#[derive(Default)]
pub struct DecisionDialog {
    pending: Option<DecisionRequest>,
}

impl DecisionDialog {
    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    pub fn open(&mut self, request: DecisionRequest) {
        if let Some(previous) = self.pending.replace(request) {
            tracing::warn!(file = %previous.file_name, "decision dialog replaced while open");
            previous.resolve(Decision::Retake);
        }
    }

    /// Answers the open request. Returns `false` if nothing was open.
    pub fn choose(&mut self, decision: Decision) -> bool {
        match self.pending.take() {
            Some(request) => {
                request.resolve(decision);
                true
            }
            None => false,
        }
    }

    /// Draws the open request, if any. The answer goes back through the
    /// request's channel.
    pub fn show(&mut self, ctx: &egui::Context, session: &SessionIdentity) {
        let Some(request) = self.pending.as_ref() else {
            return;
        };
        let outcome = &request.outcome;
        let mut chosen = None;

        let title = if outcome.code_detected {
            "QR code does not match"
        } else {
            "No QR code detected"
        };

        egui::Window::new(format!("⚠ {}", title))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(RichText::new(&request.file_name).strong());
                if let Some(message) = &outcome.message {
                    ui.colored_label(Color32::from_rgb(250, 140, 22), message);
                }
                ui.add_space(8.0);

                if outcome.code_detected {
                    let extracted = outcome.extracted.as_ref();
                    egui::Grid::new("identity_compare")
                        .num_columns(3)
                        .striped(true)
                        .show(ui, |ui| {
                            ui.label("");
                            ui.label(RichText::new("Photo").strong());
                            ui.label(RichText::new("This document").strong());
                            ui.end_row();

                            ui.label("Business ID");
                            ui.label(extracted.map_or("Unknown", |e| e.business_id.as_str()));
                            ui.label(&session.business_id);
                            ui.end_row();

                            ui.label("Document No.");
                            ui.label(
                                extracted
                                    .and_then(|e| e.doc_number.as_deref())
                                    .unwrap_or("Unknown"),
                            );
                            ui.label(&session.doc_number);
                            ui.end_row();
                        });
                } else {
                    ui.label("Retake the photo so the QR code is clearly visible.");
                }

                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ui.button("📷 Retake").clicked() {
                        chosen = Some(Decision::Retake);
                    }
                    if ui.button("Upload anyway").clicked() {
                        chosen = Some(Decision::AcceptWithWarning);
                    }
                });
            });

        if let Some(decision) = chosen {
            self.choose(decision);
        }
    }
}
