//! Transcript upload form
//!
//! Validates extension and size client-side before the multipart upload.
//! Dropped files land in the same `select_file` path as the manual picker,
//! so both are validated identically.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::RichText;
use std::path::PathBuf;

/// Upload form component
pub struct UploadForm<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> UploadForm<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.add_space(self.theme.spacing);
        ui.vertical_centered(|ui| {
            ui.set_max_width(640.0);

            ui.heading(RichText::new("Cognitive Assessment").color(self.theme.text_primary));
            ui.label(
                RichText::new(
                    "Upload a conversation transcript to receive a detailed cognitive assessment",
                )
                .color(self.theme.text_muted),
            );
            ui.add_space(self.theme.spacing);

            self.session_id_field(ui);
            ui.add_space(self.theme.spacing_sm);
            self.file_area(ui);
            ui.add_space(self.theme.spacing_sm);

            if let Some(error) = &self.state.upload.error {
                ui.label(RichText::new(error).color(self.theme.error));
                ui.add_space(self.theme.spacing_sm);
            }

            self.submit_button(ui);
            ui.add_space(self.theme.spacing);
            self.info_section(ui);
        });
    }

    fn session_id_field(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Session ID (Optional)").color(self.theme.text_secondary));
                ui.label(
                    RichText::new("Leave empty to auto-generate")
                        .size(11.0)
                        .color(self.theme.text_muted),
                );
            });
            ui.add(
                egui::TextEdit::singleline(&mut self.state.upload.session_id_input)
                    .hint_text("e.g., 123e4567-e89b-12d3-a456-426614174000")
                    .desired_width(f32::INFINITY),
            );
        });
    }

    fn file_area(&mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());

                if let Some(selected) = self.state.upload.selected.clone() {
                    ui.horizontal(|ui| {
                        ui.vertical(|ui| {
                            ui.label(
                                RichText::new(&selected.name)
                                    .strong()
                                    .color(self.theme.text_primary),
                            );
                            ui.label(
                                RichText::new(format!(
                                    "{:.2} KB",
                                    selected.size_bytes as f64 / 1024.0
                                ))
                                .size(12.0)
                                .color(self.theme.text_muted),
                            );
                        });
                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                if ui.button("✕").on_hover_text("Remove file").clicked() {
                                    self.state.clear_selected_file();
                                }
                            },
                        );
                    });
                } else {
                    ui.label(
                        RichText::new("Drop a transcript file here, or enter a path")
                            .color(self.theme.text_secondary),
                    );
                    ui.label(
                        RichText::new("Supported formats: TXT, MD (Max 10MB)")
                            .size(12.0)
                            .color(self.theme.text_muted),
                    );
                    ui.add_space(self.theme.spacing_sm);
                    ui.horizontal(|ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut self.state.upload.path_input)
                                .hint_text("/path/to/transcript.txt")
                                .desired_width(ui.available_width() - 90.0),
                        );
                        if ui.button("Select").clicked() {
                            let path = PathBuf::from(self.state.upload.path_input.trim());
                            self.state.select_file(path);
                        }
                    });
                }
            });
    }

    fn submit_button(&mut self, ui: &mut egui::Ui) {
        let can_submit =
            self.state.upload.selected.is_some() && !self.state.upload.in_flight;
        let label = if self.state.upload.in_flight {
            "Analyzing Transcript..."
        } else {
            "Analyze Transcript"
        };

        if ui
            .add_enabled(can_submit, egui::Button::new(label))
            .clicked()
        {
            self.state.submit_upload();
        }

        if self.state.upload.in_flight {
            ui.label(
                RichText::new("This may take 30-60 seconds. Please wait...")
                    .size(12.0)
                    .color(self.theme.text_muted),
            );
        }
    }

    fn info_section(&self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(
                    RichText::new("What to Expect")
                        .strong()
                        .color(self.theme.text_primary),
                );
                ui.add_space(self.theme.spacing_sm);

                let domains = [
                    ("Memory", "Assessment of recall and repetition patterns"),
                    ("Language", "Evaluation of vocabulary and coherence"),
                    ("Executive Function", "Analysis of reasoning and logic"),
                    ("Orientation", "Awareness of time, place, and context"),
                ];
                for (domain, description) in domains {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(domain).strong().color(self.theme.text_secondary));
                        ui.label(
                            RichText::new(description)
                                .size(12.0)
                                .color(self.theme.text_muted),
                        );
                    });
                }
            });
    }
}
