//! Live session view
//!
//! Session controls, avatar status, and the conversation display. All
//! state shown here is derived fresh from the orchestrator events folded
//! into `AppState`.

use crate::messages::Sender;
use crate::ui::state::{derive_status, AppState};
use crate::ui::theme::Theme;
use egui::{Align, Color32, RichText};

/// Session panel component
pub struct SessionPanel<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> SessionPanel<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.add_space(self.theme.spacing);
        ui.vertical_centered(|ui| {
            ui.set_max_width(860.0);

            ui.heading(RichText::new("Live Session").color(self.theme.text_primary));
            ui.label(
                RichText::new("Talk with the assistant; your conversation is assessed in real time.")
                    .color(self.theme.text_muted),
            );
            ui.add_space(self.theme.spacing);

            self.status_line(ui);
            ui.add_space(self.theme.spacing_sm);
            self.controls(ui);
            ui.add_space(self.theme.spacing_sm);
            self.avatar_card(ui);
            ui.add_space(self.theme.spacing);
            self.conversation(ui);
        });
    }

    fn status_line(&self, ui: &mut egui::Ui) {
        let status = derive_status(&self.state.session);
        let color = if self.state.session.recording {
            self.theme.recording
        } else if self.state.session.channel_connected {
            self.theme.primary
        } else {
            self.theme.text_muted
        };
        ui.label(RichText::new(status).strong().color(color));

        if let Some(error) = &self.state.last_error {
            ui.label(RichText::new(error).color(self.theme.error));
        }
        if let Some(notice) = &self.state.cleanup_notice {
            ui.label(RichText::new(notice).color(self.theme.text_muted));
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if !self.state.session.started {
                if ui.button("Start Session").clicked() {
                    self.state.start_session();
                }
            } else {
                if ui.button("End Session").clicked() {
                    self.state.end_session();
                }

                let record_label = if self.state.session.recording {
                    "Stop Recording"
                } else {
                    "Start Recording"
                };
                let can_record = self.state.session.channel_connected;
                if ui
                    .add_enabled(can_record, egui::Button::new(record_label))
                    .clicked()
                {
                    self.state.toggle_recording();
                }

                if self.state.session.avatar_speaking && ui.button("Stop Speaking").clicked() {
                    self.state.stop_speaking();
                }
            }

            ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                if ui
                    .button("Clean Up Sessions")
                    .on_hover_text("Force-close orphaned remote avatar sessions")
                    .clicked()
                {
                    self.state.cleanup_avatar_sessions();
                }
            });
        });
    }

    fn avatar_card(&self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Avatar").strong().color(self.theme.text_primary));

                    ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                        if self.state.session.avatar_speaking {
                            ui.label(RichText::new("● speaking").color(self.theme.primary));
                        } else if self.state.session.avatar_ready {
                            ui.label(
                                RichText::new("● ready")
                                    .color(Color32::from_rgb(16, 185, 129)),
                            );
                        } else if self.state.session.avatar_loading {
                            ui.label(RichText::new("● loading").color(self.theme.text_muted));
                        } else {
                            ui.label(RichText::new("● offline").color(self.theme.text_muted));
                        }
                    });
                });

                match (&self.state.session.avatar_stream, &self.state.session.avatar_error) {
                    (Some(stream), _) => {
                        ui.label(
                            RichText::new(format!("Stream: {}", stream.stream_url))
                                .size(12.0)
                                .color(self.theme.text_muted),
                        );
                    }
                    (None, Some(error)) => {
                        ui.label(RichText::new(error).size(12.0).color(self.theme.error));
                    }
                    (None, None) => {
                        ui.label(
                            RichText::new("The avatar joins when a session starts.")
                                .size(12.0)
                                .color(self.theme.text_muted),
                        );
                    }
                }
            });
    }

    fn conversation(&self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                if self.state.conversation.is_empty() {
                    ui.add_space(60.0);
                    ui.vertical_centered(|ui| {
                        ui.label(
                            RichText::new("Start a session and press record to begin.")
                                .color(self.theme.text_muted),
                        );
                    });
                    return;
                }

                for message in self.state.conversation.messages() {
                    let is_user = matches!(message.sender, Sender::User);
                    let align = if is_user { Align::RIGHT } else { Align::LEFT };
                    let bubble = if is_user {
                        self.theme.primary.gamma_multiply(0.6)
                    } else {
                        self.theme.bg_secondary
                    };

                    ui.with_layout(egui::Layout::top_down(align), |ui| {
                        ui.label(
                            RichText::new(if is_user { "You" } else { "Assistant" })
                                .size(12.0)
                                .color(self.theme.text_muted),
                        );
                        egui::Frame::none()
                            .fill(bubble)
                            .rounding(self.theme.card_rounding)
                            .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                            .show(ui, |ui| {
                                ui.set_max_width(ui.available_width() * 0.75);
                                ui.label(
                                    RichText::new(&message.text).color(self.theme.text_primary),
                                );
                            });
                        ui.label(
                            RichText::new(message.timestamp.format("%H:%M").to_string())
                                .size(10.0)
                                .color(self.theme.text_muted),
                        );
                    });
                    ui.add_space(self.theme.spacing_sm);
                }
            });
    }
}
