//! Main application struct and eframe integration

use crate::integration::OrchestratorHandle;
use crate::ui::components::{ResultsView, SessionPanel, UploadForm};
use crate::ui::state::{ActiveView, AppState};
use crate::ui::theme::Theme;
use egui::{CentralPanel, RichText, TopBottomPanel};
use std::time::Duration;

/// Main Caresma application
pub struct CaresmaApp {
    state: AppState,
    theme: Theme,
}

impl CaresmaApp {
    pub fn new(cc: &eframe::CreationContext<'_>, handle: OrchestratorHandle) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        Self {
            state: AppState::new(handle),
            theme,
        }
    }

    fn show_nav(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("nav")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(12.0),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Caresma")
                            .size(20.0)
                            .strong()
                            .color(self.theme.primary),
                    );

                    ui.add_space(self.theme.spacing);

                    if ui
                        .selectable_label(self.state.view == ActiveView::Home, "Home")
                        .clicked()
                    {
                        self.state.view = ActiveView::Home;
                    }
                    if ui
                        .selectable_label(self.state.view == ActiveView::Assessment, "Assessment")
                        .clicked()
                    {
                        self.state.view = ActiveView::Assessment;
                    }
                });
            });
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        if self.state.view != ActiveView::Assessment || self.state.assessment.is_some() {
            return;
        }

        let dropped: Vec<_> = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            if let Some(path) = file.path {
                self.state.select_file(path);
            }
        }
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary))
            .show(ctx, |ui| match self.state.view {
                ActiveView::Home => SessionPanel::new(&mut self.state, &self.theme).show(ui),
                ActiveView::Assessment => {
                    if self.state.assessment.is_some() {
                        ResultsView::new(&mut self.state, &self.theme).show(ui);
                    } else {
                        UploadForm::new(&mut self.state, &self.theme).show(ui);
                    }
                }
            });
    }
}

impl eframe::App for CaresmaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Fold pending orchestrator events into state before rendering
        self.state.poll_events();
        self.handle_dropped_files(ctx);

        self.show_nav(ctx);
        self.show_content(ctx);

        // Events arrive from the worker thread between frames
        ctx.request_repaint_after(Duration::from_millis(100));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Mic, channel, and avatar slot are released by the orchestrator
        self.state.shutdown();
    }
}
