//! Assessment results view
//!
//! Read-only rendering of one assessment: overall score, risk badge,
//! per-domain score bars, interpretation guide, and metadata.

use crate::api::types::{Assessment, RiskLevel};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{Color32, ProgressBar, RichText};

/// Threshold color for a score in [0, 10]
pub fn score_color(score: f64) -> Color32 {
    if score >= 8.0 {
        Color32::from_rgb(16, 185, 129) // Green
    } else if score >= 5.0 {
        Color32::from_rgb(245, 158, 11) // Amber
    } else if score >= 3.0 {
        Color32::from_rgb(251, 146, 60) // Orange
    } else {
        Color32::from_rgb(239, 68, 68) // Red
    }
}

/// Badge color for a risk classification
pub fn risk_color(level: RiskLevel) -> Color32 {
    match level {
        RiskLevel::Low => Color32::from_rgb(16, 185, 129),
        RiskLevel::Moderate => Color32::from_rgb(245, 158, 11),
        RiskLevel::High => Color32::from_rgb(239, 68, 68),
    }
}

/// Bar fill fraction: linear, score 6.5 fills 65% of the width
pub fn score_fraction(score: Option<f64>) -> f32 {
    (score.unwrap_or(0.0) / 10.0).clamp(0.0, 1.0) as f32
}

/// "7.2" or "N/A"
pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.1}", s),
        None => "N/A".to_string(),
    }
}

/// Results view component
pub struct ResultsView<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> ResultsView<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        let Some(assessment) = self.state.assessment.clone() else {
            return;
        };

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.set_max_width(720.0);
                    ui.add_space(self.theme.spacing);

                    ui.horizontal(|ui| {
                        if ui.button("← Back").clicked() {
                            self.state.reset_assessment();
                            return;
                        }
                    });

                    ui.heading(RichText::new("Assessment Results").color(self.theme.text_primary));
                    ui.label(
                        RichText::new("Cognitive Assessment Report")
                            .color(self.theme.text_muted),
                    );
                    ui.add_space(self.theme.spacing);

                    self.overall_card(ui, &assessment);
                    ui.add_space(self.theme.spacing);

                    self.domain_scores(ui, &assessment);
                    ui.add_space(self.theme.spacing);

                    self.interpretation_guide(ui);
                    ui.add_space(self.theme.spacing);

                    self.metadata(ui, &assessment);
                    ui.add_space(self.theme.spacing_lg);

                    if ui.button("Analyze Another Transcript").clicked() {
                        self.state.reset_assessment();
                    }

                    ui.add_space(self.theme.spacing);
                });
            });
    }

    fn overall_card(&self, ui: &mut egui::Ui, assessment: &Assessment) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_lg)
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new("Overall Score")
                            .size(16.0)
                            .color(self.theme.text_secondary),
                    );

                    let color = assessment
                        .overall_score
                        .map(score_color)
                        .unwrap_or(self.theme.text_muted);
                    ui.horizontal(|ui| {
                        ui.with_layout(
                            egui::Layout::top_down(egui::Align::Center),
                            |ui| {
                                ui.label(
                                    RichText::new(format!(
                                        "{}/10",
                                        format_score(assessment.overall_score)
                                    ))
                                    .size(42.0)
                                    .strong()
                                    .color(color),
                                );
                            },
                        );
                    });

                    if let Some(risk) = assessment.risk_level {
                        egui::Frame::none()
                            .fill(risk_color(risk))
                            .rounding(self.theme.button_rounding)
                            .inner_margin(egui::Margin::symmetric(12.0, 6.0))
                            .show(ui, |ui| {
                                ui.label(
                                    RichText::new(format!("Risk Level: {}", risk.label()))
                                        .strong()
                                        .color(Color32::WHITE),
                                );
                            });
                    }

                    if let Some(feedback) = &assessment.overall_feedback {
                        ui.add_space(self.theme.spacing_sm);
                        ui.label(RichText::new(feedback).color(self.theme.text_secondary));
                    }
                });
            });
    }

    fn domain_scores(&self, ui: &mut egui::Ui, assessment: &Assessment) {
        ui.label(
            RichText::new("Cognitive Domain Scores")
                .size(18.0)
                .strong()
                .color(self.theme.text_primary),
        );
        ui.add_space(self.theme.spacing_sm);

        self.score_bar(ui, "Memory", assessment.memory_score, &assessment.memory_feedback);
        self.score_bar(
            ui,
            "Language",
            assessment.language_score,
            &assessment.language_feedback,
        );
        self.score_bar(
            ui,
            "Executive Function",
            assessment.executive_function_score,
            &assessment.executive_function_feedback,
        );
        self.score_bar(
            ui,
            "Orientation",
            assessment.orientation_score,
            &assessment.orientation_feedback,
        );
    }

    fn score_bar(
        &self,
        ui: &mut egui::Ui,
        label: &str,
        score: Option<f64>,
        feedback: &Option<String>,
    ) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                let color = score.map(score_color).unwrap_or(self.theme.text_muted);

                ui.horizontal(|ui| {
                    ui.label(RichText::new(label).strong().color(self.theme.text_primary));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            RichText::new(format!("{}/10", format_score(score)))
                                .strong()
                                .color(color),
                        );
                    });
                });

                ui.add(ProgressBar::new(score_fraction(score)).fill(color));

                if let Some(feedback) = feedback {
                    ui.label(
                        RichText::new(feedback)
                            .size(12.0)
                            .color(self.theme.text_muted),
                    );
                }
            });
        ui.add_space(self.theme.spacing_sm);
    }

    fn interpretation_guide(&self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.label(
                    RichText::new("Score Interpretation")
                        .strong()
                        .color(self.theme.text_primary),
                );
                ui.add_space(self.theme.spacing_sm);

                let bands = [
                    (8.0, "8-10", "Normal cognitive function"),
                    (5.0, "5-7", "Mild impairment (monitoring recommended)"),
                    (3.0, "3-4", "Moderate impairment (clinical evaluation recommended)"),
                    (0.0, "0-2", "Severe impairment (urgent evaluation needed)"),
                ];
                for (anchor, range, meaning) in bands {
                    ui.horizontal(|ui| {
                        egui::Frame::none()
                            .fill(score_color(anchor))
                            .rounding(self.theme.button_rounding)
                            .inner_margin(egui::Margin::symmetric(8.0, 2.0))
                            .show(ui, |ui| {
                                ui.label(RichText::new(range).strong().color(Color32::WHITE));
                            });
                        ui.label(RichText::new(meaning).color(self.theme.text_secondary));
                    });
                }
            });
    }

    fn metadata(&self, ui: &mut egui::Ui, assessment: &Assessment) {
        ui.vertical(|ui| {
            if let Some(id) = &assessment.id {
                ui.label(
                    RichText::new(format!("Assessment ID: {}", id))
                        .size(12.0)
                        .color(self.theme.text_muted),
                );
            }
            if let Some(session_id) = &assessment.session_id {
                ui.label(
                    RichText::new(format!("Session ID: {}", session_id))
                        .size(12.0)
                        .color(self.theme.text_muted),
                );
            }
            if let Some(created_at) = &assessment.created_at {
                ui.label(
                    RichText::new(format!(
                        "Date: {}",
                        created_at.format("%Y-%m-%d %H:%M UTC")
                    ))
                    .size(12.0)
                    .color(self.theme.text_muted),
                );
            }
        });
    }
}
