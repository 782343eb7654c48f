//! Report View Widget
//! Central scrollable panel showing one card per analysis: a table and a
//! chart for successful analyses, a warning for empty ones and the error
//! text for failed ones.

use egui::{Color32, RichText, ScrollArea};

use crate::analysis::{Report, ReportData, TimeBucket};
use crate::charts::{ChartPlotter, Measure};

const CARD_SPACING: f32 = 15.0;

/// Scrollable list of analysis cards.
pub struct ReportView {
    reports: Vec<Report>,
}

impl Default for ReportView {
    fn default() -> Self {
        Self {
            reports: Vec::new(),
        }
    }
}

impl ReportView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.reports.clear();
    }

    pub fn set_reports(&mut self, reports: Vec<Report>) {
        self.reports = reports;
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Draw all analysis cards.
    pub fn show(&self, ui: &mut egui::Ui, measure: Measure) {
        if self.reports.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("Load a CSV export to begin analysis").size(20.0));
            });
            return;
        }

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for report in &self.reports {
                    Self::draw_card(ui, report, measure);
                    ui.add_space(CARD_SPACING);
                }
            });
    }

    fn draw_card(ui: &mut egui::Ui, report: &Report, measure: Measure) {
        let (border, icon) = match &report.outcome {
            Err(_) => (Color32::from_rgb(220, 53, 69), "⚠"),
            Ok(data) if data.is_empty() => (Color32::from_rgb(243, 156, 18), "ℹ"),
            Ok(_) => (Color32::from_rgb(40, 167, 69), "✓"),
        };

        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(2.0, border))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width() - 20.0);

                ui.label(
                    RichText::new(format!("{} {}", icon, report.title))
                        .size(18.0)
                        .strong()
                        .color(border),
                );
                ui.add_space(8.0);

                match &report.outcome {
                    Err(error) => {
                        ui.label(
                            RichText::new(format!("Analysis failed: {}", error))
                                .size(13.0)
                                .color(Color32::from_rgb(220, 53, 69)),
                        );
                    }
                    Ok(data) if data.is_empty() => {
                        ui.label(
                            RichText::new("No data found for the selected criteria.")
                                .size(13.0)
                                .color(Color32::from_rgb(243, 156, 18)),
                        );
                    }
                    Ok(ReportData::Aggregate(table)) => {
                        ChartPlotter::draw_aggregate_table(ui, &report.title, table);
                        ui.add_space(10.0);
                        ChartPlotter::draw_aggregate_bars(ui, &report.title, table, measure);
                    }
                    Ok(ReportData::Trend { bucket, points }) => match bucket {
                        TimeBucket::Daily => {
                            ChartPlotter::draw_trend_line(ui, &report.title, points)
                        }
                        TimeBucket::Weekday | TimeBucket::Hourly => {
                            ChartPlotter::draw_trend_bars(ui, &report.title, points)
                        }
                    },
                }
            });
    }
}
