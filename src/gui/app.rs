//! StoreLens Main Application
//! Main window with control panel and report view.

use std::fs::File;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::thread;

use log::{error, info};
use polars::prelude::*;

use crate::analysis::{report, Report, ReportSettings};
use crate::data::{loader, Session};
use crate::gui::{ControlPanel, ControlPanelAction, ReportView};

/// CSV loading result from background thread
enum LoadResult {
    Complete { table: DataFrame, path: PathBuf },
    Error(String),
}

/// Main application window.
pub struct StoreLensApp {
    session: Option<Session>,
    control_panel: ControlPanel,
    report_view: ReportView,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,

    // Async report computation
    calc_rx: Option<Receiver<Vec<Report>>>,
    is_calculating: bool,
}

impl StoreLensApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            session: None,
            control_panel: ControlPanel::new(),
            report_view: ReportView::new(),
            load_rx: None,
            is_loading: false,
            calc_rx: None,
            is_calculating: false,
        }
    }

    /// Handle CSV file selection; loading runs on a background thread.
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.report_view.clear();
            self.control_panel.export_enabled = false;
            self.control_panel.csv_path = Some(path.clone());
            self.control_panel.set_progress(10.0, "Loading CSV file...");
            self.is_loading = true;

            let (tx, rx) = channel();
            self.load_rx = Some(rx);

            thread::spawn(move || {
                let result = match loader::load_csv(&path) {
                    Ok(table) => LoadResult::Complete { table, path },
                    Err(e) => LoadResult::Error(e.to_string()),
                };
                let _ = tx.send(result);
            });
        }
    }

    /// Check for CSV loading results.
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete { table, path }) => {
                let session = Session::new(table, path);
                self.control_panel.update_from_session(&session);
                self.control_panel.set_progress(
                    50.0,
                    &format!("Loaded {} rows from {:?}", session.row_count(), session.source().file_name().unwrap_or_default()),
                );
                self.session = Some(session);
                self.is_loading = false;

                // First analysis pass runs right after load.
                self.start_analysis();
            }
            Ok(LoadResult::Error(error)) => {
                error!("CSV load failed: {}", error);
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", error));
                self.is_loading = false;
            }
            Err(_) => {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Run all analyses on a background thread over a clone of the table.
    fn start_analysis(&mut self) {
        if self.is_calculating {
            return;
        }

        let Some(session) = &self.session else {
            self.control_panel.set_progress(0.0, "No data loaded");
            return;
        };

        let Some((start, end)) = self.control_panel.date_range() else {
            self.control_panel
                .set_progress(0.0, "Error: invalid date range");
            return;
        };

        let settings = ReportSettings {
            stores: session.resolve_stores(&self.control_panel.selected_stores()),
            brands: self.control_panel.selected_brands(),
            categories: self.control_panel.selected_categories(),
            start,
            end,
        };

        let table = session.table().clone();
        let (tx, rx) = channel();
        self.calc_rx = Some(rx);
        self.is_calculating = true;
        self.control_panel.set_progress(60.0, "Analyzing data...");

        thread::spawn(move || {
            let reports = report::run(&table, &settings);
            let _ = tx.send(reports);
        });
    }

    /// Check for report computation results.
    fn check_calculation_results(&mut self) {
        let Some(rx) = self.calc_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(reports) => {
                let failed = reports.iter().filter(|r| r.outcome.is_err()).count();
                let status = if failed == 0 {
                    format!("Complete! {} analyses ready", reports.len())
                } else {
                    format!(
                        "Complete with {} of {} analyses failed",
                        failed,
                        reports.len()
                    )
                };
                info!("{}", status);

                self.report_view.set_reports(reports);
                self.control_panel.set_progress(100.0, &status);
                self.control_panel.export_enabled = !self.report_view.is_empty();
                self.is_calculating = false;
            }
            Err(_) => {
                self.calc_rx = Some(rx);
            }
        }
    }

    /// Write the current reports to a JSON file chosen by the user.
    fn handle_export_report(&mut self) {
        if self.report_view.is_empty() {
            self.control_panel.set_progress(0.0, "No reports to export");
            return;
        }

        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("storelens_report.json")
            .save_file()
        else {
            return;
        };

        match self.write_report(&path) {
            Ok(()) => {
                info!("report exported to {}", path.display());
                self.control_panel
                    .set_progress(100.0, &format!("Report saved to {:?}", path.file_name().unwrap_or_default()));
            }
            Err(e) => {
                error!("report export failed: {}", e);
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", e));
            }
        }
    }

    fn write_report(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self.report_view.reports())?;
        Ok(())
    }
}

impl eframe::App for StoreLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();
        self.check_calculation_results();

        // Request repaint while loading or calculating
        if self.is_loading || self.is_calculating {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        egui::SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::RunAnalysis => self.start_analysis(),
                        ControlPanelAction::ExportReport => self.handle_export_report(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Report View
        let measure = self.control_panel.measure;
        egui::CentralPanel::default().show(ctx, |ui| {
            self.report_view.show(ui, measure);
        });
    }
}
