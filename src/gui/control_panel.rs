//! Control Panel Widget
//! Left side panel with the file picker, date range, store selection and
//! comparison filters.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use egui::{Color32, ComboBox, RichText, ScrollArea};

use crate::charts::Measure;
use crate::data::Session;

/// A named multiselect backed by checkbox flags. An empty selection is
/// meaningful: the stores list falls back to "all stores" at the session
/// boundary, the comparison lists mean "no restriction".
#[derive(Default, Clone)]
struct MultiSelect {
    options: Vec<String>,
    checked: Vec<bool>,
}

impl MultiSelect {
    fn set_options(&mut self, options: Vec<String>) {
        self.checked = vec![false; options.len()];
        self.options = options;
    }

    fn selected(&self) -> Vec<String> {
        self.options
            .iter()
            .zip(self.checked.iter())
            .filter(|(_, &checked)| checked)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn show(&mut self, ui: &mut egui::Ui, id: &str) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .id_salt(id.to_string())
                    .max_height(110.0)
                    .show(ui, |ui| {
                        for (i, name) in self.options.iter().enumerate() {
                            if i < self.checked.len() {
                                ui.checkbox(&mut self.checked[i], name);
                            }
                        }
                    });
            });

        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                self.checked.iter_mut().for_each(|c| *c = true);
            }
            if ui.small_button("Clear All").clicked() {
                self.checked.iter_mut().for_each(|c| *c = false);
            }
        });
    }
}

/// Left side control panel with file selection and analysis controls.
pub struct ControlPanel {
    pub csv_path: Option<PathBuf>,
    pub start_input: String,
    pub end_input: String,
    pub measure: Measure,
    stores: MultiSelect,
    brands: MultiSelect,
    categories: MultiSelect,
    pub progress: f32,
    pub status: String,
    pub run_enabled: bool,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            csv_path: None,
            start_input: String::new(),
            end_input: String::new(),
            measure: Measure::TotalSales,
            stores: MultiSelect::default(),
            brands: MultiSelect::default(),
            categories: MultiSelect::default(),
            progress: 0.0,
            status: "Ready".to_string(),
            run_enabled: false,
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the selectable values and seed the date inputs from a
    /// freshly loaded session.
    pub fn update_from_session(&mut self, session: &Session) {
        self.stores.set_options(session.store_names());
        self.brands.set_options(session.brand_names());
        self.categories.set_options(session.category_names());

        if let Some((start, end)) = session.date_bounds() {
            self.start_input = start.format("%Y-%m-%d").to_string();
            self.end_input = end.format("%Y-%m-%d").to_string();
        }

        self.run_enabled = session.row_count() > 0;
    }

    pub fn selected_stores(&self) -> Vec<String> {
        self.stores.selected()
    }

    pub fn selected_brands(&self) -> Vec<String> {
        self.brands.selected()
    }

    pub fn selected_categories(&self) -> Vec<String> {
        self.categories.selected()
    }

    /// Parse the date inputs. The end date is inclusive: it extends to the
    /// last millisecond of that day.
    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = NaiveDate::parse_from_str(self.start_input.trim(), "%Y-%m-%d").ok()?;
        let end = NaiveDate::parse_from_str(self.end_input.trim(), "%Y-%m-%d").ok()?;

        let start = start.and_hms_opt(0, 0, 0)?.and_utc();
        let end = end.and_hms_milli_opt(23, 59, 59, 999)?.and_utc();
        (start <= end).then_some((start, end))
    }

    /// Draw the control panel.
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 StoreLens")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Sales Analytics")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.csv_path.is_some() {
                            Color32::WHITE
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Date Range Section =====
        ui.label(RichText::new("📅 Date Range").size(14.0).strong());
        ui.add_space(5.0);

        let label_width = 80.0;
        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Start date:"));
            ui.add(egui::TextEdit::singleline(&mut self.start_input).desired_width(110.0));
        });
        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("End date:"));
            ui.add(egui::TextEdit::singleline(&mut self.end_input).desired_width(110.0));
        });
        if self.run_enabled && self.date_range().is_none() {
            ui.label(
                RichText::new("Enter dates as YYYY-MM-DD, start before end")
                    .size(11.0)
                    .color(Color32::from_rgb(220, 53, 69)),
            );
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Store Selection Section =====
        ui.label(RichText::new("🏪 Stores").size(14.0).strong());
        ui.label(
            RichText::new("No selection means all stores")
                .size(11.0)
                .color(Color32::GRAY),
        );
        ui.add_space(5.0);
        self.stores.show(ui, "stores_select");

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Comparison Filters Section =====
        ui.label(RichText::new("🔧 Comparison Filters").size(14.0).strong());
        ui.label(
            RichText::new("No selection means no restriction")
                .size(11.0)
                .color(Color32::GRAY),
        );
        ui.add_space(5.0);

        ui.collapsing("Brands", |ui| {
            self.brands.show(ui, "brands_select");
        });
        ui.collapsing("Categories", |ui| {
            self.categories.show(ui, "categories_select");
        });

        ui.add_space(10.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Chart value:"));
            ComboBox::from_id_salt("measure")
                .width(150.0)
                .selected_text(self.measure.label())
                .show_ui(ui, |ui| {
                    for measure in Measure::ALL {
                        ui.selectable_value(&mut self.measure, measure, measure.label());
                    }
                });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.run_enabled, |ui| {
                let button = egui::Button::new(RichText::new("▶ Run Analysis").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::RunAnalysis;
                }
            });

            ui.add_space(8.0);

            ui.add_enabled_ui(self.export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("💾 Export JSON").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportReport;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Complete") || self.status.contains("Loaded") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status.
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    RunAnalysis,
    ExportReport,
}
