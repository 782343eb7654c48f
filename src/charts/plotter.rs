//! Chart Plotter Module
//! Creates interactive visualizations using egui_plot.

use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

use crate::analysis::{AggregateRow, AggregateTable, TrendPoint};

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(52, 152, 219),  // Blue
    Color32::from_rgb(231, 76, 60),   // Red
    Color32::from_rgb(46, 204, 113),  // Green
    Color32::from_rgb(155, 89, 182),  // Purple
    Color32::from_rgb(243, 156, 18),  // Orange
    Color32::from_rgb(26, 188, 156),  // Teal
    Color32::from_rgb(233, 30, 99),   // Pink
    Color32::from_rgb(0, 188, 212),   // Cyan
    Color32::from_rgb(255, 87, 34),   // Deep Orange
    Color32::from_rgb(121, 85, 72),   // Brown
];

const CHART_HEIGHT: f32 = 240.0;

/// Measure shown on the aggregate bar charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    TotalSales,
    Profit,
    ProfitMargin,
    Quantity,
}

impl Measure {
    pub const ALL: [Measure; 4] = [
        Measure::TotalSales,
        Measure::Profit,
        Measure::ProfitMargin,
        Measure::Quantity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Measure::TotalSales => "Total sales",
            Measure::Profit => "Profit",
            Measure::ProfitMargin => "Profit margin (%)",
            Measure::Quantity => "Quantity",
        }
    }

    fn pick(self, row: &AggregateRow) -> f64 {
        match self {
            Measure::TotalSales => row.total_sales,
            Measure::Profit => row.profit,
            Measure::ProfitMargin => row.profit_margin,
            Measure::Quantity => row.total_quantity,
        }
    }
}

/// Draws the dashboard's charts and tables.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn group_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Bar chart of one measure across the groups of an aggregate table,
    /// largest total sales first.
    pub fn draw_aggregate_bars(ui: &mut egui::Ui, id: &str, table: &AggregateTable, measure: Measure) {
        let rows = table.rows_by_sales();
        let labels: Vec<String> = rows.iter().map(|r| r.key.clone()).collect();

        let bars: Vec<Bar> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Bar::new(i as f64, measure.pick(row))
                    .width(0.6)
                    .name(&row.key)
                    .fill(Self::group_color(i))
            })
            .collect();

        Plot::new(format!("bars_{}", id))
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label(table.group_key.label())
            .y_axis_label(measure.label())
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if mark.value.fract().abs() < 1e-6 && idx < labels.len() {
                    labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars));
            });
    }

    /// Sales and profit lines over an ordered trend series.
    pub fn draw_trend_line(ui: &mut egui::Ui, id: &str, points: &[TrendPoint]) {
        let labels: Vec<String> = points.iter().map(|p| p.label.clone()).collect();

        let sales: PlotPoints = points
            .iter()
            .enumerate()
            .map(|(i, p)| [i as f64, p.total_sales])
            .collect();
        let profit: PlotPoints = points
            .iter()
            .enumerate()
            .map(|(i, p)| [i as f64, p.profit])
            .collect();

        Plot::new(format!("trend_{}", id))
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .legend(Legend::default())
            .y_axis_label("Amount")
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if mark.value.fract().abs() < 1e-6 && idx < labels.len() {
                    labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(sales).color(PALETTE[0]).width(2.0).name("Sales"));
                plot_ui.line(Line::new(profit).color(PALETTE[2]).width(2.0).name("Profit"));
            });
    }

    /// Bar chart of total sales per time bucket (weekday/hour views).
    pub fn draw_trend_bars(ui: &mut egui::Ui, id: &str, points: &[TrendPoint]) {
        let labels: Vec<String> = points.iter().map(|p| p.label.clone()).collect();

        let bars: Vec<Bar> = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Bar::new(i as f64, p.total_sales)
                    .width(0.6)
                    .name(&p.label)
                    .fill(Self::group_color(i))
            })
            .collect();

        Plot::new(format!("trend_bars_{}", id))
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .y_axis_label("Total sales")
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if mark.value.fract().abs() < 1e-6 && idx < labels.len() {
                    labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars));
            });
    }

    /// Aggregate table as a striped grid, largest total sales first.
    pub fn draw_aggregate_table(ui: &mut egui::Ui, id: &str, table: &AggregateTable) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("aggregate_table_{}", id)))
                    .striped(true)
                    .min_col_width(70.0)
                    .spacing([10.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new(table.group_key.label()).strong().size(11.0));
                        ui.label(RichText::new("Sales").strong().size(11.0));
                        ui.label(RichText::new("Cost").strong().size(11.0));
                        ui.label(RichText::new("Quantity").strong().size(11.0));
                        ui.label(RichText::new("Profit").strong().size(11.0));
                        ui.label(RichText::new("Margin %").strong().size(11.0));
                        ui.end_row();

                        for row in table.rows_by_sales() {
                            ui.label(RichText::new(&row.key).size(11.0));
                            ui.label(RichText::new(format!("{:.2}", row.total_sales)).size(11.0));
                            ui.label(RichText::new(format!("{:.2}", row.total_cost)).size(11.0));
                            ui.label(
                                RichText::new(format!("{:.0}", row.total_quantity)).size(11.0),
                            );
                            ui.label(RichText::new(format!("{:.2}", row.profit)).size(11.0));
                            ui.label(
                                RichText::new(format!("{:.1}", row.profit_margin)).size(11.0),
                            );
                            ui.end_row();
                        }
                    });
            });
    }
}
