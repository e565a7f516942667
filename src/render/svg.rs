// src/render/svg.rs

use anyhow::Result;
use plotters::prelude::*;
use plotters::style::FontTransform;

use super::{palette_color, Renderer};
use crate::projection::{AverageEntry, SeriesEntry};

pub const EMPTY_SELECTION_PROMPT: &str = "Please select at least one mouse to view data.";

/// Date ticks beyond this are thinned out; labels are drawn vertically.
const MAX_X_LABELS: usize = 31;

/// Renders projections to standalone SVG documents.
#[derive(Debug, Clone)]
pub struct SvgChart {
    pub width: u32,
    pub height: u32,
    /// Every period of the dataset, in chronological order. Series points
    /// are placed by their position in this list.
    pub periods: Vec<String>,
}

impl SvgChart {
    pub fn new(periods: &[String]) -> Self {
        Self {
            width: 1000,
            height: 500,
            periods: periods.to_vec(),
        }
    }
}

fn color_for(color_index: usize) -> RGBColor {
    let (r, g, b) = palette_color(color_index);
    RGBColor(r, g, b)
}

/// Value range that always includes zero and never collapses.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = if hi > lo { hi - lo } else { 1.0 };
    (lo - if lo < 0.0 { span * 0.05 } else { 0.0 }, hi + span * 0.05)
}

/// Label for a categorical axis tick; blank between categories.
fn category_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

impl Renderer for SvgChart {
    type Output = String;
    type Error = anyhow::Error;

    fn render_series(&mut self, entities: &[SeriesEntry]) -> Result<String> {
        let mut buf = String::new();
        {
            let root = SVGBackend::with_string(&mut buf, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE)?;

            let n = self.periods.len().max(1);
            let (y_lo, y_hi) = value_range(
                entities
                    .iter()
                    .flat_map(|e| e.points.iter().map(|p| p.amount)),
            );

            let mut chart = ChartBuilder::on(&root)
                .caption("Foraging by Mouse", ("sans-serif", 22))
                .margin(12)
                .x_label_area_size(110)
                .y_label_area_size(60)
                .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_lo..y_hi)?;

            let periods = &self.periods;
            let x_fmt = |x: &f64| category_label(periods, *x);
            chart
                .configure_mesh()
                .x_labels(n.min(MAX_X_LABELS))
                .x_label_style(("sans-serif", 12).into_font().transform(FontTransform::Rotate90))
                .x_label_formatter(&x_fmt)
                .x_desc("Date")
                .y_desc("Total Foraged (g)")
                .draw()?;

            for entry in entities {
                let color = color_for(entry.color_index);
                chart
                    .draw_series(LineSeries::new(
                        entry.points.iter().map(|p| (p.position as f64, p.amount)),
                        color.stroke_width(2),
                    ))?
                    .label(entry.id.clone())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                    });
                chart.draw_series(
                    entry
                        .points
                        .iter()
                        .map(|p| Circle::new((p.position as f64, p.amount), 3, color.filled())),
                )?;
            }

            if !entities.is_empty() {
                chart
                    .configure_series_labels()
                    .position(SeriesLabelPosition::UpperRight)
                    .background_style(WHITE.mix(0.85))
                    .border_style(BLACK)
                    .draw()?;
            }
            root.present()?;
        }
        Ok(buf)
    }

    fn render_averages(&mut self, entities: &[AverageEntry]) -> Result<String> {
        let mut buf = String::new();
        {
            let root = SVGBackend::with_string(&mut buf, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE)?;

            let ids: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
            let n = ids.len().max(1);
            let (y_lo, y_hi) = value_range(entities.iter().map(|e| e.value));

            let mut chart = ChartBuilder::on(&root)
                .caption("Average Foraging by Mouse", ("sans-serif", 22))
                .margin(12)
                .x_label_area_size(60)
                .y_label_area_size(60)
                .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_lo..y_hi)?;

            let x_fmt = |x: &f64| category_label(&ids, *x);
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(n)
                .x_label_formatter(&x_fmt)
                .x_desc("Mouse ID")
                .y_desc("Average Total Foraged (g)")
                .draw()?;

            chart.draw_series(entities.iter().enumerate().map(|(i, e)| {
                let x = i as f64;
                Rectangle::new(
                    [(x - 0.35, 0.0), (x + 0.35, e.value)],
                    color_for(e.color_index).filled(),
                )
            }))?;
            // name each bar directly; axis ticks can skip categories
            chart.draw_series(entities.iter().enumerate().map(|(i, e)| {
                Text::new(
                    format!("{} ({:.2})", e.id, e.value),
                    (i as f64 - 0.3, e.value.max(0.0)),
                    ("sans-serif", 13).into_font(),
                )
            }))?;
            root.present()?;
        }
        Ok(buf)
    }

    fn render_empty_selection(&mut self) -> Result<String> {
        let mut buf = String::new();
        {
            let root = SVGBackend::with_string(&mut buf, (self.width, 80)).into_drawing_area();
            root.fill(&WHITE)?;
            root.draw(&Text::new(
                EMPTY_SELECTION_PROMPT,
                (20, 40),
                ("sans-serif", 18).into_font(),
            ))?;
            root.present()?;
        }
        Ok(buf)
    }
}
