// src/server/page.rs

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt::Write;

use crate::projection::{PaletteIndex, ViewMode};
use crate::render::palette_color;

/// Everything the dashboard page shows for one request.
pub struct DashboardView<'a> {
    pub mice: &'a [String],
    /// Same slots the chart uses, so swatches match the lines and bars.
    pub palette: &'a PaletteIndex,
    pub selected: &'a BTreeSet<String>,
    pub mode: ViewMode,
    /// Inline SVG, or the prompt shown instead of a chart.
    pub chart: ChartSlot,
    /// Set when an older dataset is shown because a refetch failed.
    pub stale_warning: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub build_id: &'a str,
}

pub enum ChartSlot {
    Svg(String),
    Prompt(&'static str),
    Failed(String),
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;margin:1.5rem;max-width:1100px}\
.warn{background:#fff3cd;border:1px solid #e0c36a;padding:.6rem 1rem;margin:.8rem 0}\
.mice label{display:inline-block;margin:.2rem .8rem .2rem 0}\
.swatch{display:inline-block;width:.8rem;height:.8rem;margin-right:.3rem}\
footer{color:#777;font-size:.8rem;margin-top:2rem}";

fn head(out: &mut String) {
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    out.push_str("<title>Mouse Foraging Viewer</title><style>");
    out.push_str(STYLE);
    out.push_str("</style></head><body>");
}

fn refresh_form(out: &mut String) {
    out.push_str(
        "<form method=\"post\" action=\"/refresh\"><button type=\"submit\">Refresh Data</button></form>",
    );
}

fn footer(out: &mut String, fetched_at: Option<DateTime<Utc>>, build_id: &str) {
    out.push_str("<footer>");
    if let Some(at) = fetched_at {
        let _ = write!(out, "Data fetched {} &middot; ", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    let _ = write!(out, "Build {}</footer></body></html>", escape(build_id));
}

pub fn dashboard(view: &DashboardView<'_>) -> String {
    let mut out = String::new();
    head(&mut out);
    refresh_form(&mut out);
    out.push_str("<h1>Mouse Foraging Over Time</h1>");

    if let Some(warning) = &view.stale_warning {
        let _ = write!(
            out,
            "<div class=\"warn\">Showing previously loaded data; refresh failed: {}</div>",
            escape(warning)
        );
    }

    out.push_str("<form method=\"get\" action=\"/\">");
    out.push_str("<input type=\"hidden\" name=\"submitted\" value=\"1\">");
    out.push_str("<fieldset class=\"mice\"><legend>Select mice to display</legend>");
    for mouse in view.mice {
        let swatch = view.palette.slot(mouse).map_or(String::new(), |slot| {
            let (r, g, b) = palette_color(slot);
            format!("<span class=\"swatch\" style=\"background:rgb({r},{g},{b})\"></span>")
        });
        let checked = if view.selected.contains(mouse) { " checked" } else { "" };
        let _ = write!(
            out,
            "<label><input type=\"checkbox\" name=\"mouse\" value=\"{id}\"{checked}>{swatch}{id}</label>",
            id = escape(mouse),
        );
    }
    out.push_str("</fieldset><fieldset><legend>Chart</legend>");
    for (mode, label) in [
        (ViewMode::Series, "Over time"),
        (ViewMode::Average, "Average per mouse"),
    ] {
        let checked = if view.mode == mode { " checked" } else { "" };
        let _ = write!(
            out,
            "<label><input type=\"radio\" name=\"mode\" value=\"{mode}\"{checked}> {label}</label> "
        );
    }
    out.push_str("</fieldset><button type=\"submit\">Show</button></form>");

    match &view.chart {
        ChartSlot::Svg(svg) => {
            out.push_str("<div class=\"chart\">");
            out.push_str(svg);
            out.push_str("</div>");
        }
        ChartSlot::Prompt(msg) => {
            let _ = write!(out, "<div class=\"warn\">{}</div>", escape(msg));
        }
        ChartSlot::Failed(reason) => {
            let _ = write!(
                out,
                "<div class=\"warn\">Chart could not be drawn: {}</div>",
                escape(reason)
            );
        }
    }

    footer(&mut out, view.fetched_at, view.build_id);
    out
}

/// Page shown when there is no dataset at all.
pub fn unavailable(reason: &str, build_id: &str) -> String {
    let mut out = String::new();
    head(&mut out);
    refresh_form(&mut out);
    out.push_str("<h1>Mouse Foraging Over Time</h1>");
    let _ = write!(
        out,
        "<div class=\"warn\">Foraging data is unavailable right now: {}</div>",
        escape(reason)
    );
    footer(&mut out, None, build_id);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>\"M&1'\"</b>"), "&lt;b&gt;&quot;M&amp;1&#39;&quot;&lt;/b&gt;");
    }

    fn palette_for(mice: &[&str]) -> PaletteIndex {
        let records = mice
            .iter()
            .map(|m| crate::dataset::ForagingRecord {
                entity_id: m.to_string(),
                period: "d1".into(),
                amount: 1.0,
            })
            .collect();
        PaletteIndex::from_dataset(&crate::dataset::Dataset::new(records, vec!["d1".into()]))
    }

    #[test]
    fn swatches_use_the_palette_slots() {
        let mice = vec!["M1".to_string(), "M2".to_string()];
        let selected = BTreeSet::new();
        // M2 alone in the palette gets slot 0 (tab10 blue); M1 has no slot
        let palette = palette_for(&["M2"]);
        let html = dashboard(&DashboardView {
            mice: &mice,
            palette: &palette,
            selected: &selected,
            mode: ViewMode::Series,
            chart: ChartSlot::Prompt("pick one"),
            stale_warning: None,
            fetched_at: None,
            build_id: "b",
        });

        assert!(html.contains(
            "value=\"M2\"><span class=\"swatch\" style=\"background:rgb(31,119,180)\"></span>M2"
        ));
        assert!(html.contains("value=\"M1\">M1</label>"));
        assert_eq!(html.matches("class=\"swatch\"").count(), 1);
    }

    #[test]
    fn dashboard_marks_selection_and_mode() {
        let mice = vec!["M1".to_string(), "M<2>".to_string()];
        let palette = palette_for(&["M1", "M<2>"]);
        let selected: BTreeSet<String> = ["M1".to_string()].into();
        let html = dashboard(&DashboardView {
            mice: &mice,
            palette: &palette,
            selected: &selected,
            mode: ViewMode::Average,
            chart: ChartSlot::Svg("<svg></svg>".into()),
            stale_warning: Some("timeout".into()),
            fetched_at: None,
            build_id: "abc1234",
        });

        assert!(html.contains("value=\"M1\" checked"));
        assert!(html.contains("value=\"M&lt;2&gt;\">"));
        assert!(html.contains("value=\"average\" checked"));
        assert!(html.contains("refresh failed: timeout"));
        assert!(html.contains("<svg></svg>"));
        assert!(html.contains("Build abc1234"));
    }

    #[test]
    fn unavailable_page_shows_reason() {
        let html = unavailable("no data available: quota", "unknown build");
        assert!(html.contains("unavailable right now: no data available: quota"));
        assert!(html.contains("Refresh Data"));
    }
}
