//! Chart output for benchmark series.
//!
//! Rendering is a leaf: it consumes already-computed points and writes a
//! file. A failure here is reported to the caller and never touches the
//! measurements it was given.

use crate::error::RenderError;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

pub const DEFAULT_TITLE: &str = "Tempos de Execução do Algoritmo";
pub const DEFAULT_X_LABEL: &str = "Execução";
pub const DEFAULT_Y_LABEL: &str = "Tempo (ms)";

/// Writes an ordered (x, y) series to `path`.
pub trait SampleRenderer {
    fn render(&self, title: &str, points: &[(f64, f64)], path: &Path) -> Result<(), RenderError>;
}

/// Pick a renderer from the output file extension (`.json` or SVG otherwise).
pub fn renderer_for(path: &Path) -> Box<dyn SampleRenderer> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Box::new(JsonSeries),
        _ => Box::new(SvgLineChart::default()),
    }
}

fn check_points(points: &[(f64, f64)]) -> Result<(), RenderError> {
    if points.is_empty() {
        return Err(RenderError::EmptySeries);
    }
    if let Some(index) = points.iter().position(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(RenderError::NonFinitePoint { index });
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    info!(path = %path.display(), "Wrote chart");
    Ok(())
}

/// Line chart with circular markers, written as standalone SVG.
#[derive(Debug, Clone)]
pub struct SvgLineChart {
    pub width: u32,
    pub height: u32,
    pub x_label: String,
    pub y_label: String,
}

impl Default for SvgLineChart {
    /// 6x4 inches at 96 dpi.
    fn default() -> Self {
        Self {
            width: 576,
            height: 384,
            x_label: DEFAULT_X_LABEL.to_string(),
            y_label: DEFAULT_Y_LABEL.to_string(),
        }
    }
}

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;

impl SvgLineChart {
    /// Build the SVG document for `points`.
    pub fn to_svg(&self, title: &str, points: &[(f64, f64)]) -> Result<String, RenderError> {
        check_points(points)?;

        let (mut x_min, mut x_max) = bounds(points.iter().map(|p| p.0));
        let (_, mut y_max) = bounds(points.iter().map(|p| p.1));
        let y_min = 0.0;
        if x_max - x_min == 0.0 {
            x_min -= 1.0;
            x_max += 1.0;
        }
        if y_max <= y_min {
            y_max = y_min + 1.0;
        }

        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let plot_w = w - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = h - MARGIN_TOP - MARGIN_BOTTOM;
        let px = |x: f64| MARGIN_LEFT + (x - x_min) / (x_max - x_min) * plot_w;
        let py = |y: f64| MARGIN_TOP + plot_h - (y - y_min) / (y_max - y_min) * plot_h;

        let mut svg = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="24" text-anchor="middle" font-family="sans-serif" font-size="15">{}</text>"#,
            w / 2.0,
            escape(title)
        );

        // Grid and y ticks
        for tick in 0..=4 {
            let value = y_min + (y_max - y_min) * f64::from(tick) / 4.0;
            let y = py(value);
            let _ = writeln!(
                svg,
                r##"<line x1="{MARGIN_LEFT}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="#dddddd"/>"##,
                MARGIN_LEFT + plot_w
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" text-anchor="end" font-family="sans-serif" font-size="10">{value:.2}</text>"#,
                MARGIN_LEFT - 6.0,
                y + 3.0
            );
        }

        // Axes
        let _ = writeln!(
            svg,
            r#"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{:.2}" stroke="black"/>"#,
            MARGIN_TOP + plot_h
        );
        let _ = writeln!(
            svg,
            r#"<line x1="{MARGIN_LEFT}" y1="{0:.2}" x2="{1:.2}" y2="{0:.2}" stroke="black"/>"#,
            MARGIN_TOP + plot_h,
            MARGIN_LEFT + plot_w
        );

        // x ticks at each point
        for (x, _) in points {
            let _ = writeln!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-family="sans-serif" font-size="10">{}</text>"#,
                px(*x),
                MARGIN_TOP + plot_h + 14.0,
                format_tick(*x)
            );
        }

        let polyline: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{:.2},{:.2}", px(*x), py(*y)))
            .collect();
        let _ = writeln!(
            svg,
            r##"<polyline fill="none" stroke="#1f77b4" stroke-width="2" points="{}"/>"##,
            polyline.join(" ")
        );
        for (x, y) in points {
            let _ = writeln!(
                svg,
                r##"<circle cx="{:.2}" cy="{:.2}" r="3" fill="#1f77b4"/>"##,
                px(*x),
                py(*y)
            );
        }

        let _ = writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-family="sans-serif" font-size="12">{}</text>"#,
            MARGIN_LEFT + plot_w / 2.0,
            h - 12.0,
            escape(&self.x_label)
        );
        let _ = writeln!(
            svg,
            r#"<text x="16" y="{0:.2}" text-anchor="middle" font-family="sans-serif" font-size="12" transform="rotate(-90 16 {0:.2})">{1}</text>"#,
            MARGIN_TOP + plot_h / 2.0,
            escape(&self.y_label)
        );
        svg.push_str("</svg>\n");

        Ok(svg)
    }
}

impl SampleRenderer for SvgLineChart {
    fn render(&self, title: &str, points: &[(f64, f64)], path: &Path) -> Result<(), RenderError> {
        let svg = self.to_svg(title, points)?;
        write_file(path, &svg)
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Writes the series as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSeries;

#[derive(Serialize)]
struct SeriesDocument<'a> {
    title: &'a str,
    points: Vec<Point>,
}

#[derive(Serialize)]
struct Point {
    x: f64,
    y: f64,
}

impl SampleRenderer for JsonSeries {
    fn render(&self, title: &str, points: &[(f64, f64)], path: &Path) -> Result<(), RenderError> {
        check_points(points)?;
        let document = SeriesDocument {
            title,
            points: points.iter().map(|&(x, y)| Point { x, y }).collect(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        write_file(path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("keypost-render-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_svg_contains_series() {
        let chart = SvgLineChart::default();
        let svg = chart
            .to_svg(DEFAULT_TITLE, &[(1.0, 12.5), (2.0, 3.0), (3.0, 7.25)])
            .unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(DEFAULT_TITLE));
        assert!(svg.contains("Tempo (ms)"));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains(r#"width="576""#));
    }

    #[test]
    fn test_single_point_renders() {
        let svg = SvgLineChart::default().to_svg("one", &[(1.0, 0.0)]).unwrap();
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn test_title_is_escaped() {
        let svg = SvgLineChart::default().to_svg("a < b & c", &[(1.0, 1.0)]).unwrap();
        assert!(svg.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_empty_series_rejected() {
        let result = SvgLineChart::default().to_svg("empty", &[]);
        assert!(matches!(result, Err(RenderError::EmptySeries)));
    }

    #[test]
    fn test_non_finite_point_rejected() {
        let result = JsonSeries.render("bad", &[(1.0, 1.0), (2.0, f64::NAN)], &scratch("bad.json"));
        assert!(matches!(result, Err(RenderError::NonFinitePoint { index: 1 })));
    }

    #[test]
    fn test_json_series_written() {
        let path = scratch("series.json");
        JsonSeries.render("timings", &[(1.0, 2.0), (2.0, 4.5)], &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["title"], "timings");
        assert_eq!(written["points"][1]["y"], 4.5);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let blocker = scratch("blocker");
        fs::create_dir_all(blocker.parent().unwrap()).unwrap();
        fs::write(&blocker, b"file, not a directory").unwrap();

        let result = SvgLineChart::default().render("t", &[(1.0, 1.0)], &blocker.join("chart.svg"));
        assert!(matches!(result, Err(RenderError::Io(_))));
        let _ = fs::remove_file(&blocker);
    }

    #[test]
    fn test_renderer_chosen_by_extension() {
        let path = scratch("pick.json");
        renderer_for(&path).render("pick", &[(1.0, 1.0)], &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().trim_start().starts_with('{'));
        let _ = fs::remove_file(&path);
    }
}
