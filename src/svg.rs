//! Static SVG rendering of the dashboard charts and the hierarchy view

use chrono::{DateTime, Utc};
use codemd_core::dashboard::quantile_color;
use codemd_core::labels::TextMeasure;
use codemd_core::mode::{LegendConfig, Tooltip};
use codemd_core::views::{ChartSeries, ChartView, SeriesPoint, ViewKind, ViewRenderer};
use codemd_core::{ChartId, PackingView};
use std::collections::BTreeMap;
use tracing::debug;

const MARGIN_TOP: f64 = 10.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 30.0;
const MARGIN_LEFT: f64 = 50.0;
const LINE_COLOR: &str = "#1f77b4";

/// Escape text for SVG content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Outer size of one chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartSize {
    pub width: f64,
    pub height: f64,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 560.0,
            height: 220.0,
        }
    }
}

impl ChartSize {
    fn inner_width(&self) -> f64 {
        (self.width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0)
    }

    fn inner_height(&self) -> f64 {
        (self.height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0)
    }
}

struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    fn apply(&self, value: f64) -> f64 {
        let span = self.domain.1 - self.domain.0;
        if span == 0.0 {
            return (self.range.0 + self.range.1) / 2.0;
        }
        self.range.0 + (value - self.domain.0) / span * (self.range.1 - self.range.0)
    }
}

fn mismatch(view: &ChartView, series: &ChartSeries) -> codemd_core::Error {
    let got = match series {
        ChartSeries::Line(_) => "line",
        ChartSeries::Composite(_) => "composite",
        ChartSeries::Row(_) => "row",
        ChartSeries::Number(_) => "number",
    };
    codemd_core::Error::RenderError {
        view: view.mount_id.clone(),
        reason: format!("{:?} chart cannot draw {} data", view.kind, got),
    }
}

fn time_extent(view: &ChartView, series: &[&SeriesPoint]) -> Option<(f64, f64)> {
    if let Some(domain) = view.domain {
        return Some((domain.start.timestamp() as f64, domain.end.timestamp() as f64));
    }
    let first = series.iter().map(|p| p.date).min()?;
    let last = series.iter().map(|p| p.date).max()?;
    Some((first.timestamp() as f64, last.timestamp() as f64))
}

fn date_label(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn path_of(points: &[SeriesPoint], x: &LinearScale, y: &LinearScale) -> String {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{}{:.2},{:.2}",
                if i == 0 { "M" } else { "L" },
                x.apply(p.date.timestamp() as f64),
                y.apply(p.value)
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

/// Render one chart to a standalone `<svg>` element.
///
/// `defect_max` colours the defects chart by quantile; other charts ignore it.
pub fn render_chart(
    view: &ChartView,
    series: &ChartSeries,
    size: ChartSize,
    defect_max: f64,
) -> codemd_core::Result<String> {
    let mut body = String::new();
    let (w, h) = (size.inner_width(), size.inner_height());

    match (view.kind, series) {
        (ViewKind::Number, ChartSeries::Number(value)) => {
            body.push_str(&format!(
                r#"<text class="number-display" x="{:.2}" y="{:.2}" text-anchor="middle">{}</text>"#,
                w / 2.0,
                h / 2.0,
                value
            ));
        }
        (ViewKind::Row, ChartSeries::Row(rows)) => {
            let max = rows.iter().map(|(_, v)| *v).fold(0.0, f64::max);
            let x = LinearScale::new((0.0, max), (0.0, w));
            let band = h / rows.len().max(1) as f64;
            for (i, (label, value)) in rows.iter().enumerate() {
                let y = i as f64 * band;
                body.push_str(&format!(
                    r#"<g class="row"><rect x="0" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/><text x="6" y="{:.2}">{}</text></g>"#,
                    y + 1.0,
                    x.apply(*value),
                    (band - 2.0).max(1.0),
                    LINE_COLOR,
                    y + band / 2.0 + 4.0,
                    escape(label)
                ));
            }
        }
        (ViewKind::Line, ChartSeries::Line(points)) => {
            let refs: Vec<&SeriesPoint> = points.iter().collect();
            if let (Some(extent), Some((lo, hi))) = (time_extent(view, &refs), series.value_extent()) {
                let x = LinearScale::new(extent, (0.0, w));
                let y = LinearScale::new((lo.min(0.0), hi), (h, 0.0));
                if view.id == ChartId::Defects {
                    let bar = (w / points.len().max(1) as f64).clamp(1.0, 20.0);
                    for p in points {
                        let top = y.apply(p.value);
                        body.push_str(&format!(
                            r#"<rect class="bar" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
                            x.apply(p.date.timestamp() as f64) - bar / 2.0,
                            top,
                            bar,
                            (y.apply(0.0) - top).max(0.0),
                            quantile_color(p.value, defect_max)
                        ));
                    }
                } else {
                    body.push_str(&format!(
                        r#"<path class="line" d="{}" fill="none" stroke="{}"/>"#,
                        path_of(points, &x, &y),
                        LINE_COLOR
                    ));
                }
                body.push_str(&axis(extent, h));
            }
        }
        (ViewKind::Composite, ChartSeries::Composite(lines)) => {
            let refs: Vec<&SeriesPoint> = lines.iter().flat_map(|l| l.points.iter()).collect();
            if let (Some(extent), Some((lo, hi))) = (time_extent(view, &refs), series.value_extent()) {
                let x = LinearScale::new(extent, (0.0, w));
                let y = LinearScale::new((lo.min(0.0), hi.max(0.0)), (h, 0.0));
                for line in lines {
                    body.push_str(&format!(
                        r#"<path class="line" data-series="{}" d="{}" fill="none" stroke="{}"/>"#,
                        escape(&line.name),
                        path_of(&line.points, &x, &y),
                        escape(&line.color)
                    ));
                }
                body.push_str(&axis(extent, h));
            }
        }
        _ => return Err(mismatch(view, series)),
    }

    Ok(format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" id="{}-svg" width="{}" height="{}"><title>{}</title><g transform="translate({},{})">{}</g></svg>"#,
        escape(&view.mount_id),
        size.width,
        size.height,
        escape(view.id.title()),
        MARGIN_LEFT,
        MARGIN_TOP,
        body
    ))
}

fn axis(extent: (f64, f64), height: f64) -> String {
    let label = |secs: f64| {
        DateTime::<Utc>::from_timestamp(secs as i64, 0)
            .map(date_label)
            .unwrap_or_default()
    };
    format!(
        r#"<g class="axis"><text x="0" y="{:.2}">{}</text><text x="100%" y="{:.2}" text-anchor="end">{}</text></g>"#,
        height + 20.0,
        label(extent.0),
        height + 20.0,
        label(extent.1)
    )
}

/// Collects rendered charts by mount id
#[derive(Debug, Default)]
pub struct SvgRenderer {
    size: ChartSize,
    defect_max: f64,
    charts: BTreeMap<String, String>,
}

impl SvgRenderer {
    pub fn new(size: ChartSize) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn with_defect_max(mut self, defect_max: f64) -> Self {
        self.defect_max = defect_max;
        self
    }

    pub fn get(&self, mount_id: &str) -> Option<&str> {
        self.charts.get(mount_id).map(String::as_str)
    }

    pub fn charts(&self) -> &BTreeMap<String, String> {
        &self.charts
    }

    pub fn into_charts(self) -> BTreeMap<String, String> {
        self.charts
    }
}

impl ViewRenderer for SvgRenderer {
    fn render(&mut self, view: &ChartView, series: &ChartSeries) -> codemd_core::Result<()> {
        let svg = render_chart(view, series, self.size, self.defect_max)?;
        debug!(view = %view.mount_id, bytes = svg.len(), "rendered chart");
        self.charts.insert(view.mount_id.clone(), svg);
        Ok(())
    }
}

fn tooltip_text(tooltip: &Tooltip) -> String {
    let mut lines = vec![tooltip.title.clone()];
    lines.extend(tooltip.heading.clone());
    lines.extend(
        tooltip
            .lines
            .iter()
            .map(|line| format!("{}: {}", line.label, line.value)),
    );
    escape(&lines.join("\n"))
}

/// Render the hierarchy view at its current focus and mode
pub fn render_packing<M: TextMeasure>(view: &PackingView<M>) -> String {
    let config = view.config();
    let size = config.outer_diameter();
    let mut out = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}"><g transform="translate({m},{m})">"#,
        size = size,
        m = config.margin
    );

    for circle in view.circles() {
        out.push_str(&format!(
            r#"<circle class="{}" cx="{:.2}" cy="{:.2}" r="{:.2}" style="fill:{};fill-opacity:{}">"#,
            circle.class.css(),
            circle.x,
            circle.y,
            circle.r,
            escape(&circle.style.fill),
            circle.style.fill_opacity
        ));
        if let Some(tip) = view.tooltip(circle.id) {
            out.push_str(&format!("<title>{}</title>", tooltip_text(&tip)));
        }
        out.push_str("</circle>");
    }

    for label in view.labels() {
        out.push_str(&format!(
            r#"<text class="label" x="{:.2}" y="{:.2}" text-anchor="middle" style="fill-opacity:{};opacity:{}">{}</text>"#,
            label.x,
            label.y,
            label.fill_opacity,
            label.opacity,
            escape(&label.text)
        ));
    }

    out.push_str("</g></svg>");
    out
}

/// Render the author legend for a container `width` pixels wide.
///
/// Returns `None` outside the knowledge map.
pub fn render_legend<M: TextMeasure>(view: &PackingView<M>, width: f64) -> Option<String> {
    let legend = view.legend()?;
    let layout = view.legend_layout(width)?;
    let config = LegendConfig::default();

    let mut out = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}"><g transform="translate({o},{o})">"#,
        layout.width,
        layout.height,
        o = config.offset
    );
    for (entry, slot) in legend.entries().iter().zip(&layout.slots) {
        out.push_str(&format!(
            r#"<g class="legend" transform="translate({},{})"><rect width="{r}" height="{r}" style="fill:{}"/><text x="{}" y="14">{}</text></g>"#,
            slot.x,
            slot.y,
            escape(&entry.color),
            config.rect_size + config.spacing,
            escape(&entry.label),
            r = config.rect_size
        ));
    }
    out.push_str("</g></svg>");
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use codemd_core::data::{HierarchyNode, KnowledgeInfo};
    use codemd_core::views::NamedSeries;
    use codemd_core::AnnotationMode;
    use pretty_assertions::assert_eq;

    fn point(day: i64, value: f64) -> SeriesPoint {
        SeriesPoint {
            date: Utc.timestamp_opt(day * 86_400, 0).unwrap(),
            value,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[test]
    fn test_line_chart() {
        let view = ChartView::new(ChartId::Churn, "churn-over-del", None);
        let series = ChartSeries::Line(vec![point(0, 1.0), point(1, 3.0)]);
        let svg = render_chart(&view, &series, ChartSize::default(), 0.0).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"id="churn-over-del-svg""#));
        // Value axis starts at zero, the last point is at the top right
        assert!(svg.contains(r#"d="M0.00,120.00L490.00,0.00""#));
    }

    #[test]
    fn test_defect_bars_use_quantiles() {
        let view = ChartView::new(ChartId::Defects, "defects-distribution", None);
        let series = ChartSeries::Line(vec![point(0, 1.0), point(1, 10.0)]);
        let svg = render_chart(&view, &series, ChartSize::default(), 10.0).unwrap();

        assert!(svg.contains("#fb6a4a"));
        assert!(svg.contains("#67000d"));
    }

    #[test]
    fn test_composite_and_rows() {
        let view = ChartView::new(ChartId::CodeFrequency, "code-frequency", None);
        let series = ChartSeries::Composite(vec![
            NamedSeries {
                name: "insertions".to_string(),
                color: "#2ca02c".to_string(),
                points: vec![point(0, 5.0)],
            },
            NamedSeries {
                name: "deletions".to_string(),
                color: "#ef3b2c".to_string(),
                points: vec![point(0, -2.0)],
            },
        ]);
        let svg = render_chart(&view, &series, ChartSize::default(), 0.0).unwrap();
        assert_eq!(svg.matches("<path").count(), 2);

        let view = ChartView::new(ChartId::TopAuthors, "top-authors", None);
        let series = ChartSeries::Row(vec![("a <b>".to_string(), 3.0)]);
        let svg = render_chart(&view, &series, ChartSize::default(), 0.0).unwrap();
        assert!(svg.contains("a &lt;b&gt;"));
    }

    #[test]
    fn test_kind_mismatch_is_a_render_error() {
        let view = ChartView::new(ChartId::TotalCommits, "total-commits", None);
        let err = render_chart(&view, &ChartSeries::Row(vec![]), ChartSize::default(), 0.0).unwrap_err();
        assert!(matches!(err, codemd_core::Error::RenderError { .. }));
    }

    #[test]
    fn test_empty_line_chart_renders_frame_only() {
        let view = ChartView::new(ChartId::TotalLoc, "total-loc", None);
        let svg = render_chart(&view, &ChartSeries::Line(vec![]), ChartSize::default(), 0.0).unwrap();
        assert!(!svg.contains("<path"));
    }

    fn owned(name: &str, author: &str, color: &str) -> HierarchyNode {
        let mut node = HierarchyNode::file(name, 100);
        node.metrics.knowledge_info = Some(KnowledgeInfo {
            top_authors: [(author.to_string(), 4)].into_iter().collect(),
            author: Some(author.to_string()),
            color: Some(color.to_string()),
        });
        node
    }

    #[test]
    fn test_packing_and_legend() {
        let root = HierarchyNode::directory(
            "repo",
            vec![owned("a.rs", "ann", "#BE0032"), owned("b.rs", "bob", "#F3C300")],
        );
        let mut view = PackingView::for_container(&root, 400.0, 400.0);
        let svg = render_packing(&view);

        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains("node node--root"));
        assert!(svg.contains("fill:#BE0032"));
        assert!(svg.contains("<title>a.rs\nTop Contributors\nann: with 4 changes</title>"));

        let legend = render_legend(&view, 400.0).unwrap();
        assert_eq!(legend.matches("<rect").count(), 2);
        assert!(legend.contains(">bob</text>"));

        view.set_mode(AnnotationMode::Bugs);
        assert_eq!(render_legend(&view, 400.0), None);
    }
}
