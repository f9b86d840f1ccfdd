//! Linked chart views
//!
//! One range chart (the commit timeline) drives a set of focus charts. When
//! the range chart is brushed, every focus chart whose filter differs gets
//! the new range and is queued for redraw. Redraws are coalesced into a
//! [`Frame`] and flushed by a single dispatcher that isolates failures.

use crate::error::{Error, Result};
use crate::index::DimensionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error};

/// Charts of the commit dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartId {
    Timeline,
    TotalCommits,
    TotalBugs,
    Defects,
    Churn,
    TotalLoc,
    CodeFrequency,
    TopAuthors,
}

impl ChartId {
    pub const ALL: [ChartId; 8] = [
        ChartId::Timeline,
        ChartId::TotalCommits,
        ChartId::TotalBugs,
        ChartId::Defects,
        ChartId::Churn,
        ChartId::TotalLoc,
        ChartId::CodeFrequency,
        ChartId::TopAuthors,
    ];

    pub fn kind(self) -> ViewKind {
        match self {
            ChartId::Timeline | ChartId::Defects | ChartId::Churn | ChartId::TotalLoc => {
                ViewKind::Line
            }
            ChartId::CodeFrequency => ViewKind::Composite,
            ChartId::TopAuthors => ViewKind::Row,
            ChartId::TotalCommits | ChartId::TotalBugs => ViewKind::Number,
        }
    }

    /// Human-readable chart title
    pub fn title(self) -> &'static str {
        match self {
            ChartId::Timeline => "Commits",
            ChartId::TotalCommits => "Total commits",
            ChartId::TotalBugs => "Total bugs",
            ChartId::Defects => "Defects distribution",
            ChartId::Churn => "Churned / deleted",
            ChartId::TotalLoc => "Total LOC",
            ChartId::CodeFrequency => "Code frequency",
            ChartId::TopAuthors => "Top authors",
        }
    }

    /// Whether the chart has a time x axis
    pub fn is_temporal(self) -> bool {
        matches!(self.kind(), ViewKind::Line | ViewKind::Composite)
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Line,
    Composite,
    Row,
    Number,
}

/// A brushed time window, half-open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidRange(format!(
                "{} is after {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        date >= self.start && date < self.end
    }
}

/// Both empty, or both present with identical bounds
pub fn ranges_equal(a: Option<&TimeRange>, b: Option<&TimeRange>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.start == b.start && a.end == b.end,
        _ => false,
    }
}

/// One chart of the dashboard
#[derive(Debug, Clone)]
pub struct ChartView {
    pub id: ChartId,
    pub mount_id: String,
    pub kind: ViewKind,
    pub dimension: Option<DimensionId>,
    /// Full time extent, temporal charts only
    pub original_domain: Option<TimeRange>,
    pub domain: Option<TimeRange>,
    /// Range currently applied to this chart
    pub filter: Option<TimeRange>,
}

impl ChartView {
    pub fn new(id: ChartId, mount_id: impl Into<String>, dimension: Option<DimensionId>) -> Self {
        Self {
            id,
            mount_id: mount_id.into(),
            kind: id.kind(),
            dimension,
            original_domain: None,
            domain: None,
            filter: None,
        }
    }

    pub fn with_domain(mut self, domain: TimeRange) -> Self {
        self.original_domain = Some(domain);
        self.domain = Some(domain);
        self
    }

    /// Narrow the visible domain to `range`
    pub fn focus(&mut self, range: TimeRange) {
        self.filter = Some(range);
        if self.original_domain.is_some() {
            self.domain = Some(range);
        }
    }

    /// Return to the full extent
    pub fn reset_domain(&mut self) {
        self.filter = None;
        self.domain = self.original_domain;
    }
}

/// Ordered, de-duplicated set of views to redraw
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    views: Vec<ChartId>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a view, keeping its first position if already queued
    pub fn push(&mut self, id: ChartId) {
        if !self.views.contains(&id) {
            self.views.push(id);
        }
    }

    pub fn extend(&mut self, ids: impl IntoIterator<Item = ChartId>) {
        for id in ids {
            self.push(id);
        }
    }

    pub fn views(&self) -> &[ChartId] {
        &self.views
    }

    pub fn contains(&self, id: ChartId) -> bool {
        self.views.contains(&id)
    }

    pub fn position(&self, id: ChartId) -> Option<usize> {
        self.views.iter().position(|v| *v == id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// The charts plus the range-to-focus links between them
#[derive(Debug, Clone, Default)]
pub struct LinkedViewSet {
    views: Vec<ChartView>,
    range_chart: Option<ChartId>,
    focus_charts: Vec<ChartId>,
    pending: Frame,
}

impl LinkedViewSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, view: ChartView) {
        self.views.retain(|v| v.id != view.id);
        self.views.push(view);
    }

    pub fn get(&self, id: ChartId) -> Option<&ChartView> {
        self.views.iter().find(|v| v.id == id)
    }

    fn get_mut(&mut self, id: ChartId) -> Option<&mut ChartView> {
        self.views.iter_mut().find(|v| v.id == id)
    }

    pub fn views(&self) -> &[ChartView] {
        &self.views
    }

    pub fn range_chart(&self) -> Option<ChartId> {
        self.range_chart
    }

    pub fn focus_charts(&self) -> &[ChartId] {
        &self.focus_charts
    }

    /// Link `focus` charts to the `range` chart
    pub fn register_focus_charts(&mut self, range: ChartId, focus: &[ChartId]) {
        self.range_chart = Some(range);
        self.focus_charts = focus.iter().copied().filter(|id| *id != range).collect();
    }

    /// Propagate a range-chart filter to the focus charts.
    ///
    /// Returns the charts whose state changed; they are also queued.
    pub fn on_range_filtered(&mut self, filter: Option<&TimeRange>) -> Vec<ChartId> {
        let mut changed = Vec::new();

        if let Some(range) = self.range_chart {
            if let Some(view) = self.get_mut(range) {
                view.filter = filter.copied();
            }
        }

        for id in self.focus_charts.clone() {
            let Some(view) = self.get_mut(id) else {
                continue;
            };
            match filter {
                None => {
                    if view.filter.is_some() || view.domain != view.original_domain {
                        view.reset_domain();
                        changed.push(id);
                    }
                }
                Some(range) => {
                    if !ranges_equal(view.filter.as_ref(), Some(range)) {
                        view.focus(*range);
                        changed.push(id);
                    }
                }
            }
        }

        debug!(target: "views", changed = changed.len(), "range filter propagated");
        self.pending.extend(changed.iter().copied());
        changed
    }

    /// Queue a redraw
    pub fn queue(&mut self, id: ChartId) {
        self.pending.push(id);
    }

    pub fn queue_all(&mut self) {
        let ids: Vec<ChartId> = self.views.iter().map(|v| v.id).collect();
        self.pending.extend(ids);
    }

    /// Take the pending frame, leaving an empty one
    pub fn take_frame(&mut self) -> Frame {
        std::mem::take(&mut self.pending)
    }

    /// Move a view to another mount element
    pub fn set_mount(&mut self, id: ChartId, mount_id: impl Into<String>) {
        if let Some(view) = self.get_mut(id) {
            view.mount_id = mount_id.into();
        }
    }
}

/// A single point of a time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    pub value: f64,
}

/// A named line of a composite chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    pub color: String,
    pub points: Vec<SeriesPoint>,
}

/// Data behind one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ChartSeries {
    Line(Vec<SeriesPoint>),
    Composite(Vec<NamedSeries>),
    Row(Vec<(String, f64)>),
    Number(f64),
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartSeries::Line(points) => points.is_empty(),
            ChartSeries::Composite(lines) => lines.iter().all(|l| l.points.is_empty()),
            ChartSeries::Row(rows) => rows.is_empty(),
            ChartSeries::Number(_) => false,
        }
    }

    /// Smallest and largest value
    pub fn value_extent(&self) -> Option<(f64, f64)> {
        let values: Vec<f64> = match self {
            ChartSeries::Line(points) => points.iter().map(|p| p.value).collect(),
            ChartSeries::Composite(lines) => lines
                .iter()
                .flat_map(|l| l.points.iter().map(|p| p.value))
                .collect(),
            ChartSeries::Row(rows) => rows.iter().map(|(_, v)| *v).collect(),
            ChartSeries::Number(v) => vec![*v],
        };
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Draws one view
pub trait ViewRenderer {
    fn render(&mut self, view: &ChartView, series: &ChartSeries) -> Result<()>;
}

/// Outcome of flushing a frame
#[derive(Debug, Default)]
pub struct RedrawReport {
    pub rendered: Vec<ChartId>,
    pub errors: Vec<(ChartId, Error)>,
}

impl RedrawReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Redraw every view of `frame` in order.
///
/// A failing view is logged and recorded, the others still redraw.
pub fn dispatch<R, S>(frame: &Frame, views: &LinkedViewSet, renderer: &mut R, series: S) -> RedrawReport
where
    R: ViewRenderer + ?Sized,
    S: Fn(ChartId) -> ChartSeries,
{
    let mut report = RedrawReport::default();

    for &id in frame.views() {
        let Some(view) = views.get(id) else {
            continue;
        };
        let data = series(id);
        match renderer.render(view, &data) {
            Ok(()) => report.rendered.push(id),
            Err(e) => {
                error!(target: "views", view = %view.mount_id, error = %e, "view redraw failed");
                report.errors.push((id, e));
            }
        }
    }

    report
}
