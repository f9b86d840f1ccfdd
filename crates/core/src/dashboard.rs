//! Commit dashboard controller
//!
//! Owns the dimensional index, the linked chart views and the churn baseline.
//! Front-ends feed it [`Transition`] values and get back the [`Frame`] of
//! charts to redraw, then pull each chart's data with [`Dashboard::series`].

use crate::churn::{churn_series, total_loc, Baseline};
use crate::data::CommitRecord;
use crate::error::{Error, Result};
use crate::hotspots::hotspots_url;
use crate::index::{
    ChangeSums, CommitIndex, Count, DimensionId, GroupId, Key, MaxRunningTotals, Sum, SumChanges,
};
use crate::loader::{Binning, ROW_LIMIT};
use crate::views::{
    dispatch, ranges_equal, ChartId, ChartSeries, ChartView, Frame, LinkedViewSet, NamedSeries,
    RedrawReport, SeriesPoint, TimeRange, ViewRenderer,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

type RecordSum = Sum<fn(&CommitRecord) -> i64>;

/// Quantile palette of the defects chart, lightest first
pub const DEFECT_PALETTE: [&str; 5] = ["#fb6a4a", "#ef3b2c", "#cb181d", "#a50f15", "#67000d"];

pub const INSERTIONS_COLOR: &str = "#2ca02c";
pub const DELETIONS_COLOR: &str = "#ef3b2c";
pub const TOTAL_LOC_COLOR: &str = "#900C3F";

/// DOM element ids the views are mounted on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountPoints {
    pub packing: String,
    pub legend: String,
    pub timeline: String,
    pub total_commits: String,
    pub total_bugs: String,
    pub defects: String,
    pub churn: String,
    pub total_loc: String,
    pub code_frequency: String,
    pub top_authors: String,
}

impl Default for MountPoints {
    fn default() -> Self {
        Self {
            packing: "packing-container".to_string(),
            legend: "legend".to_string(),
            timeline: "commits-timeline".to_string(),
            total_commits: "total-commits".to_string(),
            total_bugs: "total-bugs".to_string(),
            defects: "defects-distribution".to_string(),
            churn: "churn-over-del".to_string(),
            total_loc: "total-loc".to_string(),
            code_frequency: "code-frequency".to_string(),
            top_authors: "top-authors".to_string(),
        }
    }
}

impl MountPoints {
    pub fn for_chart(&self, id: ChartId) -> &str {
        match id {
            ChartId::Timeline => &self.timeline,
            ChartId::TotalCommits => &self.total_commits,
            ChartId::TotalBugs => &self.total_bugs,
            ChartId::Defects => &self.defects,
            ChartId::Churn => &self.churn,
            ChartId::TotalLoc => &self.total_loc,
            ChartId::CodeFrequency => &self.code_frequency,
            ChartId::TopAuthors => &self.top_authors,
        }
    }
}

/// Configuration for the commit dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Record count from which dates are binned by week
    pub row_limit: usize,
    /// Force a binning regardless of record count
    pub binning: Option<Binning>,
    /// Maximum rows of the top-authors chart
    pub top_authors_cap: usize,
    pub mounts: MountPoints,
    /// Charts following the timeline brush
    pub focus_charts: Vec<ChartId>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            row_limit: ROW_LIMIT,
            binning: None,
            top_authors_cap: 8,
            mounts: MountPoints::default(),
            focus_charts: vec![
                ChartId::CodeFrequency,
                ChartId::TotalLoc,
                ChartId::Churn,
                ChartId::TopAuthors,
                ChartId::Defects,
            ],
        }
    }
}

/// User-driven state changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Brush a window on the timeline
    Brush(TimeRange),
    ClearBrush,
    /// Restrict to one author, `None` clears
    SelectAuthor(Option<String>),
    /// Drop every filter
    Reset,
    /// Container size changed
    Resize,
}

/// Group-all counters of the active subset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub commits: u64,
    pub bugs: u64,
}

/// Linked commit dashboard
pub struct Dashboard {
    config: DashboardConfig,
    binning: Binning,
    index: CommitIndex,
    date: DimensionId,
    author: DimensionId,
    commits_by_date: GroupId<Count>,
    bugs_by_date: GroupId<RecordSum>,
    bugs_by_day: GroupId<RecordSum>,
    changes_by_date: GroupId<SumChanges>,
    net_by_date: GroupId<RecordSum>,
    maxima_by_date: GroupId<MaxRunningTotals>,
    commits_by_author: GroupId<Count>,
    lines_by_author: GroupId<RecordSum>,
    total_commits: GroupId<Count>,
    total_bugs: GroupId<RecordSum>,
    views: LinkedViewSet,
    baseline: Baseline,
    brush: Option<TimeRange>,
    selected_author: Option<String>,
}

fn bug_flag(record: &CommitRecord) -> i64 {
    record.bug as i64
}

fn net_change(record: &CommitRecord) -> i64 {
    record.net_change()
}

fn churned_lines(record: &CommitRecord) -> i64 {
    record.churn() as i64
}

fn bucket_date(key: &Key) -> Option<DateTime<Utc>> {
    key.as_time()
}

impl Dashboard {
    /// Build the index, groups and views over `records`
    pub fn build(records: Vec<CommitRecord>, config: DashboardConfig) -> Result<Self> {
        if config.top_authors_cap == 0 {
            return Err(Error::ConfigError(
                "top_authors_cap must be at least 1".to_string(),
            ));
        }

        let binning = config
            .binning
            .unwrap_or_else(|| Binning::with_limit(records.len(), config.row_limit));
        info!(
            records = records.len(),
            binning = ?binning,
            "building commit dashboard"
        );

        let mut index = CommitIndex::new(records);
        let date = index.dimension("date", move |r| Key::Time(binning.floor(r.date)))?;
        let bug_day = index.dimension("bug-day", |r| Key::Time(Binning::Day.floor(r.date)))?;
        let author = index.dimension("author", |r| Key::Text(r.author.clone()))?;

        let commits_by_date = index.group(date, Count);
        let bugs_by_date = index.group(date, Sum::new(bug_flag as fn(&CommitRecord) -> i64));
        let bugs_by_day = index.group(bug_day, Sum::new(bug_flag as fn(&CommitRecord) -> i64));
        let changes_by_date = index.group(date, SumChanges);
        let net_by_date = index.group(date, Sum::new(net_change as fn(&CommitRecord) -> i64));
        let maxima_by_date = index.group(date, MaxRunningTotals);
        let commits_by_author = index.group(author, Count);
        let lines_by_author =
            index.group(author, Sum::new(churned_lines as fn(&CommitRecord) -> i64));
        let total_commits = index.group_all(Count);
        let total_bugs = index.group_all(Sum::new(bug_flag as fn(&CommitRecord) -> i64));

        let extent = match (index.bottom(date, 1).first(), index.top_records(date, 1).first()) {
            (Some(first), Some(last)) => Some(TimeRange {
                start: first.date,
                end: last.date,
            }),
            _ => None,
        };

        let mut views = LinkedViewSet::new();
        for id in ChartId::ALL {
            let dimension = match id {
                ChartId::TopAuthors => Some(author),
                ChartId::TotalCommits | ChartId::TotalBugs => None,
                _ => Some(date),
            };
            let view = ChartView::new(id, config.mounts.for_chart(id), dimension);
            let view = match extent {
                Some(extent) if id.is_temporal() => view.with_domain(extent),
                _ => view,
            };
            views.add(view);
        }
        views.register_focus_charts(ChartId::Timeline, &config.focus_charts);

        let baseline = Baseline::from_earliest(index.bottom(date, 1).first().copied());

        Ok(Self {
            config,
            binning,
            index,
            date,
            author,
            commits_by_date,
            bugs_by_date,
            bugs_by_day,
            changes_by_date,
            net_by_date,
            maxima_by_date,
            commits_by_author,
            lines_by_author,
            total_commits,
            total_bugs,
            views,
            baseline,
            brush: None,
            selected_author: None,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn binning(&self) -> Binning {
        self.binning
    }

    pub fn index(&self) -> &CommitIndex {
        &self.index
    }

    pub fn views(&self) -> &LinkedViewSet {
        &self.views
    }

    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    pub fn brush(&self) -> Option<&TimeRange> {
        self.brush.as_ref()
    }

    pub fn selected_author(&self) -> Option<&str> {
        self.selected_author.as_deref()
    }

    /// Apply one transition and return the charts to redraw
    pub fn apply(&mut self, transition: Transition) -> Result<Frame> {
        debug!(?transition, "applying dashboard transition");

        match transition {
            Transition::Brush(range) => {
                if ranges_equal(self.brush.as_ref(), Some(&range)) {
                    let mut frame = Frame::new();
                    frame.push(ChartId::Timeline);
                    return Ok(frame);
                }
                self.index
                    .filter_range(self.date, Key::Time(range.start), Key::Time(range.end))?;
                self.brush = Some(range);
                Ok(self.after_range_change())
            }
            Transition::ClearBrush => {
                self.index.filter_all(self.date);
                self.brush = None;
                Ok(self.after_range_change())
            }
            Transition::SelectAuthor(author) => {
                match &author {
                    Some(name) => self.index.filter_exact(self.author, Key::Text(name.clone())),
                    None => self.index.filter_all(self.author),
                }
                self.selected_author = author;
                self.refresh_baseline();
                Ok(self.full_frame())
            }
            Transition::Reset => {
                self.index.clear_all_filters();
                self.brush = None;
                self.selected_author = None;
                self.refresh_baseline();
                self.views.on_range_filtered(None);
                Ok(self.full_frame())
            }
            Transition::Resize => Ok(self.full_frame()),
        }
    }

    /// Baseline, then focus charts, then one frame with the timeline first
    fn after_range_change(&mut self) -> Frame {
        self.refresh_baseline();

        let mut frame = Frame::new();
        frame.push(ChartId::Timeline);
        frame.push(ChartId::TotalCommits);
        frame.push(ChartId::TotalBugs);

        self.views.on_range_filtered(self.brush.as_ref());
        frame.extend(self.views.take_frame().views().iter().copied());
        // The baseline moved even when the churn chart's filter did not
        frame.push(ChartId::Churn);
        frame
    }

    fn full_frame(&mut self) -> Frame {
        self.views.take_frame();
        let mut frame = Frame::new();
        frame.extend(ChartId::ALL);
        frame
    }

    fn refresh_baseline(&mut self) {
        self.baseline = Baseline::from_earliest(self.index.bottom(self.date, 1).first().copied());
        debug!(
            target: "churn",
            insertions = self.baseline.insertions,
            deletions = self.baseline.deletions,
            "baseline recomputed"
        );
    }

    /// Redraw the charts of `frame` through `renderer`
    pub fn flush<R: ViewRenderer + ?Sized>(&self, frame: &Frame, renderer: &mut R) -> RedrawReport {
        dispatch(frame, &self.views, renderer, |id| self.series(id))
    }

    /// Data currently behind `chart`
    pub fn series(&self, chart: ChartId) -> ChartSeries {
        match chart {
            ChartId::Timeline => ChartSeries::Line(self.commits_series()),
            ChartId::TotalCommits => ChartSeries::Number(self.totals().commits as f64),
            ChartId::TotalBugs => ChartSeries::Number(self.totals().bugs as f64),
            ChartId::Defects => ChartSeries::Line(self.clip(chart, self.bugs_series())),
            ChartId::Churn => ChartSeries::Line(self.churn_series()),
            ChartId::TotalLoc => ChartSeries::Line(self.clip(chart, self.total_loc_series())),
            ChartId::CodeFrequency => {
                let (insertions, deletions) = self.code_frequency_series();
                ChartSeries::Composite(vec![
                    NamedSeries {
                        name: "insertions".to_string(),
                        color: INSERTIONS_COLOR.to_string(),
                        points: self.clip(chart, insertions),
                    },
                    NamedSeries {
                        name: "deletions".to_string(),
                        color: DELETIONS_COLOR.to_string(),
                        points: self.clip(chart, deletions),
                    },
                ])
            }
            ChartId::TopAuthors => ChartSeries::Row(
                self.top_authors()
                    .into_iter()
                    .map(|(author, commits)| (author, commits as f64))
                    .collect(),
            ),
        }
    }

    /// Whether the bucket keyed at `date` is active for the chart.
    ///
    /// Bucket keys are floored dates, so this is the same half-open test the
    /// date dimension applies to the brushed range.
    fn in_domain(&self, chart: ChartId, date: DateTime<Utc>) -> bool {
        match self.views.get(chart).and_then(|v| v.filter) {
            Some(range) => date >= range.start && date < range.end,
            None => true,
        }
    }

    fn clip(&self, chart: ChartId, points: Vec<SeriesPoint>) -> Vec<SeriesPoint> {
        points
            .into_iter()
            .filter(|p| self.in_domain(chart, p.date))
            .collect()
    }

    fn time_series<V>(&self, entries: Vec<(&Key, &V)>, value: impl Fn(&V) -> f64) -> Vec<SeriesPoint> {
        entries
            .into_iter()
            .filter_map(|(key, v)| {
                bucket_date(key).map(|date| SeriesPoint {
                    date,
                    value: value(v),
                })
            })
            .collect()
    }

    /// Commits per bucket
    pub fn commits_series(&self) -> Vec<SeriesPoint> {
        self.time_series(self.index.all(self.commits_by_date), |v| *v as f64)
    }

    /// Bug fixes per bucket
    pub fn bugs_series(&self) -> Vec<SeriesPoint> {
        self.time_series(self.index.all(self.bugs_by_date), |v| *v as f64)
    }

    /// Bug fixes per day, whatever the binning
    pub fn bugs_by_day_series(&self) -> Vec<SeriesPoint> {
        self.time_series(self.index.all(self.bugs_by_day), |v| *v as f64)
    }

    /// Insertions per bucket and deletions per bucket, deletions negated
    pub fn code_frequency_series(&self) -> (Vec<SeriesPoint>, Vec<SeriesPoint>) {
        let entries = self.index.all(self.changes_by_date);
        let insertions = self.time_series(entries.clone(), |v: &ChangeSums| v.insertions as f64);
        let deletions = self.time_series(entries, |v: &ChangeSums| -(v.deletions as f64));
        (insertions, deletions)
    }

    /// Insertions minus deletions per bucket
    pub fn net_change_series(&self) -> Vec<SeriesPoint> {
        self.time_series(self.index.all(self.net_by_date), |v| *v as f64)
    }

    /// Total lines of code at the end of every non-empty bucket
    pub fn total_loc_series(&self) -> Vec<SeriesPoint> {
        let entries = self
            .index
            .all(self.maxima_by_date)
            .into_iter()
            .filter(|(_, max)| !max.is_empty())
            .collect();
        self.time_series(entries, |max| total_loc(max) as f64)
    }

    /// Churned-over-deleted ratio against the current baseline, over the
    /// churn chart's visible window
    pub fn churn_series(&self) -> Vec<SeriesPoint> {
        let visible = self
            .index
            .all(self.maxima_by_date)
            .into_iter()
            .filter(|(key, _)| {
                bucket_date(key).map_or(false, |date| self.in_domain(ChartId::Churn, date))
            });
        churn_series(visible, self.baseline)
            .into_iter()
            .filter_map(|(key, value)| bucket_date(&key).map(|date| SeriesPoint { date, value }))
            .collect()
    }

    pub fn totals(&self) -> Totals {
        Totals {
            commits: *self.index.value(self.total_commits),
            bugs: (*self.index.value(self.total_bugs)).max(0) as u64,
        }
    }

    /// Authors with the most commits in the active window, capped
    pub fn top_authors(&self) -> Vec<(String, u64)> {
        self.index
            .top(self.commits_by_author, self.config.top_authors_cap, |v| *v)
            .into_iter()
            .filter(|(_, commits)| **commits > 0)
            .map(|(key, commits)| (key.to_string(), *commits))
            .collect()
    }

    /// Changed lines per author in the active window, most first
    pub fn lines_by_author(&self) -> Vec<(String, u64)> {
        self.index
            .top(self.lines_by_author, usize::MAX, |v| *v)
            .into_iter()
            .filter(|(_, lines)| **lines > 0)
            .map(|(key, lines)| (key.to_string(), (*lines).max(0) as u64))
            .collect()
    }

    /// Dates of the first and last record in the active subset
    pub fn selection(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.index.bottom(self.date, 1).first().map(|r| r.date)?;
        let last = self.index.top_records(self.date, 1).first().map(|r| r.date)?;
        Some((first, last))
    }

    /// Drill-down URL to the hotspot view of the active selection
    pub fn hotspots_url(&self, base: &str, project: &str) -> Result<Url> {
        let (start, end) = self.selection().ok_or(Error::EmptySelection)?;
        hotspots_url(base, project, start, end)
    }

    /// Colour of a defects bucket holding `bugs` fixes
    pub fn defect_color(&self, bugs: f64) -> &'static str {
        let max = self
            .index
            .top(self.bugs_by_date, 1, |v| *v)
            .first()
            .map_or(0, |(_, v)| **v);
        quantile_color(bugs, max as f64)
    }
}

/// Quantile scale over `[0, max]` onto [`DEFECT_PALETTE`]
pub fn quantile_color(value: f64, max: f64) -> &'static str {
    let steps = DEFECT_PALETTE.len();
    let bucket = (1..steps)
        .filter(|&i| value >= max * i as f64 / steps as f64)
        .count();
    DEFECT_PALETTE[bucket]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn commit(day: i64, author: &str, ins: u64, del: u64, totals: (u64, u64), bug: bool) -> CommitRecord {
        CommitRecord {
            date: at(day * 86400 + 3600),
            author: author.to_string(),
            insertions: ins,
            deletions: del,
            total_insertions: totals.0,
            total_deletions: totals.1,
            bug,
        }
    }

    fn history() -> Vec<CommitRecord> {
        vec![
            commit(0, "x", 10, 0, (10, 0), false),
            commit(1, "y", 5, 2, (15, 2), true),
            commit(2, "x", 3, 3, (18, 5), false),
            commit(3, "z", 0, 4, (18, 9), true),
            commit(4, "y", 6, 1, (24, 10), false),
        ]
    }

    fn brush(a: i64, b: i64) -> Transition {
        Transition::Brush(TimeRange::new(at(a * 86400), at(b * 86400)).unwrap())
    }

    #[test]
    fn test_two_commit_totals() {
        let records = vec![
            CommitRecord {
                date: at(0),
                author: "x".to_string(),
                insertions: 5,
                deletions: 0,
                total_insertions: 5,
                total_deletions: 0,
                bug: false,
            },
            CommitRecord {
                date: at(86400),
                author: "y".to_string(),
                insertions: 0,
                deletions: 5,
                total_insertions: 5,
                total_deletions: 5,
                bug: true,
            },
        ];
        let dashboard = Dashboard::build(records, DashboardConfig::default()).unwrap();

        assert_eq!(dashboard.binning(), Binning::Day);
        assert_eq!(dashboard.totals(), Totals { commits: 2, bugs: 1 });
        assert_eq!(dashboard.commits_series().len(), 2);
    }

    #[test]
    fn test_brush_sequencing() {
        let mut dashboard = Dashboard::build(history(), DashboardConfig::default()).unwrap();
        assert_eq!(dashboard.baseline(), Baseline { insertions: 10, deletions: 0 });

        let frame = dashboard.apply(brush(2, 4)).unwrap();
        let timeline = frame.position(ChartId::Timeline).unwrap();
        let churn = frame.position(ChartId::Churn).unwrap();
        assert!(timeline < churn);
        assert!(frame.contains(ChartId::TopAuthors));

        // Baseline follows the earliest record of the window
        assert_eq!(dashboard.baseline(), Baseline { insertions: 18, deletions: 5 });
        assert_eq!(dashboard.totals(), Totals { commits: 2, bugs: 1 });
        // Timeline still shows the full history
        assert_eq!(dashboard.commits_series().len(), 5);
        assert_eq!(
            dashboard.views().get(ChartId::TotalLoc).unwrap().domain,
            dashboard.brush().copied()
        );
    }

    #[test]
    fn test_same_brush_only_redraws_timeline() {
        let mut dashboard = Dashboard::build(history(), DashboardConfig::default()).unwrap();
        dashboard.apply(brush(1, 3)).unwrap();
        let frame = dashboard.apply(brush(1, 3)).unwrap();
        assert_eq!(frame.views(), &[ChartId::Timeline]);
    }

    #[test]
    fn test_churn_series_in_window() {
        let mut dashboard = Dashboard::build(history(), DashboardConfig::default()).unwrap();
        dashboard.apply(brush(2, 5)).unwrap();

        let churn: Vec<f64> = dashboard.churn_series().iter().map(|p| p.value).collect();
        // Day 2 is the baseline itself: raw maxima (18 + 5) / 5
        // Day 3: dI = 0, dD = 4 -> 1
        // Day 4: dI = 6, dD = 5 -> 11 / 5
        assert_eq!(churn, vec![23.0 / 5.0, 1.0, 11.0 / 5.0]);
        assert!(churn.iter().all(|v| *v >= 0.0));
    }

    fn dates(points: &[SeriesPoint]) -> Vec<DateTime<Utc>> {
        points.iter().map(|p| p.date).collect()
    }

    #[test]
    fn test_mid_bucket_brush_skips_partial_leading_bucket() {
        let mut dashboard = Dashboard::build(history(), DashboardConfig::default()).unwrap();
        let range = TimeRange::new(at(86400 + 12 * 3600), at(4 * 86400)).unwrap();
        dashboard.apply(Transition::Brush(range)).unwrap();

        // Day 1 starts before the brush, so its bucket is filtered out
        assert_eq!(dashboard.baseline(), Baseline { insertions: 18, deletions: 5 });
        assert_eq!(dashboard.totals(), Totals { commits: 2, bugs: 1 });

        let churn = dashboard.churn_series();
        assert_eq!(dates(&churn), vec![at(2 * 86400), at(3 * 86400)]);
        assert_eq!(
            churn.iter().map(|p| p.value).collect::<Vec<_>>(),
            vec![23.0 / 5.0, 1.0]
        );

        match dashboard.series(ChartId::TotalLoc) {
            ChartSeries::Line(points) => {
                assert_eq!(dates(&points), vec![at(2 * 86400), at(3 * 86400)])
            }
            other => panic!("unexpected series {:?}", other),
        }
    }

    #[test]
    fn test_brush_end_bucket_is_excluded() {
        let mut dashboard = Dashboard::build(history(), DashboardConfig::default()).unwrap();
        dashboard.apply(brush(2, 4)).unwrap();

        let churn = dashboard.churn_series();
        assert_eq!(dates(&churn), vec![at(2 * 86400), at(3 * 86400)]);
        assert!(churn.iter().all(|p| p.value >= 0.0));

        for chart in [ChartId::Defects, ChartId::TotalLoc] {
            match dashboard.series(chart) {
                ChartSeries::Line(points) => {
                    assert!(points.iter().all(|p| p.date >= at(2 * 86400) && p.date < at(4 * 86400)))
                }
                other => panic!("unexpected series {:?}", other),
            }
        }
        match dashboard.series(ChartId::CodeFrequency) {
            ChartSeries::Composite(series) => {
                for named in series {
                    assert_eq!(dates(&named.points), vec![at(2 * 86400), at(3 * 86400)]);
                }
            }
            other => panic!("unexpected series {:?}", other),
        }
    }

    #[test]
    fn test_select_author_and_reset() {
        let mut dashboard = Dashboard::build(history(), DashboardConfig::default()).unwrap();

        assert_eq!(
            dashboard.top_authors(),
            vec![("x".to_string(), 2), ("y".to_string(), 2), ("z".to_string(), 1)]
        );

        let frame = dashboard.apply(Transition::SelectAuthor(Some("y".to_string()))).unwrap();
        assert_eq!(frame.len(), ChartId::ALL.len());
        assert_eq!(dashboard.totals(), Totals { commits: 2, bugs: 1 });
        assert_eq!(dashboard.baseline(), Baseline { insertions: 15, deletions: 2 });
        // The author chart ignores its own filter
        assert_eq!(dashboard.top_authors().len(), 3);

        dashboard.apply(brush(2, 4)).unwrap();
        assert_eq!(dashboard.selection(), None);
        assert!(matches!(
            dashboard.hotspots_url("http://localhost:5000", "demo"),
            Err(Error::EmptySelection)
        ));

        dashboard.apply(Transition::Reset).unwrap();
        assert_eq!(dashboard.totals(), Totals { commits: 5, bugs: 2 });
        assert_eq!(dashboard.brush(), None);
        assert_eq!(dashboard.selected_author(), None);
        assert_eq!(dashboard.baseline(), Baseline { insertions: 10, deletions: 0 });
    }

    #[test]
    fn test_selection_and_hotspots() {
        let mut dashboard = Dashboard::build(history(), DashboardConfig::default()).unwrap();
        dashboard.apply(brush(1, 3)).unwrap();

        let (start, end) = dashboard.selection().unwrap();
        assert_eq!(start, at(86400 + 3600));
        assert_eq!(end, at(2 * 86400 + 3600));

        let url = dashboard.hotspots_url("http://localhost:5000", "demo").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/circle_packing/demo?start1=90000&end1=176400"
        );
    }

    #[test]
    fn test_code_frequency_negates_deletions() {
        let dashboard = Dashboard::build(history(), DashboardConfig::default()).unwrap();
        let (insertions, deletions) = dashboard.code_frequency_series();
        assert_eq!(insertions[0].value, 10.0);
        assert_eq!(deletions[3].value, -4.0);
        assert_eq!(dashboard.net_change_series()[1].value, 3.0);
        assert_eq!(dashboard.total_loc_series()[4].value, 14.0);
        assert_eq!(dashboard.lines_by_author()[0], ("x".to_string(), 16));
    }

    #[test]
    fn test_week_binning_override() {
        let config = DashboardConfig {
            binning: Some(Binning::Week),
            ..Default::default()
        };
        let dashboard = Dashboard::build(history(), config).unwrap();
        assert_eq!(dashboard.binning(), Binning::Week);
        // 1970-01-01..05 spans two weeks starting on Sunday
        assert_eq!(dashboard.commits_series().len(), 2);
        assert_eq!(dashboard.bugs_by_day_series().len(), 5);
    }

    #[test]
    fn test_empty_history() {
        let dashboard = Dashboard::build(Vec::new(), DashboardConfig::default()).unwrap();
        assert_eq!(dashboard.totals(), Totals::default());
        assert_eq!(dashboard.baseline(), Baseline::zero());
        assert_eq!(dashboard.selection(), None);
        assert!(dashboard.series(ChartId::Churn).is_empty());
    }

    #[test]
    fn test_quantile_color() {
        assert_eq!(quantile_color(0.0, 10.0), DEFECT_PALETTE[0]);
        assert_eq!(quantile_color(5.0, 10.0), DEFECT_PALETTE[2]);
        assert_eq!(quantile_color(10.0, 10.0), DEFECT_PALETTE[4]);
    }

    struct Collect(Vec<(String, ChartSeries)>);

    impl ViewRenderer for Collect {
        fn render(&mut self, view: &ChartView, series: &ChartSeries) -> Result<()> {
            self.0.push((view.mount_id.clone(), series.clone()));
            Ok(())
        }
    }

    #[test]
    fn test_flush_uses_mount_ids() {
        let mut dashboard = Dashboard::build(history(), DashboardConfig::default()).unwrap();
        let frame = dashboard.apply(Transition::Resize).unwrap();

        let mut renderer = Collect(Vec::new());
        let report = dashboard.flush(&frame, &mut renderer);
        assert!(report.is_ok());
        assert_eq!(renderer.0[0].0, "commits-timeline");
        assert_eq!(renderer.0[1].1, ChartSeries::Number(5.0));
    }
}
