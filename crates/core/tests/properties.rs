use chrono::{Duration, TimeZone, Utc};
use codemd_core::index::{Count, Filter, Key};
use codemd_core::labels::fit_label;
use codemd_core::{
    pack_by_loc, ChartId, ChartSeries, CommitIndex, CommitRecord, Dashboard, DashboardConfig,
    HierarchyNode, PackConfig, TimeRange, Transition,
};
use proptest::prelude::*;

fn records_from(changes: &[(i64, String, u64, u64, bool)]) -> Vec<CommitRecord> {
    let origin = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let mut offsets: Vec<&(i64, String, u64, u64, bool)> = changes.iter().collect();
    offsets.sort_by_key(|c| c.0);

    let (mut total_ins, mut total_del) = (0, 0);
    offsets
        .into_iter()
        .map(|(hours, author, ins, del, bug)| {
            total_ins += ins;
            total_del += del;
            CommitRecord {
                date: origin + Duration::hours(*hours),
                author: author.clone(),
                insertions: *ins,
                deletions: *del,
                total_insertions: total_ins,
                total_deletions: total_del,
                bug: *bug,
            }
        })
        .collect()
}

fn change() -> impl Strategy<Value = (i64, String, u64, u64, bool)> {
    (
        0i64..24 * 60,
        prop::sample::select(vec!["ann", "bob", "cat"]).prop_map(str::to_string),
        0u64..200,
        0u64..200,
        any::<bool>(),
    )
}

fn tree() -> impl Strategy<Value = HierarchyNode> {
    (
        prop::collection::vec(prop::collection::vec(1u64..5000, 0..5), 1..3),
        prop::collection::vec(1u64..5000, 0..2),
    )
        .prop_map(|(dirs, files)| {
            let mut children: Vec<HierarchyNode> = dirs
                .into_iter()
                .enumerate()
                .map(|(d, locs)| {
                    HierarchyNode::directory(
                        format!("dir{}", d),
                        locs.into_iter()
                            .enumerate()
                            .map(|(f, loc)| HierarchyNode::file(format!("f{}.rs", f), loc))
                            .collect(),
                    )
                })
                .collect();
            children.extend(
                files
                    .into_iter()
                    .enumerate()
                    .map(|(f, loc)| HierarchyNode::file(format!("top{}.rs", f), loc)),
            );
            HierarchyNode::directory("root", children)
        })
}

proptest! {
    #[test]
    fn filtered_totals_match_a_scan(
        changes in prop::collection::vec(change(), 0..60),
        lo in 0i64..60,
        width in 0i64..60,
    ) {
        let records = records_from(&changes);
        let mut index = CommitIndex::new(records.clone());
        let day = index.dimension("day", |r| Key::Int(r.date.timestamp() / 86_400)).unwrap();
        let author = index.dimension("author", |r| Key::Text(r.author.clone())).unwrap();
        let total = index.group_all(Count);
        let by_author = index.group(author, Count);
        let unfiltered: Vec<u64> = index.all(by_author).into_iter().map(|(_, v)| *v).collect();

        // 2020-01-01 as days since the epoch
        let (lo, hi) = (18_262 + lo, 18_262 + lo + width);
        index.filter_range(day, Key::Int(lo), Key::Int(hi)).unwrap();
        let expected = records
            .iter()
            .filter(|r| {
                let d = r.date.timestamp() / 86_400;
                d >= lo && d < hi
            })
            .count() as u64;
        prop_assert_eq!(*index.value(total), expected);

        // Same filter twice is a no-op
        index.filter(day, Some(Filter::Range { lo: Key::Int(lo), hi: Key::Int(hi) })).unwrap();
        prop_assert_eq!(*index.value(total), expected);

        // A group ignores its own dimension's filter
        index.filter_exact(author, Key::from("ann"));
        let ann_in_window = records
            .iter()
            .filter(|r| {
                let d = r.date.timestamp() / 86_400;
                r.author == "ann" && d >= lo && d < hi
            })
            .count() as u64;
        prop_assert_eq!(*index.value(total), ann_in_window);
        let window_by_author: u64 = index.all(by_author).into_iter().map(|(_, v)| *v).sum();
        prop_assert_eq!(window_by_author, expected);

        index.clear_all_filters();
        prop_assert_eq!(*index.value(total), records.len() as u64);
        let restored: Vec<u64> = index.all(by_author).into_iter().map(|(_, v)| *v).collect();
        prop_assert_eq!(restored, unfiltered);
    }

    #[test]
    fn churn_is_never_negative(
        changes in prop::collection::vec(change(), 1..60),
        start in 0i64..24 * 60,
        width in 0i64..24 * 60,
    ) {
        let records = records_from(&changes);
        let mut dashboard = Dashboard::build(records.clone(), DashboardConfig::default()).unwrap();

        // Unbrushed, the earliest record bounds every bucket from below
        let buckets = dashboard.commits_series().into_iter().filter(|p| p.value > 0.0).count();
        let churn = dashboard.churn_series();
        prop_assert_eq!(churn.len(), buckets);
        prop_assert!(churn.iter().all(|p| p.value >= 1.0));

        let origin = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let range = TimeRange::new(
            origin + Duration::hours(start),
            origin + Duration::hours(start + width),
        )
        .unwrap();
        dashboard.apply(Transition::Brush(range)).unwrap();
        let churn = dashboard.churn_series();
        prop_assert!(churn.iter().all(|p| p.value.is_finite() && p.value >= 0.0));

        // One point per active bucket, keyed inside the half-open brush
        let binning = dashboard.binning();
        let mut active: Vec<_> = records
            .iter()
            .map(|r| binning.floor(r.date))
            .filter(|key| *key >= range.start && *key < range.end)
            .collect();
        active.dedup();
        let dates: Vec<_> = churn.iter().map(|p| p.date).collect();
        prop_assert_eq!(dates, active);

        for chart in [ChartId::TotalLoc, ChartId::Defects] {
            if let ChartSeries::Line(points) = dashboard.series(chart) {
                prop_assert!(points.iter().all(|p| p.date >= range.start && p.date < range.end));
            }
        }
    }

    #[test]
    fn packed_circles_nest_without_overlap(root in tree(), diameter in 100.0f64..2000.0) {
        let config = PackConfig { diameter, ..PackConfig::default() };
        let packed = pack_by_loc(&root, &config);
        let tolerance = 1e-6 * diameter;

        for id in packed.ids() {
            let node = packed.node(id);
            prop_assert!(node.r > 0.0);
            if let Some(parent) = node.parent {
                let p = packed.node(parent);
                let distance = (node.x - p.x).hypot(node.y - p.y);
                prop_assert!(distance + node.r <= p.r + tolerance);
            }
            for (i, a) in node.children.iter().enumerate() {
                for b in &node.children[i + 1..] {
                    let (a, b) = (packed.node(*a), packed.node(*b));
                    let distance = (a.x - b.x).hypot(a.y - b.y);
                    prop_assert!(distance + tolerance >= a.r + b.r);
                }
            }
        }
    }

    #[test]
    fn truncation_is_bounded(name in "[a-z_.]{1,40}", r in 21.0f64..120.0) {
        let measure = |text: &str| text.chars().count() as f64 * 7.0;
        let fitted = fit_label(&name, r, 1.0, true, &measure);
        let len = name.chars().count();

        prop_assert!(fitted.visible);
        prop_assert!(fitted.steps <= len.div_ceil(3));
        prop_assert!(fitted.text.is_empty() || measure(&fitted.text) <= std::f64::consts::PI * r / 2.0);
    }
}
