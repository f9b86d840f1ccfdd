//! Dimensional index over commit records
//!
//! A crossfilter-style structure: records are indexed along several
//! dimensions at once, each dimension can hold one filter, and groups keep
//! reduced values per key up to date as filters change.
//!
//! A group observes every filter except the one on its own dimension, so a
//! brushed timeline keeps showing the whole history while every other view
//! narrows to the brushed window. Changing a filter only visits the records
//! whose membership actually changes.

use crate::data::CommitRecord;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;
use tracing::debug;

/// Filter state is one bit per dimension
pub const MAX_DIMENSIONS: usize = 32;

/// Ordered key produced by a dimension
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Int(i64),
    Time(DateTime<Utc>),
    Text(String),
}

impl Key {
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Key::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Key::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(v) => write!(f, "{}", v),
            Key::Time(t) => write!(f, "{}", t.format("%Y-%m-%d")),
            Key::Text(s) => f.write_str(s),
        }
    }
}

impl From<DateTime<Utc>> for Key {
    fn from(value: DateTime<Utc>) -> Self {
        Key::Time(value)
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Text(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Text(value.to_string())
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

/// A filter on one dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Half-open `[lo, hi)`
    Range { lo: Key, hi: Key },
    Exact(Key),
}

impl Filter {
    pub fn contains(&self, key: &Key) -> bool {
        match self {
            Filter::Range { lo, hi } => key >= lo && key < hi,
            Filter::Exact(k) => key == k,
        }
    }
}

/// Handle to a dimension of a [`CommitIndex`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimensionId(usize);

/// Typed handle to a group of a [`CommitIndex`]
pub struct GroupId<R> {
    id: usize,
    _reducer: PhantomData<fn() -> R>,
}

impl<R> Clone for GroupId<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for GroupId<R> {}

impl<R> fmt::Debug for GroupId<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GroupId").field(&self.id).finish()
    }
}

impl<R> PartialEq for GroupId<R> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Associative, invertible aggregation over records.
///
/// `remove` must undo `add`: for any value `p` and record `v`, adding then
/// removing `v` leaves `p` unchanged.
pub trait Reducer: 'static {
    type Value: Clone + fmt::Debug + 'static;

    fn initial(&self) -> Self::Value;
    fn add(&self, value: &mut Self::Value, record: &CommitRecord);
    fn remove(&self, value: &mut Self::Value, record: &CommitRecord);
}

/// Number of records
#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl Reducer for Count {
    type Value = u64;

    fn initial(&self) -> u64 {
        0
    }

    fn add(&self, value: &mut u64, _record: &CommitRecord) {
        *value += 1;
    }

    fn remove(&self, value: &mut u64, _record: &CommitRecord) {
        *value -= 1;
    }
}

/// Sum of a per-record quantity
pub struct Sum<F> {
    accessor: F,
}

impl<F> Sum<F>
where
    F: Fn(&CommitRecord) -> i64 + 'static,
{
    pub fn new(accessor: F) -> Self {
        Self { accessor }
    }
}

impl<F> Reducer for Sum<F>
where
    F: Fn(&CommitRecord) -> i64 + 'static,
{
    type Value = i64;

    fn initial(&self) -> i64 {
        0
    }

    fn add(&self, value: &mut i64, record: &CommitRecord) {
        *value += (self.accessor)(record);
    }

    fn remove(&self, value: &mut i64, record: &CommitRecord) {
        *value -= (self.accessor)(record);
    }
}

/// Summed insertions and deletions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSums {
    pub insertions: u64,
    pub deletions: u64,
}

/// Reducer producing [`ChangeSums`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SumChanges;

impl Reducer for SumChanges {
    type Value = ChangeSums;

    fn initial(&self) -> ChangeSums {
        ChangeSums::default()
    }

    fn add(&self, value: &mut ChangeSums, record: &CommitRecord) {
        value.insertions += record.insertions;
        value.deletions += record.deletions;
    }

    fn remove(&self, value: &mut ChangeSums, record: &CommitRecord) {
        value.insertions -= record.insertions;
        value.deletions -= record.deletions;
    }
}

/// Maximum over a multiset, exact under removal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedMax {
    counts: BTreeMap<u64, u32>,
}

impl OrderedMax {
    pub fn insert(&mut self, value: u64) {
        *self.counts.entry(value).or_insert(0) += 1;
    }

    pub fn remove(&mut self, value: u64) {
        if let Some(count) = self.counts.get_mut(&value) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&value);
            }
        }
    }

    /// Largest value present, zero when empty
    pub fn max(&self) -> u64 {
        self.counts.keys().next_back().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Per-bucket maxima of the running insertion and deletion totals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunningMax {
    pub insertions: OrderedMax,
    pub deletions: OrderedMax,
}

impl RunningMax {
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty()
    }
}

/// Reducer producing [`RunningMax`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxRunningTotals;

impl Reducer for MaxRunningTotals {
    type Value = RunningMax;

    fn initial(&self) -> RunningMax {
        RunningMax::default()
    }

    fn add(&self, value: &mut RunningMax, record: &CommitRecord) {
        value.insertions.insert(record.total_insertions);
        value.deletions.insert(record.total_deletions);
    }

    fn remove(&self, value: &mut RunningMax, record: &CommitRecord) {
        value.insertions.remove(record.total_insertions);
        value.deletions.remove(record.total_deletions);
    }
}

/// Reducer assembled from three closures
pub struct FnReducer<V, A, Rm, I> {
    add: A,
    remove: Rm,
    initial: I,
    _value: PhantomData<fn() -> V>,
}

impl<V, A, Rm, I> Reducer for FnReducer<V, A, Rm, I>
where
    V: Clone + fmt::Debug + 'static,
    A: Fn(&mut V, &CommitRecord) + 'static,
    Rm: Fn(&mut V, &CommitRecord) + 'static,
    I: Fn() -> V + 'static,
{
    type Value = V;

    fn initial(&self) -> V {
        (self.initial)()
    }

    fn add(&self, value: &mut V, record: &CommitRecord) {
        (self.add)(value, record)
    }

    fn remove(&self, value: &mut V, record: &CommitRecord) {
        (self.remove)(value, record)
    }
}

/// Type-erased group storage
trait GroupSlot {
    fn dimension(&self) -> Option<usize>;
    fn add(&mut self, record_idx: usize, record: &CommitRecord);
    fn remove(&mut self, record_idx: usize, record: &CommitRecord);
    fn as_any(&self) -> &dyn Any;
}

struct GroupState<R: Reducer> {
    dimension: Option<usize>,
    reducer: R,
    keys: Vec<Key>,
    values: Vec<R::Value>,
    bucket_of: Vec<usize>,
}

impl<R: Reducer> GroupSlot for GroupState<R> {
    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn add(&mut self, record_idx: usize, record: &CommitRecord) {
        let bucket = self.bucket_of[record_idx];
        self.reducer.add(&mut self.values[bucket], record);
    }

    fn remove(&mut self, record_idx: usize, record: &CommitRecord) {
        let bucket = self.bucket_of[record_idx];
        self.reducer.remove(&mut self.values[bucket], record);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct DimensionState {
    name: String,
    /// Key of every record, by record position
    keys: Vec<Key>,
    /// Record positions sorted by key
    order: Vec<usize>,
    filter: Option<Filter>,
    /// Slice of `order` passing this dimension's filter
    selected: Range<usize>,
}

impl DimensionState {
    fn key_at(&self, pos: usize) -> &Key {
        &self.keys[self.order[pos]]
    }

    fn lower_bound(&self, key: &Key) -> usize {
        let order = &self.order;
        let keys = &self.keys;
        order.partition_point(|&r| keys[r] < *key)
    }

    fn upper_bound(&self, key: &Key) -> usize {
        let order = &self.order;
        let keys = &self.keys;
        order.partition_point(|&r| keys[r] <= *key)
    }

    fn select(&self, filter: &Filter) -> Range<usize> {
        match filter {
            Filter::Range { lo, hi } => self.lower_bound(lo)..self.lower_bound(hi),
            Filter::Exact(key) => self.lower_bound(key)..self.upper_bound(key),
        }
    }
}

/// Crossfilter-style index over an immutable list of commit records
pub struct CommitIndex {
    records: Vec<CommitRecord>,
    /// Bit `d` set when the record fails dimension `d`'s filter
    excluded: Vec<u32>,
    dimensions: Vec<DimensionState>,
    groups: Vec<Box<dyn GroupSlot>>,
}

impl CommitIndex {
    pub fn new(records: Vec<CommitRecord>) -> Self {
        let excluded = vec![0; records.len()];
        Self {
            records,
            excluded,
            dimensions: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn records(&self) -> &[CommitRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a dimension keyed by `key_fn`
    pub fn dimension<F>(&mut self, name: &str, key_fn: F) -> Result<DimensionId>
    where
        F: Fn(&CommitRecord) -> Key,
    {
        if self.dimensions.len() >= MAX_DIMENSIONS {
            return Err(Error::ConfigError(format!(
                "an index supports at most {} dimensions",
                MAX_DIMENSIONS
            )));
        }

        let keys: Vec<Key> = self.records.iter().map(&key_fn).collect();
        let mut order: Vec<usize> = (0..keys.len()).collect();
        // Stable: equal keys keep record order
        order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

        let selected = 0..order.len();
        self.dimensions.push(DimensionState {
            name: name.to_string(),
            keys,
            order,
            filter: None,
            selected,
        });
        Ok(DimensionId(self.dimensions.len() - 1))
    }

    /// Group records by the keys of `dimension`
    pub fn group<R: Reducer>(&mut self, dimension: DimensionId, reducer: R) -> GroupId<R> {
        let dim = &self.dimensions[dimension.0];

        let mut keys: Vec<Key> = Vec::new();
        let mut bucket_of = vec![0; self.records.len()];
        for &record in &dim.order {
            let key = &dim.keys[record];
            if keys.last() != Some(key) {
                keys.push(key.clone());
            }
            bucket_of[record] = keys.len() - 1;
        }

        self.install(Some(dimension.0), reducer, keys, bucket_of)
    }

    /// Group given as add/remove/initial closures
    pub fn group_with<V, A, Rm, I>(
        &mut self,
        dimension: DimensionId,
        add: A,
        remove: Rm,
        initial: I,
    ) -> GroupId<FnReducer<V, A, Rm, I>>
    where
        V: Clone + fmt::Debug + 'static,
        A: Fn(&mut V, &CommitRecord) + 'static,
        Rm: Fn(&mut V, &CommitRecord) + 'static,
        I: Fn() -> V + 'static,
    {
        self.group(
            dimension,
            FnReducer {
                add,
                remove,
                initial,
                _value: PhantomData,
            },
        )
    }

    /// Single-bucket group observing every filter
    pub fn group_all<R: Reducer>(&mut self, reducer: R) -> GroupId<R> {
        let bucket_of = vec![0; self.records.len()];
        self.install(None, reducer, vec![Key::Int(0)], bucket_of)
    }

    fn install<R: Reducer>(
        &mut self,
        dimension: Option<usize>,
        reducer: R,
        keys: Vec<Key>,
        bucket_of: Vec<usize>,
    ) -> GroupId<R> {
        let values = keys.iter().map(|_| reducer.initial()).collect();
        let mut state = GroupState {
            dimension,
            reducer,
            keys,
            values,
            bucket_of,
        };

        let ignore = dimension.map_or(0, |d| 1u32 << d);
        for (idx, record) in self.records.iter().enumerate() {
            if self.excluded[idx] & !ignore == 0 {
                state.add(idx, record);
            }
        }

        self.groups.push(Box::new(state));
        GroupId {
            id: self.groups.len() - 1,
            _reducer: PhantomData,
        }
    }

    /// Restrict `dimension` to `[lo, hi)`, replacing any previous filter
    pub fn filter_range(&mut self, dimension: DimensionId, lo: Key, hi: Key) -> Result<()> {
        if hi < lo {
            return Err(Error::InvalidRange(format!("{} > {}", lo, hi)));
        }
        self.set_filter(dimension, Some(Filter::Range { lo, hi }));
        Ok(())
    }

    /// Restrict `dimension` to one key, replacing any previous filter
    pub fn filter_exact(&mut self, dimension: DimensionId, key: Key) {
        self.set_filter(dimension, Some(Filter::Exact(key)));
    }

    /// Apply an already-built filter, `None` clears
    pub fn filter(&mut self, dimension: DimensionId, filter: Option<Filter>) -> Result<()> {
        match filter {
            Some(Filter::Range { lo, hi }) => self.filter_range(dimension, lo, hi),
            other => {
                self.set_filter(dimension, other);
                Ok(())
            }
        }
    }

    /// Remove the filter on `dimension`
    pub fn filter_all(&mut self, dimension: DimensionId) {
        self.set_filter(dimension, None);
    }

    /// Remove every filter
    pub fn clear_all_filters(&mut self) {
        for d in 0..self.dimensions.len() {
            self.set_filter(DimensionId(d), None);
        }
    }

    pub fn current_filter(&self, dimension: DimensionId) -> Option<&Filter> {
        self.dimensions[dimension.0].filter.as_ref()
    }

    fn set_filter(&mut self, dimension: DimensionId, filter: Option<Filter>) {
        let dim = &self.dimensions[dimension.0];
        let old = dim.selected.clone();
        let new = match &filter {
            Some(f) => dim.select(f),
            None => 0..dim.order.len(),
        };

        let leaving: Vec<usize> = difference(&old, &new).map(|p| dim.order[p]).collect();
        let entering: Vec<usize> = difference(&new, &old).map(|p| dim.order[p]).collect();

        debug!(
            target: "index",
            dimension = %dim.name,
            leaving = leaving.len(),
            entering = entering.len(),
            "filter changed"
        );

        let dim = &mut self.dimensions[dimension.0];
        dim.filter = filter;
        dim.selected = new;

        let bit = 1u32 << dimension.0;
        for record in leaving {
            self.toggle(record, bit, true);
        }
        for record in entering {
            self.toggle(record, bit, false);
        }
    }

    fn toggle(&mut self, record: usize, bit: u32, exclude: bool) {
        let before = self.excluded[record];
        let after = if exclude { before | bit } else { before & !bit };
        if before == after {
            return;
        }
        self.excluded[record] = after;

        let data = &self.records[record];
        for group in self.groups.iter_mut() {
            let ignore = group.dimension().map_or(0, |d| 1u32 << d);
            let was_in = before & !ignore == 0;
            let now_in = after & !ignore == 0;
            if was_in && !now_in {
                group.remove(record, data);
            } else if !was_in && now_in {
                group.add(record, data);
            }
        }
    }

    /// Whether a record passes every active filter
    pub fn is_active(&self, record: usize) -> bool {
        self.excluded[record] == 0
    }

    /// Number of records passing every active filter
    pub fn active_count(&self) -> usize {
        self.excluded.iter().filter(|&&m| m == 0).count()
    }

    /// Up to `k` active records with the smallest keys on `dimension`
    pub fn bottom(&self, dimension: DimensionId, k: usize) -> Vec<&CommitRecord> {
        let dim = &self.dimensions[dimension.0];
        dim.order[dim.selected.clone()]
            .iter()
            .filter(|&&r| self.excluded[r] == 0)
            .take(k)
            .map(|&r| &self.records[r])
            .collect()
    }

    /// Up to `k` active records with the largest keys on `dimension`
    pub fn top_records(&self, dimension: DimensionId, k: usize) -> Vec<&CommitRecord> {
        let dim = &self.dimensions[dimension.0];
        dim.order[dim.selected.clone()]
            .iter()
            .rev()
            .filter(|&&r| self.excluded[r] == 0)
            .take(k)
            .map(|&r| &self.records[r])
            .collect()
    }

    /// Smallest and largest key present on `dimension`, ignoring filters
    pub fn key_extent(&self, dimension: DimensionId) -> Option<(&Key, &Key)> {
        let dim = &self.dimensions[dimension.0];
        if dim.order.is_empty() {
            return None;
        }
        Some((dim.key_at(0), dim.key_at(dim.order.len() - 1)))
    }

    /// Every bucket of `group`, ascending by key
    pub fn all<R: Reducer>(&self, group: GroupId<R>) -> Vec<(&Key, &R::Value)> {
        let state = self.state(group);
        state.keys.iter().zip(state.values.iter()).collect()
    }

    /// Value of the first bucket, meant for [`CommitIndex::group_all`] groups
    pub fn value<R: Reducer>(&self, group: GroupId<R>) -> &R::Value {
        &self.state(group).values[0]
    }

    /// Up to `k` buckets with the largest `rank`, ties by ascending key
    pub fn top<R, F, O>(&self, group: GroupId<R>, k: usize, rank: F) -> Vec<(&Key, &R::Value)>
    where
        R: Reducer,
        F: Fn(&R::Value) -> O,
        O: Ord,
    {
        let mut entries = self.all(group);
        entries.sort_by(|a, b| rank(b.1).cmp(&rank(a.1)).then_with(|| a.0.cmp(b.0)));
        entries.truncate(k);
        entries
    }

    /// # Panics
    ///
    /// Panics when `group` was created by a different index.
    fn state<R: Reducer>(&self, group: GroupId<R>) -> &GroupState<R> {
        match self
            .groups
            .get(group.id)
            .and_then(|slot| slot.as_any().downcast_ref::<GroupState<R>>())
        {
            Some(state) => state,
            None => panic!("group handle {} does not belong to this index", group.id),
        }
    }
}

/// Positions in `a` that are not in `b`
fn difference<'a>(a: &'a Range<usize>, b: &'a Range<usize>) -> impl Iterator<Item = usize> + 'a {
    let head = a.start..a.end.min(b.start);
    let tail = a.start.max(b.end)..a.end;
    head.chain(tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn record(day: i64, author: &str, ins: u64, del: u64, bug: bool) -> CommitRecord {
        CommitRecord {
            date: Utc.timestamp_opt(day * 86400, 0).unwrap(),
            author: author.to_string(),
            insertions: ins,
            deletions: del,
            total_insertions: 0,
            total_deletions: 0,
            bug,
        }
    }

    fn sample() -> Vec<CommitRecord> {
        vec![
            record(0, "alice", 10, 0, false),
            record(1, "bob", 5, 2, true),
            record(1, "alice", 1, 1, false),
            record(2, "carol", 0, 4, true),
            record(3, "bob", 7, 3, false),
        ]
    }

    fn day_key(r: &CommitRecord) -> Key {
        Key::Int(r.date.timestamp() / 86400)
    }

    #[test]
    fn test_group_by_day() {
        let mut index = CommitIndex::new(sample());
        let day = index.dimension("day", day_key).unwrap();
        let commits = index.group(day, Count);

        let all: Vec<(Key, u64)> = index
            .all(commits)
            .into_iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        assert_eq!(
            all,
            vec![(Key::Int(0), 1), (Key::Int(1), 2), (Key::Int(2), 1), (Key::Int(3), 1)]
        );
    }

    #[test]
    fn test_group_ignores_own_filter() {
        let mut index = CommitIndex::new(sample());
        let day = index.dimension("day", day_key).unwrap();
        let author = index.dimension("author", |r| Key::from(r.author.as_str())).unwrap();
        let by_day = index.group(day, Count);
        let by_author = index.group(author, Count);
        let total = index.group_all(Count);

        index.filter_range(day, Key::Int(1), Key::Int(3)).unwrap();

        // Day group still sees every day
        assert_eq!(index.all(by_day).iter().map(|(_, v)| **v).sum::<u64>(), 5);
        // Author group narrows to days 1 and 2
        let authors: Vec<(String, u64)> = index
            .all(by_author)
            .into_iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        assert_eq!(
            authors,
            vec![
                ("alice".to_string(), 1),
                ("bob".to_string(), 1),
                ("carol".to_string(), 1)
            ]
        );
        assert_eq!(*index.value(total), 3);
    }

    #[test]
    fn test_filter_exact_and_replace() {
        let mut index = CommitIndex::new(sample());
        let author = index.dimension("author", |r| Key::from(r.author.as_str())).unwrap();
        let total = index.group_all(Count);
        let bugs = index.group_all(Sum::new(|r: &CommitRecord| r.bug as i64));

        index.filter_exact(author, Key::from("bob"));
        assert_eq!(*index.value(total), 2);
        assert_eq!(*index.value(bugs), 1);

        // A second filter replaces the first
        index.filter_exact(author, Key::from("carol"));
        assert_eq!(*index.value(total), 1);
        assert_eq!(*index.value(bugs), 1);

        index.filter_all(author);
        assert_eq!(*index.value(total), 5);
        assert_eq!(*index.value(bugs), 2);
    }

    #[test]
    fn test_bottom_and_top_records() {
        let mut index = CommitIndex::new(sample());
        let day = index.dimension("day", day_key).unwrap();
        let author = index.dimension("author", |r| Key::from(r.author.as_str())).unwrap();

        index.filter_exact(author, Key::from("bob"));
        assert_eq!(index.bottom(day, 1)[0].insertions, 5);
        assert_eq!(index.top_records(day, 1)[0].insertions, 7);

        index.filter_exact(author, Key::from("nobody"));
        assert!(index.bottom(day, 1).is_empty());
        assert!(index.top_records(day, 1).is_empty());
        assert_eq!(index.active_count(), 0);
    }

    #[test]
    fn test_exact_max_survives_removal() {
        let mut records = sample();
        for (i, r) in records.iter_mut().enumerate() {
            r.total_insertions = (i as u64 + 1) * 10;
            r.total_deletions = i as u64;
        }
        let mut index = CommitIndex::new(records);
        let author = index.dimension("author", |r| Key::from(r.author.as_str())).unwrap();
        let day = index.dimension("day", day_key).unwrap();
        let maxima = index.group(day, MaxRunningTotals);

        let day_one = |index: &CommitIndex| {
            index
                .all(maxima)
                .into_iter()
                .find(|(k, _)| **k == Key::Int(1))
                .map(|(_, v)| (v.insertions.max(), v.deletions.max()))
                .unwrap()
        };

        assert_eq!(day_one(&index), (30, 2));
        // Removing alice's record (the day maximum) falls back to bob's
        index.filter_exact(author, Key::from("bob"));
        assert_eq!(day_one(&index), (20, 1));
        index.filter_all(author);
        assert_eq!(day_one(&index), (30, 2));
    }

    #[test]
    fn test_group_with_closures() {
        let mut index = CommitIndex::new(sample());
        let day = index.dimension("day", day_key).unwrap();
        let author = index.dimension("author", |r| Key::from(r.author.as_str())).unwrap();
        let net = index.group_with(
            day,
            |v: &mut i64, r: &CommitRecord| *v += r.net_change(),
            |v: &mut i64, r: &CommitRecord| *v -= r.net_change(),
            || 0i64,
        );

        index.filter_exact(author, Key::from("alice"));
        let values: Vec<i64> = index.all(net).into_iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![10, 0, 0, 0]);
    }

    #[test]
    fn test_top_groups() {
        let mut index = CommitIndex::new(sample());
        let author = index.dimension("author", |r| Key::from(r.author.as_str())).unwrap();
        let commits = index.group(author, Count);

        let top: Vec<(String, u64)> = index
            .top(commits, 2, |v| *v)
            .into_iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        assert_eq!(top, vec![("alice".to_string(), 2), ("bob".to_string(), 2)]);
    }

    #[test]
    fn test_invalid_range() {
        let mut index = CommitIndex::new(sample());
        let day = index.dimension("day", day_key).unwrap();
        assert!(index.filter_range(day, Key::Int(3), Key::Int(1)).is_err());
        assert_eq!(index.current_filter(day), None);
    }

    #[test]
    fn test_dimension_limit() {
        let mut index = CommitIndex::new(sample());
        for i in 0..MAX_DIMENSIONS {
            index.dimension(&format!("d{}", i), day_key).unwrap();
        }
        assert!(index.dimension("overflow", day_key).is_err());
    }

    #[test]
    fn test_difference() {
        assert_eq!(difference(&(0..5), &(2..4)).collect::<Vec<_>>(), vec![0, 1, 4]);
        assert_eq!(difference(&(2..4), &(0..5)).count(), 0);
        assert_eq!(difference(&(0..3), &(5..7)).collect::<Vec<_>>(), vec![0, 1, 2]);
    }
}
