//! Churned-over-deleted ratio against a moving baseline

use crate::data::CommitRecord;
use crate::index::{Key, RunningMax};
use tracing::warn;

/// Running totals of the earliest record in the active subset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Baseline {
    pub insertions: u64,
    pub deletions: u64,
}

impl Baseline {
    /// Baseline of an empty subset
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_record(record: &CommitRecord) -> Self {
        Self {
            insertions: record.total_insertions,
            deletions: record.total_deletions,
        }
    }

    /// Baseline from the earliest record, or zero when there is none
    pub fn from_earliest(record: Option<&CommitRecord>) -> Self {
        record.map(Self::from_record).unwrap_or_default()
    }
}

/// Churn ratio of one bucket: `(dI + dD) / dD` over the deltas from `baseline`.
///
/// When both deltas are zero the raw maxima are used instead, and a zero
/// deletion delta is replaced by one. A bucket whose maxima sit below the
/// baseline yields NaN.
pub fn churn_ratio(max: &RunningMax, baseline: Baseline) -> f64 {
    let ins_max = max.insertions.max() as f64;
    let del_max = max.deletions.max() as f64;

    let mut d_ins = ins_max - baseline.insertions as f64;
    let mut d_del = del_max - baseline.deletions as f64;
    if d_ins < 0.0 || d_del < 0.0 {
        return f64::NAN;
    }

    if d_ins == 0.0 && d_del == 0.0 {
        d_ins = ins_max;
        d_del = del_max;
    }
    if d_del == 0.0 {
        d_del = 1.0;
    }

    (d_ins + d_del) / d_del
}

/// Churn ratio of every non-empty bucket, dropping invalid points
pub fn churn_series<'a, I>(buckets: I, baseline: Baseline) -> Vec<(Key, f64)>
where
    I: IntoIterator<Item = (&'a Key, &'a RunningMax)>,
{
    buckets
        .into_iter()
        .filter(|(_, max)| !max.is_empty())
        .filter_map(|(key, max)| {
            let ratio = churn_ratio(max, baseline);
            if ratio.is_nan() || ratio < 0.0 {
                warn!(
                    target: "churn",
                    bucket = %key,
                    ratio,
                    baseline_insertions = baseline.insertions,
                    baseline_deletions = baseline.deletions,
                    "invalid churn ratio, baseline tracking is off"
                );
                None
            } else {
                Some((key.clone(), ratio))
            }
        })
        .collect()
}

/// Total lines of code of a bucket
pub fn total_loc(max: &RunningMax) -> i64 {
    max.insertions.max() as i64 - max.deletions.max() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn maxima(ins: &[u64], del: &[u64]) -> RunningMax {
        let mut max = RunningMax::default();
        for &v in ins {
            max.insertions.insert(v);
        }
        for &v in del {
            max.deletions.insert(v);
        }
        max
    }

    #[test]
    fn test_ratio_against_baseline() {
        let max = maxima(&[30], &[10]);
        let baseline = Baseline {
            insertions: 10,
            deletions: 5,
        };
        // dI = 20, dD = 5
        assert_eq!(churn_ratio(&max, baseline), 5.0);
    }

    #[test]
    fn test_ratio_zero_deltas_use_raw_maxima() {
        let max = maxima(&[12], &[4]);
        let baseline = Baseline {
            insertions: 12,
            deletions: 4,
        };
        assert_eq!(churn_ratio(&max, baseline), 4.0);
    }

    #[test]
    fn test_ratio_zero_denominator() {
        let max = maxima(&[8], &[3]);
        let baseline = Baseline {
            insertions: 2,
            deletions: 3,
        };
        assert_eq!(churn_ratio(&max, baseline), 7.0);

        // Raw fallback with no deletions at all
        assert_eq!(churn_ratio(&maxima(&[5], &[0]), Baseline::zero()), 6.0);
    }

    #[test]
    fn test_series_drops_invalid_and_empty() {
        let good = maxima(&[30], &[10]);
        let stale = maxima(&[1], &[1]);
        let empty = RunningMax::default();
        let keys = [Key::Int(0), Key::Int(1), Key::Int(2)];
        let baseline = Baseline {
            insertions: 10,
            deletions: 5,
        };

        let series = churn_series(
            vec![(&keys[0], &good), (&keys[1], &stale), (&keys[2], &empty)],
            baseline,
        );
        assert_eq!(series, vec![(Key::Int(0), 5.0)]);
    }

    #[test]
    fn test_ratio_below_baseline_is_nan() {
        let baseline = Baseline {
            insertions: 18,
            deletions: 5,
        };
        // Both deltas negative would otherwise divide out to a positive 2
        assert!(churn_ratio(&maxima(&[15], &[2]), baseline).is_nan());
        assert!(churn_ratio(&maxima(&[30], &[4]), baseline).is_nan());

        let keys = [Key::Int(0), Key::Int(1)];
        let behind = maxima(&[15], &[2]);
        let ahead = maxima(&[24], &[10]);
        let series = churn_series(vec![(&keys[0], &behind), (&keys[1], &ahead)], baseline);
        assert_eq!(series, vec![(Key::Int(1), 11.0 / 5.0)]);
    }

    #[test]
    fn test_baseline_from_earliest() {
        assert_eq!(Baseline::from_earliest(None), Baseline::zero());
        assert_eq!(total_loc(&maxima(&[30, 20], &[10])), 20);
    }
}
