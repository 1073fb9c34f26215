//! Time bucketing shared by the calendar-based policies

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use snap_core::SnapshotId;
use std::collections::HashSet;

/// Calendar bucket a snapshot falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKey {
    Day(NaiveDate),
    /// ISO year and week
    Week(i32, u32),
    /// Year and month
    Month(i32, u32),
}

impl BucketKey {
    pub fn day(ts: DateTime<Utc>) -> Self {
        BucketKey::Day(ts.date_naive())
    }

    pub fn week(ts: DateTime<Utc>) -> Self {
        let week = ts.iso_week();
        BucketKey::Week(week.year(), week.week())
    }

    pub fn month(ts: DateTime<Utc>) -> Self {
        BucketKey::Month(ts.year(), ts.month())
    }
}

/// What a policy wants done with a snapshot of a given age
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Always retained
    Keep,
    /// Retained only if it is the newest snapshot in its bucket
    Bucket(BucketKey),
    /// Past every retention window
    Expired,
}

/// Whole UTC days between `ts` and `now`, 0 for today or later
pub fn days_ago(ts: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now.date_naive() - ts.date_naive()).num_days().max(0)
}

/// Select snapshots to prune by keeping the newest snapshot per bucket
///
/// `snapshots` must be sorted oldest first. Undated snapshots and the newest
/// snapshot are never selected. The result is oldest first.
pub fn prune_by_bucket<F>(snapshots: &[SnapshotId], classify: F) -> Vec<SnapshotId>
where
    F: Fn(DateTime<Utc>) -> Disposition,
{
    let mut seen: HashSet<BucketKey> = HashSet::new();
    let mut prune = Vec::new();

    for (index, sid) in snapshots.iter().enumerate().rev() {
        let Some(created_at) = sid.created_at() else {
            continue;
        };
        if index == snapshots.len() - 1 {
            if let Disposition::Bucket(key) = classify(created_at) {
                seen.insert(key);
            }
            continue;
        }

        match classify(created_at) {
            Disposition::Keep => {}
            Disposition::Bucket(key) => {
                if !seen.insert(key) {
                    prune.push(sid.clone());
                }
            }
            Disposition::Expired => prune.push(sid.clone()),
        }
    }

    prune.reverse();
    prune
}
