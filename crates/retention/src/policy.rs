//! Retention policy evaluation

use crate::buckets::{days_ago, prune_by_bucket, BucketKey, Disposition};
use crate::RetentionPolicyType;
use chrono::{DateTime, Utc};
use snap_core::SnapshotId;
use std::fmt;

/// Days after today that GFS keeps one snapshot per day
pub const GFS_DAILY_DAYS: i64 = 7;

/// Weeks after the daily window that GFS keeps one snapshot per week
pub const GFS_WEEKLY_WEEKS: i64 = 4;

/// A configured retention policy
///
/// Evaluation is a pure function of the snapshot list and the evaluation
/// instant, so running it twice on the same input gives the same answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Keep the `count` most recent snapshots
    Fixed { count: u32 },
    /// Keep all of today's snapshots and the newest of each of the previous `days` days
    Daily { days: u32 },
    /// Today: all. Previous week: newest per day. Four weeks before that:
    /// newest per ISO week. Older: newest per calendar month.
    Gfs,
}

impl RetentionPolicy {
    pub fn policy_type(&self) -> RetentionPolicyType {
        match self {
            RetentionPolicy::Fixed { .. } => RetentionPolicyType::Fixed,
            RetentionPolicy::Daily { .. } => RetentionPolicyType::Daily,
            RetentionPolicy::Gfs => RetentionPolicyType::Gfs,
        }
    }

    /// Parameter values in schema order
    pub fn params(&self) -> Vec<(&'static str, u32)> {
        match self {
            RetentionPolicy::Fixed { count } => vec![("count", *count)],
            RetentionPolicy::Daily { days } => vec![("days", *days)],
            RetentionPolicy::Gfs => Vec::new(),
        }
    }

    /// Select the snapshots to delete
    ///
    /// `snapshots` should be the history of one world. Input order does not
    /// matter; the result is oldest first and never contains the newest
    /// snapshot.
    pub fn snapshots_to_prune(&self, snapshots: &[SnapshotId], now: DateTime<Utc>) -> Vec<SnapshotId> {
        let mut sorted = snapshots.to_vec();
        sorted.sort();
        sorted.dedup();

        match *self {
            RetentionPolicy::Fixed { count } => {
                let excess = sorted.len().saturating_sub(count.max(1) as usize);
                sorted.truncate(excess);
                sorted
            }
            RetentionPolicy::Daily { days } => prune_by_bucket(&sorted, |ts| {
                match days_ago(ts, now) {
                    0 => Disposition::Keep,
                    n if n <= i64::from(days) => Disposition::Bucket(BucketKey::day(ts)),
                    _ => Disposition::Expired,
                }
            }),
            RetentionPolicy::Gfs => prune_by_bucket(&sorted, |ts| {
                match days_ago(ts, now) {
                    0 => Disposition::Keep,
                    n if n <= GFS_DAILY_DAYS => Disposition::Bucket(BucketKey::day(ts)),
                    n if n <= GFS_DAILY_DAYS + GFS_WEEKLY_WEEKS * 7 => {
                        Disposition::Bucket(BucketKey::week(ts))
                    }
                    _ => Disposition::Bucket(BucketKey::month(ts)),
                }
            }),
        }
    }

    /// Human readable summary
    pub fn describe(&self) -> String {
        match self {
            RetentionPolicy::Fixed { count } => format!("keep the {} most recent snapshots", count),
            RetentionPolicy::Daily { days } => {
                format!("keep today's snapshots and one per day for {} days", days)
            }
            RetentionPolicy::Gfs => self.policy_type().description().to_lowercase(),
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.policy_type().key())?;
        for (name, value) in self.params() {
            write!(f, " {}={}", name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn hourly(world: Uuid, count: i64, end: DateTime<Utc>) -> Vec<SnapshotId> {
        (0..count)
            .map(|i| SnapshotId::at(world, end - Duration::hours(count - 1 - i)))
            .collect()
    }

    #[test]
    fn test_fixed_keeps_most_recent() {
        let world = Uuid::new_v4();
        for history_len in 0..8i64 {
            let snapshots = hourly(world, history_len, now());
            for count in 1..6u32 {
                let policy = RetentionPolicy::Fixed { count };
                let prune = policy.snapshots_to_prune(&snapshots, now());
                let expected = (history_len as usize).saturating_sub(count as usize);
                assert_eq!(prune.len(), expected, "H={} N={}", history_len, count);
                assert_eq!(prune, snapshots[..expected].to_vec());
            }
        }
    }

    #[test]
    fn test_fixed_ignores_input_order() {
        let world = Uuid::new_v4();
        let snapshots = hourly(world, 5, now());
        let mut shuffled = snapshots.clone();
        shuffled.reverse();
        shuffled.swap(1, 3);

        let policy = RetentionPolicy::Fixed { count: 3 };
        assert_eq!(
            policy.snapshots_to_prune(&shuffled, now()),
            policy.snapshots_to_prune(&snapshots, now())
        );
        assert_eq!(policy.snapshots_to_prune(&snapshots, now()), snapshots[..2].to_vec());
    }

    #[test]
    fn test_fixed_counts_named_snapshots() {
        let world = Uuid::new_v4();
        let snapshots: Vec<_> = ["s1", "s2", "s3", "s4", "s5"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                SnapshotId::new(world, *name)
                    .unwrap()
                    .with_created_at(Some(now() - Duration::days(5 - i as i64)))
            })
            .collect();
        let prune = RetentionPolicy::Fixed { count: 3 }.snapshots_to_prune(&snapshots, now());
        let names: Vec<_> = prune.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["s1", "s2"]);
    }

    #[test]
    fn test_daily() {
        let world = Uuid::new_v4();
        let at = |d: u32, h: u32| SnapshotId::at(world, Utc.with_ymd_and_hms(2024, 6, d, h, 0, 0).unwrap());

        let today_early = at(15, 1);
        let today_late = at(15, 9);
        let yesterday_early = at(14, 3);
        let yesterday_late = at(14, 20);
        let two_days = at(13, 10);
        let four_days = at(11, 10);

        let snapshots = vec![
            four_days.clone(),
            two_days.clone(),
            yesterday_early.clone(),
            yesterday_late.clone(),
            today_early.clone(),
            today_late.clone(),
        ];

        let prune = RetentionPolicy::Daily { days: 2 }.snapshots_to_prune(&snapshots, now());
        assert_eq!(prune, vec![four_days, yesterday_early]);
    }

    #[test]
    fn test_daily_keeps_newest_even_when_expired() {
        let world = Uuid::new_v4();
        let ancient = SnapshotId::at(world, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let prune = RetentionPolicy::Daily { days: 1 }.snapshots_to_prune(&[ancient], now());
        assert!(prune.is_empty());
    }

    #[test]
    fn test_gfs() {
        let world = Uuid::new_v4();
        let days_back = |d: i64, h: u32| {
            let day = now().date_naive() - Duration::days(d);
            SnapshotId::at(world, Utc.from_utc_datetime(&day.and_hms_opt(h, 0, 0).unwrap()))
        };

        // Two per day for 120 days, including today
        let mut snapshots = Vec::new();
        for d in (0..120).rev() {
            snapshots.push(days_back(d, 6));
            snapshots.push(days_back(d, 18));
        }

        let policy = RetentionPolicy::Gfs;
        let prune = policy.snapshots_to_prune(&snapshots, now());
        let kept: Vec<_> = snapshots.iter().filter(|s| !prune.contains(s)).cloned().collect();

        // Today is fully kept
        assert!(kept.contains(&days_back(0, 6)) && kept.contains(&days_back(0, 18)));
        // Daily window keeps only the evening snapshot
        for d in 1..=GFS_DAILY_DAYS {
            assert!(kept.contains(&days_back(d, 18)));
            assert!(!kept.contains(&days_back(d, 6)));
        }
        // At most one per ISO week in the weekly window
        let weekly: Vec<_> = kept
            .iter()
            .filter(|s| {
                let ago = days_ago(s.created_at().unwrap(), now());
                ago > GFS_DAILY_DAYS && ago <= GFS_DAILY_DAYS + GFS_WEEKLY_WEEKS * 7
            })
            .collect();
        let mut weeks: Vec<_> = weekly.iter().map(|s| BucketKey::week(s.created_at().unwrap())).collect();
        weeks.dedup();
        assert_eq!(weeks.len(), weekly.len());
        // The oldest month still has a representative
        assert!(kept.iter().any(|s| s.created_at().unwrap() < now() - Duration::days(100)));

        // Deterministic
        assert_eq!(policy.snapshots_to_prune(&snapshots, now()), prune);
    }

    #[test]
    fn test_display() {
        assert_eq!(RetentionPolicy::Fixed { count: 10 }.to_string(), "fixed count=10");
        assert_eq!(RetentionPolicy::Daily { days: 7 }.to_string(), "daily days=7");
        assert_eq!(RetentionPolicy::Gfs.to_string(), "gfs");
    }
}
