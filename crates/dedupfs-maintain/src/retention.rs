//! Generation-based snapshot retention (grandfather-father-son rotation).
//!
//! Classifies a set of snapshot timestamps into keep/remove sets under
//! daily/weekly/monthly/yearly limits, anchored at the most recent
//! timestamp in the set. Pure and stateless aside from the configured
//! limits: no I/O, no locking, no failure modes beyond configuration,
//! which the typed policy makes unrepresentable.
//!
//! Tie-breaks inside a bucket are asymmetric on purpose: week and month
//! buckets keep their *oldest* member while year buckets keep their
//! *newest*. This mirrors the rotation policy the store has always
//! shipped with and must not be unified.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Retention limits per generation. A snapshot is kept when any of the
/// four generation checks passes for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Number of most-recent days whose snapshots are all kept.
    pub max_daily: u32,
    /// Number of week generations to keep.
    pub max_weekly: u32,
    /// Number of month generations to keep.
    pub max_monthly: u32,
    /// Number of year generations to keep.
    pub max_yearly: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_daily: 7,
            max_weekly: 4,
            max_monthly: 6,
            max_yearly: 2,
        }
    }
}

/// Result of one classification pass. Keep and remove are exact
/// complements of the input, both in original input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPlan {
    kept: Vec<DateTime<Utc>>,
    removed: Vec<DateTime<Utc>>,
}

impl RetentionPlan {
    /// Snapshots to keep, in input order.
    pub fn kept(&self) -> &[DateTime<Utc>] {
        &self.kept
    }

    /// Snapshots that may be discarded, in input order.
    pub fn removed(&self) -> &[DateTime<Utc>] {
        &self.removed
    }
}

/// Per-snapshot distances from the now-anchor.
#[derive(Debug, Clone, Copy)]
struct Distance {
    /// Whole days.
    dc: i64,
    /// Week generations: `dc / 7`.
    wc: i64,
    /// Calendar-month difference.
    mc: i32,
    /// Calendar-year difference.
    yc: i32,
}

fn distance(last: DateTime<Utc>, d: DateTime<Utc>) -> Distance {
    let dc = (last - d).num_days();
    Distance {
        dc,
        wc: dc / 7,
        mc: (last.year() - d.year()) * 12 + last.month() as i32 - d.month() as i32,
        yc: last.year() - d.year(),
    }
}

/// The GFS rotation classifier.
#[derive(Debug, Clone, Default)]
pub struct RetentionPlanner {
    policy: RetentionPolicy,
}

impl RetentionPlanner {
    /// Build a planner for the given limits.
    pub fn new(policy: RetentionPolicy) -> Self {
        Self { policy }
    }

    /// The configured limits.
    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Classify every snapshot as keep or remove, relative to the most
    /// recent timestamp in the set. Empty input yields an empty plan.
    pub fn classify(&self, dates: &[DateTime<Utc>]) -> RetentionPlan {
        let Some(&last) = dates.iter().max() else {
            return RetentionPlan {
                kept: Vec::new(),
                removed: Vec::new(),
            };
        };

        // First pass: bucket boundaries. Oldest member per week and month
        // bucket, newest per year bucket.
        let mut week_oldest: HashMap<i64, DateTime<Utc>> = HashMap::new();
        let mut month_oldest: HashMap<i32, DateTime<Utc>> = HashMap::new();
        let mut year_newest: HashMap<i32, DateTime<Utc>> = HashMap::new();
        for &d in dates {
            let dist = distance(last, d);
            week_oldest
                .entry(dist.wc)
                .and_modify(|e| *e = (*e).min(d))
                .or_insert(d);
            month_oldest
                .entry(dist.mc)
                .and_modify(|e| *e = (*e).min(d))
                .or_insert(d);
            year_newest
                .entry(dist.yc)
                .and_modify(|e| *e = (*e).max(d))
                .or_insert(d);
        }

        // Second pass: the four generation checks.
        let p = &self.policy;
        let mut kept = Vec::new();
        let mut removed = Vec::new();
        for &d in dates {
            let dist = distance(last, d);

            let daily = dist.dc < i64::from(p.max_daily);

            let weekly = dist.wc < i64::from(p.max_weekly) + 1
                && !(dist.wc == 1 && dist.dc < i64::from(p.max_daily))
                && week_oldest[&dist.wc] == d;

            let monthly = dist.mc < p.max_monthly as i32 + 1
                && !(dist.mc == 1 && dist.wc < i64::from(p.max_weekly))
                && month_oldest[&dist.mc] == d;

            let yearly = dist.yc < p.max_yearly as i32 + 1
                && !(dist.yc == 1 && dist.mc < p.max_monthly as i32)
                && year_newest[&dist.yc] == d;

            if daily || weekly || monthly || yearly {
                kept.push(d);
            } else {
                removed.push(d);
            }
        }

        RetentionPlan { kept, removed }
    }
}
