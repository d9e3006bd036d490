// src/pipeline/group.rs

//! Weekday grouping and ordering.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{LineupRecord, Weekday};

/// Records of one weekday, in output order.
#[derive(Debug, Clone, Serialize)]
pub struct DayGroup {
    pub weekday: Weekday,
    pub records: Vec<LineupRecord>,
}

/// Bucket records by weekday.
///
/// Buckets come out Monday..Sunday then Other; empty buckets are omitted.
/// Within a bucket records are ordered by broadcast date, undated last, with
/// the title as tie-break.
pub fn group_by_weekday(records: Vec<LineupRecord>) -> Vec<DayGroup> {
    let mut buckets: BTreeMap<Weekday, Vec<LineupRecord>> = BTreeMap::new();
    for record in records {
        buckets.entry(record.weekday).or_default().push(record);
    }

    buckets
        .into_iter()
        .map(|(weekday, mut records)| {
            records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
            DayGroup { weekday, records }
        })
        .collect()
}

/// Total records across groups.
pub fn record_count(groups: &[DayGroup]) -> usize {
    groups.iter().map(|g| g.records.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BroadcastDate;

    fn record(weekday: Weekday, title: &str, date: Option<(u32, u32)>) -> LineupRecord {
        let mut record = LineupRecord::new(weekday, title, 1);
        if let Some((m, d)) = date {
            record.resolve(BroadcastDate::new(m, d).unwrap());
        }
        record
    }

    #[test]
    fn test_fixed_day_order_and_empty_buckets_omitted() {
        let groups = group_by_weekday(vec![
            record(Weekday::Other, "X", None),
            record(Weekday::Sunday, "S", None),
            record(Weekday::Monday, "M", None),
        ]);
        let days: Vec<_> = groups.iter().map(|g| g.weekday).collect();
        assert_eq!(days, vec![Weekday::Monday, Weekday::Sunday, Weekday::Other]);
        assert!(groups.iter().all(|g| !g.records.is_empty()));
    }

    #[test]
    fn test_sort_within_bucket() {
        let groups = group_by_weekday(vec![
            record(Weekday::Monday, "Undated", None),
            record(Weekday::Monday, "B", Some((10, 6))),
            record(Weekday::Monday, "A", Some((10, 6))),
            record(Weekday::Monday, "Early", Some((9, 30))),
            record(Weekday::Monday, "Another", None),
        ]);
        let titles: Vec<_> = groups[0].records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Early", "A", "B", "Another", "Undated"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_weekday(Vec::new()).is_empty());
        assert_eq!(record_count(&[]), 0);
    }
}
