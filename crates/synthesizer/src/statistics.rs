//! Cluster Aggregate Statistics

use chrono::NaiveDate;
use record_validator::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Aggregates of one cluster's real members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStatistics {
    /// Number of members
    pub size: usize,
    /// Rounded mean age
    pub mean_age: u32,
    /// Rounded mean day offset over members with a valid date
    pub mean_day_offset: Option<i64>,
    /// Members marked as vaccinated
    pub vaccinated: usize,
    /// Distinct sex values, sorted
    pub sexes: Vec<String>,
    /// Distinct site values, sorted
    pub sites: Vec<String>,
}

impl ClusterStatistics {
    /// Summarise the members of `records` at `members`.
    ///
    /// Day offsets are measured from `min_date`; members without a valid date
    /// do not contribute to the mean offset.
    pub fn compute(records: &[Record], members: &[usize], min_date: Option<NaiveDate>) -> Self {
        let size = members.len();
        if size == 0 {
            return Self {
                size: 0,
                mean_age: 0,
                mean_day_offset: None,
                vaccinated: 0,
                sexes: Vec::new(),
                sites: Vec::new(),
            };
        }

        let age_sum: f64 = members.iter().map(|&i| f64::from(records[i].age)).sum();
        let mean_age = (age_sum / size as f64).round() as u32;

        let offsets: Vec<i64> = members
            .iter()
            .filter_map(|&i| records[i].vaccination_date.zip(min_date))
            .map(|(date, origin)| (date - origin).num_days())
            .collect();
        let mean_day_offset = if offsets.is_empty() {
            None
        } else {
            let sum: i64 = offsets.iter().sum();
            Some((sum as f64 / offsets.len() as f64).round() as i64)
        };

        let vaccinated = members.iter().filter(|&&i| records[i].vaccinated).count();

        let sexes: BTreeSet<&str> = members.iter().map(|&i| records[i].sex.as_str()).collect();
        let sites: BTreeSet<&str> = members
            .iter()
            .map(|&i| records[i].vaccination_site.as_str())
            .collect();

        Self {
            size,
            mean_age,
            mean_day_offset,
            vaccinated,
            sexes: sexes.into_iter().map(str::to_string).collect(),
            sites: sites.into_iter().map(str::to_string).collect(),
        }
    }

    /// Fraction of vaccinated members
    pub fn vaccinated_fraction(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.vaccinated as f64 / self.size as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(age: u32, sex: &str, vaccinated: bool, date: Option<NaiveDate>, site: &str) -> Record {
        Record {
            name: "x".to_string(),
            age,
            sex: sex.to_string(),
            vaccinated,
            vaccination_date: date,
            vaccination_site: site.to_string(),
        }
    }

    fn feb(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2021, 2, day)
    }

    #[test]
    fn test_compute_statistics() {
        let records = vec![
            record(20, "F", true, feb(1), "UBS Centro"),
            record(25, "F", false, feb(11), "UBS Sul"),
            record(31, "M", true, None, "UBS Centro"),
            record(99, "M", true, feb(28), "UBS Norte"),
        ];
        let stats = ClusterStatistics::compute(&records, &[0, 1, 2], feb(1));
        assert_eq!(stats.size, 3);
        // (20 + 25 + 31) / 3 = 25.33
        assert_eq!(stats.mean_age, 25);
        // Missing date excluded: (0 + 10) / 2
        assert_eq!(stats.mean_day_offset, Some(5));
        assert_eq!(stats.vaccinated, 2);
        assert!((stats.vaccinated_fraction() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.sexes, vec!["F", "M"]);
        assert_eq!(stats.sites, vec!["UBS Centro", "UBS Sul"]);
    }

    #[test]
    fn test_all_dates_missing() {
        let records = vec![
            record(40, "F", true, None, "A"),
            record(41, "F", true, None, "A"),
        ];
        let stats = ClusterStatistics::compute(&records, &[0, 1], feb(1));
        assert_eq!(stats.mean_day_offset, None);
        // 40.5 rounds away from zero
        assert_eq!(stats.mean_age, 41);
    }

    #[test]
    fn test_empty_members() {
        let stats = ClusterStatistics::compute(&[], &[], None);
        assert_eq!(stats.size, 0);
        assert_eq!(stats.vaccinated_fraction(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_statistics_stay_within_members(
            ages in prop::collection::vec(0u32..110, 1..30),
            flags in prop::collection::vec(any::<bool>(), 30),
        ) {
            let records: Vec<Record> = ages
                .iter()
                .zip(&flags)
                .map(|(&age, &v)| {
                    let sex = if age % 2 == 0 { "F" } else { "M" };
                    record(age, sex, v, if v { feb(1 + age % 28) } else { None }, "UBS Sul")
                })
                .collect();
            let members: Vec<usize> = (0..records.len()).collect();
            let stats = ClusterStatistics::compute(&records, &members, feb(1));

            let min = *ages.iter().min().unwrap();
            let max = *ages.iter().max().unwrap();
            prop_assert!(stats.mean_age >= min && stats.mean_age <= max);
            prop_assert!((0.0..=1.0).contains(&stats.vaccinated_fraction()));
            prop_assert_eq!(stats.mean_day_offset.is_some(), stats.vaccinated > 0);
            if let Some(offset) = stats.mean_day_offset {
                prop_assert!((0..=27).contains(&offset));
            }
            prop_assert!(stats.sexes.iter().all(|s| records.iter().any(|r| &r.sex == s)));
        }
    }
}
