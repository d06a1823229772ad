//! Profile re-identification audit
//!
//! Counts how many source and released records fit a target individual's
//! profile.

use chrono::{Datelike, NaiveDate};
use record_validator::Record;
use serde::{Deserialize, Serialize};
use synthesizer::AnonymizedRecord;
use tracing::info;

/// Fields a profile can be matched against
pub trait ProfileFields {
    fn age(&self) -> u32;
    fn sex(&self) -> &str;
    fn vaccinated(&self) -> bool;
    fn vaccination_date(&self) -> Option<NaiveDate>;
    fn site(&self) -> &str;
}

impl ProfileFields for Record {
    fn age(&self) -> u32 {
        self.age
    }
    fn sex(&self) -> &str {
        &self.sex
    }
    fn vaccinated(&self) -> bool {
        self.vaccinated
    }
    fn vaccination_date(&self) -> Option<NaiveDate> {
        self.vaccination_date
    }
    fn site(&self) -> &str {
        &self.vaccination_site
    }
}

impl ProfileFields for AnonymizedRecord {
    fn age(&self) -> u32 {
        self.age
    }
    fn sex(&self) -> &str {
        &self.sex
    }
    fn vaccinated(&self) -> bool {
        self.vaccination_status
    }
    fn vaccination_date(&self) -> Option<NaiveDate> {
        self.vaccination_date
    }
    fn site(&self) -> &str {
        &self.vaccination_site
    }
}

/// Target profile; every `None` field matches anything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileCriteria {
    /// Inclusive lower age bound
    pub age_min: Option<u32>,
    /// Inclusive upper age bound
    pub age_max: Option<u32>,
    pub sex: Option<String>,
    pub vaccinated: Option<bool>,
    pub vaccination_year: Option<i32>,
    pub vaccination_month: Option<u32>,
    pub site: Option<String>,
}

impl ProfileCriteria {
    /// Whether `record` fits every set criterion.
    ///
    /// A record without a date never satisfies a year or month criterion.
    pub fn matches<T: ProfileFields + ?Sized>(&self, record: &T) -> bool {
        let age = record.age();
        if self.age_min.is_some_and(|min| age < min) || self.age_max.is_some_and(|max| age > max) {
            return false;
        }
        if self.sex.as_deref().is_some_and(|s| s != record.sex()) {
            return false;
        }
        if self.vaccinated.is_some_and(|v| v != record.vaccinated()) {
            return false;
        }
        if self.site.as_deref().is_some_and(|s| s != record.site()) {
            return false;
        }
        if self.vaccination_year.is_some() || self.vaccination_month.is_some() {
            let Some(date) = record.vaccination_date() else {
                return false;
            };
            if self.vaccination_year.is_some_and(|y| y != date.year())
                || self.vaccination_month.is_some_and(|m| m != date.month())
            {
                return false;
            }
        }
        true
    }

    /// Number of records fitting the profile
    pub fn count_matches<T: ProfileFields>(&self, records: &[T]) -> usize {
        records.iter().filter(|r| self.matches(*r)).count()
    }
}

/// Match counts of one profile over a source batch and its release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAudit {
    pub criteria: ProfileCriteria,
    pub source_total: usize,
    pub source_matches: usize,
    pub synthetic_total: usize,
    pub synthetic_matches: usize,
}

impl ProfileAudit {
    /// Count profile matches on both sides of the release
    pub fn run(criteria: &ProfileCriteria, source: &[Record], synthetic: &[AnonymizedRecord]) -> Self {
        let audit = Self {
            criteria: criteria.clone(),
            source_total: source.len(),
            source_matches: criteria.count_matches(source),
            synthetic_total: synthetic.len(),
            synthetic_matches: criteria.count_matches(synthetic),
        };
        info!(
            "Profile audit: {}/{} source records and {}/{} synthetic records match",
            audit.source_matches, audit.source_total, audit.synthetic_matches, audit.synthetic_total
        );
        audit
    }
}
