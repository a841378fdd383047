use chrono::NaiveDate;

use crate::error::{Error, Result};

/// Inclusive range of calendar days. Keeps the original strings for naming
/// the exported object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    start_label: String,
    end_label: String,
}

impl DateRange {
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: parse_date(start)?,
            end: parse_date(end)?,
            start_label: start.to_string(),
            end_label: end.to_string(),
        })
    }

    pub fn start_label(&self) -> &str {
        &self.start_label
    }

    pub fn end_label(&self) -> &str {
        &self.end_label
    }

    /// Every day from start to end, in order. Empty when start is after end.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |day| *day <= self.end)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| Error::InvalidDate {
        value: value.to_string(),
        source,
    })
}
