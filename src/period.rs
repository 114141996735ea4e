// Fiscal-year period labels such as `2024-25` or `2024-2025`.
//
// The suffix after the dash is never trusted: it is always re-derived from
// the start year, so `2024-99` is treated the same as `2024-25`.
use crate::error::{ReportError, ReportResult};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodForm {
    /// `YYYY-YY`
    Short,
    /// `YYYY-YYYY`
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodLabel {
    pub start_year: i32,
    pub form: PeriodForm,
}

impl PeriodLabel {
    /// The period `offset` years before this one, in the same form.
    pub fn preceding(&self, offset: i32) -> PeriodLabel {
        PeriodLabel {
            start_year: self.start_year - offset,
            form: self.form,
        }
    }
}

impl FromStr for PeriodLabel {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let form = match s.chars().count() {
            7 => PeriodForm::Short,
            9 => PeriodForm::Long,
            _ => return Err(ReportError::invalid_format(s)),
        };
        let prefix = s.split('-').next().unwrap_or_default();
        let start_year = prefix
            .parse::<i32>()
            .map_err(|_| ReportError::invalid_format(s))?;
        Ok(PeriodLabel { start_year, form })
    }
}

impl fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end_year = self.start_year + 1;
        match self.form {
            PeriodForm::Short => write!(f, "{}-{:02}", self.start_year, end_year.rem_euclid(100)),
            PeriodForm::Long => write!(f, "{}-{:04}", self.start_year, end_year),
        }
    }
}

/// Compute the `count` periods preceding `label`, most recent first.
///
/// `derive_previous_periods("2024-25", 2)` yields `["2023-24", "2022-23"]`.
/// Either every label is produced or the call fails with `InvalidFormat`.
pub fn derive_previous_periods(label: &str, count: usize) -> ReportResult<Vec<String>> {
    let period: PeriodLabel = label.parse()?;
    let count = i32::try_from(count).map_err(|_| ReportError::invalid_format(label))?;
    Ok((1..=count)
        .map(|i| period.preceding(i).to_string())
        .collect())
}
