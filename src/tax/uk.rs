use chrono::{Datelike, NaiveDate};

/// UK tax year (runs 6 April to 5 April). The value is the end year,
/// e.g. 2025 = the 2024/25 tax year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaxYear(pub i32);

impl TaxYear {
    pub fn from_date(date: NaiveDate) -> Self {
        let year = date.year();
        if date >= NaiveDate::from_ymd_opt(year, 4, 6).expect("valid date") {
            TaxYear(year + 1)
        } else {
            TaxYear(year)
        }
    }

    /// Display as "2024/25".
    pub fn display(&self) -> String {
        format!("{}/{:02}", self.0 - 1, self.0 % 100)
    }
}

/// Jurisdiction rule set selected for a run. Determines which tax years
/// carry published capital-gains data and therefore participate in
/// disposal aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxRules {
    UkIndividual,
}

impl TaxRules {
    /// Whether this rule set recognises the given tax year.
    pub fn recognises(&self, year: TaxYear) -> bool {
        match self {
            // Individual CGT data is published from 2008/09 onwards.
            TaxRules::UkIndividual => (2009..=2027).contains(&year.0),
        }
    }
}
