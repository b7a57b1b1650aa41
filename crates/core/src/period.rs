//! Indian financial year quarters and statutory due dates.
//!
//! The financial year runs April to March. Q1 is Apr–Jun, Q2 Jul–Sep,
//! Q3 Oct–Dec and Q4 Jan–Mar of the following calendar year.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::TaxError;

const MIN_YEAR: i32 = 1961;
const MAX_YEAR: i32 = 9998;

/// Quarter within a financial year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quarter {
    /// April to June.
    Q1,
    /// July to September.
    Q2,
    /// October to December.
    Q3,
    /// January to March.
    Q4,
}

impl Quarter {
    /// All quarters in order.
    pub const ALL: [Self; 4] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4];

    /// Quarter number, 1 to 4.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }
}

/// A quarter of an Indian financial year, written `2024-25/Q1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FinancialQuarter {
    start_year: i32,
    quarter: Quarter,
}

/// Builds a date from parts the caller has already range-checked.
fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

impl FinancialQuarter {
    /// Creates a quarter of the financial year starting in April of `start_year`.
    ///
    /// # Errors
    ///
    /// Returns `TaxError::Validation` for years outside the supported range.
    pub fn new(start_year: i32, quarter: Quarter) -> Result<Self, TaxError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&start_year) {
            return Err(TaxError::Validation(format!(
                "financial year {start_year} is out of range"
            )));
        }
        Ok(Self {
            start_year,
            quarter,
        })
    }

    /// The quarter containing `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        let (start_year, quarter) = match date.month() {
            4..=6 => (date.year(), Quarter::Q1),
            7..=9 => (date.year(), Quarter::Q2),
            10..=12 => (date.year(), Quarter::Q3),
            _ => (date.year() - 1, Quarter::Q4),
        };
        Self {
            start_year: start_year.clamp(MIN_YEAR, MAX_YEAR),
            quarter,
        }
    }

    /// Calendar year in which the financial year starts.
    #[must_use]
    pub const fn start_year(&self) -> i32 {
        self.start_year
    }

    /// The quarter.
    #[must_use]
    pub const fn quarter(&self) -> Quarter {
        self.quarter
    }

    /// Financial year label, e.g. `2024-25`.
    #[must_use]
    pub fn financial_year(&self) -> String {
        format!("{}-{:02}", self.start_year, (self.start_year + 1) % 100)
    }

    /// First day of the quarter.
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        match self.quarter {
            Quarter::Q1 => ymd(self.start_year, 4, 1),
            Quarter::Q2 => ymd(self.start_year, 7, 1),
            Quarter::Q3 => ymd(self.start_year, 10, 1),
            Quarter::Q4 => ymd(self.start_year + 1, 1, 1),
        }
    }

    /// Last day of the quarter.
    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        match self.quarter {
            Quarter::Q1 => ymd(self.start_year, 6, 30),
            Quarter::Q2 => ymd(self.start_year, 9, 30),
            Quarter::Q3 => ymd(self.start_year, 12, 31),
            Quarter::Q4 => ymd(self.start_year + 1, 3, 31),
        }
    }

    /// Whether `date` falls inside the quarter.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    /// Due date of the quarterly TDS/TCS return.
    #[must_use]
    pub fn return_due_date(&self) -> NaiveDate {
        match self.quarter {
            Quarter::Q1 => ymd(self.start_year, 7, 31),
            Quarter::Q2 => ymd(self.start_year, 10, 31),
            Quarter::Q3 => ymd(self.start_year + 1, 1, 31),
            Quarter::Q4 => ymd(self.start_year + 1, 5, 31),
        }
    }

    /// The following quarter.
    #[must_use]
    pub fn next(&self) -> Self {
        match self.quarter {
            Quarter::Q1 => Self {
                quarter: Quarter::Q2,
                ..*self
            },
            Quarter::Q2 => Self {
                quarter: Quarter::Q3,
                ..*self
            },
            Quarter::Q3 => Self {
                quarter: Quarter::Q4,
                ..*self
            },
            Quarter::Q4 => Self {
                start_year: (self.start_year + 1).min(MAX_YEAR),
                quarter: Quarter::Q1,
            },
        }
    }

    /// The preceding quarter.
    #[must_use]
    pub fn previous(&self) -> Self {
        match self.quarter {
            Quarter::Q1 => Self {
                start_year: (self.start_year - 1).max(MIN_YEAR),
                quarter: Quarter::Q4,
            },
            Quarter::Q2 => Self {
                quarter: Quarter::Q1,
                ..*self
            },
            Quarter::Q3 => Self {
                quarter: Quarter::Q2,
                ..*self
            },
            Quarter::Q4 => Self {
                quarter: Quarter::Q3,
                ..*self
            },
        }
    }
}

/// Deposit due date for tax withheld on `transaction_date`: the 7th of the
/// following month, or 30 April for March.
#[must_use]
pub fn deposit_due_date(transaction_date: NaiveDate) -> NaiveDate {
    let year = transaction_date.year();
    match transaction_date.month() {
        3 => ymd(year, 4, 30),
        12 => ymd(year + 1, 1, 7),
        month => ymd(year, month + 1, 7),
    }
}

impl fmt::Display for FinancialQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/Q{}", self.financial_year(), self.quarter.number())
    }
}

impl FromStr for FinancialQuarter {
    type Err = TaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            TaxError::Validation(format!(
                "invalid quarter {s:?}: expected a value like 2024-25/Q1"
            ))
        };

        let (year_part, quarter_part) = s.trim().split_once('/').ok_or_else(invalid)?;
        let (start, end) = year_part.split_once('-').ok_or_else(invalid)?;
        let start_year: i32 = start.parse().map_err(|_| invalid())?;
        let end_suffix: i32 = end.parse().map_err(|_| invalid())?;
        if end.len() != 2 || end_suffix != (start_year + 1) % 100 {
            return Err(invalid());
        }

        let quarter = match quarter_part.trim().to_uppercase().as_str() {
            "Q1" => Quarter::Q1,
            "Q2" => Quarter::Q2,
            "Q3" => Quarter::Q3,
            "Q4" => Quarter::Q4,
            _ => return Err(invalid()),
        };

        Self::new(start_year, quarter)
    }
}

impl TryFrom<String> for FinancialQuarter {
    type Error = TaxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FinancialQuarter> for String {
    fn from(value: FinancialQuarter) -> Self {
        value.to_string()
    }
}
