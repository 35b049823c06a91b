use crate::error::{AppError, ValidationError};
use chrono::{Local, NaiveDate};
use std::cmp::Ordering;
use std::fmt;

pub const MIN_YEAR: i32 = 1950;
pub const MAX_YEAR: i32 = 2100;

/// A user-entered film expiry date in one of the three accepted shapes:
/// a bare year (`2026`), month and year (`12/2026`), or the legacy full
/// form (`12/31/2026`) kept for records imported from older data.
///
/// Parsing a bare year anchors the date at Jan 1 internally; expiry
/// comparisons always use the end of the implied period instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpiryDate {
    Year(i32),
    YearMonth { month: u32, year: i32 },
    Full { month: u32, day: u32, year: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryDateErrorKind {
    /// Input is not one of the accepted shapes
    Shape,
    /// Year outside [1950, 2100]
    YearRange,
    /// Month outside [1, 12]
    MonthRange,
    /// Day does not exist in the given month
    DayRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryDateError {
    pub kind: ExpiryDateErrorKind,
    pub input: String,
}

impl fmt::Display for ExpiryDateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ExpiryDateErrorKind::Shape => {
                write!(f, "'{}' is not a YYYY or MM/YYYY date", self.input)
            }
            ExpiryDateErrorKind::YearRange => write!(
                f,
                "year in '{}' must be between {} and {}",
                self.input, MIN_YEAR, MAX_YEAR
            ),
            ExpiryDateErrorKind::MonthRange => {
                write!(f, "month in '{}' must be between 1 and 12", self.input)
            }
            ExpiryDateErrorKind::DayRange => {
                write!(f, "'{}' is not a real calendar date", self.input)
            }
        }
    }
}

impl std::error::Error for ExpiryDateError {}

/// Normalizes raw user entry: strips everything that is not a digit, and
/// once exactly 6 digits are present re-inserts the single separator
/// (`MMYYYY` -> `MM/YYYY`). Four digits stay a bare year; anything else is
/// passed through as digits so live editing keeps working.
pub fn normalize_input(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 6 {
        format!("{}/{}", &digits[..2], &digits[2..])
    } else {
        digits
    }
}

fn parse_number(s: &str) -> Option<u32> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

impl ExpiryDate {
    /// Parses a canonical-shape date string (`YYYY`, `MM/YYYY`, `MM/DD/YYYY`)
    pub fn parse(s: &str) -> Result<Self, ExpiryDateError> {
        let err = |kind| ExpiryDateError {
            kind,
            input: s.to_string(),
        };

        let parts: Vec<&str> = s.split('/').collect();
        let (month, day, year) = match parts.as_slice() {
            [y] if y.len() == 4 => (None, None, *y),
            [m, y] if m.len() == 2 && y.len() == 4 => (Some(*m), None, *y),
            [m, d, y] if m.len() == 2 && d.len() == 2 && y.len() == 4 => {
                (Some(*m), Some(*d), *y)
            }
            _ => return Err(err(ExpiryDateErrorKind::Shape)),
        };

        let year = parse_number(year).ok_or_else(|| err(ExpiryDateErrorKind::Shape))? as i32;
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(err(ExpiryDateErrorKind::YearRange));
        }

        let month = match month {
            Some(m) => {
                let m = parse_number(m).ok_or_else(|| err(ExpiryDateErrorKind::Shape))?;
                if !(1..=12).contains(&m) {
                    return Err(err(ExpiryDateErrorKind::MonthRange));
                }
                Some(m)
            }
            None => None,
        };

        match (month, day) {
            (None, _) => Ok(ExpiryDate::Year(year)),
            (Some(month), None) => Ok(ExpiryDate::YearMonth { month, year }),
            (Some(month), Some(d)) => {
                let day = parse_number(d).ok_or_else(|| err(ExpiryDateErrorKind::Shape))?;
                NaiveDate::from_ymd_opt(year, month, day)
                    .ok_or_else(|| err(ExpiryDateErrorKind::DayRange))?;
                Ok(ExpiryDate::Full { month, day, year })
            }
        }
    }

    /// The canonical string form (`YYYY`, `MM/YYYY` or `MM/DD/YYYY`)
    pub fn canonical(&self) -> String {
        match self {
            ExpiryDate::Year(year) => format!("{:04}", year),
            ExpiryDate::YearMonth { month, year } => format!("{:02}/{:04}", month, year),
            ExpiryDate::Full { month, day, year } => {
                format!("{:02}/{:02}/{:04}", month, day, year)
            }
        }
    }

    /// First day of the implied period (Jan 1 for a bare year)
    pub fn first_day(&self) -> NaiveDate {
        match *self {
            ExpiryDate::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN),
            ExpiryDate::YearMonth { month, year } => {
                NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
            }
            ExpiryDate::Full { month, day, year } => {
                NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
            }
        }
    }

    /// Last day of the implied period: Dec 31 for a year, last day of the
    /// month for month/year, the exact day for legacy full dates. This is
    /// the instant all expiry comparisons use.
    pub fn end_of_period(&self) -> NaiveDate {
        match *self {
            ExpiryDate::Year(year) => {
                NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX)
            }
            ExpiryDate::YearMonth { month, year } => last_day_of_month(year, month),
            ExpiryDate::Full { .. } => self.first_day(),
        }
    }

    /// Strictly past: the whole implied period lies before `today`
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.end_of_period() < today
    }

    pub fn is_past_now(&self) -> bool {
        self.is_past(Local::now().date_naive())
    }
}

impl fmt::Display for ExpiryDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl Ord for ExpiryDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.end_of_period()
            .cmp(&other.end_of_period())
            .then_with(|| self.canonical().cmp(&other.canonical()))
    }
}

impl PartialOrd for ExpiryDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The most urgent date of a set: minimal end-of-period instant.
/// Unparseable entries are skipped (they never reach storage anyway).
pub fn closest<'a, I>(dates: I) -> Option<ExpiryDate>
where
    I: IntoIterator<Item = &'a str>,
{
    dates
        .into_iter()
        .filter_map(|s| ExpiryDate::parse(s).ok())
        .min()
}

/// Validates a list of raw date strings; the first offending entry is
/// reported with its index so the caller can highlight it.
pub fn validate_all(dates: &[String]) -> Result<(), AppError> {
    for (i, date) in dates.iter().enumerate() {
        if let Err(e) = ExpiryDate::parse(date) {
            return Err(ValidationError::at_index("expiry_dates", i, e.to_string()).into());
        }
    }
    Ok(())
}
