use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Where a Feb 29 birthday falls in years without a Feb 29.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeapDayPolicy {
    /// Celebrate on the last day of February.
    #[default]
    Feb28,
    /// Celebrate on the day after Feb 28.
    Mar1,
}

impl std::fmt::Display for LeapDayPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeapDayPolicy::Feb28 => write!(f, "feb28"),
            LeapDayPolicy::Mar1 => write!(f, "mar1"),
        }
    }
}

impl std::str::FromStr for LeapDayPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "feb28" => Ok(LeapDayPolicy::Feb28),
            "mar1" => Ok(LeapDayPolicy::Mar1),
            other => Err(format!("unknown leap_day policy: {other}")),
        }
    }
}

/// The day `birth_date`'s birthday is observed in `year`.
///
/// Identical month/day for every birth date except Feb 29, which moves
/// according to `policy` in common years. `None` only when `year` is
/// outside chrono's representable range.
pub fn observed_birthday(birth_date: NaiveDate, year: i32, policy: LeapDayPolicy) -> Option<NaiveDate> {
    if let Some(day) = NaiveDate::from_ymd_opt(year, birth_date.month(), birth_date.day()) {
        return Some(day);
    }
    // Only Feb 29 in a common year gets here.
    match policy {
        LeapDayPolicy::Feb28 => NaiveDate::from_ymd_opt(year, 2, 28),
        LeapDayPolicy::Mar1 => NaiveDate::from_ymd_opt(year, 3, 1),
    }
}

/// True when `day` is the observed birthday for `birth_date`.
pub fn is_birthday_on(birth_date: NaiveDate, day: NaiveDate, policy: LeapDayPolicy) -> bool {
    observed_birthday(birth_date, day.year(), policy) == Some(day)
}

/// The next observed birthday on or after `today`.
pub fn next_birthday(birth_date: NaiveDate, today: NaiveDate, policy: LeapDayPolicy) -> Option<NaiveDate> {
    let this_year = observed_birthday(birth_date, today.year(), policy)?;
    if this_year >= today {
        Some(this_year)
    } else {
        observed_birthday(birth_date, today.year() + 1, policy)
    }
}

/// Whole days until the next observed birthday; 0 when it is today.
pub fn days_until_birthday(birth_date: NaiveDate, today: NaiveDate, policy: LeapDayPolicy) -> Option<i64> {
    next_birthday(birth_date, today, policy).map(|next| (next - today).num_days())
}

/// Age the friend turns on their next observed birthday.
pub fn age_on_next_birthday(birth_date: NaiveDate, today: NaiveDate, policy: LeapDayPolicy) -> Option<i32> {
    next_birthday(birth_date, today, policy).map(|next| next.year() - birth_date.year())
}
