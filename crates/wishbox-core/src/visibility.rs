//! Time-gated visibility for time-capsule wishes and locked group cards.
//!
//! One rule serves both: protected content stays hidden while the entity's
//! gate flag is set, except on the friend's birthday (UTC calendar date).
//! For a wish the flag is `is_time_capsule`; for a card it is
//! `is_locked_until_bday`, which also blocks new contributions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::calendar::{is_birthday_on, LeapDayPolicy};

/// Outcome of a visibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub hidden: bool,
    pub is_birthday_today: bool,
}

/// Evaluate the gate for `flag` against the friend's birth date at `now`.
pub fn evaluate(flag: bool, birth_date: NaiveDate, now: DateTime<Utc>, policy: LeapDayPolicy) -> Visibility {
    let is_birthday_today = is_birthday_on(birth_date, now.date_naive(), policy);
    Visibility {
        hidden: flag && !is_birthday_today,
        is_birthday_today,
    }
}

/// `flag && !is_birthday_today` under the default leap-day policy.
pub fn is_hidden(flag: bool, birth_date: NaiveDate, now: DateTime<Utc>) -> bool {
    evaluate(flag, birth_date, now, LeapDayPolicy::default()).hidden
}
