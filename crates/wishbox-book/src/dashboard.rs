use chrono::NaiveDate;
use serde::Serialize;
use wishbox_core::calendar::{age_on_next_birthday, days_until_birthday, is_birthday_on, next_birthday};
use wishbox_core::LeapDayPolicy;

use crate::types::Friend;

/// How many upcoming birthdays the dashboard lists.
pub const UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct UpcomingBirthday {
    pub friend: Friend,
    pub next_birthday: Option<NaiveDate>,
    pub days_until: Option<i64>,
    pub turning: Option<i32>,
}

/// Owner home page: totals, the next few birthdays and today's.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub friends_count: usize,
    pub wishes_count: usize,
    pub cards_count: usize,
    pub upcoming: Vec<UpcomingBirthday>,
    pub todays_birthdays: Vec<Friend>,
}

impl Dashboard {
    /// Assemble from the owner's friends and counts. Friends whose next
    /// birthday cannot be computed sort last.
    pub fn build(
        friends: Vec<Friend>,
        wishes_count: usize,
        cards_count: usize,
        today: NaiveDate,
        policy: LeapDayPolicy,
    ) -> Self {
        let friends_count = friends.len();
        let todays_birthdays = friends
            .iter()
            .filter(|f| is_birthday_on(f.birth_date, today, policy))
            .cloned()
            .collect();

        let mut upcoming: Vec<UpcomingBirthday> = friends
            .into_iter()
            .map(|friend| UpcomingBirthday {
                next_birthday: next_birthday(friend.birth_date, today, policy),
                days_until: days_until_birthday(friend.birth_date, today, policy),
                turning: age_on_next_birthday(friend.birth_date, today, policy),
                friend,
            })
            .collect();
        upcoming.sort_by_key(|u| u.days_until.unwrap_or(i64::MAX));
        upcoming.truncate(UPCOMING_LIMIT);

        Self {
            friends_count,
            wishes_count,
            cards_count,
            upcoming,
            todays_birthdays,
        }
    }
}
