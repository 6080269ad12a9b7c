//! Demo data for local runs: one account with two friends, two templates,
//! three wishes (one a time capsule, one scheduled two minutes out) and a
//! group card with a first contribution.

use chrono::{Duration, NaiveDate};
use tracing::info;
use wishbox_book::types::{CardInput, CardTheme, ContributionInput, FriendInput, TemplateInput, Tone, WishInput};
use wishbox_users::User;

use crate::app::AppState;

pub const DEMO_EMAIL: &str = "demo@bwh.local";
pub const DEMO_PASSWORD: &str = "password123";

#[derive(Debug)]
pub enum SeedOutcome {
    Created(User),
    AlreadySeeded(User),
}

/// Create the demo account and its data unless the account already exists.
pub fn seed_demo(state: &AppState) -> anyhow::Result<SeedOutcome> {
    if let Some(existing) = state.accounts.find_by_email(DEMO_EMAIL)? {
        info!(user_id = %existing.id, "demo data already exists");
        return Ok(SeedOutcome::AlreadySeeded(existing));
    }

    let now = state.now();
    let user = state.accounts.register("Demo User", DEMO_EMAIL, DEMO_PASSWORD)?;
    let uid = user.id.as_str();

    let aarav = state.friends.create(
        uid,
        &FriendInput {
            full_name: "Aarav Sharma".into(),
            nickname: Some("Aaru".into()),
            relationship: Some("Best Friend".into()),
            timezone: Some("Europe/Dublin".into()),
            birth_date: date(1999, 12, 10)?,
            notes: Some("That 2022 trip still cracks me up.".into()),
            photo_url: None,
        },
        now,
    )?;
    let meera = state.friends.create(
        uid,
        &FriendInput {
            full_name: "Meera Nair".into(),
            nickname: None,
            relationship: Some("Colleague".into()),
            timezone: Some("Europe/Dublin".into()),
            birth_date: date(1998, 1, 3)?,
            notes: None,
            photo_url: None,
        },
        now,
    )?;

    for (title, tone, body) in [
        ("Warm Classic", Tone::Warm, "Wishing you a day full of laughter and love!"),
        (
            "Office Friendly",
            Tone::Formal,
            "Wishing you continued success and happiness. Happy Birthday!",
        ),
    ] {
        state.templates.create(
            uid,
            &TemplateInput {
                title: title.into(),
                tone,
                body: body.into(),
            },
            now,
        )?;
    }

    let wishes = [
        WishInput {
            friend_id: aarav.id.clone(),
            title: "Aaru's Big Day".into(),
            body: "Happy birthday! May your cake be bigger than your problems 😂".into(),
            tone: Tone::Funny,
            image_url: None,
            is_time_capsule: false,
            scheduled_for: None,
        },
        WishInput {
            friend_id: aarav.id.clone(),
            title: "Time Capsule Note".into(),
            body: "You've always been my constant. Proud of you.".into(),
            tone: Tone::Emotional,
            image_url: None,
            is_time_capsule: true,
            scheduled_for: None,
        },
        WishInput {
            friend_id: meera.id.clone(),
            title: "Scheduled Office Wish".into(),
            body: "Happy Birthday! Hope you have a wonderful year ahead.".into(),
            tone: Tone::Formal,
            image_url: None,
            is_time_capsule: false,
            scheduled_for: Some(now + Duration::minutes(2)),
        },
    ];
    for wish in &wishes {
        state.wishes.create(uid, wish, now)?;
    }

    let card = state.cards.create(
        uid,
        &CardInput {
            friend_id: aarav.id,
            title: "Aarav's Group Surprise".into(),
            description: None,
            theme: CardTheme::Party,
            is_locked_until_bday: false,
        },
        now,
    )?;
    state.cards.add_contribution(
        &card.slug,
        &ContributionInput {
            author_name: "Team Alpha".into(),
            message: "Have an amazing year ahead! 🎉".into(),
            reaction: Some("🎉".into()),
        },
        now,
    )?;

    info!(user_id = %user.id, "demo data created");
    Ok(SeedOutcome::Created(user))
}

fn date(y: i32, m: u32, d: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| anyhow::anyhow!("invalid date {y}-{m}-{d}"))
}
