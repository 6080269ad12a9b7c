use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Voice of a wish or template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Warm,
    Funny,
    Formal,
    Emotional,
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tone::Warm => write!(f, "warm"),
            Tone::Funny => write!(f, "funny"),
            Tone::Formal => write!(f, "formal"),
            Tone::Emotional => write!(f, "emotional"),
        }
    }
}

impl std::str::FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "warm" => Ok(Tone::Warm),
            "funny" => Ok(Tone::Funny),
            "formal" => Ok(Tone::Formal),
            "emotional" => Ok(Tone::Emotional),
            other => Err(format!("unknown tone: {other}")),
        }
    }
}

/// Visual theme of a group card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardTheme {
    #[default]
    Cloud,
    Minimal,
    Retro,
    Party,
}

impl std::fmt::Display for CardTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardTheme::Cloud => write!(f, "cloud"),
            CardTheme::Minimal => write!(f, "minimal"),
            CardTheme::Retro => write!(f, "retro"),
            CardTheme::Party => write!(f, "party"),
        }
    }
}

impl std::str::FromStr for CardTheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cloud" => Ok(CardTheme::Cloud),
            "minimal" => Ok(CardTheme::Minimal),
            "retro" => Ok(CardTheme::Retro),
            "party" => Ok(CardTheme::Party),
            other => Err(format!("unknown card theme: {other}")),
        }
    }
}

/// Default IANA zone recorded on new friends. Informational only: every
/// birthday check runs against the UTC calendar date.
pub const DEFAULT_TIMEZONE: &str = "Europe/Dublin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friend {
    pub id: String,
    pub user_id: String,
    pub full_name: String,
    pub nickname: Option<String>,
    pub relationship: Option<String>,
    pub timezone: String,
    pub birth_date: NaiveDate,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Create/replace payload for a friend. `timezone: None` means the default
/// on create and "keep the current value" on update.
#[derive(Debug, Clone, Deserialize)]
pub struct FriendInput {
    pub full_name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishTemplate {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub tone: Tone,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateInput {
    pub title: String,
    #[serde(default)]
    pub tone: Tone,
    pub body: String,
}

/// A stored wish. `sent_at` is set at most once and never cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wish {
    pub id: String,
    pub user_id: String,
    pub friend_id: String,
    pub title: String,
    pub body: String,
    pub tone: Tone,
    pub image_url: Option<String>,
    pub is_time_capsule: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub reveal_token: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Wish {
    pub fn is_sent(&self) -> bool {
        self.sent_at.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WishInput {
    pub friend_id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_time_capsule: bool,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// A wish as shown to a reader, with the body withheld while the time
/// capsule is sealed.
#[derive(Debug, Clone, Serialize)]
pub struct WishView {
    pub id: String,
    pub friend_id: String,
    pub friend_name: String,
    pub title: String,
    pub tone: Tone,
    pub image_url: Option<String>,
    /// `None` while hidden.
    pub body: Option<String>,
    pub is_time_capsule: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    /// Only present on the owner's view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reveal_token: Option<String>,
    pub hidden: bool,
    pub is_birthday_today: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupCard {
    pub id: String,
    pub user_id: String,
    pub friend_id: String,
    pub title: String,
    pub description: Option<String>,
    pub theme: CardTheme,
    pub slug: String,
    pub is_locked_until_bday: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardInput {
    pub friend_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub theme: CardTheme,
    #[serde(default)]
    pub is_locked_until_bday: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardContribution {
    pub id: String,
    pub card_id: String,
    pub author_name: String,
    pub message: String,
    pub reaction: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContributionInput {
    pub author_name: String,
    pub message: String,
    #[serde(default)]
    pub reaction: Option<String>,
}

/// A card as shown to a reader. While `locked`, `contributions` is empty and
/// only the count is disclosed.
#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    #[serde(flatten)]
    pub card: GroupCard,
    pub friend_name: String,
    pub locked: bool,
    pub is_birthday_today: bool,
    pub contribution_count: usize,
    pub contributions: Vec<CardContribution>,
}
