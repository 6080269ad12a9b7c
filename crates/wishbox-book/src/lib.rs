//! `wishbox-book`: the address book of birthdays and everything hung off
//! it: friends, wish templates, wishes and group cards.
//!
//! Reads that disclose gated content go through
//! [`wishbox_core::visibility`]; the card contribution write path enforces
//! the same rule. [`wishes::WishManager`] also implements the scheduler's
//! [`wishbox_scheduler::DueWishStore`] port.

pub mod cards;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod friends;
pub mod templates;
pub mod types;
pub mod wishes;

pub use cards::CardManager;
pub use dashboard::{Dashboard, UpcomingBirthday};
pub use error::{BookError, Result};
pub use friends::FriendManager;
pub use templates::TemplateManager;
pub use wishes::{MarkSent, WishManager};
