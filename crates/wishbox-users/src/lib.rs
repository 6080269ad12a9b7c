pub mod accounts;
pub mod db;
pub mod error;
pub mod types;

pub use accounts::AccountManager;
pub use error::{Result, UserError};
pub use types::User;
