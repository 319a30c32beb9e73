//! Data models shared by the REST API and the mobile sync consumer.
//!
//! Wire names are camelCase to match the mobile app's import format.

mod poi;
mod revision;
mod user;

pub use poi::*;
pub use revision::*;
pub use user::*;
