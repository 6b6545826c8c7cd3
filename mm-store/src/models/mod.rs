//! Domain models persisted by the repositories

pub mod user;

pub use user::{NewUser, User, UserUpdate};
