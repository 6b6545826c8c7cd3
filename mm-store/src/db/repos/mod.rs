pub mod users;

pub use users::{UserRepo, UserRepository};
