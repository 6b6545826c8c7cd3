//! Persistence layer for the money management backend
//!
//! - [`db::Store`]: narrow capability over a relational store
//! - [`db::PgStore`]: Postgres implementation on a sqlx pool
//! - [`db::UserRepo`]: user repository (create, get, update, delete, list, count)
//! - [`db::ScriptedStore`]: expectation-driven store for tests

pub mod db;
pub mod models;

pub use db::{
    with_deadline, ErrorKind, PgStore, RepoError, ScanError, Store, StoreError, UserRepo,
    UserRepository,
};
pub use models::{NewUser, User, UserUpdate};
