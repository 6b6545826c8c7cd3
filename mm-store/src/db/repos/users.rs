//! User repository
//!
//! One round trip per operation, no cached state:
//! - create: INSERT ... ON CONFLICT (email) DO NOTHING RETURNING id
//! - update: single UPDATE ... RETURNING, no existence pre-check
//! - delete: affected-row count decides not-found
//! - count: zero is reported as `NoRecords`, not as a quantity

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument};

use crate::db::error::{RepoError, ScanError, StoreError};
use crate::db::store::{Row, Store, Value};
use crate::models::{NewUser, User, UserUpdate};

const ENTITY: &str = "user";

const INSERT_USER: &str = r#"
    insert into users (username, email, passhash)
    values ($1, $2, $3)
    on conflict (email) do nothing
    returning id
"#;

const SELECT_USER_BY_ID: &str = r#"
    select id, username, email, passhash, create_at, update_at
    from users
    where id = $1
"#;

const UPDATE_USER: &str = r#"
    update users
    set username = $1, email = $2, passhash = $3, update_at = now()
    where id = $4
    returning id, username, email, passhash, create_at, update_at
"#;

const DELETE_USER: &str = "delete from users where id = $1";

const LIST_USERS: &str = r#"
    select id, username, email, passhash, create_at, update_at
    from users
    order by id
    limit $1 offset $2
"#;

const COUNT_USERS: &str = "select count(id) from users";

/// User persistence operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and return the store-assigned id.
    async fn create(&self, user: &NewUser) -> Result<i64, RepoError>;

    async fn get_by_id(&self, id: i64) -> Result<User, RepoError>;

    /// Replace the mutable fields and return the full updated row.
    async fn update(&self, user: &UserUpdate) -> Result<User, RepoError>;

    async fn delete(&self, id: i64) -> Result<(), RepoError>;

    /// Page through users in ascending id order.
    async fn list(&self, limit: u32, offset: u64) -> Result<Vec<User>, RepoError>;

    /// Total number of users, for pagination.
    async fn count(&self) -> Result<i64, RepoError>;
}

/// Map a `users` row (select order above) onto a [`User`].
fn scan_user(row: &Row) -> Result<User, ScanError> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        pass_hash: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// [`UserRepository`] over any [`Store`]
#[derive(Clone)]
pub struct UserRepo {
    store: Arc<dyn Store>,
}

impl UserRepo {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for UserRepo {
    #[instrument(skip(self, user), fields(op = "create"))]
    async fn create(&self, user: &NewUser) -> Result<i64, RepoError> {
        let args = [
            Value::from(user.username.as_deref()),
            Value::from(user.email.as_str()),
            Value::from(user.pass_hash.as_str()),
        ];

        let row = match self.store.query_row(INSERT_USER, &args).await {
            Ok(row) => row,
            // The conflict target is email, so an empty RETURNING means the email is taken.
            Err(StoreError::NoRows) => {
                error!("user already exists: email taken");
                return Err(RepoError::AlreadyExists {
                    entity: ENTITY,
                    field: "email".to_string(),
                });
            }
            Err(StoreError::UniqueViolation { constraint, message }) => {
                error!(constraint = ?constraint, error = %message, "user already exists");
                return Err(RepoError::AlreadyExists {
                    entity: ENTITY,
                    field: constraint.unwrap_or_else(|| "unique".to_string()),
                });
            }
            Err(source) => {
                error!(error = %source, "failed to create user");
                return Err(RepoError::Query { op: "create", source });
            }
        };

        let id: i64 = row.get(0).map_err(|source| {
            error!(error = %source, "failed to scan created user id");
            RepoError::Scan { op: "create", source }
        })?;

        info!(user_id = id, "created user");
        Ok(id)
    }

    #[instrument(skip(self), fields(op = "get_by_id"))]
    async fn get_by_id(&self, id: i64) -> Result<User, RepoError> {
        let row = match self.store.query_row(SELECT_USER_BY_ID, &[Value::Int(id)]).await {
            Ok(row) => row,
            Err(source @ StoreError::NoRows) => {
                error!(user_id = id, "user not found");
                return Err(RepoError::NotFound {
                    entity: ENTITY,
                    id,
                    source: Some(source),
                });
            }
            Err(source) => {
                error!(user_id = id, error = %source, "failed to execute get_by_id query");
                return Err(RepoError::Query { op: "get_by_id", source });
            }
        };

        scan_user(&row).map_err(|source| {
            error!(user_id = id, error = %source, "failed to scan get_by_id row");
            RepoError::Scan { op: "get_by_id", source }
        })
    }

    #[instrument(skip(self, user), fields(op = "update", user_id = user.id))]
    async fn update(&self, user: &UserUpdate) -> Result<User, RepoError> {
        let args = [
            Value::from(user.username.as_deref()),
            Value::from(user.email.as_str()),
            Value::from(user.pass_hash.as_str()),
            Value::Int(user.id),
        ];

        let row = match self.store.query_row(UPDATE_USER, &args).await {
            Ok(row) => row,
            Err(source @ StoreError::NoRows) => {
                error!("user not found");
                return Err(RepoError::NotFound {
                    entity: ENTITY,
                    id: user.id,
                    source: Some(source),
                });
            }
            Err(source) => {
                error!(error = %source, "failed to execute update query");
                return Err(RepoError::Query { op: "update", source });
            }
        };

        scan_user(&row).map_err(|source| {
            error!(error = %source, "failed to scan updated row");
            RepoError::Scan { op: "update", source }
        })
    }

    #[instrument(skip(self), fields(op = "delete"))]
    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let affected = self
            .store
            .execute(DELETE_USER, &[Value::Int(id)])
            .await
            .map_err(|source| {
                error!(user_id = id, error = %source, "failed to execute delete");
                RepoError::Exec { op: "delete", source }
            })?;

        if affected == 0 {
            error!(user_id = id, "user not found");
            return Err(RepoError::NotFound {
                entity: ENTITY,
                id,
                source: None,
            });
        }

        info!(user_id = id, "deleted user");
        Ok(())
    }

    #[instrument(skip(self), fields(op = "list"))]
    async fn list(&self, limit: u32, offset: u64) -> Result<Vec<User>, RepoError> {
        let rows = self
            .store
            .query(LIST_USERS, &[Value::from(limit), Value::from(offset)])
            .await
            .map_err(|source| {
                error!(error = %source, "failed to execute list query");
                RepoError::Query { op: "list", source }
            })?;

        // Partial results are discarded on the first failure.
        let mut users = Vec::new();
        for item in rows {
            let row = item.map_err(|source| {
                error!(error = %source, "rows iteration error in list");
                RepoError::Cursor { op: "list", source }
            })?;
            let user = scan_user(&row).map_err(|source| {
                error!(error = %source, "failed to scan list row");
                RepoError::Scan { op: "list", source }
            })?;
            users.push(user);
        }

        Ok(users)
    }

    #[instrument(skip(self), fields(op = "count"))]
    async fn count(&self) -> Result<i64, RepoError> {
        let row = self
            .store
            .query_row(COUNT_USERS, &[])
            .await
            .map_err(|source| {
                error!(error = %source, "failed to execute count query");
                RepoError::Query { op: "count", source }
            })?;

        let count: i64 = row.get(0).map_err(|source| {
            error!(error = %source, "failed to scan count");
            RepoError::Scan { op: "count", source }
        })?;

        if count == 0 {
            error!("no users found");
            return Err(RepoError::NoRecords { entity: ENTITY });
        }

        Ok(count)
    }
}
