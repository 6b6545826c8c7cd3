pub mod error;
pub mod pool;
pub mod repos;
pub mod scripted;
pub mod store;

use std::future::Future;
use std::time::Duration;

use tracing::warn;

pub use error::{ErrorKind, RepoError, ScanError, StoreError};
pub use pool::PgStore;
pub use repos::{UserRepo, UserRepository};
pub use scripted::{Expectation, ScriptedStore};
pub use store::{FromValue, Row, Rows, Store, Value};

/// Run a repository call under a deadline.
///
/// When the deadline passes first the call's future is dropped, which
/// abandons the in-flight statement, and `DeadlineExceeded` is returned.
pub async fn with_deadline<T, F>(deadline: Duration, op: F) -> Result<T, RepoError>
where
    F: Future<Output = Result<T, RepoError>>,
{
    match tokio::time::timeout(deadline, op).await {
        Ok(result) => result,
        Err(_) => {
            warn!(deadline_ms = deadline.as_millis() as u64, "repository call timed out");
            Err(RepoError::DeadlineExceeded { after: deadline })
        }
    }
}
