pub mod pool;
pub mod users;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::models::{NewUser, UpdateProfileInput, UserRecord};

pub use pool::create_pool;
pub use users::PgUserStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("User store did not respond within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(UserRecord),
    /// A record with the same subject already exists.
    AlreadyExists,
}

/// Persistence for user records. Implementations must enforce uniqueness of
/// `subject`, so `insert_if_absent` creates at most one record per subject
/// even under concurrent callers.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError>;

    /// Email is not unique; the oldest record with that address wins.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;

    async fn insert_if_absent(&self, user: &NewUser) -> Result<InsertOutcome, StoreError>;

    /// Apply the supplied fields; `None` when no record has that subject.
    async fn update_fields(
        &self,
        subject: &str,
        changes: &UpdateProfileInput,
    ) -> Result<Option<UserRecord>, StoreError>;
}

/// Run a store operation with an upper bound on how long it may take.
pub async fn bounded<T, F>(limit: Duration, operation: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_through_result() {
        let value = bounded(Duration::from_secs(1), async { Ok::<_, StoreError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result = bounded(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, StoreError>(())
        })
        .await;

        assert!(matches!(result, Err(StoreError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_bounded_keeps_store_errors() {
        let result: Result<(), StoreError> = bounded(Duration::from_secs(1), async {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        })
        .await;

        assert!(matches!(result, Err(StoreError::Database(_))));
    }
}
