use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::{InsertOutcome, StoreError, UserStore};
use crate::models::{NewUser, UpdateProfileInput, UserRecord};

/// In-memory store with the same subject-uniqueness contract as Postgres.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
    inserts: AtomicUsize,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count_with_subject(&self, subject: &str) -> usize {
        self.users
            .read()
            .await
            .values()
            .filter(|u| u.subject == subject)
            .count()
    }

    /// Number of successful inserts.
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(subject).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.values().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.email == email)
            .min_by_key(|u| u.id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut users: Vec<_> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn insert_if_absent(&self, user: &NewUser) -> Result<InsertOutcome, StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.subject) {
            return Ok(InsertOutcome::AlreadyExists);
        }

        let record = UserRecord {
            id: users.len() as i64 + 1,
            subject: user.subject.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: user.bio.clone(),
            location: user.location.clone(),
            phone_number: user.phone_number.clone(),
            profile_picture: user.profile_picture.clone(),
            created_at: Utc::now(),
        };
        users.insert(user.subject.clone(), record.clone());
        self.inserts.fetch_add(1, Ordering::SeqCst);

        Ok(InsertOutcome::Inserted(record))
    }

    async fn update_fields(
        &self,
        subject: &str,
        changes: &UpdateProfileInput,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(subject) else {
            return Ok(None);
        };

        let fields = [
            (&mut user.first_name, &changes.first_name),
            (&mut user.last_name, &changes.last_name),
            (&mut user.phone_number, &changes.phone_number),
            (&mut user.location, &changes.location),
            (&mut user.bio, &changes.bio),
            (&mut user.profile_picture, &changes.profile_picture),
        ];
        for (field, change) in fields {
            if let Some(value) = change {
                *field = value.clone();
            }
        }

        Ok(Some(user.clone()))
    }
}
