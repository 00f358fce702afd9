use metrics::counter;
use std::sync::Arc;

use super::claims::VerifiedClaims;
use crate::{
    db::{InsertOutcome, StoreError, UserStore},
    models::{
        user::{
            DEFAULT_BIO, DEFAULT_LOCATION, DEFAULT_NAME, DEFAULT_PHONE_NUMBER,
            DEFAULT_PROFILE_PICTURE,
        },
        NewUser, UserRecord,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Token is missing required claim: {0}")]
    MissingRequiredClaim(&'static str),

    #[error("User store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ReconcileError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconcileError::StoreUnavailable(_))
    }
}

impl From<StoreError> for ReconcileError {
    fn from(e: StoreError) -> Self {
        ReconcileError::StoreUnavailable(e.to_string())
    }
}

/// Maps a verified external identity onto exactly one local user record.
#[derive(Clone)]
pub struct IdentityReconciler {
    store: Arc<dyn UserStore>,
}

impl IdentityReconciler {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Return the record for `claims.subject()`, creating it on first sight.
    ///
    /// Existing records are returned as stored; profile drift upstream is not
    /// copied over. Concurrent first sign-ins for the same subject all resolve
    /// to the single record the store accepted.
    pub async fn reconcile(&self, claims: &VerifiedClaims) -> Result<UserRecord, ReconcileError> {
        let subject = claims.subject();

        if let Some(user) = self.store.find_by_subject(subject).await? {
            return Ok(user);
        }

        let new_user = new_user_from(claims)?;

        match self.store.insert_if_absent(&new_user).await? {
            InsertOutcome::Inserted(user) => {
                counter!("users_created_total").increment(1);
                tracing::info!(
                    subject,
                    user_id = user.id,
                    email_verified = claims.email_verified(),
                    "User created on first sign-in"
                );
                Ok(user)
            }
            InsertOutcome::AlreadyExists => {
                tracing::debug!(subject, "User created by a concurrent sign-in, re-fetching");
                self.store.find_by_subject(subject).await?.ok_or_else(|| {
                    ReconcileError::StoreUnavailable(format!(
                        "record for {} reported as existing but not found",
                        subject
                    ))
                })
            }
        }
    }
}

fn new_user_from(claims: &VerifiedClaims) -> Result<NewUser, ReconcileError> {
    let email = claims
        .email()
        .ok_or(ReconcileError::MissingRequiredClaim("email"))?;

    let name_tokens: Vec<&str> = claims
        .display_name()
        .map(|name| name.split_whitespace().collect())
        .unwrap_or_default();

    let first_name = claims
        .given_name()
        .or_else(|| name_tokens.first().copied())
        .unwrap_or(DEFAULT_NAME);
    let last_name = name_tokens.last().copied().unwrap_or(DEFAULT_NAME);

    Ok(NewUser {
        subject: claims.subject().to_string(),
        email: email.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        bio: DEFAULT_BIO.to_string(),
        location: DEFAULT_LOCATION.to_string(),
        phone_number: DEFAULT_PHONE_NUMBER.to_string(),
        profile_picture: DEFAULT_PROFILE_PICTURE.to_string(),
    })
}
