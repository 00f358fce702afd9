use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub const DEFAULT_NAME: &str = "Unknown";
pub const DEFAULT_BIO: &str = "New user";
pub const DEFAULT_LOCATION: &str = "Unknown";
pub const DEFAULT_PHONE_NUMBER: &str = "Unknown";
pub const DEFAULT_PROFILE_PICTURE: &str = "/placeholder.jpeg";

/// Local user record, keyed for reconciliation by the provider `subject`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserRecord {
    pub id: i64,
    pub subject: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub location: String,
    pub phone_number: String,
    pub profile_picture: String,
    pub created_at: DateTime<Utc>,
}

/// A record about to be inserted; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub subject: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub location: String,
    pub phone_number: String,
    pub profile_picture: String,
}
