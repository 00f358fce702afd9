use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserRecord;
use crate::AppError;

const MAX_BIO_LEN: usize = 1000;
const MAX_FIELD_LEN: usize = 200;

/// Input for updating own profile (self-service). Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

impl UpdateProfileInput {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone_number.is_none()
            && self.location.is_none()
            && self.bio.is_none()
            && self.profile_picture.is_none()
    }

    /// Trim every supplied field and reject empty or oversized values.
    pub fn validated(self) -> Result<Self, AppError> {
        if self.is_empty() {
            return Err(AppError::BadRequest(
                "No valid fields provided for update.".to_string(),
            ));
        }

        Ok(Self {
            first_name: check("first_name", self.first_name, MAX_FIELD_LEN)?,
            last_name: check("last_name", self.last_name, MAX_FIELD_LEN)?,
            phone_number: check("phone_number", self.phone_number, MAX_FIELD_LEN)?,
            location: check("location", self.location, MAX_FIELD_LEN)?,
            bio: check("bio", self.bio, MAX_BIO_LEN)?,
            profile_picture: check("profile_picture", self.profile_picture, MAX_FIELD_LEN)?,
        })
    }
}

fn check(field: &str, value: Option<String>, max_len: usize) -> Result<Option<String>, AppError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be blank", field)));
    }
    if value.chars().count() > max_len {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }

    Ok(Some(value))
}

/// Response for a successful profile update
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: UserRecord,
}
