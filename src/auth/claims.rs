use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw claim payload as issued by the identity provider (Auth0 / Google).
/// `sub` and `exp` may be absent at this layer; the validator's required-claim
/// check rejects such tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderClaims {
    pub sub: Option<String>, // "<provider>|<provider-local-id>"
    pub exp: Option<i64>,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub given_name: Option<String>,
}

/// Claims that passed signature and policy validation.
///
/// Only the token verifier can build one; everything downstream may assume
/// the subject is authentic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    subject: String,
    email: Option<String>,
    email_verified: bool,
    display_name: Option<String>,
    given_name: Option<String>,
    expires_at: DateTime<Utc>,
}

impl VerifiedClaims {
    /// Returns `None` when `sub` or `exp` is absent, or `exp` is outside the
    /// representable range.
    pub(super) fn from_provider(claims: ProviderClaims) -> Option<Self> {
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp?, 0)?;

        Some(Self {
            subject: claims.sub?,
            email: non_blank(claims.email),
            email_verified: claims.email_verified,
            display_name: non_blank(claims.name),
            given_name: non_blank(claims.given_name),
            expires_at,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn given_name(&self) -> Option<&str> {
        self.given_name.as_deref()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[cfg(test)]
impl VerifiedClaims {
    pub fn for_tests(
        subject: &str,
        email: Option<&str>,
        given_name: Option<&str>,
        display_name: Option<&str>,
    ) -> Self {
        Self {
            subject: subject.to_string(),
            email: email.map(str::to_string),
            email_verified: email.is_some(),
            display_name: display_name.map(str::to_string),
            given_name: given_name.map(str::to_string),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_claims() -> ProviderClaims {
        ProviderClaims {
            sub: Some("google-oauth2|105290470073128554236".to_string()),
            exp: Some(1_900_000_000),
            email: Some("kiril@example.com".to_string()),
            email_verified: true,
            name: Some("Kiril Ivanov".to_string()),
            given_name: Some("Kiril".to_string()),
        }
    }

    #[test]
    fn test_from_provider_copies_profile_claims() {
        let verified = VerifiedClaims::from_provider(provider_claims()).unwrap();

        assert_eq!(verified.subject(), "google-oauth2|105290470073128554236");
        assert_eq!(verified.email(), Some("kiril@example.com"));
        assert!(verified.email_verified());
        assert_eq!(verified.display_name(), Some("Kiril Ivanov"));
        assert_eq!(verified.given_name(), Some("Kiril"));
        assert_eq!(verified.expires_at().timestamp(), 1_900_000_000);
    }

    #[test]
    fn test_blank_profile_claims_are_treated_as_absent() {
        let mut claims = provider_claims();
        claims.email = Some("   ".to_string());
        claims.name = Some(String::new());

        let verified = VerifiedClaims::from_provider(claims).unwrap();

        assert_eq!(verified.email(), None);
        assert_eq!(verified.display_name(), None);
    }

    #[test]
    fn test_unrepresentable_expiry_is_rejected() {
        let mut claims = provider_claims();
        claims.exp = Some(i64::MAX);

        assert!(VerifiedClaims::from_provider(claims).is_none());
    }

    #[test]
    fn test_payload_without_sub_or_exp_still_deserializes() {
        let claims: ProviderClaims = serde_json::from_value(serde_json::json!({
            "iss": "https://volunteer-match.test/",
            "email": "kiril@example.com"
        }))
        .unwrap();

        assert!(claims.sub.is_none());
        assert!(claims.exp.is_none());
        assert!(VerifiedClaims::from_provider(claims).is_none());
    }

    #[test]
    fn test_missing_email_verified_defaults_to_false() {
        let claims: ProviderClaims = serde_json::from_value(serde_json::json!({
            "sub": "auth0|abc",
            "exp": 1_900_000_000,
            "iss": "https://volunteer-match.test/"
        }))
        .unwrap();

        assert!(!claims.email_verified);
        assert!(claims.email.is_none());
    }
}
