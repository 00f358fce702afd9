use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, Header, Validation};
use metrics::counter;
use std::sync::Arc;

use super::{
    claims::{ProviderClaims, VerifiedClaims},
    jwks::JwksCache,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication: no Authorization header")]
    MissingToken,

    #[error("Authorization header must be 'Bearer <token>'")]
    MalformedHeader,

    #[error("Bearer token is not a well-formed JWT")]
    MalformedToken,

    #[error("Token signed with an unknown key")]
    UnknownSigningKey,

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token claims do not match policy")]
    ClaimsMismatch,
}

impl AuthError {
    fn outcome(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnknownSigningKey => "unknown_signing_key",
            AuthError::BadSignature => "bad_signature",
            AuthError::ExpiredToken => "expired_token",
            AuthError::ClaimsMismatch => "claims_mismatch",
        }
    }
}

/// What a token must satisfy besides a good signature.
#[derive(Debug, Clone)]
pub struct VerifierPolicy {
    pub issuer: String,
    pub audience: Option<String>,
    /// Pinned by configuration; the token's own `alg` header is never trusted.
    pub algorithm: Algorithm,
    pub leeway_secs: u64,
}

pub struct TokenVerifier {
    keys: Arc<JwksCache>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: Arc<JwksCache>, policy: VerifierPolicy) -> Self {
        let mut validation = Validation::new(policy.algorithm);
        validation.set_issuer(&[&policy.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;
        validation.leeway = policy.leeway_secs;

        match &policy.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self { keys, validation }
    }

    pub fn keys(&self) -> &Arc<JwksCache> {
        &self.keys
    }

    /// Verify the raw `Authorization` header value.
    pub async fn verify(&self, authorization: Option<&str>) -> Result<VerifiedClaims, AuthError> {
        let result = match bearer_token(authorization) {
            Ok(token) => self.verify_token(token).await,
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.outcome(),
        };
        counter!("auth_verifications_total", "outcome" => outcome).increment(1);

        result
    }

    async fn verify_token(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MalformedToken)?;

        let decoding_key = self.keys.get_decoding_key(&kid).await.map_err(|e| {
            tracing::debug!(error = %e, kid, "Signing key not resolvable");
            AuthError::UnknownSigningKey
        })?;

        let token_data = decode::<ProviderClaims>(token, &decoding_key, &self.validation)
            .map_err(|e| classify(e.kind()))?;

        VerifiedClaims::from_provider(token_data.claims).ok_or(AuthError::MalformedToken)
    }
}

/// Extract the token from `Bearer <token>`. The scheme is case-insensitive
/// and exactly one token segment must follow it.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
    let value = authorization
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

fn decode_header(token: &str) -> Result<Header, AuthError> {
    // header.payload.signature, none of them empty
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        return Err(AuthError::MalformedToken);
    }

    jsonwebtoken::decode_header(token).map_err(|_| AuthError::MalformedToken)
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
            AuthError::BadSignature
        }
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_) => AuthError::ClaimsMismatch,
        ErrorKind::InvalidKeyFormat | ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidEcdsaKey => {
            AuthError::UnknownSigningKey
        }
        _ => AuthError::MalformedToken,
    }
}
