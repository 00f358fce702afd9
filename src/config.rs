use axum::http::HeaderValue;
use jsonwebtoken::Algorithm;
use std::{env, str::FromStr, time::Duration};

use crate::auth::VerifierPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub cors_origin: HeaderValue,
    pub auth: AuthConfig,
    pub store_timeout: Duration,
}

/// Identity provider settings.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub issuer: String,
    pub jwks_url: String,
    pub audience: Option<String>,
    pub algorithm: Algorithm,
    pub leeway_secs: u64,
    pub jwks_ttl: Duration,
    pub jwks_refresh_cooldown: Duration,
    pub jwks_fetch_timeout: Duration,
}

impl AuthConfig {
    pub fn policy(&self) -> VerifierPolicy {
        VerifierPolicy {
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            algorithm: self.algorithm,
            leeway_secs: self.leeway_secs,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").ok_or("DATABASE_URL must be set")?;

        let domain = var("AUTH0_DOMAIN").map(|d| normalize_domain(&d));
        let issuer = match (var("AUTH_ISSUER"), &domain) {
            (Some(issuer), _) => issuer,
            (None, Some(domain)) => format!("https://{}/", domain),
            (None, None) => return Err("AUTH0_DOMAIN or AUTH_ISSUER must be set".to_string()),
        };
        let jwks_url = match (var("AUTH_JWKS_URL"), &domain) {
            (Some(url), _) => url,
            (None, Some(domain)) => format!("https://{}/.well-known/jwks.json", domain),
            (None, None) => return Err("AUTH0_DOMAIN or AUTH_JWKS_URL must be set".to_string()),
        };

        let algorithm = parse_algorithm(var("AUTH_ALGORITHM").as_deref().unwrap_or("RS256"))?;

        let auth = AuthConfig {
            issuer,
            jwks_url,
            audience: var("AUTH0_AUDIENCE"),
            algorithm,
            leeway_secs: parse_secs(&var, "AUTH_LEEWAY_SECS", 0)?,
            jwks_ttl: Duration::from_secs(parse_secs(&var, "JWKS_CACHE_TTL_SECS", 3600)?),
            jwks_refresh_cooldown: Duration::from_secs(parse_secs(
                &var,
                "JWKS_REFRESH_COOLDOWN_SECS",
                30,
            )?),
            jwks_fetch_timeout: Duration::from_secs(parse_secs(&var, "JWKS_FETCH_TIMEOUT_SECS", 5)?),
        };

        let cors_origin = var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        let cors_origin = HeaderValue::from_str(&cors_origin)
            .map_err(|_| format!("CORS_ORIGIN {} is not a valid header value", cors_origin))?;

        Ok(Self {
            database_url,
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            cors_origin,
            auth,
            store_timeout: Duration::from_secs(parse_secs(&var, "STORE_TIMEOUT_SECS", 5)?),
        })
    }
}

// Accepts "tenant.us.auth0.com", "https://tenant.us.auth0.com/" and the like.
fn normalize_domain(domain: &str) -> String {
    domain
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

fn parse_algorithm(name: &str) -> Result<Algorithm, String> {
    let algorithm = Algorithm::from_str(name.trim())
        .map_err(|_| format!("AUTH_ALGORITHM {} is not a known JWT algorithm", name))?;

    // Provider keys are public keys; a shared-secret algorithm can never verify them.
    if matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
        return Err(format!("AUTH_ALGORITHM {} is not an asymmetric algorithm", name));
    }

    Ok(algorithm)
}

fn parse_secs<F>(var: &F, key: &str, default: u64) -> Result<u64, String>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| format!("{} must be a whole number of seconds", key)),
        None => Ok(default),
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/volunteer_match_test".to_string()),
            "AUTH_ISSUER" => Some(crate::test_support::ISSUER.to_string()),
            "AUTH_JWKS_URL" => Some("https://volunteer-match.test/.well-known/jwks.json".to_string()),
            _ => None,
        })
        .unwrap()
    }
}
