//! Fixtures shared by unit tests: RSA signing keys, a controllable key
//! source and token minting helpers.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{jwk::JwkSet, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::auth::{
    jwks::{KeySetError, KeySource},
    JwksCache, TokenVerifier, VerifierPolicy,
};

pub const ISSUER: &str = "https://volunteer-match.test/";

const KEY_A_PEM: &str = include_str!("auth/testdata/key-a.pem");
const KEY_B_PEM: &str = include_str!("auth/testdata/key-b.pem");
const KEY_A_JWKS: &str = include_str!("auth/testdata/key-a.jwks.json");
const KEY_B_JWKS: &str = include_str!("auth/testdata/key-b.jwks.json");

pub fn jwks_with(kids: &[&str]) -> JwkSet {
    let keys = kids
        .iter()
        .flat_map(|kid| {
            let doc = match *kid {
                "key-a" => KEY_A_JWKS,
                "key-b" => KEY_B_JWKS,
                other => panic!("no fixture for kid {other}"),
            };
            serde_json::from_str::<JwkSet>(doc).unwrap().keys
        })
        .collect();

    JwkSet { keys }
}

pub struct StaticKeySource {
    keys: Mutex<Result<JwkSet, u16>>,
    fetches: AtomicUsize,
}

impl StaticKeySource {
    pub fn new(keys: JwkSet) -> Self {
        Self {
            keys: Mutex::new(Ok(keys)),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set_keys(&self, keys: JwkSet) {
        *self.keys.lock().unwrap() = Ok(keys);
    }

    pub fn fail_with(&self, status: u16) {
        *self.keys.lock().unwrap() = Err(status);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().clone().map_err(KeySetError::Status)
    }
}

pub fn policy() -> VerifierPolicy {
    VerifierPolicy {
        issuer: ISSUER.to_string(),
        audience: None,
        algorithm: Algorithm::RS256,
        leeway_secs: 0,
    }
}

pub fn verifier_over(source: Arc<StaticKeySource>, policy: VerifierPolicy) -> TokenVerifier {
    let keys = Arc::new(JwksCache::new(source, Duration::from_secs(3600), Duration::ZERO));
    TokenVerifier::new(keys, policy)
}

/// Claims for a freshly signed-in Google user, valid for an hour.
pub fn claims_for(subject: &str) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "sub": subject,
        "iss": ISSUER,
        "iat": now,
        "exp": now + 3600,
        "email": "kiril@example.com",
        "email_verified": true,
        "name": "Kiril Ivanov",
        "given_name": "Kiril",
    })
}

pub fn sign(kid: &str, alg: Algorithm, claims: &Value) -> String {
    let pem = match kid {
        "key-a" => KEY_A_PEM,
        "key-b" => KEY_B_PEM,
        other => panic!("no fixture for kid {other}"),
    };

    let mut header = Header::new(alg);
    header.kid = Some(kid.to_string());

    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    jsonwebtoken::encode(&header, claims, &key).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
