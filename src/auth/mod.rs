//! Identity gate: bearer-token verification against the provider's key set,
//! followed by reconciliation of the verified subject to a local user record.

pub mod claims;
pub mod jwks;
pub mod jwt;
pub mod reconcile;

pub use claims::VerifiedClaims;
pub use jwks::{HttpKeySource, JwksCache};
pub use jwt::{AuthError, TokenVerifier, VerifierPolicy};
pub use reconcile::{IdentityReconciler, ReconcileError};
