mod error;
mod layer;
mod verifier;

pub use error::JwtAuthError;
pub use layer::JwtAuthLayer;
pub use verifier::JwtVerifier;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    sub: String,
    aud: String,
    exp: usize,
}
