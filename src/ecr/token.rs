use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::error::EcrError;

/// Credentials for `docker login` against an ECR registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryAuth {
    pub username: String,
    pub password: String,
    /// Registry endpoint the token was issued for (e.g. "https://123456789012.dkr.ecr.us-east-1.amazonaws.com")
    pub proxy_endpoint: String,
}

/// Decode an ECR authorization token into a username/password pair
///
/// The token is base64 over `username:password`. Only the first `:` separates
/// the two halves. `registry_endpoint` is carried into the result untouched.
pub fn extract_token(encoded: &str, registry_endpoint: &str) -> Result<RegistryAuth, EcrError> {
    let decoded = BASE64
        .decode(encoded)
        .map_err(|e| EcrError::TokenDecode(Box::new(e)))?;
    let decoded = String::from_utf8(decoded).map_err(|e| EcrError::TokenDecode(Box::new(e)))?;

    let parts: Vec<&str> = decoded.splitn(2, ':').collect();
    if parts.len() != 2 {
        return Err(EcrError::InvalidToken {
            expected: 2,
            actual: parts.len(),
        });
    }

    Ok(RegistryAuth {
        username: parts[0].to_string(),
        password: parts[1].to_string(),
        proxy_endpoint: registry_endpoint.to_string(),
    })
}
