use thiserror::Error;

/// Boxed upstream error carried by the pass-through variants
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum EcrError {
    /// The base configuration loader failed
    #[error(transparent)]
    ConfigLoad(BoxError),

    /// The resolved configuration carries no credentials provider.
    ///
    /// Callers branch on this variant with `matches!` or
    /// [`EcrError::is_no_credentials`], never on its message.
    #[error("no AWS credentials were found")]
    NoCredentials,

    #[error("no AWS region configured; pass --region or set one in your AWS profile")]
    MissingRegion,

    #[error("invalid AWS region '{0}'")]
    InvalidRegion(String),

    #[error(transparent)]
    RoleAssumption(BoxError),

    #[error(transparent)]
    RepositoryQuery(BoxError),

    #[error(transparent)]
    RepositoryCreate(BoxError),

    #[error(transparent)]
    RepositoryLookup(BoxError),

    #[error(transparent)]
    AuthorizationToken(BoxError),

    #[error("failed to decode authorization token: {0}")]
    TokenDecode(#[source] BoxError),

    #[error("invalid token: expected {expected} parts, got {actual}")]
    InvalidToken { expected: usize, actual: usize },
}

impl EcrError {
    pub fn is_no_credentials(&self) -> bool {
        matches!(self, EcrError::NoCredentials)
    }
}

/// Extract a clean error message from an AWS SDK error's Debug output
///
/// The AWS SDK errors have verbose Debug output and a terse Display, so we
/// pull out the `message: Some("...")` field when there is one.
pub(crate) fn format_sdk_error<E: std::fmt::Debug>(err: &E) -> String {
    let debug_str = format!("{:?}", err);

    // Pattern: message: Some("actual error message")
    if let Some(start) = debug_str.find("message: Some(\"") {
        let start = start + 15;
        if let Some(end) = debug_str[start..].find("\")") {
            return debug_str[start..start + end].to_string();
        }
    }

    // Fallback: a Message field from the raw JSON response
    if let Some(start) = debug_str.find("\"Message\":\"") {
        let start = start + 11;
        if let Some(end) = debug_str[start..].find('"') {
            return debug_str[start..start + end].to_string();
        }
    }

    if debug_str.len() > 200 {
        let cut = (0..=200)
            .rev()
            .find(|i| debug_str.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}...", &debug_str[..cut])
    } else {
        debug_str
    }
}
