use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use aws_sdk_sts::Client as StsClient;
use std::time::SystemTime;
use tracing::{debug, info};

use super::config::RoleAssumer;
use super::error::{format_sdk_error, BoxError};

/// Prefix for STS session names, followed by a random suffix
const SESSION_NAME_PREFIX: &str = "trebuchet";

/// Assumes roles through STS `AssumeRole`
///
/// The temporary credentials are fetched once and handed out as a static
/// provider. They are not refreshed; a long-running caller should resolve a
/// new configuration before they expire (one hour by default).
#[derive(Debug, Clone, Default)]
pub struct StsRoleAssumer {
    duration_seconds: Option<i32>,
}

impl StsRoleAssumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a specific session duration instead of the role's default
    pub fn with_duration_seconds(mut self, seconds: i32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

fn session_name() -> String {
    format!("{}-{}", SESSION_NAME_PREFIX, uuid::Uuid::new_v4().simple())
}

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume_role(
        &self,
        config: &SdkConfig,
        role_arn: &str,
    ) -> Result<SharedCredentialsProvider, BoxError> {
        let client = StsClient::new(config);
        let session_name = session_name();

        debug!(
            "Calling sts:AssumeRole for {} (session {})",
            role_arn, session_name
        );

        let response = client
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(&session_name)
            .set_duration_seconds(self.duration_seconds)
            .send()
            .await
            .map_err(|e| {
                format!(
                    "Failed to assume role '{}': {}",
                    role_arn,
                    format_sdk_error(&e)
                )
            })?;

        let creds = response
            .credentials()
            .ok_or_else(|| format!("No credentials returned when assuming role '{}'", role_arn))?;

        let expires_after = SystemTime::try_from(*creds.expiration()).ok();

        info!("Assumed role {}", role_arn);

        Ok(SharedCredentialsProvider::new(Credentials::new(
            creds.access_key_id(),
            creds.secret_access_key(),
            Some(creds.session_token().to_string()),
            expires_after,
            "AssumeRole",
        )))
    }
}
