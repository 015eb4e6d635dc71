// Resolution of the AWS configuration used by the ECR client

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;
use serde::Deserialize;
use tracing::{debug, info};

use super::error::{BoxError, EcrError};

lazy_static::lazy_static! {
    static ref REGION_PATTERN: regex::Regex =
        regex::Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]*)?-[a-z]+-\d+$").unwrap();
}

/// Where a piece of the resolved configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `AWS_*` environment variables
    Environment,
    /// Shared config/credentials files, with the selected profile if any
    SharedConfig { profile: Option<String> },
    /// Region given explicitly by the caller
    RegionOverride(String),
    /// Credentials replaced by an assumed role
    AssumedRole { role_arn: String },
}

/// Caller-supplied inputs to configuration resolution
///
/// Empty strings are treated the same as `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveOptions {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub role_arn: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl ResolveOptions {
    pub fn region(&self) -> Option<&str> {
        non_empty(&self.region)
    }

    pub fn role_arn(&self) -> Option<&str> {
        non_empty(&self.role_arn)
    }

    pub fn profile(&self) -> Option<&str> {
        non_empty(&self.profile)
    }
}

/// Options handed to a [`ConfigLoader`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub profile: Option<String>,
}

/// Output of a [`ConfigLoader`]
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub sdk: SdkConfig,
    pub sources: Vec<ConfigSource>,
}

/// Loads the base AWS configuration (files, environment, profiles)
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    async fn load(&self, options: LoadOptions) -> Result<LoadedConfig, BoxError>;
}

/// Exchanges the current configuration for credentials of another role
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn assume_role(
        &self,
        config: &SdkConfig,
        role_arn: &str,
    ) -> Result<SharedCredentialsProvider, BoxError>;
}

/// [`ConfigLoader`] backed by the `aws-config` default provider chains
#[derive(Debug, Clone, Default)]
pub struct AwsConfigLoader;

#[async_trait]
impl ConfigLoader for AwsConfigLoader {
    async fn load(&self, options: LoadOptions) -> Result<LoadedConfig, BoxError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &options.profile {
            debug!("Loading AWS configuration for profile {}", profile);
            loader = loader.profile_name(profile);
        }

        let sdk = loader.load().await;

        Ok(LoadedConfig {
            sdk,
            sources: vec![
                ConfigSource::Environment,
                ConfigSource::SharedConfig {
                    profile: options.profile,
                },
            ],
        })
    }
}

/// Effective configuration for talking to ECR
///
/// Always carries a credentials provider and a valid region.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    sdk: SdkConfig,
    sources: Vec<ConfigSource>,
}

impl ClientConfig {
    pub fn sdk(&self) -> &SdkConfig {
        &self.sdk
    }

    pub fn region(&self) -> Option<&str> {
        self.sdk.region().map(|r| r.as_ref())
    }

    pub fn credentials_provider(&self) -> Option<SharedCredentialsProvider> {
        self.sdk.credentials_provider()
    }

    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }
}

fn validate_region(region: &str) -> Result<(), EcrError> {
    if REGION_PATTERN.is_match(region) {
        Ok(())
    } else {
        Err(EcrError::InvalidRegion(region.to_string()))
    }
}

/// Build the effective client configuration
///
/// 1. Load the base configuration, selecting `profile` when given.
/// 2. Override the region when `region` is given.
/// 3. Require a credentials provider and a valid region.
/// 4. When `role_arn` is given, swap the credentials for the assumed role's.
///
/// Errors from the loader and the role assumer are passed through unchanged.
pub async fn resolve_client_config<A, L>(
    options: &ResolveOptions,
    role_assumer: &A,
    loader: &L,
) -> Result<ClientConfig, EcrError>
where
    A: RoleAssumer + ?Sized,
    L: ConfigLoader + ?Sized,
{
    let load_options = LoadOptions {
        profile: options.profile().map(str::to_string),
    };
    let LoadedConfig { sdk, mut sources } = loader
        .load(load_options)
        .await
        .map_err(EcrError::ConfigLoad)?;

    let sdk = match options.region() {
        Some(region) => {
            debug!("Using region {} from caller", region);
            sources.push(ConfigSource::RegionOverride(region.to_string()));
            sdk.to_builder()
                .region(Region::new(region.to_string()))
                .build()
        }
        None => sdk,
    };

    if sdk.credentials_provider().is_none() {
        return Err(EcrError::NoCredentials);
    }

    let region = sdk.region().ok_or(EcrError::MissingRegion)?;
    validate_region(region.as_ref())?;

    let sdk = match options.role_arn() {
        Some(role_arn) => {
            info!("Assuming role {}", role_arn);
            let credentials = role_assumer
                .assume_role(&sdk, role_arn)
                .await
                .map_err(EcrError::RoleAssumption)?;
            sources.push(ConfigSource::AssumedRole {
                role_arn: role_arn.to_string(),
            });
            sdk.to_builder().credentials_provider(credentials).build()
        }
        None => sdk,
    };

    Ok(ClientConfig { sdk, sources })
}
