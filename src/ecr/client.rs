use async_trait::async_trait;
use aws_sdk_ecr::types::{ImageScanningConfiguration, Tag};
use aws_sdk_ecr::Client as EcrClient;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::config::{resolve_client_config, AwsConfigLoader, ClientConfig, ResolveOptions};
use super::error::{format_sdk_error, EcrError};
use super::sts::StsRoleAssumer;
use super::token::{extract_token, RegistryAuth};
use super::RegistryClient;

/// Settings applied to repositories created by [`Client`]
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryOptions {
    /// Enable image scanning on push for new repositories
    #[serde(default = "default_scan_on_push")]
    pub scan_on_push: bool,
    /// Tags attached to new repositories
    #[serde(default = "default_tags")]
    pub tags: BTreeMap<String, String>,
}

fn default_scan_on_push() -> bool {
    true
}

fn default_tags() -> BTreeMap<String, String> {
    BTreeMap::from([("trebuchet:managed".to_string(), "true".to_string())])
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            scan_on_push: default_scan_on_push(),
            tags: default_tags(),
        }
    }
}

/// ECR-backed [`RegistryClient`]
pub struct Client {
    ecr_client: EcrClient,
    region: String,
    repository_options: RepositoryOptions,
}

/// Resolve configuration from the default AWS sources and build a client
///
/// `options.role_arn`, when set, is assumed through STS before any ECR call.
pub async fn new_client(options: &ResolveOptions) -> Result<Client, EcrError> {
    let config = resolve_client_config(options, &StsRoleAssumer::new(), &AwsConfigLoader).await?;
    Ok(Client::new(&config))
}

impl Client {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            ecr_client: EcrClient::new(config.sdk()),
            region: config.region().unwrap_or_default().to_string(),
            repository_options: RepositoryOptions::default(),
        }
    }

    pub fn with_repository_options(mut self, options: RepositoryOptions) -> Self {
        self.repository_options = options;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

fn build_tags(options: &RepositoryOptions) -> Result<Vec<Tag>, EcrError> {
    options
        .tags
        .iter()
        .map(|(key, value)| {
            Tag::builder().key(key).value(value).build().map_err(|e| {
                EcrError::RepositoryCreate(format!("Failed to build tag '{}': {}", key, e).into())
            })
        })
        .collect()
}

#[async_trait]
impl RegistryClient for Client {
    async fn repository_exists(&self, repository: &str) -> Result<bool, EcrError> {
        match self
            .ecr_client
            .describe_repositories()
            .repository_names(repository)
            .send()
            .await
        {
            Ok(response) => Ok(!response.repositories().is_empty()),
            Err(err) => {
                if let Some(service_err) = err.as_service_error() {
                    if service_err.is_repository_not_found_exception() {
                        return Ok(false);
                    }
                }
                Err(EcrError::RepositoryQuery(
                    format!(
                        "Failed to check ECR repository existence for '{}': {}",
                        repository,
                        format_sdk_error(&err)
                    )
                    .into(),
                ))
            }
        }
    }

    async fn create_repository(&self, repository: &str) -> Result<(), EcrError> {
        info!("Creating ECR repository: {}", repository);

        self.ecr_client
            .create_repository()
            .repository_name(repository)
            .set_tags(Some(build_tags(&self.repository_options)?))
            .image_scanning_configuration(
                ImageScanningConfiguration::builder()
                    .scan_on_push(self.repository_options.scan_on_push)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                EcrError::RepositoryCreate(
                    format!(
                        "Failed to create ECR repository '{}': {}",
                        repository,
                        format_sdk_error(&e)
                    )
                    .into(),
                )
            })?;

        info!("Created ECR repository: {}", repository);
        Ok(())
    }

    async fn repository_uri(&self, repository: &str) -> Result<String, EcrError> {
        let response = self
            .ecr_client
            .describe_repositories()
            .repository_names(repository)
            .send()
            .await
            .map_err(|e| {
                EcrError::RepositoryLookup(
                    format!(
                        "Failed to look up ECR repository '{}': {}",
                        repository,
                        format_sdk_error(&e)
                    )
                    .into(),
                )
            })?;

        let uri = response
            .repositories()
            .first()
            .and_then(|repo| repo.repository_uri())
            .ok_or_else(|| {
                EcrError::RepositoryLookup(
                    format!("No URI returned for ECR repository '{}'", repository).into(),
                )
            })?;

        debug!("ECR repository {} has URI {}", repository, uri);
        Ok(uri.to_string())
    }

    async fn authorization_token(&self) -> Result<RegistryAuth, EcrError> {
        debug!("Requesting ECR authorization token in {}", self.region);

        let response = self
            .ecr_client
            .get_authorization_token()
            .send()
            .await
            .map_err(|e| {
                EcrError::AuthorizationToken(
                    format!(
                        "Failed to get ECR authorization token: {}",
                        format_sdk_error(&e)
                    )
                    .into(),
                )
            })?;

        let auth_data = response.authorization_data().first().ok_or_else(|| {
            EcrError::AuthorizationToken("No authorization data returned from ECR".into())
        })?;

        let token = auth_data.authorization_token().ok_or_else(|| {
            EcrError::AuthorizationToken("No authorization token in response".into())
        })?;

        extract_token(token, auth_data.proxy_endpoint().unwrap_or_default())
    }
}
