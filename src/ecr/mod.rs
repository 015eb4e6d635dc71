pub mod client;
pub mod config;
pub mod error;
pub mod provision;
pub mod sts;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{new_client, Client, RepositoryOptions};
pub use config::{
    resolve_client_config, AwsConfigLoader, ClientConfig, ConfigLoader, ConfigSource, LoadOptions,
    LoadedConfig, ResolveOptions, RoleAssumer,
};
pub use error::EcrError;
pub use provision::setup_repository;
pub use sts::StsRoleAssumer;
pub use token::{extract_token, RegistryAuth};

use async_trait::async_trait;

/// Operations against a container registry that the provisioning logic needs
///
/// `Client` is the ECR-backed implementation; tests substitute their own.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Check whether a repository with this name exists
    async fn repository_exists(&self, repository: &str) -> Result<bool, EcrError>;

    /// Create a repository with this name
    async fn create_repository(&self, repository: &str) -> Result<(), EcrError>;

    /// Get the pull/push URI of an existing repository
    ///
    /// (e.g., "123456789012.dkr.ecr.us-east-1.amazonaws.com/my-app")
    async fn repository_uri(&self, repository: &str) -> Result<String, EcrError>;

    /// Fetch and decode a registry authorization token
    async fn authorization_token(&self) -> Result<RegistryAuth, EcrError>;
}
