// In-memory registry for exercising the command handlers

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Mutex;

use trebuchet::ecr::{EcrError, RegistryAuth, RegistryClient};

pub(crate) const REGISTRY_HOST: &str = "123456789012.dkr.ecr.us-east-1.amazonaws.com";

/// Registry whose repositories live in a set; every call is logged
#[derive(Debug, Default)]
pub(crate) struct MemoryRegistry {
    repositories: Mutex<BTreeSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryRegistry {
    pub(crate) fn with_repositories(names: &[&str]) -> Self {
        Self {
            repositories: Mutex::new(names.iter().map(|n| n.to_string()).collect()),
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn contains(&self, repository: &str) -> bool {
        self.repositories.lock().unwrap().contains(repository)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub(crate) fn registry_auth() -> RegistryAuth {
    RegistryAuth {
        username: "AWS".to_string(),
        password: "ecrregistrycredentials".to_string(),
        proxy_endpoint: format!("https://{}", REGISTRY_HOST),
    }
}

#[async_trait]
impl RegistryClient for MemoryRegistry {
    async fn repository_exists(&self, repository: &str) -> Result<bool, EcrError> {
        self.record(format!("repository_exists:{}", repository));
        Ok(self.contains(repository))
    }

    async fn create_repository(&self, repository: &str) -> Result<(), EcrError> {
        self.record(format!("create_repository:{}", repository));
        self.repositories
            .lock()
            .unwrap()
            .insert(repository.to_string());
        Ok(())
    }

    async fn repository_uri(&self, repository: &str) -> Result<String, EcrError> {
        self.record(format!("repository_uri:{}", repository));
        if !self.contains(repository) {
            return Err(EcrError::RepositoryLookup(
                format!("repository {} not found", repository).into(),
            ));
        }
        Ok(format!("{}/{}", REGISTRY_HOST, repository))
    }

    async fn authorization_token(&self) -> Result<RegistryAuth, EcrError> {
        self.record("authorization_token".to_string());
        Ok(registry_auth())
    }
}
