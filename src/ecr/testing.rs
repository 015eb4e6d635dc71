// Hand-written test doubles for the registry traits

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use super::error::BoxError;
use super::{EcrError, RegistryAuth, RegistryClient};

/// Serializes tests that touch process-wide environment variables
static ENV_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Canned result for one fake operation
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Ok(T),
    Err(&'static str),
    /// Calling the operation fails the test
    Unexpected,
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Outcome::Unexpected
    }
}

impl<T: Clone> Outcome<T> {
    fn resolve(&self, op: &str, wrap: fn(BoxError) -> EcrError) -> Result<T, EcrError> {
        match self {
            Outcome::Ok(value) => Ok(value.clone()),
            Outcome::Err(message) => Err(wrap((*message).into())),
            Outcome::Unexpected => panic!("unexpected call to {}", op),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeRegistry {
    pub exists: Outcome<bool>,
    pub create: Outcome<()>,
    pub uri: Outcome<String>,
    pub token: Outcome<RegistryAuth>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeRegistry {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        let prefix = format!("{}:", op);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(&prefix) || c.as_str() == op)
            .count()
    }
}

#[async_trait]
impl RegistryClient for FakeRegistry {
    async fn repository_exists(&self, repository: &str) -> Result<bool, EcrError> {
        self.record(format!("repository_exists:{}", repository));
        self.exists
            .resolve("repository_exists", EcrError::RepositoryQuery)
    }

    async fn create_repository(&self, repository: &str) -> Result<(), EcrError> {
        self.record(format!("create_repository:{}", repository));
        self.create
            .resolve("create_repository", EcrError::RepositoryCreate)
    }

    async fn repository_uri(&self, repository: &str) -> Result<String, EcrError> {
        self.record(format!("repository_uri:{}", repository));
        self.uri.resolve("repository_uri", EcrError::RepositoryLookup)
    }

    async fn authorization_token(&self) -> Result<RegistryAuth, EcrError> {
        self.record("authorization_token".to_string());
        self.token
            .resolve("authorization_token", EcrError::AuthorizationToken)
    }
}
