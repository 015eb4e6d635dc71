use tracing::{debug, info};

use super::{EcrError, RegistryClient};

/// Make sure `repository` exists and return its URI
///
/// Creates the repository when it is missing. Any failure is returned as-is
/// and no URI is produced. The existence check and the create are separate
/// calls, so a concurrent creator shows up as a create error.
pub async fn setup_repository<C>(client: &C, repository: &str) -> Result<String, EcrError>
where
    C: RegistryClient + ?Sized,
{
    if client.repository_exists(repository).await? {
        debug!("Repository {} already exists", repository);
    } else {
        info!("Repository {} does not exist, creating it", repository);
        client.create_repository(repository).await?;
    }

    client.repository_uri(repository).await
}
