pub mod docker;
pub mod push;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use docker::ContainerCli;
use trebuchet::ecr::{new_client, setup_repository, Client, RegistryAuth, RegistryClient};
use trebuchet::settings::Settings;

/// Output format for `trebuchet credentials`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CredentialsFormat {
    /// `username`, `password` and `endpoint` on separate lines
    #[default]
    Text,
    Json,
}

/// Resolve AWS configuration and build an ECR client from settings
pub async fn build_client(settings: &Settings) -> Result<Client> {
    let client = new_client(&settings.aws)
        .await
        .context("Failed to configure AWS ECR client")?;
    Ok(client.with_repository_options(settings.repository.clone()))
}

/// Ensure a repository exists and print its URI
pub async fn handle_repository<C>(client: &C, name: &str) -> Result<()>
where
    C: RegistryClient + ?Sized,
{
    let uri = setup_repository(client, name)
        .await
        .with_context(|| format!("Failed to set up repository '{}'", name))?;
    println!("{}", uri);
    Ok(())
}

fn format_credentials(auth: &RegistryAuth, format: CredentialsFormat) -> Result<String> {
    match format {
        CredentialsFormat::Text => Ok(format!(
            "username: {}\npassword: {}\nendpoint: {}",
            auth.username, auth.password, auth.proxy_endpoint
        )),
        CredentialsFormat::Json => {
            serde_json::to_string_pretty(auth).context("Failed to serialize credentials")
        }
    }
}

/// Fetch registry credentials and render them in `format`
pub async fn fetch_credentials<C>(client: &C, format: CredentialsFormat) -> Result<String>
where
    C: RegistryClient + ?Sized,
{
    let auth = client
        .authorization_token()
        .await
        .context("Failed to get registry credentials")?;
    format_credentials(&auth, format)
}

pub async fn handle_credentials<C>(client: &C, format: CredentialsFormat) -> Result<()>
where
    C: RegistryClient + ?Sized,
{
    println!("{}", fetch_credentials(client, format).await?);
    Ok(())
}

/// Log the container CLI in to the registry
pub async fn handle_login<C>(client: &C, cli: &ContainerCli) -> Result<()>
where
    C: RegistryClient + ?Sized,
{
    cli.ensure_available()?;

    let auth = client
        .authorization_token()
        .await
        .context("Failed to get registry credentials")?;
    cli.login(&auth)
}
