use anyhow::{bail, Context, Result};
use tracing::info;

use super::docker::ContainerCli;
use trebuchet::ecr::{setup_repository, RegistryAuth, RegistryClient};

/// A local image reference split into repository path and tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImageReference {
    /// Path without any registry host (e.g. "org/app")
    pub repository: String,
    pub tag: String,
}

fn looks_like_registry_host(component: &str) -> bool {
    component == "localhost" || component.contains('.') || component.contains(':')
}

impl std::str::FromStr for ImageReference {
    type Err = anyhow::Error;

    fn from_str(image: &str) -> Result<Self> {
        if image.is_empty() {
            bail!("Image reference must not be empty");
        }
        if image.contains('@') {
            bail!(
                "Image reference '{}' uses a digest; push needs a tag",
                image
            );
        }

        // The tag separator is the last ':' after the last '/' (a ':' before
        // it belongs to a registry port)
        let name_start = image.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (path, tag) = match image[name_start..].rfind(':') {
            Some(i) => (&image[..name_start + i], &image[name_start + i + 1..]),
            None => (image, "latest"),
        };
        if tag.is_empty() {
            bail!("Image reference '{}' has an empty tag", image);
        }

        let repository = match path.split_once('/') {
            Some((first, rest)) if looks_like_registry_host(first) => rest,
            _ => path,
        };
        if repository.is_empty() {
            bail!("Image reference '{}' has no repository name", image);
        }

        Ok(Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }
}

/// Everything the container CLI needs to publish one image
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PushPlan {
    /// The local image as given
    pub source: String,
    /// `<repository uri>:<tag>`
    pub target: String,
    pub auth: RegistryAuth,
}

/// Resolve the target repository, create it when missing and fetch credentials
///
/// `repository` overrides the name taken from the image reference.
pub(crate) async fn prepare_push<C>(
    client: &C,
    image: &str,
    repository: Option<&str>,
) -> Result<PushPlan>
where
    C: RegistryClient + ?Sized,
{
    let reference: ImageReference = image.parse()?;
    let repository = repository.unwrap_or(&reference.repository);

    let uri = setup_repository(client, repository)
        .await
        .with_context(|| format!("Failed to set up repository '{}'", repository))?;

    let auth = client
        .authorization_token()
        .await
        .context("Failed to get registry credentials")?;

    Ok(PushPlan {
        source: image.to_string(),
        target: format!("{}:{}", uri, reference.tag),
        auth,
    })
}

/// Provision the repository, log in, then tag and push `image`
///
/// Returns the pushed reference.
pub(crate) async fn push_image<C>(
    client: &C,
    cli: &ContainerCli,
    image: &str,
    repository: Option<&str>,
) -> Result<String>
where
    C: RegistryClient + ?Sized,
{
    cli.ensure_available()?;

    let plan = prepare_push(client, image, repository).await?;
    cli.login(&plan.auth)?;
    cli.tag(&plan.source, &plan.target)?;
    cli.push(&plan.target)?;

    info!("Pushed {} to {}", plan.source, plan.target);
    Ok(plan.target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::testing::{registry_auth, MemoryRegistry, REGISTRY_HOST};

    fn parse(image: &str) -> ImageReference {
        image.parse().unwrap()
    }

    #[test]
    fn test_parse_name_and_tag() {
        assert_eq!(
            parse("myapp:1.0"),
            ImageReference {
                repository: "myapp".to_string(),
                tag: "1.0".to_string()
            }
        );
    }

    #[test]
    fn test_parse_defaults_to_latest() {
        let reference = parse("org/myapp");
        assert_eq!(reference.repository, "org/myapp");
        assert_eq!(reference.tag, "latest");
    }

    #[test]
    fn test_parse_strips_registry_host() {
        let reference = parse("localhost:5000/org/myapp:v2");
        assert_eq!(reference.repository, "org/myapp");
        assert_eq!(reference.tag, "v2");

        let reference = parse("registry.example.com/myapp");
        assert_eq!(reference.repository, "myapp");
        assert_eq!(reference.tag, "latest");

        let reference = parse("localhost/myapp:dev");
        assert_eq!(reference.repository, "myapp");
        assert_eq!(reference.tag, "dev");
    }

    #[test]
    fn test_parse_rejects_invalid_references() {
        assert!("".parse::<ImageReference>().is_err());
        assert!("myapp:".parse::<ImageReference>().is_err());
        assert!("myapp@sha256:abcd".parse::<ImageReference>().is_err());
        assert!("registry.example.com/".parse::<ImageReference>().is_err());
    }

    #[tokio::test]
    async fn test_prepare_push_creates_repository_from_image_name() {
        let registry = MemoryRegistry::default();

        let plan = prepare_push(&registry, "localhost:5000/org/myapp:v2", None)
            .await
            .unwrap();

        assert_eq!(plan.source, "localhost:5000/org/myapp:v2");
        assert_eq!(plan.target, format!("{}/org/myapp:v2", REGISTRY_HOST));
        assert_eq!(plan.auth, registry_auth());
        assert!(registry.contains("org/myapp"));
        assert_eq!(
            registry.calls(),
            vec![
                "repository_exists:org/myapp",
                "create_repository:org/myapp",
                "repository_uri:org/myapp",
                "authorization_token",
            ]
        );
    }

    #[tokio::test]
    async fn test_prepare_push_repository_override() {
        let registry = MemoryRegistry::with_repositories(&["team/service"]);

        let plan = prepare_push(&registry, "myapp", Some("team/service"))
            .await
            .unwrap();

        assert_eq!(plan.target, format!("{}/team/service:latest", REGISTRY_HOST));
        assert!(!registry.contains("myapp"));
        assert!(!registry
            .calls()
            .iter()
            .any(|call| call.starts_with("create_repository")));
    }

    #[tokio::test]
    async fn test_prepare_push_rejects_bad_reference_before_registry_calls() {
        let registry = MemoryRegistry::default();

        assert!(prepare_push(&registry, "myapp@sha256:abcd", None)
            .await
            .is_err());
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn test_push_image_with_stand_in_cli() {
        let registry = MemoryRegistry::default();

        let pushed = push_image(&registry, &ContainerCli::new("true"), "myapp:1.0", None)
            .await
            .unwrap();

        assert_eq!(pushed, format!("{}/myapp:1.0", REGISTRY_HOST));
        assert!(registry.contains("myapp"));
    }

    #[tokio::test]
    async fn test_push_image_stops_when_cli_is_missing() {
        let registry = MemoryRegistry::default();
        let cli = ContainerCli::new("trebuchet-no-such-container-cli");

        assert!(push_image(&registry, &cli, "myapp:1.0", None).await.is_err());
        assert!(registry.calls().is_empty());
    }
}
