use config::{Config, ConfigError};
use serde::Deserialize;
use std::path::Path;

use crate::ecr::{RepositoryOptions, ResolveOptions};

/// Layered configuration: config file, then `TREBUCHET_*` environment
/// variables, then command-line flags
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// AWS region, role and profile selection
    #[serde(default)]
    pub aws: ResolveOptions,
    /// Options for repositories created on demand
    #[serde(default)]
    pub repository: RepositoryOptions,
    #[serde(default)]
    pub docker: DockerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DockerSettings {
    /// Container CLI used for login/tag/push (docker or podman)
    #[serde(default = "default_container_cli")]
    pub container_cli: String,
}

fn default_container_cli() -> String {
    "docker".to_string()
}

impl Default for DockerSettings {
    fn default() -> Self {
        Self {
            container_cli: default_container_cli(),
        }
    }
}

/// Values given on the command line; `None` leaves the configured value alone
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub role_arn: Option<String>,
    pub profile: Option<String>,
    pub container_cli: Option<String>,
}

impl Settings {
    /// Add the first existing `<dir>/<name>.{toml,yaml,yml}` as a config source
    fn add_optional_config_file(
        builder: &mut config::ConfigBuilder<config::builder::DefaultState>,
        config_dir: &Path,
        name: &str,
    ) {
        for ext in ["toml", "yaml", "yml"] {
            let path = config_dir.join(format!("{}.{}", name, ext));
            if path.exists() {
                tracing::info!("Loading config file: {}", path.display());
                *builder = builder.clone().add_source(config::File::from(path));
                return;
            }
        }

        tracing::debug!(
            "Optional config file not found: {}/{}.{{toml,yaml,yml}}",
            config_dir.display(),
            name
        );
    }

    /// Load settings
    ///
    /// With `config_file` set, that file is required. Otherwise an optional
    /// `trebuchet.{toml,yaml,yml}` in the working directory is used.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::Message(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                tracing::info!("Loading config file: {}", path.display());
                builder = builder.add_source(config::File::from(path));
            }
            None => {
                Self::add_optional_config_file(&mut builder, Path::new("."), "trebuchet");
            }
        }

        // e.g. TREBUCHET_AWS__REGION=us-east-1
        builder = builder.add_source(
            config::Environment::with_prefix("TREBUCHET")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build()?;

        let mut unused_fields = Vec::new();
        let settings: Settings = serde_ignored::deserialize(config, |path| {
            unused_fields.push(path.to_string());
        })?;

        for field in &unused_fields {
            tracing::warn!("Unknown configuration field: {}", field);
        }

        Ok(settings)
    }

    /// Apply command-line values on top of the loaded settings
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if overrides.region.is_some() {
            self.aws.region = overrides.region;
        }
        if overrides.role_arn.is_some() {
            self.aws.role_arn = overrides.role_arn;
        }
        if overrides.profile.is_some() {
            self.aws.profile = overrides.profile;
        }
        if let Some(container_cli) = overrides.container_cli {
            self.docker.container_cli = container_cli;
        }
        self
    }
}
