use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::CredentialsFormat;
use trebuchet::settings::{Overrides, Settings};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// AWS region (defaults to the region of the AWS profile/environment)
    #[arg(long, short, global = true)]
    region: Option<String>,
    /// IAM role ARN to assume before talking to ECR
    #[arg(long, short = 'a', global = true)]
    role_arn: Option<String>,
    /// AWS profile from the shared config files
    #[arg(long, short, global = true)]
    profile: Option<String>,
    /// Config file (defaults to ./trebuchet.{toml,yaml,yml} when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a repository if it does not exist and print its URI
    #[command(visible_alias = "repo")]
    Repository {
        /// Repository name (e.g., "my-app" or "team/my-app")
        name: String,
    },
    /// Print credentials for the registry
    #[command(visible_alias = "creds")]
    Credentials {
        #[arg(long, value_enum, default_value_t = CredentialsFormat::Text)]
        format: CredentialsFormat,
    },
    /// Log the container CLI in to the registry
    Login {
        /// Container CLI to use (docker or podman)
        #[arg(long)]
        container_cli: Option<String>,
    },
    /// Push a local image, creating its repository first when needed
    Push {
        /// Local image (e.g., myapp:1.0); the tag defaults to "latest"
        image: String,
        /// Repository name (defaults to the image name without registry and tag)
        #[arg(long)]
        repository: Option<String>,
        /// Container CLI to use (docker or podman)
        #[arg(long)]
        container_cli: Option<String>,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let container_cli = match &self.command {
            Commands::Login { container_cli } | Commands::Push { container_cli, .. } => {
                container_cli.clone()
            }
            _ => None,
        };
        Overrides {
            region: self.region.clone(),
            role_arn: self.role_arn.clone(),
            profile: self.profile.clone(),
            container_cli,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output on stdout stays scriptable
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(cli.overrides());

    let client = cli::build_client(&settings).await?;

    match &cli.command {
        Commands::Repository { name } => {
            cli::handle_repository(&client, name).await?;
        }
        Commands::Credentials { format } => {
            cli::handle_credentials(&client, *format).await?;
        }
        Commands::Login { .. } => {
            let container_cli = cli::docker::ContainerCli::new(&settings.docker.container_cli);
            cli::handle_login(&client, &container_cli).await?;
        }
        Commands::Push {
            image, repository, ..
        } => {
            let container_cli = cli::docker::ContainerCli::new(&settings.docker.container_cli);
            let pushed = cli::push::push_image(
                &client,
                &container_cli,
                image,
                repository.as_deref(),
            )
            .await?;
            println!("{}", pushed);
        }
    }

    Ok(())
}
