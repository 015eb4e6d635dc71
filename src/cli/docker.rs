use anyhow::{bail, Context, Result};
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use trebuchet::ecr::RegistryAuth;

/// A docker-compatible container CLI (docker, podman, nerdctl)
#[derive(Debug, Clone)]
pub struct ContainerCli {
    program: String,
}

impl ContainerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `<program> <args>`, optionally feeding `stdin`, and require success
    fn run(&self, args: &[&str], stdin: Option<&str>) -> Result<()> {
        let action = args.first().copied().unwrap_or_default();
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if stdin.is_some() {
            cmd.stdin(Stdio::piped());
        }

        debug!("Running {} {}", self.program, args.join(" "));

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Could not start '{} {}'", self.program, action))?;
        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            // A program that exits without reading is judged by its exit status
            if let Err(e) = pipe.write_all(input.as_bytes()) {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(e).with_context(|| {
                        format!("Could not write to '{} {}'", self.program, action)
                    });
                }
            }
        }
        let status = child
            .wait()
            .with_context(|| format!("'{} {}' did not finish", self.program, action))?;

        if !status.success() {
            bail!("'{} {}' exited with {}", self.program, action, status);
        }
        Ok(())
    }

    /// Fail early with a clear message when the program is not installed
    pub fn ensure_available(&self) -> Result<()> {
        let found = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok();
        if !found {
            bail!(
                "Container CLI '{}' was not found on PATH; install Docker or Podman, or pass --container-cli",
                self.program
            );
        }
        Ok(())
    }

    /// Log in to the registry the credentials were issued for
    ///
    /// The password goes over stdin so it never shows up in the process list.
    pub fn login(&self, auth: &RegistryAuth) -> Result<()> {
        if auth.proxy_endpoint.is_empty() {
            bail!("Registry credentials carry no endpoint to log in to");
        }
        self.run(
            &[
                "login",
                &auth.proxy_endpoint,
                "--username",
                &auth.username,
                "--password-stdin",
            ],
            Some(&auth.password),
        )?;
        info!("Logged in to {}", auth.proxy_endpoint);
        Ok(())
    }

    pub fn tag(&self, source: &str, target: &str) -> Result<()> {
        self.run(&["tag", source, target], None)
    }

    pub fn push(&self, reference: &str) -> Result<()> {
        info!("Pushing {}", reference);
        self.run(&["push", reference], None)
    }
}
