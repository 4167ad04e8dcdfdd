// Container engine backed by the docker/podman command-line interface

use std::process::{Command, Output, Stdio};
use tracing::debug;

use super::{parse_listing, ContainerEngine, EngineError, ImageListing, LISTING_FORMAT};

/// Runs image operations by shelling out to a container CLI
#[derive(Debug, Clone)]
pub(crate) struct CliEngine {
    container_cli: String,
}

impl CliEngine {
    pub(crate) fn new(container_cli: impl Into<String>) -> Self {
        Self {
            container_cli: container_cli.into(),
        }
    }

    pub(crate) fn container_cli(&self) -> &str {
        &self.container_cli
    }

    /// Check that the container CLI can be executed at all
    pub(crate) fn check_available(&self) -> Result<(), EngineError> {
        let mut cmd = self.command(&["--version"]);
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
        let status = cmd.status().map_err(|source| EngineError::Spawn {
            command: self.describe(&["--version"]),
            source,
        })?;
        if !status.success() {
            return Err(EngineError::Failed {
                command: self.describe(&["--version"]),
                code: status.code(),
            });
        }
        Ok(())
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.container_cli);
        cmd.args(args);
        cmd
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.container_cli, args.join(" "))
    }

    /// Run with inherited stdio and require a zero exit status
    fn run_checked(&self, args: &[&str]) -> Result<(), EngineError> {
        let mut cmd = self.command(args);

        debug!("Executing command: {:?}", cmd);

        let status = cmd.status().map_err(|source| EngineError::Spawn {
            command: self.describe(args),
            source,
        })?;

        if !status.success() {
            return Err(EngineError::Failed {
                command: self.describe(args),
                code: status.code(),
            });
        }

        Ok(())
    }

    /// Run capturing stdout; stderr is passed through to the terminal
    fn output_checked(&self, args: &[&str]) -> Result<Output, EngineError> {
        let mut cmd = self.command(args);
        cmd.stderr(Stdio::inherit());

        debug!("Executing command: {:?}", cmd);

        let output = cmd.output().map_err(|source| EngineError::Spawn {
            command: self.describe(args),
            source,
        })?;

        if !output.status.success() {
            return Err(EngineError::Failed {
                command: self.describe(args),
                code: output.status.code(),
            });
        }

        Ok(output)
    }
}

impl ContainerEngine for CliEngine {
    fn image_exists(&self, reference: &str) -> Result<bool, EngineError> {
        let args = ["image", "inspect", reference];
        let mut cmd = self.command(&args);
        cmd.stdout(Stdio::null()).stderr(Stdio::null());

        debug!("Executing command: {:?}", cmd);

        let status = cmd.status().map_err(|source| EngineError::Spawn {
            command: self.describe(&args),
            source,
        })?;

        Ok(status.success())
    }

    fn tag(&self, source: &str, target: &str) -> Result<(), EngineError> {
        self.run_checked(&["tag", source, target])
    }

    fn list_images(&self, repository: &str) -> Result<Vec<ImageListing>, EngineError> {
        let args = ["images", repository, "--format", LISTING_FORMAT];
        let output = self.output_checked(&args)?;
        let stdout = String::from_utf8(output.stdout).map_err(|source| {
            EngineError::InvalidOutput {
                command: self.describe(&args),
                source,
            }
        })?;
        Ok(parse_listing(&stdout))
    }

    fn remove_image(&self, reference: &str) -> Result<(), EngineError> {
        self.run_checked(&["rmi", reference])
    }
}
