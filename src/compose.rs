use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::DeployConfig;

/// Drives the container runtime. Only exit codes are interpreted.
#[derive(Clone, Debug)]
pub struct ComposeRunner {
    program: String,
    base_args: Vec<String>,
    file: PathBuf,
}

impl ComposeRunner {
    pub fn from_config(config: &DeployConfig) -> Result<Self> {
        let (program, base_args) = config
            .compose_command
            .split_first()
            .ok_or(Error::EmptyComposeCommand)?;
        Ok(Self {
            program: program.clone(),
            base_args: base_args.to_vec(),
            file: config.compose_file.clone(),
        })
    }

    pub fn down_args(volumes: bool) -> Vec<&'static str> {
        let mut args = vec!["down", "--remove-orphans"];
        if volumes {
            args.push("--volumes");
        }
        args
    }

    pub fn up_args(build: bool) -> Vec<&'static str> {
        let mut args = vec!["up", "--detach"];
        if build {
            args.push("--build");
        }
        args
    }

    pub fn command_line(&self, action: &[&str]) -> Vec<String> {
        let mut line = Vec::with_capacity(self.base_args.len() + action.len() + 3);
        line.push(self.program.clone());
        line.extend(self.base_args.iter().cloned());
        line.push("-f".to_string());
        line.push(self.file.display().to_string());
        line.extend(action.iter().map(|arg| arg.to_string()));
        line
    }

    pub async fn down(&self, volumes: bool) -> Result<()> {
        info!(volumes, "stopping fleet");
        self.invoke(&Self::down_args(volumes)).await
    }

    pub async fn up(&self, build: bool) -> Result<()> {
        info!(build, "starting fleet");
        self.invoke(&Self::up_args(build)).await
    }

    async fn invoke(&self, action: &[&str]) -> Result<()> {
        let line = self.command_line(action);
        let status = Command::new(&line[0])
            .args(&line[1..])
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|err| Error::Compose(format!("failed to run '{}': {}", line.join(" "), err)))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Compose(format!(
                "'{}' exited with {}",
                line.join(" "),
                status
            )))
        }
    }
}
