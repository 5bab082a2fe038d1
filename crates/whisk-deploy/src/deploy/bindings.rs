//! Service binding through the platform's command line tool.

use crate::compile::ServiceBinding;
use crate::error::DeployError;
use async_trait::async_trait;
use std::io::ErrorKind;
use tokio::process::Command;
use tracing::debug;

const DEFAULT_PROGRAM: &str = "ibmcloud";

/// Applies one service binding. There is no platform API for this, so the
/// default implementation shells out.
#[async_trait]
pub trait BindingTool: Send + Sync {
    async fn bind(&self, binding: &ServiceBinding) -> Result<(), DeployError>;
}

/// Runs `ibmcloud fn service bind <service> <target> [--instance i] [--keyname k]`.
#[derive(Debug, Clone)]
pub struct CliBindingTool {
    program: String,
}

impl Default for CliBindingTool {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
        }
    }
}

impl CliBindingTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn args(binding: &ServiceBinding) -> Vec<String> {
        let mut args = vec![
            "fn".to_string(),
            "service".to_string(),
            "bind".to_string(),
            binding.name.clone(),
            binding.action.clone(),
        ];
        if let Some(instance) = &binding.instance {
            args.push("--instance".to_string());
            args.push(instance.clone());
        }
        if let Some(key) = &binding.key {
            args.push("--keyname".to_string());
            args.push(key.clone());
        }
        args
    }
}

#[async_trait]
impl BindingTool for CliBindingTool {
    async fn bind(&self, binding: &ServiceBinding) -> Result<(), DeployError> {
        let described = serde_json::to_string(binding).unwrap_or_default();
        debug!(binding = %described, "Configuring Service Binding");

        let output = Command::new(&self.program)
            .args(Self::args(binding))
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => DeployError::ServiceBinding(
                    "Unable to execute `ibmcloud fn service bind` command. Is IBM Cloud CLI installed?"
                        .to_string(),
                ),
                _ => DeployError::ServiceBinding(e.to_string()),
            })?;

        match output.status.code() {
            Some(0) => {
                debug!(binding = %described, "Configured Service Binding");
                Ok(())
            }
            Some(2) => Err(DeployError::ServiceBinding(
                "Unable to execute `ibmcloud fn service bind` command. Is IBM Cloud Functions CLI plugin installed?"
                    .to_string(),
            )),
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let first_line = stderr.lines().next().unwrap_or_default();
                Err(DeployError::ServiceBinding(format!(
                    "Failed to configure service binding ({})\n  {}",
                    described, first_line
                )))
            }
        }
    }
}
