//! Dispatch by shelling out to the LiveKit CLI
//!
//! `lk dispatch create --new-room --agent-name <name> --metadata <json>`.
//! Credentials (`LIVEKIT_URL`, `LIVEKIT_API_KEY`, `LIVEKIT_API_SECRET`) are
//! inherited from the environment.

use crate::config::DispatchConfig;
use crate::domain::dispatch::{DispatchError, DispatchReceipt, DispatchRequest, Dispatcher};
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CliDispatcher {
    program: String,
    agent_name: String,
    bin_dir: PathBuf,
    timeout: Duration,
}

impl CliDispatcher {
    pub fn new(program: &str, agent_name: &str, bin_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            agent_name: agent_name.to_string(),
            bin_dir,
            timeout,
        }
    }

    pub fn from_config(config: &DispatchConfig, agent_name: &str) -> Self {
        Self::new(
            &config.program,
            agent_name,
            config.bin_dir.clone(),
            config.timeout(),
        )
    }

    pub fn args(&self, request: &DispatchRequest) -> Vec<String> {
        vec![
            "dispatch".to_string(),
            "create".to_string(),
            "--new-room".to_string(),
            "--agent-name".to_string(),
            self.agent_name.clone(),
            "--metadata".to_string(),
            request.metadata(),
        ]
    }

    /// PATH for the child: the local bin directory first, then the inherited PATH
    pub fn search_path(&self) -> OsString {
        let bin_dir = if self.bin_dir.is_absolute() {
            self.bin_dir.clone()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&self.bin_dir))
                .unwrap_or_else(|_| self.bin_dir.clone())
        };

        let mut dirs = vec![bin_dir];
        if let Some(path) = std::env::var_os("PATH") {
            dirs.extend(std::env::split_paths(&path));
        }
        std::env::join_paths(dirs).unwrap_or_else(|_| std::env::var_os("PATH").unwrap_or_default())
    }
}

#[async_trait]
impl Dispatcher for CliDispatcher {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchReceipt, DispatchError> {
        info!(
            program = %self.program,
            agent = %self.agent_name,
            "dispatching call to {}",
            request.phone_number()
        );

        let mut command = Command::new(&self.program);
        command
            .args(self.args(request))
            .env("PATH", self.search_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                DispatchError::Io(format!(
                    "{} timed out after {} seconds",
                    self.program,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => DispatchError::NotFound(self.program.clone()),
                _ => DispatchError::Io(format!("failed to run {}: {}", self.program, e)),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            warn!(status = %output.status, "dispatch command failed");
            return Err(DispatchError::CommandFailed {
                status: output.status.to_string(),
                stdout,
                stderr,
            });
        }

        Ok(DispatchReceipt { stdout, stderr })
    }

    fn program(&self) -> String {
        self.program.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DispatchRequest {
        DispatchRequest::from_form("+918980579954", "+17345214522").unwrap()
    }

    fn dispatcher(program: &str) -> CliDispatcher {
        CliDispatcher::new(
            program,
            "outbound-caller",
            PathBuf::from("bin"),
            Duration::from_secs(10),
        )
    }

    #[test]
    fn test_args() {
        let args = dispatcher("lk").args(&request());
        assert_eq!(
            &args[..6],
            &["dispatch", "create", "--new-room", "--agent-name", "outbound-caller", "--metadata"]
        );
        let metadata: serde_json::Value = serde_json::from_str(&args[6]).unwrap();
        assert_eq!(metadata["phone_number"], "+918980579954");
        assert_eq!(metadata["transfer_to"], "+17345214522");
    }

    #[test]
    fn test_search_path_starts_with_bin_dir() {
        let path = dispatcher("lk").search_path();
        let first = std::env::split_paths(&path).next().unwrap();
        assert!(first.is_absolute());
        assert!(first.ends_with("bin"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let result = dispatcher("definitely-not-a-dispatch-cli").dispatch(&request()).await;
        assert_eq!(
            result,
            Err(DispatchError::NotFound("definitely-not-a-dispatch-cli".to_string()))
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout() {
        let receipt = dispatcher("echo").dispatch(&request()).await.unwrap();
        assert!(receipt
            .stdout
            .starts_with("dispatch create --new-room --agent-name outbound-caller --metadata"));
        assert!(receipt.stderr.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit() {
        // `sh dispatch ...` fails: there is no script named `dispatch`
        let result = dispatcher("sh").dispatch(&request()).await;
        match result {
            Err(DispatchError::CommandFailed { stderr, .. }) => assert!(!stderr.is_empty()),
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }
}
