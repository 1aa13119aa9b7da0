//! Local command backend (llama-cli style binaries).

use crate::backend::{extract_response, GenerationBackend, RESPONSE_MARKER};
use crate::error::ApiError;
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Replaced in command arguments by the path of the prompt file
pub const PROMPT_FILE_PLACEHOLDER: &str = "{prompt_file}";

/// Runs a local program per completion.
///
/// The prompt, followed by the response marker, is written to a temp file whose
/// path is substituted into the arguments. The child is killed if the future is
/// dropped, e.g. on timeout.
pub struct CommandBackend {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandBackend {
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

#[async_trait]
impl GenerationBackend for CommandBackend {
    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let full_prompt = format!("{}\n{}\n", prompt.trim(), RESPONSE_MARKER);

        let mut prompt_file = tempfile::NamedTempFile::new()
            .map_err(|e| ApiError::BackendError(format!("Failed to create prompt file: {}", e)))?;
        prompt_file
            .write_all(full_prompt.as_bytes())
            .and_then(|_| prompt_file.flush())
            .map_err(|e| ApiError::BackendError(format!("Failed to write prompt file: {}", e)))?;
        let prompt_path = prompt_file.path().to_string_lossy().to_string();

        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(PROMPT_FILE_PLACEHOLDER, &prompt_path))
            .collect();
        debug!(program = %self.program.display(), ?args, "Running generation command");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ApiError::BackendError(format!(
                    "Failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApiError::BackendError(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(extract_response(&stdout))
    }

    fn name(&self) -> &str {
        "command"
    }
}
