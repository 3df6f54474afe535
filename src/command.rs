use crate::error::Error;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tracing::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs one external binary with an argument vector, optionally streaming
/// `stdin` into it. A non-zero exit status is an error carrying stderr.
#[derive(Debug, Clone)]
pub struct Command {
    program: String,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Command {
            program: program.into(),
        }
    }

    pub async fn run(
        &self,
        args: &[&str],
        stdin: Option<&str>,
        cwd: Option<&Path>,
    ) -> Result<CommandOutput, Error> {
        debug!("$ {} {}", self.program, args.join(" "));
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        let mut child = cmd.spawn().map_err(|source| self.spawn_failed(source))?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes())
                    .await
                    .map_err(|source| self.spawn_failed(source))?;
                // Closing stdin lets the child see end of input.
                drop(pipe);
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| self.spawn_failed(source))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(Error::CommandFailed {
                program: self.program.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(CommandOutput { stdout, stderr })
    }

    fn spawn_failed(&self, source: std::io::Error) -> Error {
        Error::CommandSpawnFailed {
            program: self.program.clone(),
            source,
        }
    }
}
