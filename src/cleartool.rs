//! ClearCase command-line operations.

use std::process::{Command, Output, Stdio};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::source::{HistoryQuery, HistorySource};

/// `-since` argument format understood by cleartool.
const SINCE_FORMAT: &str = "%d-%b-%Y.%H:%M:%S";

/// A handle on the `cleartool` executable.
pub struct Cleartool {
    program: String,
}

impl Cleartool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Get the executable this handle runs.
    pub fn program(&self) -> &str {
        &self.program
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn spawn(&self, args: &[String]) -> Result<Output, Error> {
        debug!(program = %self.program, ?args, "running cleartool");
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                Error::Exec(format!(
                    "{} {}: {e}",
                    self.program,
                    args.first().map(String::as_str).unwrap_or("")
                ))
            })
    }

    /// Run a cleartool command and capture its stdout.
    fn run_output(&self, args: &[String]) -> Result<String, Error> {
        let output = self.spawn(args)?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(self.failed(args, &output))
        }
    }

    fn failed(&self, args: &[String], output: &Output) -> Error {
        Error::Failed {
            command: format!("{} {}", self.program, args.join(" ")),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

impl HistorySource for Cleartool {
    fn history(&self, query: &HistoryQuery<'_>) -> crate::Result<String> {
        let args = vec![
            "find".to_string(),
            query.root.to_string(),
            "-type".to_string(),
            query.kind.find_type().to_string(),
            "-exec".to_string(),
            lshistory_exec(&self.program, query),
        ];
        Ok(self.run_output(&args)?)
    }

    fn element_history(&self, path: &str, format: &str) -> crate::Result<String> {
        let args = vec![
            "lshistory".to_string(),
            "-fmt".to_string(),
            format.to_string(),
            path.to_string(),
        ];
        Ok(self.run_output(&args)?)
    }

    fn diff_predecessor(&self, directory: &str) -> crate::Result<String> {
        let args = vec![
            "diff".to_string(),
            "-diff_format".to_string(),
            "-pred".to_string(),
            directory.to_string(),
        ];
        let output = self.spawn(&args)?;
        // diff exits 1 when the versions differ
        match output.status.code() {
            Some(0) | Some(1) => Ok(String::from_utf8_lossy(&output.stdout).to_string()),
            _ => Err(self.failed(&args, &output).into()),
        }
    }
}

/// Build the command `cleartool find -exec` runs for every matching element.
fn lshistory_exec(program: &str, query: &HistoryQuery<'_>) -> String {
    let mut words = vec![shell_quote(program), "lshistory".to_string()];
    if let Some(since) = query.since {
        words.push("-since".to_string());
        words.push(format_since(since));
    }
    if let Some(branch) = query.branch {
        words.push("-branch".to_string());
        words.push(shell_quote(branch));
    }
    words.push("-fmt".to_string());
    words.push(shell_quote(query.format));
    words.push("\"$CLEARCASE_PN\"".to_string());
    words.join(" ")
}

/// Render a timestamp the way `-since` expects it.
pub fn format_since(since: NaiveDateTime) -> String {
    since.format(SINCE_FORMAT).to_string()
}

/// Quote a word for the shell that `find -exec` hands its command to.
fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

/// Errors from running cleartool.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to execute: {0}")]
    Exec(String),

    #[error("`{command}` exited with status {status:?}: {stderr}")]
    Failed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
}
