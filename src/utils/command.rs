/// Command execution utilities
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Builder for executing external commands
pub struct CommandBuilder {
    command: Command,
    context_msg: Option<String>,
}

impl CommandBuilder {
    /// Create a new command builder
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            command: Command::new(program),
            context_msg: None,
        }
    }

    /// Share stdin, stdout and stderr with the current process
    pub fn inherit_stdio(mut self) -> Self {
        self.command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    /// Set context message for error reporting
    pub fn context<S: Into<String>>(mut self, msg: S) -> Self {
        self.context_msg = Some(msg.into());
        self
    }

    /// Execute and wait for the exit status
    pub async fn status(mut self) -> Result<ExitStatus> {
        let status = if let Some(ctx) = &self.context_msg {
            self.command.status().await.context(ctx.clone())?
        } else {
            self.command.status().await?
        };
        Ok(status)
    }
}

/// Split a raw argument string into arguments
///
/// Arguments are separated by spaces. Double quotes group text containing
/// spaces and `\"` inside quotes yields a literal quote. Every other
/// backslash is kept as written.
pub fn split_args(raw: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    let push = |current: &mut String, escaped: &mut bool, c: char| {
        if *escaped && c != '"' {
            current.push('\\');
        }
        current.push(c);
        *escaped = false;
    };

    for c in raw.chars() {
        match c {
            '"' if !escaped => in_quotes = !in_quotes,
            '"' => push(&mut current, &mut escaped, c),
            '\\' if escaped => push(&mut current, &mut escaped, c),
            '\\' if in_quotes => escaped = true,
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => push(&mut current, &mut escaped, c),
        }
    }

    if !current.is_empty() {
        args.push(current.trim().to_string());
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_builder_success() {
        let status = CommandBuilder::new("echo")
            .args(["test"])
            .context("Testing echo command")
            .inherit_stdio()
            .status()
            .await
            .unwrap();

        assert!(status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_builder_status() {
        let status = CommandBuilder::new("sh")
            .args(["-c", "exit 3"])
            .inherit_stdio()
            .status()
            .await
            .unwrap();

        assert_eq!(status.code(), Some(3));
    }

    #[tokio::test]
    async fn test_missing_program_reports_context() {
        let err = CommandBuilder::new("definitely-not-a-real-binary-7f3a")
            .context("Failed to run kubectl")
            .status()
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to run kubectl"));
    }

    #[test]
    fn test_split_args_plain() {
        assert_eq!(
            split_args("get pods -n kube-system"),
            vec!["get", "pods", "-n", "kube-system"]
        );
        assert_eq!(split_args("  get   pods  "), vec!["get", "pods"]);
        assert!(split_args("").is_empty());
    }

    #[test]
    fn test_split_args_quotes() {
        assert_eq!(
            split_args(r#"annotate pod web "note=hello world""#),
            vec!["annotate", "pod", "web", "note=hello world"]
        );
        assert_eq!(
            split_args(r#"get pods -o "jsonpath={.items[*].metadata.name}""#),
            vec!["get", "pods", "-o", "jsonpath={.items[*].metadata.name}"]
        );
    }

    #[test]
    fn test_split_args_escapes() {
        assert_eq!(split_args(r#""say \"hi\"""#), vec![r#"say "hi""#]);
        assert_eq!(split_args(r#""a\\b""#), vec![r"a\\b"]);
        assert_eq!(split_args(r#""a\nb""#), vec![r"a\nb"]);
        assert_eq!(split_args(r"C:\path\kubeconfig"), vec![r"C:\path\kubeconfig"]);
    }
}
