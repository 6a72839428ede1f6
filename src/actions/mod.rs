/// GitHub Actions runner conventions: inputs and workflow commands
use std::io::Write;
use tracing::{error as log_error, warn as log_warn};

/// Read a named action input from the environment
///
/// Inputs arrive as `INPUT_<NAME>` with spaces replaced by underscores and
/// the name upper-cased. Missing inputs read as an empty string.
pub fn get_input(name: &str) -> String {
    std::env::var(input_env_name(name))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Whether the runner has step debug logging enabled
pub fn is_debug() -> bool {
    std::env::var("RUNNER_DEBUG").map(|v| v == "1").unwrap_or(false)
}

/// Emit a warning annotation
pub fn warning(message: &str) {
    log_warn!("{}", message);
    issue_command("warning", message);
}

/// Emit an error annotation
pub fn error(message: &str) {
    log_error!("{}", message);
    issue_command("error", message);
}

/// Report the run as failed
///
/// The caller is responsible for exiting with a non-zero status.
pub fn set_failed(message: &str) {
    error(message);
}

fn issue_command(command: &str, message: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{}", format_command(command, message));
    let _ = stdout.flush();
}

fn format_command(command: &str, message: &str) -> String {
    format!("::{}::{}", command, escape_data(message))
}

/// Escape workflow command data
fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
