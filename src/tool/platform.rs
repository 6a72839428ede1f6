/// Host platform detection
use std::fmt;

/// Platforms kubectl is published for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    Darwin,
    Windows,
}

impl Platform {
    /// Platform of the running host
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS identifier to a platform
    ///
    /// Anything that is not macOS or Windows is treated as Linux, including
    /// hosts kubectl has no build for. The download then fails for those
    /// rather than this function.
    pub fn from_os(os: &str) -> Self {
        match os.trim().to_ascii_lowercase().as_str() {
            "macos" | "darwin" => Self::Darwin,
            "windows" | "windows_nt" => Self::Windows,
            _ => Self::Linux,
        }
    }

    /// Executable file name suffix
    pub fn binary_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Linux | Self::Darwin => "",
        }
    }

    /// Executable file name for a tool on this platform
    pub fn binary_name(&self, tool_name: &str) -> String {
        format!("{}{}", tool_name, self.binary_suffix())
    }

    /// Path segment used by the release bucket
    pub fn url_segment(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url_segment())
    }
}
