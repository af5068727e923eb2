//! Shell dialect dispatch.
//!
//! Every place ccenv has to care about shell differences (escaping, config
//! file location, activation one-liner, env output syntax) goes through this
//! one table instead of parallel match statements scattered per feature.

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// Shell families ccenv can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

impl Shell {
    pub const ALL: [Shell; 4] = [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell];

    pub fn name(&self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
            Shell::PowerShell => "powershell",
        }
    }

    /// Detect the user's shell from environment hints, in fixed precedence:
    /// fish hints, zsh hints, a PowerShell distribution hint, a bash path
    /// substring, then (Windows only) COMSPEC. Returns `None` rather than
    /// guessing.
    pub fn detect() -> Option<Shell> {
        let shell_path = std::env::var("SHELL").unwrap_or_default();

        if std::env::var("FISH_VERSION").is_ok() || shell_path.contains("fish") {
            return Some(Shell::Fish);
        }
        if std::env::var("ZSH_VERSION").is_ok() || shell_path.contains("zsh") {
            return Some(Shell::Zsh);
        }
        if std::env::var("PSModulePath").is_ok() {
            return Some(Shell::PowerShell);
        }
        if shell_path.contains("bash") {
            return Some(Shell::Bash);
        }

        #[cfg(windows)]
        if std::env::var("COMSPEC").is_ok() {
            return Some(Shell::PowerShell);
        }

        None
    }

    /// Quote a string literal for this shell.
    pub fn escape(&self, value: &str) -> String {
        match self {
            // POSIX single quotes: close, escaped quote, reopen
            Shell::Bash | Shell::Zsh => format!("'{}'", value.replace('\'', r"'\''")),
            // fish double quotes: backslash-escape backslash (first), quote,
            // and dollar
            Shell::Fish => format!(
                "\"{}\"",
                value
                    .replace('\\', "\\\\")
                    .replace('"', "\\\"")
                    .replace('$', "\\$")
            ),
            // PowerShell single quotes: doubled single quote
            Shell::PowerShell => format!("'{}'", value.replace('\'', "''")),
        }
    }

    /// One shell-native export statement.
    pub fn export_line(&self, key: &str, value: &str) -> String {
        match self {
            Shell::Bash | Shell::Zsh => format!("export {}={}", key, self.escape(value)),
            Shell::Fish => format!("set -gx {} {}", key, self.escape(value)),
            Shell::PowerShell => format!("$env:{} = {}", key, self.escape(value)),
        }
    }

    /// The startup file the permanent-write flow targets.
    pub fn config_path(&self, home: &Path) -> PathBuf {
        match self {
            Shell::Bash => bash_config_path(home),
            Shell::Zsh => home.join(".zshrc"),
            Shell::Fish => home.join(".config/fish/config.fish"),
            Shell::PowerShell => {
                home.join("Documents/PowerShell/Microsoft.PowerShell_profile.ps1")
            }
        }
    }

    /// One-line command that loads the snapshot into the current session.
    pub fn activation_command(&self) -> String {
        match self {
            Shell::Bash | Shell::Zsh => "eval \"$(ccenv env sh)\"".to_string(),
            Shell::Fish => "ccenv env fish | source".to_string(),
            Shell::PowerShell => "ccenv env powershell | Invoke-Expression".to_string(),
        }
    }

    pub fn supported_list() -> String {
        Shell::ALL
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// macOS sources ~/.bash_profile for login shells, so prefer it when it
/// exists or when ~/.bashrc does not.
fn bash_config_path(home: &Path) -> PathBuf {
    if cfg!(target_os = "macos") {
        let profile = home.join(".bash_profile");
        let bashrc = home.join(".bashrc");
        if profile.exists() || !bashrc.exists() {
            return profile;
        }
        bashrc
    } else {
        home.join(".bashrc")
    }
}

/// Output syntax for the `env` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvFormat {
    /// POSIX `export` statements
    #[default]
    Sh,
    Fish,
    PowerShell,
    /// Flat `KEY=value` lines for file redirection
    Dotenv,
}

impl EnvFormat {
    pub fn format_line(&self, key: &str, value: &str) -> String {
        match self {
            EnvFormat::Sh => Shell::Bash.export_line(key, value),
            EnvFormat::Fish => Shell::Fish.export_line(key, value),
            EnvFormat::PowerShell => Shell::PowerShell.export_line(key, value),
            EnvFormat::Dotenv => {
                format!("{}={}", key, crate::envmap::escape_snapshot_value(value))
            }
        }
    }
}

impl std::str::FromStr for EnvFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sh" | "bash" | "zsh" => Ok(EnvFormat::Sh),
            "fish" => Ok(EnvFormat::Fish),
            "powershell" | "pwsh" => Ok(EnvFormat::PowerShell),
            "dotenv" | "plain" => Ok(EnvFormat::Dotenv),
            _ => bail!(
                "Unknown env format '{}'. Supported formats: sh, fish, powershell, dotenv",
                s
            ),
        }
    }
}
