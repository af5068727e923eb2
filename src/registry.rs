//! Profile registry data model.
//!
//! The registry file (`~/.ccenv/profiles.json`) is the single source of
//! truth for all named configurations. Profiles hold an ordered env map plus
//! optional display metadata.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::envmap::EnvMap;

/// A named provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Profile {
    /// Env vars this profile exports when active. May be empty on disk
    /// (mid-edit), but activation of an empty profile is rejected.
    #[serde(default)]
    pub env: EnvMap,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(env: EnvMap) -> Self {
        Self {
            env,
            description: None,
            created_at: Some(Utc::now()),
        }
    }
}

/// All stored profiles, keyed by name. Insertion order is preserved and
/// decides first-match-wins resolution.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Registry {
    #[serde(default)]
    pub profiles: IndexMap<String, Profile>,
}

impl Registry {
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Validate a profile name.
///
/// Only allows alphanumeric characters, underscores, and hyphens.
pub fn validate_profile_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Profile name cannot be empty");
    }

    if name.chars().count() > 64 {
        bail!("Profile name cannot be longer than 64 characters");
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        bail!(
            "Invalid profile name '{}'.\nHint: Only alphanumeric characters, hyphens (-), and underscores (_) are allowed.",
            name
        );
    }

    Ok(())
}

/// Which channel `use` writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Write the profile env into ~/.claude/settings.json
    Settings,
    /// Write the profile env into the snapshot file, loaded by the shell
    #[default]
    Env,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Settings => "settings",
            Mode::Env => "env",
        }
    }

    /// Parse a persisted mode value. Anything unrecognized falls back to the
    /// default rather than failing; a garbage mode file is not fatal.
    pub fn from_persisted(s: &str) -> Self {
        match s.trim() {
            "settings" => Mode::Settings,
            "env" => Mode::Env,
            _ => Mode::default(),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "settings" => Ok(Mode::Settings),
            "env" => Ok(Mode::Env),
            _ => bail!("Invalid mode '{}'. Legal values: settings, env", s),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
