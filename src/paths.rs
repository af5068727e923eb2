use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::PathBuf;

/// All computed paths used by ccenv
#[derive(Debug, Clone)]
pub struct Paths {
    /// ~/.ccenv
    pub base_dir: PathBuf,
    /// ~/.ccenv/profiles.json
    pub registry_file: PathBuf,
    /// ~/.ccenv/active.env
    pub snapshot_file: PathBuf,
    /// ~/.ccenv/mode
    pub mode_file: PathBuf,
    /// ~/.claude
    pub claude_dir: PathBuf,
    /// ~/.claude/settings.json
    pub claude_settings: PathBuf,
    /// Home directory (shell config files live here)
    pub home_dir: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        let home = base_dirs.home_dir();

        let base_dir = home.join(".ccenv");
        let registry_file = base_dir.join("profiles.json");
        let snapshot_file = base_dir.join("active.env");
        let mode_file = base_dir.join("mode");
        let claude_dir = home.join(".claude");
        let claude_settings = claude_dir.join("settings.json");

        Ok(Self {
            base_dir,
            registry_file,
            snapshot_file,
            mode_file,
            claude_dir,
            claude_settings,
            home_dir: home.to_path_buf(),
        })
    }

    /// Ensure the base directory exists with owner-only permissions
    pub fn ensure_base_dir(&self) -> Result<()> {
        crate::store::create_private_dir(&self.base_dir)
    }
}
