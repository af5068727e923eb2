//! Storage layer: registry, native Claude settings, env snapshot, mode flag.
//!
//! Read operations treat a missing file as a normal first-run state and
//! return an empty/default value. A present-but-corrupt registry is fatal;
//! it is never silently repaired because that would destroy user data. The
//! native settings file is externally owned, so corruption there degrades to
//! a warning plus an empty document instead.
//!
//! Every write ensures the containing directory exists and then restricts
//! the file to owner read/write. This happens on every save, not just on
//! creation, so a previously world-readable file self-heals.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::envmap::{
    EnvMap, escape_snapshot_value, is_valid_snapshot_key, unescape_snapshot_value,
};
use crate::paths::Paths;
use crate::registry::{Mode, Registry};

/// Create a directory (and parents) readable only by the owner.
pub fn create_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .with_context(|| format!("Failed to restrict directory: {}", dir.display()))?;
    }
    Ok(())
}

/// Restrict a file to owner read/write on platforms with POSIX permissions.
fn restrict_file(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict file: {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Write a file with its parent directory ensured and permissions forced.
fn write_private(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_private_dir(parent)?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write: {}", path.display()))?;
    restrict_file(path)
}

/// Load the profile registry, returning an empty registry when the file does
/// not exist yet. Invalid JSON is fatal.
pub fn load_registry(paths: &Paths) -> Result<Registry> {
    if !paths.registry_file.exists() {
        return Ok(Registry::default());
    }

    let content = fs::read_to_string(&paths.registry_file)
        .with_context(|| format!("Failed to read registry: {}", paths.registry_file.display()))?;

    serde_json::from_str(&content).with_context(|| {
        format!(
            "Registry file is corrupt (invalid JSON): {}\nHint: Fix or remove the file by hand; ccenv will not overwrite it.",
            paths.registry_file.display()
        )
    })
}

pub fn save_registry(paths: &Paths, registry: &Registry) -> Result<()> {
    let content =
        serde_json::to_string_pretty(registry).context("Failed to serialize registry")?;
    write_private(&paths.registry_file, &(content + "\n"))
}

/// Load ~/.claude/settings.json as a raw JSON object. The file is shared
/// with Claude Code itself: absence is normal, and an unreadable file is a
/// warning, not an error.
pub fn load_native_settings(paths: &Paths) -> Result<Map<String, Value>> {
    if !paths.claude_settings.exists() {
        return Ok(Map::new());
    }

    let content = match fs::read_to_string(&paths.claude_settings) {
        Ok(c) => c,
        Err(e) => {
            anstream::eprintln!(
                "Warning: could not read {}: {}",
                paths.claude_settings.display(),
                e
            );
            return Ok(Map::new());
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) | Err(_) => {
            anstream::eprintln!(
                "Warning: {} is not a JSON object; treating it as empty",
                paths.claude_settings.display()
            );
            Ok(Map::new())
        }
    }
}

pub fn save_native_settings(paths: &Paths, doc: &Map<String, Value>) -> Result<()> {
    let content = serde_json::to_string_pretty(&Value::Object(doc.clone()))
        .context("Failed to serialize Claude settings")?;
    write_private(&paths.claude_settings, &(content + "\n"))
}

/// Read the snapshot file. `None` means the file does not exist; an existing
/// file always yields a map (possibly empty). Malformed lines are skipped so
/// partial manual edits do not break activation.
pub fn read_snapshot(paths: &Paths) -> Result<Option<EnvMap>> {
    if !paths.snapshot_file.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&paths.snapshot_file)
        .with_context(|| format!("Failed to read snapshot: {}", paths.snapshot_file.display()))?;

    let mut map = EnvMap::new();
    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if !is_valid_snapshot_key(key) {
            continue;
        }
        map.insert(key.to_string(), unescape_snapshot_value(value));
    }
    Ok(Some(map))
}

/// Write the full snapshot file, one `KEY=escaped_value` line per entry.
pub fn write_snapshot(paths: &Paths, env: &EnvMap) -> Result<()> {
    let mut content = String::new();
    for (key, value) in env {
        content.push_str(key);
        content.push('=');
        content.push_str(&escape_snapshot_value(value));
        content.push('\n');
    }
    write_private(&paths.snapshot_file, &content)
}

/// Read the persisted activation mode, defaulting when absent or unreadable.
pub fn get_mode(paths: &Paths) -> Mode {
    match fs::read_to_string(&paths.mode_file) {
        Ok(content) => Mode::from_persisted(&content),
        Err(_) => Mode::default(),
    }
}

pub fn set_mode(paths: &Paths, mode: Mode) -> Result<()> {
    write_private(&paths.mode_file, &format!("{}\n", mode))
}
