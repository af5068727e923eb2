//! Test utilities shared across test modules.

use crate::paths::Paths;
use tempfile::TempDir;

/// Create a Paths struct rooted in a temporary directory, mimicking the real
/// ~/.ccenv/ and ~/.claude/ layout.
pub fn setup_test_paths(temp_dir: &TempDir) -> Paths {
    Paths {
        base_dir: temp_dir.path().join(".ccenv"),
        registry_file: temp_dir.path().join(".ccenv/profiles.json"),
        snapshot_file: temp_dir.path().join(".ccenv/active.env"),
        mode_file: temp_dir.path().join(".ccenv/mode"),
        claude_dir: temp_dir.path().join(".claude"),
        claude_settings: temp_dir.path().join(".claude/settings.json"),
        home_dir: temp_dir.path().to_path_buf(),
    }
}
