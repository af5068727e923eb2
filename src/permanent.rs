//! Permanent shell-config writes.
//!
//! `use --permanent` writes the profile's env straight into the user's shell
//! startup file, inside a fixed marker-delimited block. Content outside the
//! markers is never touched, and the write only happens after an explicit
//! interactive confirmation.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

use crate::envmap::{EnvMap, display_value};
use crate::paths::Paths;
use crate::prompt::{Prompter, ensure_interactive};
use crate::shell::Shell;
use crate::ui::Ui;

pub const BLOCK_START: &str = "# >>> ccenv managed block >>>";
pub const BLOCK_END: &str = "# <<< ccenv managed block <<<";

/// Build the marker-delimited block of export statements.
pub fn build_block(shell: Shell, env: &EnvMap) -> String {
    let mut block = String::from(BLOCK_START);
    block.push('\n');
    for (key, value) in env {
        block.push_str(&shell.export_line(key, value));
        block.push('\n');
    }
    block.push_str(BLOCK_END);
    block.push('\n');
    block
}

/// Like [`build_block`] but with secrets masked, for the preview.
fn build_preview(shell: Shell, env: &EnvMap) -> String {
    let masked: EnvMap = env
        .iter()
        .map(|(k, v)| (k.clone(), display_value(k, v, false)))
        .collect();
    build_block(shell, &masked)
}

/// Replace an existing marker block in place, or append a new one after
/// ensuring a trailing newline. Matches from the first start marker to the
/// first end marker that follows it.
pub fn upsert_block(existing: &str, block: &str) -> String {
    if let Some(start) = existing.find(BLOCK_START)
        && let Some(end_marker) = existing[start..].find(BLOCK_END)
    {
        let end = start + end_marker + BLOCK_END.len();
        // Swallow the newline after the old end marker, the new block
        // carries its own.
        let end = if existing[end..].starts_with('\n') {
            end + 1
        } else {
            end
        };
        let mut out = String::with_capacity(existing.len() + block.len());
        out.push_str(&existing[..start]);
        out.push_str(block);
        out.push_str(&existing[end..]);
        return out;
    }

    let mut out = existing.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(block);
    out
}

/// Run the permanent-write flow: detect shell, preview, confirm, write.
/// Declining the confirmation is not an error.
pub fn run(paths: &Paths, env: &EnvMap, ui: &Ui, prompter: &mut dyn Prompter) -> Result<()> {
    ensure_interactive(prompter, "use --permanent")?;

    let Some(shell) = Shell::detect() else {
        bail!(
            "Could not detect your shell, refusing to guess.\nHint: Supported shells: {}",
            Shell::supported_list()
        );
    };

    let config_path = shell.config_path(&paths.home_dir);

    ui.section("Permanent write");
    ui.newline();
    ui.println(format!("Target file: {}", config_path.display()));
    ui.println(format!("Detected shell: {}", shell.name()));
    ui.newline();
    ui.println("The following block will be written (secrets masked):");
    ui.newline();
    for line in build_preview(shell, env).lines() {
        ui.println(format!("  {}", ui.dim(line)));
    }
    ui.newline();
    ui.println(
        "An existing ccenv block in that file is replaced; everything else is left untouched.",
    );

    let confirmed = prompter.confirm(
        &format!("Write these variables to {}?", config_path.display()),
        Some("New shells will pick the variables up automatically"),
    )?;

    if !confirmed {
        ui.warn("Permanent write cancelled.");
        ui.println(format!(
            "To load the profile in the current shell instead:\n  {}",
            shell.activation_command()
        ));
        return Ok(());
    }

    write_block(&config_path, &build_block(shell, env))?;

    ui.ok(format!("Updated {}", config_path.display()));
    ui.println("Restart your shell (or source the file) for the change to take effect.");
    Ok(())
}

fn write_block(config_path: &Path, block: &str) -> Result<()> {
    let existing = if config_path.exists() {
        fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?
    } else {
        String::new()
    };

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    fs::write(config_path, upsert_block(&existing, block))
        .with_context(|| format!("Failed to write {}", config_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_build_block() {
        let env = env_of(&[
            ("ANTHROPIC_BASE_URL", "https://api.x.com"),
            ("ANTHROPIC_AUTH_TOKEN", "tok123"),
        ]);
        let block = build_block(Shell::Bash, &env);
        assert!(block.starts_with(BLOCK_START));
        assert!(block.ends_with(&format!("{}\n", BLOCK_END)));
        assert!(block.contains("export ANTHROPIC_BASE_URL='https://api.x.com'"));
        assert!(block.contains("export ANTHROPIC_AUTH_TOKEN='tok123'"));
    }

    #[test]
    fn test_preview_masks_secrets() {
        let env = env_of(&[("ANTHROPIC_AUTH_TOKEN", "sk-ant-api03-longsecret")]);
        let preview = build_preview(Shell::Bash, &env);
        assert!(preview.contains("sk-ant-a..."));
        assert!(!preview.contains("longsecret"));
    }

    #[test]
    fn test_upsert_appends_with_newline() {
        let block = build_block(Shell::Zsh, &env_of(&[("K", "v")]));
        let out = upsert_block("export PATH=$PATH:/opt/bin", &block);
        assert!(out.starts_with("export PATH=$PATH:/opt/bin\n# >>>"));
        assert!(out.ends_with(&format!("{}\n", BLOCK_END)));
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let old = build_block(Shell::Zsh, &env_of(&[("OLD_KEY", "old")]));
        let file = format!("# before\n{}# after\n", old);

        let new = build_block(Shell::Zsh, &env_of(&[("NEW_KEY", "new")]));
        let out = upsert_block(&file, &new);

        assert!(out.contains("# before\n"));
        assert!(out.contains("# after\n"));
        assert!(out.contains("NEW_KEY"));
        assert!(!out.contains("OLD_KEY"));
        assert_eq!(out.matches(BLOCK_START).count(), 1);
    }

    #[test]
    fn test_upsert_idempotent() {
        let block = build_block(Shell::Bash, &env_of(&[("K", "v")]));
        let once = upsert_block("", &block);
        let twice = upsert_block(&once, &block);
        assert_eq!(once, twice);
    }

    fn force_zsh_env() {
        unsafe {
            std::env::remove_var("FISH_VERSION");
            std::env::remove_var("ZSH_VERSION");
            std::env::remove_var("PSModulePath");
            std::env::set_var("SHELL", "/bin/zsh");
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_declined_confirmation_leaves_config_untouched() {
        use crate::prompt::ScriptedPrompter;
        use crate::test_utils::setup_test_paths;
        use crate::ui::{ColorMode, Ui};
        use tempfile::TempDir;

        force_zsh_env();

        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let zshrc = paths.home_dir.join(".zshrc");
        fs::write(&zshrc, "# mine\n").unwrap();

        let ui = Ui::new(ColorMode::Never, false);
        let mut prompter = ScriptedPrompter::new(&[]).with_confirms(&[false]);
        run(&paths, &env_of(&[("K", "v")]), &ui, &mut prompter).unwrap();

        assert_eq!(fs::read_to_string(&zshrc).unwrap(), "# mine\n");
    }

    #[test]
    #[serial_test::serial]
    fn test_confirmed_write_appends_block() {
        use crate::prompt::ScriptedPrompter;
        use crate::test_utils::setup_test_paths;
        use crate::ui::{ColorMode, Ui};
        use tempfile::TempDir;

        force_zsh_env();

        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let zshrc = paths.home_dir.join(".zshrc");
        fs::write(&zshrc, "# mine\n").unwrap();

        let ui = Ui::new(ColorMode::Never, false);
        let mut prompter = ScriptedPrompter::new(&[]).with_confirms(&[true]);
        run(
            &paths,
            &env_of(&[("ANTHROPIC_BASE_URL", "https://api.x.com")]),
            &ui,
            &mut prompter,
        )
        .unwrap();

        let content = fs::read_to_string(&zshrc).unwrap();
        assert!(content.starts_with("# mine\n"));
        assert!(content.contains(BLOCK_START));
        assert!(content.contains("export ANTHROPIC_BASE_URL='https://api.x.com'"));
    }
}
