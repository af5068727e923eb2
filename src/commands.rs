//! High-level command orchestration for the CLI.
//!
//! One handler per subcommand. Handlers coordinate:
//! - `crate::store` for persistence.
//! - `crate::resolve` for active-profile derivation.
//! - `crate::shell` / `crate::permanent` for shell-facing output.
//! - `crate::prompt` for interactive input.
//! - `crate::ui` for display.

use anstyle::AnsiColor;
use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::envmap::{EnvKey, display_value};
use crate::paths::Paths;
use crate::permanent;
use crate::prompt::{Prompter, ensure_interactive};
use crate::registry::{Mode, Profile, Registry, validate_profile_name};
use crate::resolve;
use crate::shell::{EnvFormat, Shell};
use crate::store;
use crate::ui::Ui;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const CLAUDE_BIN: &str = "claude";
const SKIP_PERMISSIONS_FLAG: &str = "--dangerously-skip-permissions";

/// List all profiles, marking the active one
pub fn list(paths: &Paths, ui: &Ui) -> Result<()> {
    let registry = store::load_registry(paths)?;

    if registry.is_empty() {
        ui.warn("No profiles found.");
        ui.newline();
        ui.println("Create one with:");
        ui.println(format!("  {} add <name>", ui.bold("ccenv")));
        return Ok(());
    }

    let active = resolve::current_profile_name(paths, &registry)?;

    let mut table = ui.simple_table();
    table.set_header(vec![
        ui.header_cell(""),
        ui.header_cell("Profile"),
        ui.header_cell("Base URL"),
        ui.header_cell("Model"),
        ui.header_cell("Status"),
    ]);

    for (name, profile) in &registry.profiles {
        let is_active = active.as_deref() == Some(name.as_str());
        let icon = if is_active { ui.icon_ok() } else { " " };
        let status_cell = if is_active {
            ui.colored_cell("active", AnsiColor::Green)
        } else {
            ui.cell("-")
        };

        let base_url = profile
            .env
            .get(EnvKey::BaseUrl.as_str())
            .map(String::as_str)
            .unwrap_or("-");
        let model = profile
            .env
            .get(EnvKey::Model.as_str())
            .map(String::as_str)
            .unwrap_or("-");

        table.add_row(vec![
            ui.cell(icon),
            ui.cell(name),
            ui.cell(base_url),
            ui.cell(model),
            status_cell,
        ]);
    }

    ui.section("Profiles");
    ui.println(table.to_string());

    for (name, profile) in &registry.profiles {
        if let Some(desc) = &profile.description {
            ui.println(format!("  {} {}", ui.bold(name), ui.dim(desc)));
        }
    }

    // The active settings may point at an endpoint no profile knows about.
    // Call that out so it doesn't read as a misconfiguration.
    if active.is_none()
        && let Some(env) = resolve::settings_env(paths)?
        && let Some(url) = env.get(EnvKey::BaseUrl.as_str())
    {
        ui.newline();
        ui.info(format!(
            "Claude settings currently use an unlisted custom configuration: {}",
            url
        ));
    }

    Ok(())
}

/// Shared prompt sequence for add/update. When `existing` is given each
/// prompt is pre-filled with the stored value, so pressing Enter keeps it.
fn prompt_profile(prompter: &mut dyn Prompter, existing: Option<&Profile>) -> Result<Profile> {
    let prev = |key: EnvKey| {
        existing.and_then(|p| p.env.get(key.as_str()).map(String::as_str))
    };

    let base_url = prompter.text(
        "Base URL",
        Some(prev(EnvKey::BaseUrl).unwrap_or(DEFAULT_BASE_URL)),
    )?;
    let auth_token = prompter.text("Auth token (ANTHROPIC_AUTH_TOKEN)", prev(EnvKey::AuthToken))?;
    let api_key = prompter.text(
        "API key (ANTHROPIC_API_KEY, optional)",
        prev(EnvKey::ApiKey),
    )?;
    let model = prompter.text("Model (ANTHROPIC_MODEL, optional)", prev(EnvKey::Model))?;
    let small_model = prompter.text(
        "Small/fast model (ANTHROPIC_SMALL_FAST_MODEL, optional)",
        prev(EnvKey::SmallFastModel),
    )?;
    let description = prompter.text(
        "Description (optional)",
        existing.and_then(|p| p.description.as_deref()),
    )?;

    // Start from the existing env so hand-edited extra keys survive updates.
    let mut env = existing.map(|p| p.env.clone()).unwrap_or_default();
    env.insert(EnvKey::BaseUrl.as_str().to_string(), base_url);
    env.insert(EnvKey::AuthToken.as_str().to_string(), auth_token);
    for (key, value) in [
        (EnvKey::ApiKey, api_key),
        (EnvKey::Model, model),
        (EnvKey::SmallFastModel, small_model),
    ] {
        if !value.is_empty() {
            env.insert(key.as_str().to_string(), value);
        }
    }

    Ok(Profile {
        env,
        description: if description.is_empty() {
            None
        } else {
            Some(description)
        },
        created_at: existing.and_then(|p| p.created_at).or_else(|| Some(Utc::now())),
    })
}

fn print_profile_summary(ui: &Ui, profile: &Profile) {
    let mut table = ui.simple_table();
    for (key, value) in &profile.env {
        table.add_row(vec![
            ui.cell(format!("{}:", key)),
            ui.cell(display_value(key, value, false)),
        ]);
    }
    if let Some(desc) = &profile.description {
        table.add_row(vec![ui.cell("Description:"), ui.cell(desc)]);
    }
    ui.println(table.to_string());
}

/// Create a new profile interactively
pub fn add(
    paths: &Paths,
    name: Option<&str>,
    ui: &Ui,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    ensure_interactive(prompter, "add")?;
    paths.ensure_base_dir()?;
    let mut registry = store::load_registry(paths)?;

    let name = match name {
        Some(n) => n.to_string(),
        None => prompter.text("Profile name", None)?,
    };
    validate_profile_name(&name)?;

    if registry.profiles.contains_key(&name) {
        bail!(
            "Profile '{}' already exists.\nHint: Use 'ccenv update {}' to modify it, or choose a different name.",
            name,
            name
        );
    }

    let profile = prompt_profile(prompter, None)?;
    registry.profiles.insert(name.clone(), profile.clone());
    store::save_registry(paths, &registry)?;

    ui.ok(format!("Created profile '{}'", name));
    ui.newline();
    print_profile_summary(ui, &profile);
    ui.newline();
    ui.println("To activate it:");
    ui.println(format!("  ccenv use {}", name));

    Ok(())
}

/// Modify an existing profile interactively, Enter keeping each stored value
pub fn update(
    paths: &Paths,
    name: Option<&str>,
    ui: &Ui,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    ensure_interactive(prompter, "update")?;
    let mut registry = store::load_registry(paths)?;

    let name = match name {
        Some(n) => n.to_string(),
        None => prompter.text("Profile name", None)?,
    };
    validate_profile_name(&name)?;

    let Some(existing) = registry.profiles.get(&name).cloned() else {
        bail!(
            "Profile '{}' does not exist.\nHint: Use 'ccenv add {}' to create it.",
            name,
            name
        );
    };

    let profile = prompt_profile(prompter, Some(&existing))?;
    registry.profiles.insert(name.clone(), profile.clone());
    store::save_registry(paths, &registry)?;

    ui.ok(format!("Updated profile '{}'", name));
    ui.newline();
    print_profile_summary(ui, &profile);

    Ok(())
}

/// Remove a profile. Takes the name as a direct argument; no confirmation.
pub fn remove(paths: &Paths, name: &str, ui: &Ui) -> Result<()> {
    validate_profile_name(name)?;

    if !paths.registry_file.exists() {
        bail!("No profiles stored yet.\nHint: Nothing to remove.");
    }

    let mut registry = store::load_registry(paths)?;
    if registry.profiles.shift_remove(name).is_none() {
        bail!(
            "Profile '{}' does not exist.\nHint: Use 'ccenv list' to see available profiles.",
            name
        );
    }

    store::save_registry(paths, &registry)?;
    ui.ok(format!("Removed profile '{}'", name));
    Ok(())
}

/// Look up a profile for activation, with three distinct failure messages:
/// empty registry, unknown name, empty env.
fn activation_profile<'a>(registry: &'a Registry, name: &str) -> Result<&'a Profile> {
    validate_profile_name(name)?;

    if registry.is_empty() {
        bail!("No profiles stored yet.\nHint: Create one with 'ccenv add'.");
    }

    let Some(profile) = registry.profiles.get(name) else {
        bail!(
            "Profile '{}' does not exist.\nHint: Use 'ccenv list' to see available profiles.",
            name
        );
    };

    if profile.env.is_empty() {
        bail!(
            "Profile '{}' has an empty environment and cannot be activated.\nHint: Fill it in with 'ccenv update {}'.",
            name,
            name
        );
    }

    Ok(profile)
}

/// Activate a profile through the channel the current mode selects
pub fn use_profile(
    paths: &Paths,
    name: &str,
    permanent_flag: bool,
    ui: &Ui,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    let registry = store::load_registry(paths)?;
    let profile = activation_profile(&registry, name)?.clone();

    match store::get_mode(paths) {
        Mode::Settings => {
            let mut doc = store::load_native_settings(paths)?;
            let env_obj = doc
                .entry("env".to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !env_obj.is_object() {
                *env_obj = Value::Object(Map::new());
            }
            if let Value::Object(env_map) = env_obj {
                // Drop every recognized key first so a previous profile with
                // a different key set cannot leave stale entries behind.
                for key in EnvKey::ALL {
                    env_map.remove(key.as_str());
                }
                for (key, value) in &profile.env {
                    env_map.insert(key.clone(), Value::String(value.clone()));
                }
            }
            store::save_native_settings(paths, &doc)?;

            ui.ok(format!(
                "Profile '{}' written to {}",
                name,
                paths.claude_settings.display()
            ));
            ui.println("Restart Claude Code to pick up the new settings.");

            if permanent_flag {
                ui.info(
                    "--permanent has no effect in settings mode; the settings file is already durable.",
                );
            }
        }
        Mode::Env => {
            // Full overwrite, never a merge: the snapshot must not retain
            // keys orphaned by the previous profile.
            store::write_snapshot(paths, &profile.env)?;
            ui.ok(format!(
                "Profile '{}' written to {}",
                name,
                paths.snapshot_file.display()
            ));

            if permanent_flag {
                ui.newline();
                permanent::run(paths, &profile.env, ui, prompter)?;
            } else {
                print_activation_hint(ui);
            }
        }
    }

    Ok(())
}

fn print_activation_hint(ui: &Ui) {
    let detected = Shell::detect();

    let mut commands: Vec<String> = Vec::new();
    for shell in Shell::ALL {
        let cmd = shell.activation_command();
        if !commands.contains(&cmd) {
            commands.push(cmd);
        }
    }

    ui.newline();
    match detected {
        Some(shell) => {
            ui.println("Load it into your current shell:");
            ui.println(format!("  {}", ui.bold(shell.activation_command())));
            let own = shell.activation_command();
            let others: Vec<_> = commands.iter().filter(|c| **c != own).collect();
            if !others.is_empty() {
                ui.newline();
                ui.println(ui.dim("Other shells:"));
                for cmd in others {
                    ui.println(format!("  {}", ui.dim(cmd)));
                }
            }
        }
        None => {
            ui.println("Load it into your shell:");
            for cmd in &commands {
                ui.println(format!("  {}", cmd));
            }
        }
    }
}

/// Argument list for the spawned Claude Code process. The permission-skip
/// flag always comes before user-supplied args.
fn child_args(skip_permissions: bool, extra_args: &[String]) -> Vec<String> {
    let mut args = Vec::new();
    if skip_permissions {
        args.push(SKIP_PERMISSIONS_FLAG.to_string());
    }
    args.extend(extra_args.iter().cloned());
    args
}

pub(crate) fn find_in_path(bin: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(bin);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let candidate = dir.join(format!("{}.exe", bin));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Launch Claude Code with a profile's env. Returns the child's exit code.
pub fn start(
    paths: &Paths,
    name: &str,
    extra_args: &[String],
    skip_permissions: bool,
    ui: &Ui,
) -> Result<i32> {
    let registry = store::load_registry(paths)?;
    let profile = activation_profile(&registry, name)?;

    let Some(claude_bin) = find_in_path(CLAUDE_BIN) else {
        bail!(
            "The '{}' binary was not found on your PATH.\nHint: Install Claude Code first: npm install -g @anthropic-ai/claude-code",
            CLAUDE_BIN
        );
    };

    let mut command = Command::new(&claude_bin);
    command.args(child_args(skip_permissions, extra_args));
    // Profile values win over inherited process env on collision
    for (key, value) in &profile.env {
        command.env(key, value);
    }

    ui.info(format!("Launching {} with profile '{}'", CLAUDE_BIN, name));

    // stdio is inherited: the child owns the terminal until it exits
    let status = match command.status() {
        Ok(status) => status,
        Err(e) => bail!("Failed to launch '{}': {}", claude_bin.display(), e),
    };

    Ok(status.code().unwrap_or(1))
}

/// Show the current mode, active source, matched profile, and env values
pub fn current(paths: &Paths, show_secret: bool, ui: &Ui) -> Result<()> {
    let registry = store::load_registry(paths)?;
    let mode = store::get_mode(paths);

    ui.section("Current Configuration");
    ui.newline();

    let mut table = ui.simple_table();
    table.add_row(vec![ui.cell("Mode:"), ui.cell(mode.as_str())]);
    let source_path = match mode {
        Mode::Settings => &paths.claude_settings,
        Mode::Env => &paths.snapshot_file,
    };
    table.add_row(vec![
        ui.cell("Source:"),
        ui.cell(source_path.display().to_string()),
    ]);

    let source = resolve::display_source(paths)?;
    match resolve::current_profile_name(paths, &registry)? {
        Some(name) => table.add_row(vec![
            ui.cell("Active profile:"),
            ui.colored_cell(name, AnsiColor::Green),
        ]),
        None => table.add_row(vec![ui.cell("Active profile:"), ui.cell("(none)")]),
    };
    ui.println(table.to_string());

    match source {
        Some(env) if !env.is_empty() => {
            ui.newline();
            ui.section("Environment");
            let mut env_table = ui.simple_table();
            for (key, value) in &env {
                env_table.add_row(vec![
                    ui.cell(format!("{}:", key)),
                    ui.cell(display_value(key, value, show_secret)),
                ]);
            }
            ui.println(env_table.to_string());
        }
        _ => {
            ui.newline();
            ui.info("No active configuration. Activate one with 'ccenv use <name>'.");
        }
    }

    Ok(())
}

/// Show or change the activation mode
pub fn mode(paths: &Paths, value: Option<&str>, ui: &Ui) -> Result<()> {
    let current = store::get_mode(paths);

    let Some(raw) = value else {
        ui.section("Activation mode");
        ui.newline();
        ui.println(format!("Current mode: {}", ui.bold(current.as_str())));
        ui.newline();
        match current {
            Mode::Env => {
                ui.println(
                    "env mode: 'ccenv use' writes the profile to ~/.ccenv/active.env; \
                     your shell loads it with 'ccenv env'.",
                );
                ui.println(
                    "settings mode instead writes the profile into ~/.claude/settings.json, \
                     picked up when Claude Code restarts.",
                );
            }
            Mode::Settings => {
                ui.println(
                    "settings mode: 'ccenv use' writes the profile into ~/.claude/settings.json, \
                     picked up when Claude Code restarts.",
                );
                ui.println(
                    "env mode instead writes the profile to ~/.ccenv/active.env; \
                     your shell loads it with 'ccenv env'.",
                );
            }
        }
        let other = match current {
            Mode::Env => Mode::Settings,
            Mode::Settings => Mode::Env,
        };
        ui.newline();
        ui.println(format!("Switch with: ccenv mode {}", other));
        return Ok(());
    };

    let new: Mode = raw.parse()?;
    store::set_mode(paths, new)?;
    ui.ok(format!("Mode changed: {} -> {}", current, new));
    ui.println("Run 'ccenv use <name>' to activate a profile through the new channel.");
    Ok(())
}

/// Emit the active env in a shell-loadable syntax
pub fn env_output(paths: &Paths, format: &str, ui: &Ui) -> Result<()> {
    let format: EnvFormat = format.parse()?;

    let env = match resolve::active_env_vars(paths)? {
        Some(env) if !env.is_empty() => env,
        _ => bail!("No active environment found.\nHint: Run 'ccenv use <name>' first."),
    };

    for (key, value) in &env {
        ui.println(format.format_line(key, value));
    }
    Ok(())
}

/// Open the registry in the user's editor, then re-validate it
pub fn edit(paths: &Paths, ui: &Ui) -> Result<()> {
    paths.ensure_base_dir()?;
    if !paths.registry_file.exists() {
        store::save_registry(paths, &Registry::default())?;
    }

    open_in_editor(&paths.registry_file)?;

    store::load_registry(paths)
        .context("The edited registry is no longer valid; fix it before running other commands")?;
    ui.ok(format!("Updated {}", paths.registry_file.display()));
    Ok(())
}

fn open_in_editor(path: &Path) -> Result<()> {
    if let Ok(editor) = std::env::var("EDITOR") {
        let status = Command::new(&editor)
            .arg(path)
            .status()
            .with_context(|| format!("Failed to run editor: {}", editor))?;

        if !status.success() {
            bail!("Editor exited with non-zero status");
        }
    } else {
        // Fallback to macOS 'open -t' (opens in default text editor)
        let status = Command::new("open")
            .arg("-t")
            .arg(path)
            .status()
            .context("Failed to run 'open -t'")?;

        if !status.success() {
            bail!("'open -t' exited with non-zero status");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envmap::EnvMap;
    use crate::prompt::ScriptedPrompter;
    use crate::test_utils::setup_test_paths;
    use crate::ui::ColorMode;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn test_ui() -> Ui {
        Ui::new(ColorMode::Never, false)
    }

    /// Answers for the six prompts of prompt_profile, in order.
    fn add_answers(base_url: &str, token: &str) -> ScriptedPrompter {
        ScriptedPrompter::new(&[base_url, token, "", "", "", ""])
    }

    fn add_work_profile(paths: &Paths) {
        let ui = test_ui();
        let mut prompter = add_answers("https://api.x.com", "tok123");
        add(paths, Some("work"), &ui, &mut prompter).unwrap();
    }

    #[test]
    fn test_list_empty_registry() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        assert!(list(&paths, &test_ui()).is_ok());
        // list never lazily creates the registry
        assert!(!paths.registry_file.exists());
    }

    #[test]
    fn test_add_writes_registry() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        add_work_profile(&paths);

        let registry = store::load_registry(&paths).unwrap();
        let profile = &registry.profiles["work"];
        assert_eq!(profile.env["ANTHROPIC_BASE_URL"], "https://api.x.com");
        assert_eq!(profile.env["ANTHROPIC_AUTH_TOKEN"], "tok123");
        // blank optional fields are omitted
        assert!(!profile.env.contains_key("ANTHROPIC_API_KEY"));
        assert!(!profile.env.contains_key("ANTHROPIC_MODEL"));
        assert!(profile.created_at.is_some());
    }

    #[test]
    fn test_add_blank_answers_store_required_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let ui = test_ui();

        // Enter on everything: base URL takes its default, token stays empty
        let mut prompter = ScriptedPrompter::new(&["", "", "", "", "", ""]);
        add(&paths, Some("blank"), &ui, &mut prompter).unwrap();

        let registry = store::load_registry(&paths).unwrap();
        let profile = &registry.profiles["blank"];
        assert_eq!(profile.env["ANTHROPIC_BASE_URL"], DEFAULT_BASE_URL);
        assert_eq!(profile.env["ANTHROPIC_AUTH_TOKEN"], "");
        assert_eq!(profile.env.len(), 2);
    }

    #[test]
    fn test_add_duplicate_does_not_mutate() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        add_work_profile(&paths);

        let before = fs::read_to_string(&paths.registry_file).unwrap();
        let mut prompter = add_answers("https://other.example", "different");
        assert!(add(&paths, Some("work"), &test_ui(), &mut prompter).is_err());
        let after = fs::read_to_string(&paths.registry_file).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_add_invalid_name() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let mut prompter = add_answers("https://api.x.com", "t");
        assert!(add(&paths, Some("bad name!"), &test_ui(), &mut prompter).is_err());
    }

    #[test]
    fn test_update_enter_preserves_values() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        add_work_profile(&paths);

        let mut prompter = ScriptedPrompter::new(&["", "", "", "", "", ""]);
        update(&paths, Some("work"), &test_ui(), &mut prompter).unwrap();

        let registry = store::load_registry(&paths).unwrap();
        let profile = &registry.profiles["work"];
        assert_eq!(profile.env["ANTHROPIC_BASE_URL"], "https://api.x.com");
        assert_eq!(profile.env["ANTHROPIC_AUTH_TOKEN"], "tok123");
    }

    #[test]
    fn test_update_preserves_extra_env_keys() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        add_work_profile(&paths);

        // Hand-edit an extra key into the stored profile
        let mut registry = store::load_registry(&paths).unwrap();
        registry.profiles["work"]
            .env
            .insert("MY_EXTRA_FLAG".into(), "1".into());
        store::save_registry(&paths, &registry).unwrap();

        let mut prompter = ScriptedPrompter::new(&["", "newtok", "", "", "", ""]);
        update(&paths, Some("work"), &test_ui(), &mut prompter).unwrap();

        let registry = store::load_registry(&paths).unwrap();
        let profile = &registry.profiles["work"];
        assert_eq!(profile.env["MY_EXTRA_FLAG"], "1");
        assert_eq!(profile.env["ANTHROPIC_AUTH_TOKEN"], "newtok");
    }

    #[test]
    fn test_update_missing_profile() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        add_work_profile(&paths);

        let mut prompter = ScriptedPrompter::new(&["", "", "", "", "", ""]);
        let err = update(&paths, Some("ghost"), &test_ui(), &mut prompter).unwrap_err();
        assert!(err.to_string().contains("ccenv add"));
    }

    #[test]
    fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        add_work_profile(&paths);

        remove(&paths, "work", &test_ui()).unwrap();
        let registry = store::load_registry(&paths).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_ghost_leaves_registry_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        add_work_profile(&paths);

        let before = fs::read_to_string(&paths.registry_file).unwrap();
        assert!(remove(&paths, "ghost", &test_ui()).is_err());
        let after = fs::read_to_string(&paths.registry_file).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_activation_failure_messages_are_distinct() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let ui = test_ui();
        let mut prompter = ScriptedPrompter::new(&[]);

        // 1. No profiles at all
        let err = use_profile(&paths, "work", false, &ui, &mut prompter).unwrap_err();
        assert!(err.to_string().contains("No profiles stored yet"));

        add_work_profile(&paths);

        // 2. Name not found
        let err = use_profile(&paths, "ghost", false, &ui, &mut prompter).unwrap_err();
        assert!(err.to_string().contains("does not exist"));

        // 3. Empty env
        let mut registry = store::load_registry(&paths).unwrap();
        registry
            .profiles
            .insert("hollow".into(), Profile::default());
        store::save_registry(&paths, &registry).unwrap();
        let err = use_profile(&paths, "hollow", false, &ui, &mut prompter).unwrap_err();
        assert!(err.to_string().contains("empty environment"));
    }

    #[test]
    #[serial]
    fn test_use_env_mode_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        add_work_profile(&paths);
        let ui = test_ui();
        let mut prompter = ScriptedPrompter::new(&[]);

        use_profile(&paths, "work", false, &ui, &mut prompter).unwrap();
        let first = fs::read_to_string(&paths.snapshot_file).unwrap();
        use_profile(&paths, "work", false, &ui, &mut prompter).unwrap();
        let second = fs::read_to_string(&paths.snapshot_file).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("ANTHROPIC_BASE_URL=https://api.x.com"));
    }

    #[test]
    #[serial]
    fn test_use_env_mode_overwrites_whole_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        add_work_profile(&paths);
        let ui = test_ui();
        let mut prompter = ScriptedPrompter::new(&[]);

        let mut stale = EnvMap::new();
        stale.insert("LEFTOVER_KEY".into(), "stale".into());
        store::write_snapshot(&paths, &stale).unwrap();

        use_profile(&paths, "work", false, &ui, &mut prompter).unwrap();
        let snapshot = store::read_snapshot(&paths).unwrap().unwrap();
        assert!(!snapshot.contains_key("LEFTOVER_KEY"));
    }

    #[test]
    fn test_use_settings_mode_replaces_recognized_keys_only() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        add_work_profile(&paths);
        store::set_mode(&paths, Mode::Settings).unwrap();

        fs::create_dir_all(&paths.claude_dir).unwrap();
        fs::write(
            &paths.claude_settings,
            r#"{
                "permissions": {"allow": ["Bash"]},
                "env": {
                    "ANTHROPIC_API_KEY": "stale-from-old-profile",
                    "UNRELATED_VAR": "keep-me"
                }
            }"#,
        )
        .unwrap();

        let ui = test_ui();
        let mut prompter = ScriptedPrompter::new(&[]);
        use_profile(&paths, "work", false, &ui, &mut prompter).unwrap();

        let doc = store::load_native_settings(&paths).unwrap();
        let env = doc["env"].as_object().unwrap();
        // Stale recognized key from a previous profile is gone
        assert!(!env.contains_key("ANTHROPIC_API_KEY"));
        // Foreign keys survive, both inside env and beside it
        assert_eq!(env["UNRELATED_VAR"], "keep-me");
        assert_eq!(doc["permissions"]["allow"][0], "Bash");
        assert_eq!(env["ANTHROPIC_BASE_URL"], "https://api.x.com");
        assert_eq!(env["ANTHROPIC_AUTH_TOKEN"], "tok123");
    }

    #[test]
    fn test_mode_switch_never_touches_registry() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        add_work_profile(&paths);

        let before = fs::read_to_string(&paths.registry_file).unwrap();
        mode(&paths, Some("settings"), &test_ui()).unwrap();
        mode(&paths, Some("env"), &test_ui()).unwrap();
        let after = fs::read_to_string(&paths.registry_file).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_mode_rejects_unknown_value() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let err = mode(&paths, Some("both"), &test_ui()).unwrap_err();
        assert!(err.to_string().contains("settings, env"));
    }

    #[test]
    #[serial]
    fn test_env_output_requires_activation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let ui = test_ui();

        let err = env_output(&paths, "sh", &ui).unwrap_err();
        assert!(err.to_string().contains("ccenv use"));

        add_work_profile(&paths);
        let mut prompter = ScriptedPrompter::new(&[]);
        use_profile(&paths, "work", false, &ui, &mut prompter).unwrap();
        assert!(env_output(&paths, "sh", &ui).is_ok());
    }

    #[test]
    fn test_env_output_unknown_format() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let err = env_output(&paths, "tcsh", &test_ui()).unwrap_err();
        assert!(err.to_string().contains("Supported formats"));
    }

    #[test]
    fn test_child_args_ordering() {
        let extra = vec!["-p".to_string(), "hello".to_string()];
        assert_eq!(
            child_args(true, &extra),
            vec![
                SKIP_PERMISSIONS_FLAG.to_string(),
                "-p".to_string(),
                "hello".to_string()
            ]
        );
        assert_eq!(child_args(false, &extra), extra);
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_find_in_path() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let bin = temp_dir.path().join("claude");
        fs::write(&bin, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();

        let old_path = std::env::var_os("PATH");
        unsafe {
            std::env::set_var("PATH", temp_dir.path());
        }
        let found = find_in_path("claude");
        unsafe {
            match old_path {
                Some(p) => std::env::set_var("PATH", p),
                None => std::env::remove_var("PATH"),
            }
        }

        assert_eq!(found, Some(bin));
    }

    #[test]
    #[serial]
    fn test_start_fails_fast_without_binary() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        add_work_profile(&paths);

        let old_path = std::env::var_os("PATH");
        unsafe {
            // Empty PATH: the claude binary cannot be found
            std::env::set_var("PATH", temp_dir.path());
        }
        let result = start(&paths, "work", &[], true, &test_ui());
        unsafe {
            match old_path {
                Some(p) => std::env::set_var("PATH", p),
                None => std::env::remove_var("PATH"),
            }
        }

        let err = result.unwrap_err();
        assert!(err.to_string().contains("not found on your PATH"));
    }

    #[test]
    fn test_current_runs_without_state() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        assert!(current(&paths, false, &test_ui()).is_ok());
    }
}
