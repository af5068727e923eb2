//! Diagnostic tool for ccenv.
//!
//! This module implements the `ccenv doctor` command, which checks the system
//! for common issues:
//! - Existence and permissions of the state directory.
//! - Validity of the registry and of each stored profile.
//! - Mode flag, snapshot file, and native Claude settings.
//! - Shell detection and the `claude` binary on PATH.
//!
//! It reports issues to the user with a pass/fail/warn status.

use anstyle::AnsiColor;
use std::env;

use crate::envmap::EnvKey;
use crate::paths::Paths;
use crate::registry::Mode;
use crate::resolve;
use crate::shell::Shell;
use crate::store;
use crate::ui::Ui;

/// Run the doctor diagnostics
pub fn run_doctor(paths: &Paths, ui: &Ui) {
    ui.section("ccenv Doctor");
    ui.newline();

    // 1. Check directories
    check_step(ui, "Directories", || {
        let mut ok = true;
        if paths.base_dir.exists() {
            ui.println(format!(
                "  {} Base directory exists: {}",
                ui.icon_ok(),
                paths.base_dir.display()
            ));
            if let Some(problem) = dir_permission_problem(paths) {
                ui.println(format!("  {} {}", ui.icon_warn(), problem));
            }
        } else {
            ui.println(format!(
                "  {} Base directory missing (fresh install?): {}",
                ui.icon_warn(),
                paths.base_dir.display()
            ));
        }

        if paths.claude_dir.exists() {
            ui.println(format!(
                "  {} Claude directory exists: {}",
                ui.icon_ok(),
                paths.claude_dir.display()
            ));
        } else {
            ui.println(format!(
                "  {} Claude directory missing: {}",
                ui.icon_warn(),
                paths.claude_dir.display()
            ));
            // Not necessarily an error if they haven't installed Claude Code yet
        }

        if !paths.base_dir.exists() && !paths.claude_dir.exists() {
            ok = paths.home_dir.exists();
        }
        ok
    });

    // 2. Check Registry
    check_step(ui, "Registry", || {
        let registry = match store::load_registry(paths) {
            Ok(r) => r,
            Err(e) => {
                ui.println(format!("  {} Registry unreadable: {:#}", ui.icon_err(), e));
                return false;
            }
        };

        if registry.is_empty() {
            ui.println(format!(
                "  {} No profiles stored yet (run 'ccenv add')",
                ui.icon_warn()
            ));
            return true;
        }

        ui.println(format!("  Found {} profile(s):", registry.profiles.len()));
        for (name, profile) in &registry.profiles {
            if profile.env.is_empty() {
                ui.println(format!(
                    "    {} {} (empty env, cannot be activated)",
                    ui.icon_warn(),
                    name
                ));
                continue;
            }

            let mut notes = Vec::new();
            if !profile.env.contains_key(EnvKey::BaseUrl.as_str()) {
                notes.push("no base URL");
            }
            let has_credential = EnvKey::CREDENTIALS
                .iter()
                .any(|k| profile.env.get(k.as_str()).is_some_and(|v| !v.is_empty()));
            if !has_credential {
                notes.push("no credential");
            }

            if notes.is_empty() {
                ui.println(format!("    {} {}", ui.icon_ok(), name));
            } else {
                ui.println(format!(
                    "    {} {} ({})",
                    ui.icon_warn(),
                    name,
                    notes.join(", ")
                ));
            }
        }
        true
    });

    // 3. Check Mode and active source
    check_step(ui, "Activation", || {
        let mode = store::get_mode(paths);
        ui.println(format!("  {} Mode: {}", ui.icon_info(), mode));

        match mode {
            Mode::Env => {
                if !paths.snapshot_file.exists() {
                    ui.println(format!(
                        "  {} No snapshot yet (run 'ccenv use <name>')",
                        ui.icon_warn()
                    ));
                    return true;
                }
                match store::read_snapshot(paths) {
                    Ok(Some(env)) if env.is_empty() => {
                        ui.println(format!("  {} Snapshot file is empty", ui.icon_warn()));
                    }
                    Ok(Some(env)) => {
                        ui.println(format!(
                            "  {} Snapshot readable ({} vars)",
                            ui.icon_ok(),
                            env.len()
                        ));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        ui.println(format!("  {} Snapshot unreadable: {:#}", ui.icon_err(), e));
                        return false;
                    }
                }
            }
            Mode::Settings => match resolve::settings_env(paths) {
                Ok(Some(env)) if env.contains_key(EnvKey::BaseUrl.as_str()) => {
                    ui.println(format!(
                        "  {} Claude settings carry an endpoint configuration",
                        ui.icon_ok()
                    ));
                }
                Ok(_) => {
                    ui.println(format!(
                        "  {} Claude settings carry no endpoint (run 'ccenv use <name>')",
                        ui.icon_warn()
                    ));
                }
                Err(e) => {
                    ui.println(format!(
                        "  {} Claude settings unreadable: {:#}",
                        ui.icon_err(),
                        e
                    ));
                    return false;
                }
            },
        }
        true
    });

    // 4. Check Environment
    check_step(ui, "Environment", || {
        match Shell::detect() {
            Some(shell) => ui.println(format!("  {} Shell detected: {}", ui.icon_ok(), shell.name())),
            None => ui.println(format!(
                "  {} Could not detect shell (supported: {})",
                ui.icon_warn(),
                Shell::supported_list()
            )),
        }

        match crate::commands::find_in_path("claude") {
            Some(bin) => ui.println(format!(
                "  {} claude binary: {}",
                ui.icon_ok(),
                bin.display()
            )),
            None => ui.println(format!(
                "  {} claude binary not found on PATH",
                ui.icon_warn()
            )),
        }

        match env::var("EDITOR") {
            Ok(e) => ui.println(format!("  {} EDITOR set to: {}", ui.icon_ok(), e)),
            Err(_) => ui.println(format!(
                "  {} EDITOR not set (using system default)",
                ui.icon_info()
            )),
        }
        true
    });
}

#[cfg(unix)]
fn dir_permission_problem(paths: &Paths) -> Option<String> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(&paths.base_dir).ok()?.permissions().mode();
    if mode & 0o077 != 0 {
        Some(format!(
            "Base directory is group/world accessible (mode {:o}); the next write will fix it",
            mode & 0o777
        ))
    } else {
        None
    }
}

#[cfg(not(unix))]
fn dir_permission_problem(_paths: &Paths) -> Option<String> {
    None
}

fn check_step<F>(ui: &Ui, name: &str, check_fn: F)
where
    F: FnOnce() -> bool,
{
    ui.println(ui.bold(format!("Checking {}...", name)));
    let success = check_fn();
    if !success {
        ui.println(ui.colored("  Issues detected!", AnsiColor::Red));
    }
    ui.newline();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_paths;
    use crate::ui::ColorMode;
    use tempfile::TempDir;

    #[test]
    fn test_doctor_runs_on_fresh_state() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let ui = Ui::new(ColorMode::Never, false);
        run_doctor(&paths, &ui);
    }

    #[test]
    fn test_doctor_runs_with_populated_state() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let ui = Ui::new(ColorMode::Never, false);

        let mut registry = crate::registry::Registry::default();
        let mut env = crate::envmap::EnvMap::new();
        env.insert("ANTHROPIC_BASE_URL".into(), "https://api.x.com".into());
        env.insert("ANTHROPIC_AUTH_TOKEN".into(), "tok123".into());
        registry
            .profiles
            .insert("work".into(), crate::registry::Profile::new(env.clone()));
        store::save_registry(&paths, &registry).unwrap();
        store::write_snapshot(&paths, &env).unwrap();

        run_doctor(&paths, &ui);
    }
}
