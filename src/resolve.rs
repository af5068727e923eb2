//! Active-profile resolution.
//!
//! The "active" configuration is never stored; it is derived on demand from
//! the channel the current mode points at. Matching deliberately compares
//! only the base URL and the first-present credential key; model selection
//! keys are ignored, so two profiles differing only in model choice are
//! indistinguishable here.

use anyhow::Result;
use serde_json::Value;

use crate::envmap::{EnvKey, EnvMap};
use crate::paths::Paths;
use crate::registry::{Mode, Registry};
use crate::store;

/// The env object currently present in ~/.claude/settings.json, if any.
pub fn settings_env(paths: &Paths) -> Result<Option<EnvMap>> {
    let doc = store::load_native_settings(paths)?;
    let Some(Value::Object(env)) = doc.get("env") else {
        return Ok(None);
    };

    let mut map = EnvMap::new();
    for (key, value) in env {
        match value {
            Value::String(s) => map.insert(key.clone(), s.clone()),
            // Numbers/bools written by hand still count as values
            other => map.insert(key.clone(), other.to_string()),
        };
    }
    Ok(Some(map))
}

/// Resolve the env vars that are currently in effect, following the mode
/// with a fallback: in settings mode a settings file without our endpoint
/// key falls back to a non-empty snapshot, since the user may have switched
/// mode without re-running activation.
pub fn active_env_vars(paths: &Paths) -> Result<Option<EnvMap>> {
    match store::get_mode(paths) {
        Mode::Env => store::read_snapshot(paths),
        Mode::Settings => {
            if let Some(env) = settings_env(paths)?
                && env.contains_key(EnvKey::BaseUrl.as_str())
            {
                return Ok(Some(env));
            }
            match store::read_snapshot(paths)? {
                Some(snapshot) if !snapshot.is_empty() => Ok(Some(snapshot)),
                _ => Ok(None),
            }
        }
    }
}

/// The env source used for display matching: the mode-appropriate channel
/// only, with no cross-channel fallback.
pub fn display_source(paths: &Paths) -> Result<Option<EnvMap>> {
    match store::get_mode(paths) {
        Mode::Env => store::read_snapshot(paths),
        Mode::Settings => settings_env(paths),
    }
}

/// Whether a profile's env matches an active source: equal base URL, and an
/// equal value for the profile's preferred credential key.
pub fn profile_matches(profile_env: &EnvMap, source: &EnvMap) -> bool {
    let base_key = EnvKey::BaseUrl.as_str();
    match (profile_env.get(base_key), source.get(base_key)) {
        (Some(a), Some(b)) if a == b => {}
        _ => return false,
    }

    for key in EnvKey::CREDENTIALS {
        if let Some(cred) = profile_env.get(key.as_str()) {
            return source.get(key.as_str()) == Some(cred);
        }
    }

    // Profile stores no credential at all: URL equality is the whole match.
    true
}

/// Name of the first stored profile matching the mode-appropriate source,
/// in registry iteration order.
pub fn current_profile_name(paths: &Paths, registry: &Registry) -> Result<Option<String>> {
    let Some(source) = display_source(paths)? else {
        return Ok(None);
    };

    for (name, profile) in &registry.profiles {
        if profile_matches(&profile.env, &source) {
            return Ok(Some(name.clone()));
        }
    }
    Ok(None)
}
