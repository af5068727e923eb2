//! Environment variable model for profiles.
//!
//! Profiles carry an ordered map of env vars. A fixed set of keys is
//! recognized by ccenv (endpoint, credentials, model selection); anything
//! else is passed through untouched so hand-edited extras survive.

use indexmap::IndexMap;

/// Ordered env mapping. Order is preserved so registry iteration order
/// decides first-match-wins resolution and snapshot files round-trip stably.
pub type EnvMap = IndexMap<String, String>;

/// How many characters of a secret are shown before truncation.
pub const MASK_PREFIX_LEN: usize = 8;

/// Env keys ccenv recognizes and manages inside the Claude settings `env`
/// object and the snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvKey {
    BaseUrl,
    AuthToken,
    ApiKey,
    Model,
    SmallFastModel,
}

impl EnvKey {
    pub const ALL: [EnvKey; 5] = [
        EnvKey::BaseUrl,
        EnvKey::AuthToken,
        EnvKey::ApiKey,
        EnvKey::Model,
        EnvKey::SmallFastModel,
    ];

    /// Credential keys in matching-preference order.
    pub const CREDENTIALS: [EnvKey; 2] = [EnvKey::AuthToken, EnvKey::ApiKey];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::BaseUrl => "ANTHROPIC_BASE_URL",
            EnvKey::AuthToken => "ANTHROPIC_AUTH_TOKEN",
            EnvKey::ApiKey => "ANTHROPIC_API_KEY",
            EnvKey::Model => "ANTHROPIC_MODEL",
            EnvKey::SmallFastModel => "ANTHROPIC_SMALL_FAST_MODEL",
        }
    }

    /// Whether values under this key should be masked in output.
    pub fn is_secret(&self) -> bool {
        matches!(self, EnvKey::AuthToken | EnvKey::ApiKey)
    }
}

/// Whether a raw key name should be treated as a secret when displayed.
/// Unknown keys that look credential-shaped are masked too.
pub fn is_secret_key(key: &str) -> bool {
    EnvKey::ALL
        .iter()
        .any(|k| k.as_str() == key && k.is_secret())
        || key.contains("TOKEN")
        || key.contains("KEY")
        || key.contains("SECRET")
}

/// Truncate a secret to a fixed prefix with an ellipsis suffix. Values at or
/// under the threshold are shown in full.
pub fn mask_value(value: &str) -> String {
    if value.chars().count() > MASK_PREFIX_LEN {
        let prefix: String = value.chars().take(MASK_PREFIX_LEN).collect();
        format!("{}...", prefix)
    } else {
        value.to_string()
    }
}

/// Display form of a key=value pair, masking secrets unless `show_secret`.
pub fn display_value(key: &str, value: &str, show_secret: bool) -> String {
    if !show_secret && is_secret_key(key) {
        mask_value(value)
    } else {
        value.to_string()
    }
}

/// Escape a value for the flat snapshot format. The backslash is escaped
/// first so later escapes are not double-processed.
pub fn escape_snapshot_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Inverse of [`escape_snapshot_value`]. Processed character by character so
/// an escaped backslash cannot be re-interpreted.
pub fn unescape_snapshot_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            // Unknown escape: keep it verbatim, tolerating manual edits.
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Whether a snapshot line key is acceptable: UPPER_SNAKE_CASE, not starting
/// with a digit.
pub fn is_valid_snapshot_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with(|c: char| c.is_ascii_digit())
        && key
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
