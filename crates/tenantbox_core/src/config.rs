//! Core runtime configuration.
//!
//! # Responsibility
//! - Collect database, logging and scoping settings in one value.
//! - Apply environment overrides with explicit, human-readable errors.
//!
//! # Invariants
//! - Defaults preserve the documented "no context means unrestricted"
//!   read behavior; fail-closed reads are opt-in.
//! - Parsing never panics.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "TENANTBOX_DB";
pub const ENV_LOG_LEVEL: &str = "TENANTBOX_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TENANTBOX_LOG_DIR";
pub const ENV_UNSCOPED: &str = "TENANTBOX_UNSCOPED";

const DEFAULT_DB_FILE: &str = "tenantbox.db";

/// What an ambient collection does when no current tenant is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnscopedPolicy {
    /// Queries are unrestricted. Reserved for startup and admin tooling
    /// that runs outside any unit of work.
    #[default]
    Unrestricted,
    /// Queries match nothing, so updates and deletes through them affect
    /// nothing. Creates still rely on the create hook and storage
    /// constraints.
    DenyAll,
}

impl UnscopedPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unrestricted => "unrestricted",
            Self::DenyAll => "deny",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unrestricted" | "allow" => Ok(Self::Unrestricted),
            "deny" | "deny_all" | "deny-all" => Ok(Self::DenyAll),
            other => Err(format!(
                "unsupported unscoped policy `{other}`; expected unrestricted|deny"
            )),
        }
    }
}

/// Settings consumed by the CLI and by embedding applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// `None` keeps logging disabled.
    pub log_dir: Option<PathBuf>,
    pub unscoped_policy: UnscopedPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            unscoped_policy: UnscopedPolicy::default(),
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by `TENANTBOX_*` environment variables.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CoreConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = non_blank(lookup(ENV_DB_PATH)) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = non_blank(lookup(ENV_LOG_LEVEL)) {
            config.log_level = level.trim().to_ascii_lowercase();
        }
        if let Some(dir) = non_blank(lookup(ENV_LOG_DIR)) {
            let dir = PathBuf::from(dir.trim());
            if !dir.is_absolute() {
                return Err(format!(
                    "{ENV_LOG_DIR} must be an absolute path, got `{}`",
                    dir.display()
                ));
            }
            config.log_dir = Some(dir);
        }
        if let Some(policy) = non_blank(lookup(ENV_UNSCOPED)) {
            config.unscoped_policy = UnscopedPolicy::parse(&policy)?;
        }

        Ok(config)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, UnscopedPolicy, ENV_DB_PATH, ENV_LOG_DIR, ENV_UNSCOPED};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_keep_unrestricted_policy() {
        let config = CoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.unscoped_policy, UnscopedPolicy::Unrestricted);
    }

    #[test]
    fn overrides_are_applied() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/tmp/tb.db"),
            (ENV_UNSCOPED, " Deny "),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/tb.db"));
        assert_eq!(config.unscoped_policy, UnscopedPolicy::DenyAll);
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_LOG_DIR, "logs")])).unwrap_err();
        assert!(err.contains("absolute"));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_UNSCOPED, "sometimes")])).unwrap_err();
        assert!(err.contains("unrestricted|deny"));
    }
}
