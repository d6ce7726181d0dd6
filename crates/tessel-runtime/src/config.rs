#![forbid(unsafe_code)]

//! Render configuration.
//!
//! Plain struct with builder methods, optionally seeded from the
//! environment:
//!
//! | variable | field | values |
//! |---|---|---|
//! | `TESSEL_CYCLE_CHECK` | `cycle_check` | `1/0/true/false/on/off` |
//! | `TESSEL_PLACEHOLDER` | `placeholder` | any text |
//! | `TESSEL_DEFAULT_KEY` | `default_key` | `@identity`, `@index` or a dotted path |

use std::env;
use std::fmt;

pub const ENV_CYCLE_CHECK: &str = "TESSEL_CYCLE_CHECK";
pub const ENV_PLACEHOLDER: &str = "TESSEL_PLACEHOLDER";
pub const ENV_DEFAULT_KEY: &str = "TESSEL_DEFAULT_KEY";

/// Knobs shared by every morph of a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Walk keyed item lists after every structural change and fail on a
    /// cycle or broken back-link.
    pub cycle_check: bool,
    /// Text of the comment that anchors an empty region.
    pub placeholder: String,
    /// Key strategy for `each` when the call site gives none.
    pub default_key: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cycle_check: cfg!(debug_assertions),
            placeholder: String::new(),
            default_key: "@identity".to_owned(),
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cycle_check(mut self, enabled: bool) -> Self {
        self.cycle_check = enabled;
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = text.into();
        self
    }

    #[must_use]
    pub fn with_default_key(mut self, key: impl Into<String>) -> Self {
        self.default_key = key.into();
        self
    }

    /// Config from the process environment; malformed values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().into_config()
    }

    /// Config from the process environment plus one error per malformed value.
    #[must_use]
    pub fn from_env_with_diagnostics() -> ConfigParse {
        from_env_with(|key| env::var(key).ok())
    }
}

/// A rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: &'static str,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Result of parsing configuration with diagnostics.
#[derive(Debug, Clone)]
pub struct ConfigParse {
    pub config: RenderConfig,
    pub errors: Vec<ConfigError>,
}

impl ConfigParse {
    /// Keep the parsed config, logging a warning per rejected value.
    pub fn into_config(self) -> RenderConfig {
        #[cfg(feature = "tracing")]
        for error in &self.errors {
            tessel_core::warn!(
                field = error.field,
                value = %error.value,
                reason = error.message,
                "ignoring malformed setting"
            );
        }
        self.config
    }
}

/// Parse configuration through an arbitrary variable lookup.
pub fn from_env_with<F>(mut get: F) -> ConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = RenderConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_CYCLE_CHECK) {
        match parse_bool(&value) {
            Some(parsed) => config.cycle_check = parsed,
            None => errors.push(ConfigError {
                field: "cycle_check",
                value,
                message: "expected bool (1/0/true/false/on/off)",
            }),
        }
    }

    if let Some(value) = get(ENV_PLACEHOLDER) {
        if value.contains("--") {
            errors.push(ConfigError {
                field: "placeholder",
                value,
                message: "comment text cannot contain `--`",
            });
        } else {
            config.placeholder = value;
        }
    }

    if let Some(value) = get(ENV_DEFAULT_KEY) {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.split('.').any(str::is_empty) {
            errors.push(ConfigError {
                field: "default_key",
                value,
                message: "expected @identity, @index or a dotted path",
            });
        } else {
            config.default_key = trimmed.to_owned();
        }
    }

    ConfigParse { config, errors }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
