// config.rs

use crate::error::ConfigError;

pub const DEFAULT_PROMPT: &str = "dsh> ";
pub const DEFAULT_MAX_LINE: usize = 80;
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
pub const DEFAULT_HISTORY_LIST_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    /// Longest accepted input line, in characters. Longer lines are truncated.
    pub max_line: usize,
    pub history_capacity: usize,
    /// How many entries the `history` built-in shows.
    pub history_list_limit: usize,
    /// Collect finished background children instead of leaving them as zombies.
    pub reap_background: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            max_line: DEFAULT_MAX_LINE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_list_limit: DEFAULT_HISTORY_LIST_LIMIT,
            reap_background: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to the
    /// defaults for keys that are absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(prompt) = lookup("DSH_PROMPT") {
            config.prompt = prompt;
        }
        if let Some(v) = lookup("DSH_MAX_LINE") {
            config.max_line = positive("DSH_MAX_LINE", v)?;
        }
        if let Some(v) = lookup("DSH_HISTORY_SIZE") {
            config.history_capacity = positive("DSH_HISTORY_SIZE", v)?;
        }
        if let Some(v) = lookup("DSH_HISTORY_LIST") {
            config.history_list_limit = positive("DSH_HISTORY_LIST", v)?;
        }
        if let Some(v) = lookup("DSH_REAP_BACKGROUND") {
            config.reap_background = flag("DSH_REAP_BACKGROUND", v)?;
        }
        Ok(config)
    }
}

fn positive(key: &'static str, value: String) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            expected: "a positive integer",
        }),
    }
}

fn flag(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            expected: "a boolean",
        }),
    }
}
