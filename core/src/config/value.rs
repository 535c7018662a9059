use crate::prelude::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const FPS_KEY: &str = "FPS";

/// A single config entry as coerced from a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl ConfigValue {
    /// Integer if the text parses as one, then the literals `true`/`false`,
    /// otherwise the text unchanged.
    pub fn coerce(raw: &str) -> Self {
        if let Ok(value) = raw.trim().parse::<i64>() {
            return ConfigValue::Int(value);
        }
        match raw {
            "true" => ConfigValue::Bool(true),
            "false" => ConfigValue::Bool(false),
            _ => ConfigValue::Str(raw.to_string()),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Int(value) => write!(f, "{}", value),
            ConfigValue::Bool(value) => write!(f, "{}", value),
            ConfigValue::Str(value) => write!(f, "{:?}", value),
        }
    }
}

/// Viewer-adjustable settings shared with the producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config(BTreeMap<String, ConfigValue>);

impl Default for Config {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        let mut set = |key: &str, value: ConfigValue| {
            entries.insert(key.to_string(), value);
        };
        set("values", ConfigValue::Str("trainable_variables".into()));
        set("mode", ConfigValue::Str("variance".into()));
        set("scaling", ConfigValue::Str("layer".into()));
        set("window_size", ConfigValue::Int(15));
        set(FPS_KEY, ConfigValue::Int(10));
        set("is_recording", ConfigValue::Bool(false));
        set("show_all", ConfigValue::Bool(false));
        set("colormap", ConfigValue::Str("magma".into()));
        Config(entries)
    }
}

impl Config {
    /// Builds a config from submitted form fields. Repeated keys keep their
    /// first value.
    pub fn from_form<I, K, V>(form: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut entries = BTreeMap::new();
        for (key, value) in form {
            entries
                .entry(key.into())
                .or_insert_with(|| ConfigValue::coerce(value.as_ref()));
        }
        Config(entries)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Frame rate requested by this config.
    pub fn fps(&self) -> Result<u32, ConfigError> {
        match self.get(FPS_KEY) {
            None => Err(ConfigError::MissingKey(FPS_KEY)),
            Some(ConfigValue::Int(value)) => {
                u32::try_from(*value).map_err(|_| ConfigError::InvalidValue {
                    key: FPS_KEY,
                    reason: format!("{} is not a frame rate", value),
                })
            }
            Some(other) => Err(ConfigError::InvalidValue {
                key: FPS_KEY,
                reason: format!("expected an integer, got {}", other),
            }),
        }
    }
}
