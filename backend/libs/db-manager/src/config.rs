//! Config document lookup
//!
//! Profiles live in a YAML document located by a directory and a base name.
//! Values are addressed with dotted keys, e.g. `redis.default.Addresses`.
//!
//! Profile fields are read under a [`FieldPolicy`]. The default,
//! [`FieldPolicy::Strict`], fails on an absent required field or a
//! wrong-typed value instead of substituting the zero value. Use
//! [`FieldPolicy::Lenient`] to get zero values for every field.

use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ClientError, Result};

/// Extensions tried, in order, when resolving a config file.
const CONFIG_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Location of the config file: a directory plus a base name without extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub name: String,
}

impl Default for ConfigLocation {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            name: String::from("config"),
        }
    }
}

impl ConfigLocation {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Create a location from `DB_MANAGER_CONFIG_PATH` and `DB_MANAGER_CONFIG_NAME`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            path: std::env::var("DB_MANAGER_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            name: std::env::var("DB_MANAGER_CONFIG_NAME").unwrap_or(defaults.name),
        }
    }

    /// Candidate file paths in lookup order
    pub fn candidates(&self) -> Vec<PathBuf> {
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| self.path.join(format!("{}.{}", self.name, ext)))
            .collect()
    }
}

/// Read-only key lookup over a config document.
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<&Value>;
}

/// Flat map of fully-qualified keys, mostly useful in tests.
impl ConfigSource for HashMap<String, Value> {
    fn get(&self, key: &str) -> Option<&Value> {
        HashMap::get(self, key)
    }
}

/// Parsed YAML document
#[derive(Debug, Clone)]
pub struct YamlConfig {
    root: Value,
}

impl YamlConfig {
    /// Load the first existing candidate file of `location`
    pub fn load(location: &ConfigLocation) -> Result<Self> {
        let candidates = location.candidates();
        let path = candidates
            .iter()
            .find(|p| p.is_file())
            .unwrap_or(&candidates[0]);

        Self::load_file(path)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let document = std::fs::read_to_string(path).map_err(|source| ClientError::ConfigLoad {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&document).map_err(|source| ClientError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    pub fn parse(document: &str) -> std::result::Result<Self, serde_yaml::Error> {
        let root = serde_yaml::from_str(document)?;
        Ok(Self { root })
    }
}

impl ConfigSource for YamlConfig {
    fn get(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.root, |node, segment| node.get(segment))
    }
}

/// What to do with an absent or wrong-typed config value.
///
/// Optional fields (passwords, the Redis `DB` index, ...) fall back to zero
/// values under both policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldPolicy {
    /// Required fields must be present, every present field must have the right type.
    #[default]
    Strict,
    /// Absent or wrong-typed values become the zero value of the field type.
    Lenient,
}

/// Reads the fields of one profile (`<kind>.<profile>.<Field>`).
pub struct ProfileReader<'a> {
    source: &'a dyn ConfigSource,
    prefix: &'a str,
    policy: FieldPolicy,
}

impl<'a> ProfileReader<'a> {
    pub fn new(source: &'a dyn ConfigSource, prefix: &'a str, policy: FieldPolicy) -> Self {
        Self {
            source,
            prefix,
            policy,
        }
    }

    fn key(&self, field: &str) -> String {
        format!("{}.{}", self.prefix, field)
    }

    pub fn required_string(&self, field: &str) -> Result<String> {
        self.string(field, true)
    }

    pub fn optional_string(&self, field: &str) -> Result<String> {
        self.string(field, false)
    }

    pub fn optional_integer(&self, field: &str) -> Result<i64> {
        let key = self.key(field);
        match self.lookup(&key) {
            None => Ok(0),
            Some(Value::Number(n)) if n.is_i64() => Ok(n.as_i64().unwrap_or_default()),
            Some(_) => self.mistyped(key, "integer").map(|_| 0),
        }
    }

    fn string(&self, field: &str, required: bool) -> Result<String> {
        let key = self.key(field);
        match self.lookup(&key) {
            None if required && self.policy == FieldPolicy::Strict => {
                Err(ClientError::MissingField(key))
            }
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            // Unquoted numeric scalars, e.g. `Password: 123456`
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => self.mistyped(key, "string").map(|_| String::new()),
        }
    }

    fn lookup(&self, key: &str) -> Option<&'a Value> {
        self.source.get(key).filter(|v| !v.is_null())
    }

    fn mistyped(&self, key: String, expected: &'static str) -> Result<()> {
        match self.policy {
            FieldPolicy::Strict => Err(ClientError::InvalidField { key, expected }),
            FieldPolicy::Lenient => {
                debug!(key = %key, expected, "Ignoring wrong-typed config value");
                Ok(())
            }
        }
    }
}
