//! Configuration manager
//!
//! This module provides the configuration manager that layers built-in
//! defaults, an optional JSON configuration file, and environment variable
//! overrides. Values are read through typed getters.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use common::error::{Error, Result};

/// Prefix for environment variable overrides
///
/// `MEMBER_PORTAL_DB_POOL_SIZE=10` overrides the `db_pool_size` key.
const ENV_PREFIX: &str = "MEMBER_PORTAL_";

/// Configuration manager for the member portal
pub struct ConfigManager {
    /// Configuration values keyed by name
    values: RwLock<HashMap<String, Value>>,
}

impl ConfigManager {
    /// Creates a configuration manager from defaults and environment overrides
    pub fn new() -> Result<Self> {
        let mut values = Self::defaults();
        Self::apply_env_overrides(&mut values);

        Ok(Self {
            values: RwLock::new(values),
        })
    }

    /// Creates a configuration manager from a JSON file, defaults and environment overrides
    ///
    /// File values replace defaults; environment variables replace both.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut values = Self::defaults();

        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Storage(format!("Failed to read configuration file: {}", e)))?;
        let file_values: HashMap<String, Value> = serde_json::from_str(&contents)
            .map_err(|e| Error::Storage(format!("Failed to parse configuration file: {}", e)))?;

        for (key, value) in file_values {
            values.insert(key, value);
        }
        Self::apply_env_overrides(&mut values);

        debug!("Loaded configuration from {}", path.as_ref().display());

        Ok(Self {
            values: RwLock::new(values),
        })
    }

    /// Built-in default configuration
    fn defaults() -> HashMap<String, Value> {
        let mut values = HashMap::new();
        values.insert("bind_address".to_string(), Value::from("127.0.0.1:8080"));
        values.insert("api_path".to_string(), Value::from("/api"));
        values.insert("is_production".to_string(), Value::from(false));
        values.insert("db_pool_size".to_string(), Value::from(50));
        values.insert("token_expiry_secs".to_string(), Value::from(60 * 60 * 10));
        values.insert(
            "jwt_private_key_path".to_string(),
            Value::from("keys/jwt.pem"),
        );
        values.insert(
            "jwt_public_key_path".to_string(),
            Value::from("keys/jwt.pub"),
        );
        values
    }

    /// Applies `MEMBER_PORTAL_*` environment variables on top of the given values
    fn apply_env_overrides(values: &mut HashMap<String, Value>) {
        for (name, raw) in std::env::vars() {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let key = key.to_lowercase();

            // Numbers and booleans parse as JSON scalars; everything else is a string
            let value = match serde_json::from_str::<Value>(&raw) {
                Ok(parsed) if parsed.is_number() || parsed.is_boolean() => parsed,
                _ => Value::from(raw.as_str()),
            };

            debug!("Configuration override from environment: {}", key);
            values.insert(key, value);
        }
    }

    /// Gets a string value
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .get(key)
            .and_then(|value| value.as_str().map(str::to_string))
    }

    /// Gets a usize value
    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.values
            .read()
            .get(key)
            .and_then(|value| value.as_u64())
            .map(|value| value as usize)
    }

    /// Gets an i64 value
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.read().get(key).and_then(|value| value.as_i64())
    }

    /// Gets a boolean value
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values
            .read()
            .get(key)
            .and_then(|value| value.as_bool())
    }

    /// Sets a value at runtime
    pub fn set(&self, key: &str, value: Value) {
        if self.values.read().contains_key(key) {
            debug!("Overwriting configuration key {}", key);
        } else {
            warn!("Setting unknown configuration key {}", key);
        }
        self.values.write().insert(key.to_string(), value);
    }
}
