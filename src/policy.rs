//! Shared application policy store
//!
//! One `PolicyStore` is constructed at startup and handles to it are passed
//! to every consumer. Cloning a handle shares the same underlying state, so
//! a `set` through one handle is immediately visible through all the others.
//! There is deliberately no hidden global: tests build their own isolated
//! store instead of fighting over process-wide state.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub const APP_NAME: &str = "app_name";
pub const VERSION: &str = "version";
pub const ENVIRONMENT: &str = "environment";
pub const MAINTENANCE_MODE: &str = "maintenance_mode";
pub const SESSION_TIMEOUT_MINUTES: &str = "session_timeout_minutes";
pub const MAX_LOGIN_ATTEMPTS: &str = "max_login_attempts";
pub const MIN_PASSWORD_LENGTH: &str = "min_password_length";
pub const TIMEZONE: &str = "timezone";
pub const DEFAULT_LOCALE: &str = "default_locale";
pub const PAGE_SIZE: &str = "page_size";

const DEFAULT_SESSION_TIMEOUT_MINUTES: i64 = 30;
const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 3;
const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// A single policy value. Unknown keys are allowed; values are loosely typed
/// the way a config file is.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum PolicyValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for PolicyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyValue::Bool(b) => write!(f, "{}", b),
            PolicyValue::Int(n) => write!(f, "{}", n),
            PolicyValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for PolicyValue {
    fn from(b: bool) -> Self {
        PolicyValue::Bool(b)
    }
}

impl From<i64> for PolicyValue {
    fn from(n: i64) -> Self {
        PolicyValue::Int(n)
    }
}

impl From<u32> for PolicyValue {
    fn from(n: u32) -> Self {
        PolicyValue::Int(n as i64)
    }
}

impl From<&str> for PolicyValue {
    fn from(s: &str) -> Self {
        PolicyValue::Str(s.to_string())
    }
}

impl From<String> for PolicyValue {
    fn from(s: String) -> Self {
        PolicyValue::Str(s)
    }
}

/// Handle to the shared policy state. `Clone` is cheap and every clone sees
/// the same live values.
#[derive(Clone)]
pub struct PolicyStore {
    inner: Arc<Mutex<HashMap<String, PolicyValue>>>,
}

fn default_policy() -> HashMap<String, PolicyValue> {
    let mut map = HashMap::new();
    map.insert(APP_NAME.to_string(), "User Management System".into());
    map.insert(VERSION.to_string(), "2.1.0".into());
    map.insert(ENVIRONMENT.to_string(), "development".into());
    map.insert(MAINTENANCE_MODE.to_string(), false.into());
    map.insert(
        SESSION_TIMEOUT_MINUTES.to_string(),
        DEFAULT_SESSION_TIMEOUT_MINUTES.into(),
    );
    map.insert(
        MAX_LOGIN_ATTEMPTS.to_string(),
        (DEFAULT_MAX_LOGIN_ATTEMPTS as i64).into(),
    );
    map.insert(
        MIN_PASSWORD_LENGTH.to_string(),
        (DEFAULT_MIN_PASSWORD_LENGTH as i64).into(),
    );
    map.insert(TIMEZONE.to_string(), "Europe/Madrid".into());
    map.insert(DEFAULT_LOCALE.to_string(), "es".into());
    map.insert(PAGE_SIZE.to_string(), 25i64.into());
    map
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore {
    /// New store with the built-in defaults.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(default_policy())),
        }
    }

    /// Load policy overrides from a TOML file on top of the defaults.
    /// A missing or unparseable file falls back to defaults.
    pub fn load_or_default(path: &str) -> Self {
        let store = Self::new();
        if !std::path::Path::new(path).exists() {
            info!("Policy file not found at '{}'. Using defaults.", path);
            return store;
        }
        match std::fs::read_to_string(path) {
            Ok(s) => match s.parse::<toml::Table>() {
                Ok(table) => {
                    for (key, value) in table {
                        let value = match value {
                            toml::Value::String(s) => PolicyValue::Str(s),
                            toml::Value::Integer(n) => PolicyValue::Int(n),
                            toml::Value::Boolean(b) => PolicyValue::Bool(b),
                            other => {
                                warn!("Ignoring policy key '{}': unsupported type {}", key, other);
                                continue;
                            }
                        };
                        store.set(&key, value);
                    }
                    info!("Policy loaded from {}", path);
                }
                Err(e) => warn!("Error parsing policy file: {}. Using defaults.", e),
            },
            Err(e) => warn!("Error reading policy file: {}. Using defaults.", e),
        }
        store
    }

    /// Current value for `key`, or `None` for unknown keys. Never errors.
    pub fn get(&self, key: &str) -> Option<PolicyValue> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    /// Insert or overwrite `key`. Effective immediately for every handle.
    pub fn set(&self, key: &str, value: impl Into<PolicyValue>) {
        self.inner.lock().unwrap().insert(key.to_string(), value.into());
    }

    pub fn is_under_maintenance(&self) -> bool {
        matches!(self.get(MAINTENANCE_MODE), Some(PolicyValue::Bool(true)))
    }

    pub fn enter_maintenance(&self) {
        self.set(MAINTENANCE_MODE, true);
    }

    pub fn exit_maintenance(&self) {
        self.set(MAINTENANCE_MODE, false);
    }

    /// Detached copy of the whole policy for display or export. Mutating the
    /// returned map does not touch the live store.
    pub fn snapshot(&self) -> BTreeMap<String, PolicyValue> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // Typed threshold reads. A key that was removed or overwritten with the
    // wrong type falls back to the built-in default.

    pub fn min_password_length(&self) -> usize {
        match self.get(MIN_PASSWORD_LENGTH) {
            Some(PolicyValue::Int(n)) if n > 0 => {
                usize::try_from(n).unwrap_or(DEFAULT_MIN_PASSWORD_LENGTH)
            }
            _ => DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }

    pub fn max_login_attempts(&self) -> u32 {
        match self.get(MAX_LOGIN_ATTEMPTS) {
            Some(PolicyValue::Int(n)) if n > 0 => {
                u32::try_from(n).unwrap_or(DEFAULT_MAX_LOGIN_ATTEMPTS)
            }
            _ => DEFAULT_MAX_LOGIN_ATTEMPTS,
        }
    }

    pub fn session_timeout_minutes(&self) -> i64 {
        match self.get(SESSION_TIMEOUT_MINUTES) {
            Some(PolicyValue::Int(n)) if n > 0 => n,
            _ => DEFAULT_SESSION_TIMEOUT_MINUTES,
        }
    }
}
