//! Application configuration structures.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV_VAR: &str = "GEOLEASE_CONFIG";

/// Travel speed limit used when a set does not name one.
pub const DEFAULT_MAX_SPEED_KMPH: f64 = 35.0;

const fn default_max_speed() -> f64 {
    DEFAULT_MAX_SPEED_KMPH
}

/// One account entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Unique identifier, usually the login name.
    pub identifier: String,
    /// Opaque credential document passed through to lease holders.
    #[serde(default)]
    pub credentials: serde_json::Value,
    /// Account already flagged and never to be leased.
    #[serde(default)]
    pub blocked: bool,
}

/// One named account set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSetConfig {
    /// Maximum plausible travel speed between assignments.
    #[serde(default = "default_max_speed")]
    pub max_speed_kmph: f64,
    /// Members in lease-preference order.
    pub accounts: Vec<AccountConfig>,
}

/// Region source files. Either may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeofenceConfig {
    /// File of allowed regions.
    #[serde(default)]
    pub allowed_path: Option<PathBuf>,
    /// File of forbidden regions.
    #[serde(default)]
    pub forbidden_path: Option<PathBuf>,
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Geofence sources.
    #[serde(default)]
    pub geofence: GeofenceConfig,
    /// Map of set name to configuration.
    pub sets: BTreeMap<String, AccountSetConfig>,
}

impl AccountSetConfig {
    /// Validate set configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_speed_kmph.is_finite() && self.max_speed_kmph > 0.0) {
            return Err(format!(
                "max_speed_kmph must be a positive number, got {}",
                self.max_speed_kmph
            ));
        }
        if self.accounts.is_empty() {
            return Err("at least one account must be listed".into());
        }
        if let Some(blank) = self.accounts.iter().position(|a| a.identifier.trim().is_empty()) {
            return Err(format!("account #{blank} has an empty identifier"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Validate all sets and ensure identifiers are unique across them.
    pub fn validate(&self) -> Result<(), String> {
        if self.sets.is_empty() {
            return Err("at least one account set must be defined".into());
        }
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for (name, set) in &self.sets {
            set.validate()
                .map_err(|e| format!("set `{name}` invalid: {e}"))?;
            for account in &set.accounts {
                if let Some(other) = owners.insert(&account.identifier, name) {
                    return Err(format!(
                        "account `{}` appears in both `{other}` and `{name}`",
                        account.identifier
                    ));
                }
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `.env` if present, then read the file named by
    /// [`CONFIG_ENV_VAR`].
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_ENV_VAR)
            .map_err(|_| format!("{CONFIG_ENV_VAR} is not set"))?;
        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {path}: {e}"))?;
        Self::from_json_str(&text)
    }
}
