//! Bootstrapper configuration.
//!
//! Sources, lowest precedence first:
//! - compiled defaults
//! - `bootstrap.toml` in the working directory (optional)
//! - `BOOTSTRAP_*` environment variables, `__` separating nested keys
//!   (`BOOTSTRAP_RETRY__MAX_ATTEMPTS=10`)
//! - `ADMIN_USERNAME`, `ADMIN_PASSWORD`, `ADMIN_EMAIL`, `ADMIN_FIRSTNAME`,
//!   `ADMIN_LASTNAME`, taken verbatim

use crate::error::BootstrapError;
use crate::password::{MAX_COST, MIN_COST};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_APP_CONFIG: &str = "/etc/powerdns-admin/production_config.toml";
pub const CONFIG_FILE: &str = "bootstrap.toml";
pub const ADMIN_ROLE_NAME: &str = "Administrator";
pub const ADMIN_ROLE_DESCRIPTION: &str = "Administrator role";

/// Environment variable to config key. Read raw so that a password such as
/// `007` is not turned into the integer 7.
const ADMIN_ENV: [(&str, &str); 5] = [
    ("ADMIN_USERNAME", "admin.username"),
    ("ADMIN_PASSWORD", "admin.password"),
    ("ADMIN_EMAIL", "admin.email"),
    ("ADMIN_FIRSTNAME", "admin.firstname"),
    ("ADMIN_LASTNAME", "admin.lastname"),
];

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdminAccount {
    pub username: String,
    pub password: String,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
}

impl Default for AdminAccount {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin123".to_string(),
            email: "admin@local.domain".to_string(),
            firstname: "Admin".to_string(),
            lastname: "User".to_string(),
        }
    }
}

impl fmt::Debug for AdminAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAccount")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("email", &self.email)
            .field("firstname", &self.firstname)
            .field("lastname", &self.lastname)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            delay_secs: 2,
        }
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Application configuration file handed to the app factory.
    pub app_config: PathBuf,
    pub loglevel: String,
    pub bcrypt_cost: u32,
    /// Include the plaintext password in the success report.
    pub print_credentials: bool,
    pub retry: RetrySettings,
    pub admin: AdminAccount,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_config: PathBuf::from(DEFAULT_APP_CONFIG),
            loglevel: "info".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            print_credentials: true,
            retry: RetrySettings::default(),
            admin: AdminAccount::default(),
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file_exact(CONFIG_FILE))
            .merge(Env::prefixed("BOOTSTRAP_").split("__"));

        for (var, key) in ADMIN_ENV {
            if let Ok(value) = std::env::var(var) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }
        figment
    }

    /// Load from every source and validate.
    pub fn load() -> Result<Self, BootstrapError> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, BootstrapError> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BootstrapError> {
        if self.retry.max_attempts == 0 {
            return Err(BootstrapError::InvalidConfig(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(MIN_COST..=MAX_COST).contains(&self.bcrypt_cost) {
            return Err(BootstrapError::InvalidConfig(format!(
                "bcrypt_cost must be between {MIN_COST} and {MAX_COST}"
            )));
        }
        if self.admin.username.trim().is_empty() {
            return Err(BootstrapError::InvalidConfig(
                "admin username must not be empty".to_string(),
            ));
        }
        if self.admin.password.is_empty() {
            return Err(BootstrapError::InvalidConfig(
                "admin password must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
