//! Application factory: builds the runtime context the bootstrapper works in.
//!
//! The backend is SQLite, so "not reachable yet" means the database file cannot
//! be opened, e.g. its volume is not mounted. Server-backed databases are out
//! of scope.

use crate::db::sqlite::SqliteStore;
use crate::db::store::IdentityStore;
use crate::error::BootstrapError;
use figment::Figment;
use figment::providers::{Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Settings read from the application's own configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    pub database_url: String,
    #[serde(default = "default_true")]
    pub captcha_enabled: bool,
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
    #[serde(default = "default_timeout_secs")]
    pub busy_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    5
}

/// Values forced on top of the configuration file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha_enabled: Option<bool>,
}

impl AppOverrides {
    /// What the bootstrapper runs with: no captcha.
    pub fn bootstrap() -> Self {
        Self {
            captcha_enabled: Some(false),
        }
    }
}

/// A runtime the bootstrapper can enter and leave once per attempt.
#[allow(async_fn_in_trait)]
pub trait Application {
    type Context: IdentityStore;

    /// Activate the database bindings. Fails while the database is unreachable.
    async fn enter(&self) -> Result<Self::Context, BootstrapError>;

    /// Release whatever `enter` acquired.
    async fn leave(&self, ctx: Self::Context);
}

/// The SQLite-backed application.
#[derive(Debug, Clone)]
pub struct App {
    settings: AppSettings,
    connect_opts: SqliteConnectOptions,
}

/// Build the application from its configuration file.
///
/// Nothing here touches the database, so failures are configuration problems.
pub fn create_app(path: &Path, overrides: AppOverrides) -> Result<App, BootstrapError> {
    let unusable = |reason: String| BootstrapError::AppConfig {
        path: PathBuf::from(path),
        reason,
    };

    if !path.is_file() {
        return Err(unusable("file not found".to_string()));
    }

    let settings: AppSettings = Figment::from(Toml::file_exact(path))
        .merge(Serialized::defaults(overrides))
        .extract()
        .map_err(|e| unusable(e.to_string()))?;

    let connect_opts = SqliteConnectOptions::from_str(&settings.database_url)
        .map_err(|e| unusable(format!("invalid database_url: {e}")))?
        .create_if_missing(settings.create_if_missing)
        .busy_timeout(Duration::from_secs(settings.busy_timeout_secs));

    Ok(App {
        settings,
        connect_opts,
    })
}

impl App {
    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn captcha_enabled(&self) -> bool {
        self.settings.captcha_enabled
    }
}

impl Application for App {
    type Context = SqliteStore;

    async fn enter(&self) -> Result<SqliteStore, BootstrapError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(self.settings.acquire_timeout_secs))
            .connect_with(self.connect_opts.clone())
            .await?;
        Ok(SqliteStore::new(pool))
    }

    async fn leave(&self, ctx: SqliteStore) {
        ctx.pool().close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("production_config.toml");
        fs::write(&path, body).expect("write config");
        path
    }

    #[test]
    fn missing_file_is_unusable() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_app(&dir.path().join("nope.toml"), AppOverrides::default())
            .expect_err("missing config");
        assert!(matches!(err, BootstrapError::AppConfig { .. }));
    }

    #[test]
    fn missing_database_url_is_unusable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "captcha_enabled = true\n");
        let err = create_app(&path, AppOverrides::default()).expect_err("no url");
        assert!(matches!(err, BootstrapError::AppConfig { .. }));
    }

    #[test]
    fn overrides_win_over_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "database_url = \"sqlite://pda.db\"\ncaptcha_enabled = true\n",
        );

        let app = create_app(&path, AppOverrides::default()).unwrap();
        assert!(app.captcha_enabled());

        let app = create_app(&path, AppOverrides::bootstrap()).unwrap();
        assert!(!app.captcha_enabled());
        assert_eq!(app.settings().busy_timeout_secs, 5);
    }

    #[test]
    fn relative_path_is_not_searched_upwards() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("production_config.toml", "database_url = \"sqlite://pda.db\"\n")?;
            jail.create_dir("workdir")?;
            jail.change_dir("workdir")?;

            let err = create_app(Path::new("production_config.toml"), AppOverrides::bootstrap())
                .expect_err("only the working directory counts");
            assert!(matches!(err, BootstrapError::AppConfig { .. }));
            Ok(())
        });
    }

    #[tokio::test]
    async fn enter_and_leave_a_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("pda.db");
        let path = write_config(
            dir.path(),
            &format!("database_url = \"sqlite://{}\"\n", db.display()),
        );

        let app = create_app(&path, AppOverrides::bootstrap()).unwrap();
        let ctx = app.enter().await.expect("connect");
        ctx.create_all_schema().await.expect("schema");
        app.leave(ctx).await;
        assert!(db.exists());
    }

    #[tokio::test]
    async fn unreachable_database_is_transient() {
        use crate::error::IsRetryable;

        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("not-mounted-yet").join("pda.db");
        let path = write_config(
            dir.path(),
            &format!("database_url = \"sqlite://{}\"\n", db.display()),
        );

        let app = create_app(&path, AppOverrides::bootstrap()).unwrap();
        let err = app.enter().await.expect_err("directory does not exist");
        assert!(err.is_retryable(), "unexpected classification: {err}");
    }
}
