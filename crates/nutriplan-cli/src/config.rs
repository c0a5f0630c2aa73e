//! Configuration file management for nutriplan.
//!
//! Provides a TOML-based config file at `~/.config/nutriplan/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use nutriplan_db::config::DbConfig;

pub const GENERATOR_URL_ENV: &str = "NUTRIPLAN_GENERATOR_URL";
pub const USER_ENV: &str = "NUTRIPLAN_USER";
pub const DEFAULT_GENERATOR_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub generator: GeneratorSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSection>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

/// Which collaborator endpoint produces plans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorMode {
    /// Structured JSON batches from `/plans/{user}/generate`.
    #[default]
    Structured,
    /// Free-text plans from `/agent/query`.
    Agent,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratorSection {
    pub url: String,
    #[serde(default)]
    pub mode: GeneratorMode,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_GENERATOR_URL.to_owned(),
            mode: GeneratorMode::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSection {
    pub id: String,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the nutriplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/nutriplan` or
/// `~/.config/nutriplan`, never the macOS `Application Support` path.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("nutriplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("nutriplan")
}

/// Return the path to the nutriplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line, highest priority in the chain.
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub database_url: Option<&'a str>,
    pub generator_url: Option<&'a str>,
    pub user: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub url: String,
    pub mode: GeneratorMode,
    pub timeout: Duration,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct NutriplanConfig {
    pub db_config: DbConfig,
    pub generator: GeneratorSettings,
    user_id: Option<String>,
}

fn first_of(cli: Option<&str>, env: &str, file: Option<&str>) -> Option<String> {
    cli.map(str::to_owned)
        .or_else(|| std::env::var(env).ok().filter(|v| !v.is_empty()))
        .or_else(|| file.map(str::to_owned))
}

impl NutriplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `--database-url` > `NUTRIPLAN_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Generator URL: `--generator-url` > `NUTRIPLAN_GENERATOR_URL` > `generator.url` > `http://localhost:8000`
    /// - User id: `--user` > `NUTRIPLAN_USER` > `user.id`, no default
    pub fn resolve(overrides: &Overrides<'_>) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = first_of(
            overrides.database_url,
            DbConfig::ENV_VAR,
            file_config.as_ref().map(|c| c.database.url.as_str()),
        )
        .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_owned());

        let section = file_config.as_ref().map(|c| &c.generator);
        let generator_url = first_of(
            overrides.generator_url,
            GENERATOR_URL_ENV,
            section.map(|s| s.url.as_str()),
        )
        .unwrap_or_else(|| DEFAULT_GENERATOR_URL.to_owned());

        let user_id = first_of(
            overrides.user,
            USER_ENV,
            file_config
                .as_ref()
                .and_then(|c| c.user.as_ref())
                .map(|u| u.id.as_str()),
        );

        Ok(Self {
            db_config: DbConfig::new(db_url),
            generator: GeneratorSettings {
                url: generator_url,
                mode: section.map(|s| s.mode).unwrap_or_default(),
                timeout: Duration::from_secs(
                    section.map_or(DEFAULT_TIMEOUT_SECS, |s| s.timeout_secs),
                ),
            },
            user_id,
        })
    }

    /// The user whose plan the command works on.
    pub fn user_id(&self) -> Result<&str> {
        match self.user_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => bail!(
                "no user id; pass --user, set {USER_ENV}, or run `nutriplan init --user <id>`"
            ),
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point config lookup at an empty temp dir and clear the env vars.
    fn isolated() -> tempfile::TempDir {
        let tmp = tempfile::TempDir::new().unwrap();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        unsafe { std::env::remove_var(DbConfig::ENV_VAR) };
        unsafe { std::env::remove_var(GENERATOR_URL_ENV) };
        unsafe { std::env::remove_var(USER_ENV) };
        tmp
    }

    fn sample_file() -> ConfigFile {
        ConfigFile {
            database: DatabaseSection {
                url: "postgresql://filehost:5432/filedb".to_owned(),
            },
            generator: GeneratorSection {
                url: "http://planner:9000".to_owned(),
                mode: GeneratorMode::Agent,
                timeout_secs: 30,
            },
            user: Some(UserSection {
                id: "file-user".to_owned(),
            }),
        }
    }

    #[test]
    fn config_file_parses_with_defaults() {
        let parsed: ConfigFile = toml::from_str(
            r#"
            [database]
            url = "postgresql://localhost:5432/nutriplan"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.generator.url, DEFAULT_GENERATOR_URL);
        assert_eq!(parsed.generator.mode, GeneratorMode::Structured);
        assert_eq!(parsed.generator.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(parsed.user.is_none());

        let agent: ConfigFile = toml::from_str(
            r#"
            [database]
            url = "postgresql://localhost:5432/nutriplan"
            [generator]
            url = "http://localhost:8000"
            mode = "agent"
            "#,
        )
        .unwrap();
        assert_eq!(agent.generator.mode, GeneratorMode::Agent);
    }

    #[test]
    fn save_and_resolve_from_file() {
        let _lock = lock_env();
        let _tmp = isolated();

        let path = save_config(&sample_file()).unwrap();
        assert!(path.ends_with("nutriplan/config.toml"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let meta = std::fs::metadata(&path).unwrap();
            assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        }

        let config = NutriplanConfig::resolve(&Overrides::default()).unwrap();
        assert_eq!(
            config.db_config.database_url,
            "postgresql://filehost:5432/filedb"
        );
        assert_eq!(config.generator.url, "http://planner:9000");
        assert_eq!(config.generator.mode, GeneratorMode::Agent);
        assert_eq!(config.generator.timeout, Duration::from_secs(30));
        assert_eq!(config.user_id().unwrap(), "file-user");

        unsafe { std::env::remove_var("XDG_CONFIG_HOME") };
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        let _lock = lock_env();
        let _tmp = isolated();
        save_config(&sample_file()).unwrap();

        unsafe { std::env::set_var(DbConfig::ENV_VAR, "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var(USER_ENV, "env-user") };

        let config = NutriplanConfig::resolve(&Overrides::default()).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
        assert_eq!(config.user_id().unwrap(), "env-user");

        let config = NutriplanConfig::resolve(&Overrides {
            database_url: Some("postgresql://cli:5432/clidb"),
            generator_url: Some("http://cli:1234"),
            user: Some("cli-user"),
        })
        .unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");
        assert_eq!(config.generator.url, "http://cli:1234");
        assert_eq!(config.user_id().unwrap(), "cli-user");

        unsafe { std::env::remove_var(DbConfig::ENV_VAR) };
        unsafe { std::env::remove_var(USER_ENV) };
        unsafe { std::env::remove_var("XDG_CONFIG_HOME") };
    }

    #[test]
    fn defaults_when_nothing_set_and_user_is_required() {
        let _lock = lock_env();
        let _tmp = isolated();

        let config = NutriplanConfig::resolve(&Overrides::default()).unwrap();
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(config.generator.url, DEFAULT_GENERATOR_URL);
        assert_eq!(config.generator.mode, GeneratorMode::Structured);

        let err = config.user_id().unwrap_err().to_string();
        assert!(err.contains("no user id"), "unexpected error: {err}");

        unsafe { std::env::remove_var("XDG_CONFIG_HOME") };
    }
}
