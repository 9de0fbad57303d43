//! Configuration file management for studyplan.
//!
//! Provides a TOML config file at `~/.config/studyplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.
//!
//! The model API key is only ever read from `STUDYPLAN_AI_API_KEY`; it is
//! never written to disk.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use studyplan_core::gateway::{GatewayClient, GatewayConfig};
use studyplan_core::planner::{API_KEY_ENV, StudyPlanner};
use studyplan_core::token::{SECRET_ENV, TokenConfig};
use studyplan_db::config::DbConfig;

const BASE_URL_ENV: &str = "STUDYPLAN_AI_BASE_URL";
const MODEL_ENV: &str = "STUDYPLAN_AI_MODEL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub auth: AuthSection,
    #[serde(default)]
    pub ai: AiSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSection {
    /// Hex-encoded token secret (64 hex chars = 32 bytes).
    pub token_secret: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the studyplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/studyplan` or
/// `~/.config/studyplan`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("studyplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("studyplan")
}

/// Return the path to the studyplan config file.
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
/// The file is owner read/write only on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
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

    Ok(())
}

/// Generate a random token secret: 32 random bytes, hex-encoded (64 chars).
pub fn generate_token_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct AppConfig {
    pub db_config: DbConfig,
    /// `None` when no secret is configured; only the HTTP server and token
    /// commands need one.
    pub token_config: Option<TokenConfig>,
    /// `None` when `STUDYPLAN_AI_API_KEY` is unset.
    pub gateway: Option<GatewayConfig>,
}

impl AppConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `STUDYPLAN_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Token secret: `STUDYPLAN_TOKEN_SECRET` > `auth.token_secret`
    /// - Gateway: API key from `STUDYPLAN_AI_API_KEY`; base URL and model
    ///   from env > `[ai]` > built-in default
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        Self::resolve_with(cli_db_url, load_config().ok())
    }

    fn resolve_with(cli_db_url: Option<&str>, file_config: Option<ConfigFile>) -> Result<Self> {
        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let db_config = DbConfig::new(db_url);

        let token_config = if let Ok(secret_hex) = std::env::var(SECRET_ENV) {
            Some(
                TokenConfig::from_hex(&secret_hex)
                    .with_context(|| format!("{SECRET_ENV} env var is invalid"))?,
            )
        } else if let Some(ref cfg) = file_config {
            Some(
                TokenConfig::from_hex(&cfg.auth.token_secret)
                    .context("invalid token_secret in config file")?,
            )
        } else {
            None
        };

        let ai = file_config.map(|cfg| cfg.ai).unwrap_or_default();
        if ai.timeout_secs == Some(0) {
            bail!("[ai] timeout_secs must be greater than 0");
        }
        let gateway = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|key| {
                let mut gateway = GatewayConfig::new(key.trim());
                if let Some(url) = std::env::var(BASE_URL_ENV).ok().or(ai.base_url) {
                    gateway = gateway.with_base_url(url);
                }
                if let Some(model) = std::env::var(MODEL_ENV).ok().or(ai.model) {
                    gateway = gateway.with_model(model);
                }
                if let Some(secs) = ai.timeout_secs {
                    gateway = gateway.with_timeout(Duration::from_secs(secs));
                }
                gateway
            });

        Ok(Self {
            db_config,
            token_config,
            gateway,
        })
    }

    /// The token secret, or an error explaining how to configure one.
    pub fn require_token_config(&self) -> Result<&TokenConfig> {
        match &self.token_config {
            Some(cfg) => Ok(cfg),
            None => bail!(
                "token secret not found; set {SECRET_ENV} or run `studyplan init` to create a config file"
            ),
        }
    }

    /// Build the planner. Without an API key the planner still runs but
    /// answers every request with a missing-credential error.
    pub fn planner(&self) -> Result<StudyPlanner> {
        match &self.gateway {
            Some(cfg) => {
                let client = GatewayClient::new(cfg.clone())
                    .context("failed to build AI gateway client")?;
                Ok(StudyPlanner::new(Arc::new(client)))
            }
            None => {
                tracing::warn!("{API_KEY_ENV} is not set; plan generation will fail");
                Ok(StudyPlanner::unconfigured())
            }
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

    const SECRET: &str = "aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55";

    fn clear_env() {
        for var in [
            DbConfig::ENV_VAR,
            SECRET_ENV,
            API_KEY_ENV,
            BASE_URL_ENV,
            MODEL_ENV,
        ] {
            unsafe { std::env::remove_var(var) };
        }
    }

    fn file_config() -> ConfigFile {
        ConfigFile {
            database: DatabaseSection {
                url: "postgresql://file:5432/filedb".to_string(),
            },
            auth: AuthSection {
                token_secret: "bb".repeat(32),
            },
            ai: AiSection {
                base_url: Some("http://file-gateway/v1".to_string()),
                model: Some("file/model".to_string()),
                timeout_secs: Some(15),
            },
        }
    }

    #[test]
    fn generate_token_secret_is_64_hex_chars() {
        let secret = generate_token_secret();
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(secret, generate_token_secret());
    }

    #[test]
    fn config_file_toml_roundtrip() {
        let written = file_config();
        let contents = toml::to_string_pretty(&written).unwrap();
        let loaded: ConfigFile = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.database.url, written.database.url);
        assert_eq!(loaded.auth.token_secret, written.auth.token_secret);
        assert_eq!(loaded.ai.model.as_deref(), Some("file/model"));
    }

    #[test]
    fn ai_section_is_optional() {
        let loaded: ConfigFile = toml::from_str(
            "[database]\nurl = \"postgresql://h/db\"\n\n[auth]\ntoken_secret = \"aa\"\n",
        )
        .unwrap();
        assert!(loaded.ai.base_url.is_none());
        assert!(loaded.ai.timeout_secs.is_none());
    }

    #[test]
    fn save_config_writes_private_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };

        let result = save_config(&file_config()).and_then(|_| load_config());

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        let loaded = result.expect("save then load should succeed");
        assert_eq!(loaded.database.url, "postgresql://file:5432/filedb");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let path = tmp.path().join("studyplan").join("config.toml");
            let mode = std::fs::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn cli_flag_overrides_everything() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var(DbConfig::ENV_VAR, "postgresql://env:5432/envdb") };

        let config =
            AppConfig::resolve_with(Some("postgresql://cli:5432/clidb"), Some(file_config()))
                .unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");

        clear_env();
    }

    #[test]
    fn env_overrides_config_file() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var(DbConfig::ENV_VAR, "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var(SECRET_ENV, SECRET) };

        let config = AppConfig::resolve_with(None, Some(file_config())).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
        assert!(config.token_config.is_some());

        clear_env();
    }

    #[test]
    fn config_file_used_when_env_unset() {
        let _lock = lock_env();
        clear_env();

        let config = AppConfig::resolve_with(None, Some(file_config())).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
        assert!(config.require_token_config().is_ok());
        assert!(config.gateway.is_none(), "no API key means no gateway");
    }

    #[test]
    fn defaults_when_nothing_set() {
        let _lock = lock_env();
        clear_env();

        let config = AppConfig::resolve_with(None, None).unwrap();
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        let err = config.require_token_config().unwrap_err().to_string();
        assert!(err.contains("token secret not found"), "unexpected error: {err}");
        assert!(!config.planner().unwrap().is_configured());
    }

    #[test]
    fn invalid_env_secret_is_an_error() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var(SECRET_ENV, "not-hex") };

        let result = AppConfig::resolve_with(None, None);
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    fn gateway_layers_env_over_file() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var(API_KEY_ENV, "key-123") };
        unsafe { std::env::set_var(MODEL_ENV, "env/model") };

        let config = AppConfig::resolve_with(None, Some(file_config())).unwrap();
        clear_env();

        let gateway = config.gateway.expect("API key set, gateway expected");
        assert_eq!(gateway.api_key, "key-123");
        assert_eq!(gateway.model, "env/model");
        assert_eq!(gateway.base_url, "http://file-gateway/v1");
        assert_eq!(gateway.timeout, Duration::from_secs(15));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let _lock = lock_env();
        clear_env();
        let mut cfg = file_config();
        cfg.ai.timeout_secs = Some(0);

        let err = AppConfig::resolve_with(None, Some(cfg)).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"), "{err}");
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var(API_KEY_ENV, "   ") };

        let config = AppConfig::resolve_with(None, None).unwrap();
        clear_env();
        assert!(config.gateway.is_none());
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("studyplan/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
