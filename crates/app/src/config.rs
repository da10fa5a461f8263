use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use learn_core::model::UserId;
use learn_core::{Session, UserIdentity, ZeroTolerance};
use storage::remote::RemoteConfig;
use thiserror::Error;

pub const DEFAULT_DB_URL: &str = "sqlite://dev.sqlite3";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid {var} value: {raw}")]
    Invalid { var: &'static str, raw: String },
    #[error("{0} must be set for the remote backend")]
    Missing(&'static str),
    #[error("invalid database url: {0}")]
    InvalidDbUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Backend {
    #[default]
    Sqlite,
    Remote,
}

/// Runtime settings, read from `LEARN_*` variables and overridden by flags.
#[derive(Clone)]
pub struct AppConfig {
    pub backend: Backend,
    pub db_url: String,
    pub store_url: Option<String>,
    pub store_key: Option<String>,
    pub user_id: Option<UserId>,
    pub access_token: Option<String>,
    pub http_timeout: Duration,
    pub zero_tolerance: ZeroTolerance,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = match var("LEARN_BACKEND").as_deref().map(str::trim) {
            None | Some("sqlite") => Backend::Sqlite,
            Some("remote") => Backend::Remote,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LEARN_BACKEND",
                    raw: other.to_string(),
                });
            }
        };

        let user_id = var("LEARN_USER_ID")
            .map(|raw| {
                raw.parse::<UserId>().map_err(|_| ConfigError::Invalid {
                    var: "LEARN_USER_ID",
                    raw,
                })
            })
            .transpose()?;

        let http_timeout = match var("LEARN_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    var: "LEARN_HTTP_TIMEOUT_SECS",
                    raw,
                })?,
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let zero_tolerance = match var("LEARN_ZERO_TOLERANCE").as_deref().map(str::trim) {
            None | Some("default") => ZeroTolerance::UseDefault,
            Some("exact") => ZeroTolerance::Exact,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LEARN_ZERO_TOLERANCE",
                    raw: other.to_string(),
                });
            }
        };

        Ok(Self {
            backend,
            db_url: var("LEARN_DB_URL").map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url),
            store_url: var("LEARN_STORE_URL"),
            store_key: var("LEARN_STORE_KEY"),
            user_id,
            access_token: var("LEARN_ACCESS_TOKEN"),
            http_timeout,
            zero_tolerance,
        })
    }

    /// Apply command-line flags on top of the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDbUrl` for a blank `--db` value.
    pub fn with_overrides(
        mut self,
        backend: Option<Backend>,
        db_url: Option<String>,
        user_id: Option<UserId>,
    ) -> Result<Self, ConfigError> {
        if let Some(backend) = backend {
            self.backend = backend;
        }
        if let Some(db_url) = db_url {
            if db_url.trim().is_empty() {
                return Err(ConfigError::InvalidDbUrl(db_url));
            }
            self.db_url = normalize_sqlite_url(db_url);
        }
        if let Some(user_id) = user_id {
            self.user_id = Some(user_id);
        }
        Ok(self)
    }

    #[must_use]
    pub fn session(&self) -> Session {
        match self.user_id {
            Some(id) => {
                let mut user = UserIdentity::new(id);
                if let Some(token) = &self.access_token {
                    user = user.with_access_token(token.clone());
                }
                Session::signed_in(user)
            }
            None => Session::anonymous(),
        }
    }

    /// Connection settings for the hosted store, authenticated as `session`'s user when present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the store URL or key is not configured.
    pub fn remote_config(&self, session: &Session) -> Result<RemoteConfig, ConfigError> {
        let base_url = self
            .store_url
            .clone()
            .ok_or(ConfigError::Missing("LEARN_STORE_URL"))?;
        let api_key = self
            .store_key
            .clone()
            .ok_or(ConfigError::Missing("LEARN_STORE_KEY"))?;
        let mut config = RemoteConfig::new(base_url, api_key).with_timeout(self.http_timeout);
        if let Some(token) = session.user().and_then(|user| user.access_token.clone()) {
            config = config.with_access_token(token);
        }
        Ok(config)
    }
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file and its directory exist before sqlx opens it.
///
/// # Errors
///
/// Returns an error for a non-file URL or when the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ConfigError::InvalidDbUrl(db_url.to_string()))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ConfigError::InvalidDbUrl(db_url.to_string()).into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config(&[]).unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.db_url, DEFAULT_DB_URL);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.zero_tolerance, ZeroTolerance::UseDefault);
        assert!(!config.session().is_signed_in());
    }

    #[test]
    fn reads_remote_settings() {
        let user = UserId::random();
        let user_raw = user.to_string();
        let config = config(&[
            ("LEARN_BACKEND", "remote"),
            ("LEARN_STORE_URL", "https://store.test"),
            ("LEARN_STORE_KEY", "anon"),
            ("LEARN_USER_ID", &user_raw),
            ("LEARN_ACCESS_TOKEN", "jwt"),
            ("LEARN_HTTP_TIMEOUT_SECS", "5"),
            ("LEARN_ZERO_TOLERANCE", "exact"),
        ])
        .unwrap();
        assert_eq!(config.backend, Backend::Remote);
        assert_eq!(config.zero_tolerance, ZeroTolerance::Exact);

        let session = config.session();
        assert_eq!(session.require_user().unwrap().id, user);

        let remote = config.remote_config(&session).unwrap();
        assert_eq!(remote.access_token.as_deref(), Some("jwt"));
        assert_eq!(remote.timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(matches!(
            config(&[("LEARN_BACKEND", "postgres")]),
            Err(ConfigError::Invalid { var: "LEARN_BACKEND", .. })
        ));
        assert!(matches!(
            config(&[("LEARN_USER_ID", "42")]),
            Err(ConfigError::Invalid { var: "LEARN_USER_ID", .. })
        ));
        assert!(matches!(
            config(&[("LEARN_HTTP_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn remote_backend_needs_store_url() {
        let config = config(&[("LEARN_STORE_KEY", "anon")]).unwrap();
        assert!(matches!(
            config.remote_config(&Session::anonymous()),
            Err(ConfigError::Missing("LEARN_STORE_URL"))
        ));
    }

    #[test]
    fn flags_override_environment() {
        let user = UserId::random();
        let config = config(&[("LEARN_DB_URL", "sqlite://env.db")])
            .unwrap()
            .with_overrides(Some(Backend::Remote), Some("sqlite://flag.db".into()), Some(user))
            .unwrap();
        assert_eq!(config.backend, Backend::Remote);
        assert_eq!(config.db_url, "sqlite://flag.db");
        assert_eq!(config.user_id, Some(user));
    }

    #[test]
    fn relative_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("sqlite:data/dev.db".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/dev.db"));
    }
}
