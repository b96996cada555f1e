//! Startup configuration for the tool servers.
//!
//! Values arrive from CLI flags or their environment-variable fallbacks and
//! are immutable for the life of the process. A missing required credential
//! is a startup error, never a per-request one.

use url::Url;

/// Default base address for uploaded reports.
pub const DEFAULT_REPORT_REPO_URL: &str = "http://localhost:8080/reports";

/// Default Slack Web API base address.
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

/// Default PostgreSQL port.
pub const DEFAULT_DB_PORT: u16 = 5432;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid URL in {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
}

fn required(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl { name, source })
}

/// Connection settings for the CRM database.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

impl DatabaseConfig {
    pub fn new(
        host: String,
        port: u16,
        user: Option<String>,
        password: Option<String>,
        database: Option<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            host,
            port,
            user: required("DB_USER", user)?,
            password: password.filter(|p| !p.is_empty()),
            database: required("DB_NAME", database)?,
        })
    }

    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .dbname(&self.database);
        if let Some(password) = &self.password {
            config.password(password);
        }
        config
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .finish()
    }
}

/// Settings for the Slack Web API client.
#[derive(Clone)]
pub struct SlackConfig {
    pub token: String,
    pub api_url: Url,
}

impl SlackConfig {
    pub fn new(token: Option<String>, api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            token: required("SLACK_BOT_TOKEN", token)?,
            api_url: parse_url("SLACK_API_URL", api_url)?,
        })
    }
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &"***")
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

/// Settings for the report upload tool.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub base_url: Url,
}

impl UploadConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("REPORT_REPO_URL", base_url)?,
        })
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_REPORT_REPO_URL).expect("default report URL is valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_requires_user_and_name() {
        let err = DatabaseConfig::new("localhost".into(), DEFAULT_DB_PORT, None, None, Some("crm".into()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DB_USER")));

        let err = DatabaseConfig::new(
            "localhost".into(),
            DEFAULT_DB_PORT,
            Some("admin".into()),
            None,
            Some("  ".into()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DB_NAME")));
    }

    #[test]
    fn test_database_config_debug_hides_password() {
        let config = DatabaseConfig::new(
            "db".into(),
            5433,
            Some("admin".into()),
            Some("hunter2".into()),
            Some("crm".into()),
        )
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("5433"));
    }

    #[test]
    fn test_empty_password_is_none() {
        let config = DatabaseConfig::new(
            "db".into(),
            DEFAULT_DB_PORT,
            Some("admin".into()),
            Some(String::new()),
            Some("crm".into()),
        )
        .unwrap();
        assert!(config.password.is_none());
    }

    #[test]
    fn test_slack_config_requires_token() {
        let err = SlackConfig::new(None, DEFAULT_SLACK_API_URL).unwrap_err();
        assert_eq!(err.to_string(), "missing required setting SLACK_BOT_TOKEN");

        let err = SlackConfig::new(Some(String::new()), DEFAULT_SLACK_API_URL).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SLACK_BOT_TOKEN")));

        let config = SlackConfig::new(Some("xoxb-1".into()), DEFAULT_SLACK_API_URL).unwrap();
        assert!(!format!("{:?}", config).contains("xoxb-1"));
    }

    #[test]
    fn test_upload_config() {
        assert_eq!(UploadConfig::default().base_url.as_str(), DEFAULT_REPORT_REPO_URL);
        assert!(matches!(
            UploadConfig::new("not a url").unwrap_err(),
            ConfigError::InvalidUrl { name: "REPORT_REPO_URL", .. }
        ));
    }
}
