//! Runtime configuration, read once from the environment at startup.
//!
//! | Variable            | Default            |
//! |---------------------|--------------------|
//! | `KAMPAIGN_HOST`     | `127.0.0.1`        |
//! | `KAMPAIGN_PORT`     | `8080`             |
//! | `KAMPAIGN_DB`       | `kampaign.sqlite`  |
//! | `KAMPAIGN_LOG_ROOT` | `logs/campaigns`   |
//! | `KAMPAIGN_DRY_RUN`  | `false`            |
//! | `KAMPAIGN_FROM`     | `SMTP_USER`        |
//!
//! SMTP is configured through `SMTP_HOST`, `SMTP_PORT`, `SMTP_SECURE`,
//! `SMTP_USER` and `SMTP_APP_PASSWORD`. All but `SMTP_SECURE` must be set,
//! otherwise SMTP counts as not configured and sends are refused.

use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB: &str = "kampaign.sqlite";
const DEFAULT_LOG_ROOT: &str = "logs/campaigns";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
    #[error("invalid SMTP configuration: {0}")]
    Smtp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Implicit TLS when true, opportunistic STARTTLS otherwise.
    pub secure: bool,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub log_root: PathBuf,
    pub dry_run: bool,
    pub from: Option<String>,
    pub smtp: Option<SmtpSettings>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Empty variables count as unset.
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("KAMPAIGN_PORT") {
            Some(raw) => parse_port("KAMPAIGN_PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let smtp = match (
            var("SMTP_HOST"),
            var("SMTP_PORT"),
            var("SMTP_USER"),
            var("SMTP_APP_PASSWORD"),
        ) {
            (Some(host), Some(port), Some(user), Some(password)) => Some(SmtpSettings {
                host,
                port: parse_port("SMTP_PORT", &port)?,
                secure: var("SMTP_SECURE").is_some_and(|v| v == "true"),
                user,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            host: var("KAMPAIGN_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            db_path: var("KAMPAIGN_DB").unwrap_or_else(|| DEFAULT_DB.to_string()).into(),
            log_root: var("KAMPAIGN_LOG_ROOT")
                .unwrap_or_else(|| DEFAULT_LOG_ROOT.to_string())
                .into(),
            dry_run: var("KAMPAIGN_DRY_RUN").is_some_and(|v| v == "true" || v == "1"),
            from: var("KAMPAIGN_FROM"),
            smtp,
        })
    }

    /// Address used in the `From` header: `KAMPAIGN_FROM`, falling back to
    /// the SMTP user.
    pub fn sender(&self) -> Option<String> {
        self.from
            .clone()
            .or_else(|| self.smtp.as_ref().map(|smtp| smtp.user.clone()))
    }
}

fn parse_port(name: &'static str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
    })
}
