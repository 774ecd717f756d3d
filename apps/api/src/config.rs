//! API configuration module.
//!
//! Configuration is layered with the `config` crate:
//!
//! ```text
//! defaults  ──►  cajas.toml (optional)  ──►  environment variables
//!                                            (PORT, DATABASE_URL, EMAIL_HOST, ...)
//! ```
//!
//! Later sources win. Environment keys are the upper-case field names.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use cajas_core::validation::is_valid_ruc;

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP port
    pub port: u16,

    /// Interface to bind
    pub bind_addr: String,

    /// MySQL connection string
    pub database_url: String,

    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT lifetime in seconds (default: one day)
    pub jwt_expiry_secs: i64,

    /// Comma separated list of origins allowed by CORS
    pub allowed_origins: String,

    /// Issuer data printed on comprobantes and carried in the QR
    pub company_ruc: String,
    pub company_name: String,
    pub company_address: String,

    /// SMTP relay; mail is disabled when unset
    pub email_host: Option<String>,
    pub email_port: u16,
    /// Implicit TLS (port 465) instead of STARTTLS
    pub email_secure: bool,
    pub email_user: Option<String>,
    pub email_pass: Option<String>,
    pub email_from: Option<String>,
}

/// SMTP settings, present only when fully configured.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl ApiConfig {
    /// Load configuration from `cajas.toml` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Environment::default())
    }

    /// Load configuration with an explicit environment source.
    pub fn load_from(environment: Environment) -> Result<Self, ConfigError> {
        let config: ApiConfig = Self::defaults()?
            .add_source(File::with_name("cajas").required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let builder = Config::builder()
            .set_default("port", 3000)?
            .set_default("bind_addr", "0.0.0.0")?
            .set_default("database_url", "mysql://root@localhost:3306/cajas")?
            .set_default("db_max_connections", 10)?
            // In production, this MUST be set via environment variable
            .set_default("jwt_secret", "cajas-dev-secret-change-in-production")?
            .set_default("jwt_expiry_secs", 86_400)?
            .set_default("allowed_origins", "http://localhost:5173")?
            .set_default("company_ruc", "20123456789")?
            .set_default("company_name", "Ferretería Ejemplo S.A.C.")?
            .set_default("company_address", "Av. Siempre Viva 123, Lima")?
            .set_default("email_port", 587)?
            .set_default("email_secure", false)?;
        Ok(builder)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }

        if self.jwt_expiry_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_EXPIRY_SECS".to_string()));
        }

        if !is_valid_ruc(&self.company_ruc) {
            return Err(ConfigError::InvalidValue("COMPANY_RUC".to_string()));
        }

        let smtp_fields = [&self.email_host, &self.email_user, &self.email_pass];
        let present = smtp_fields.iter().filter(|f| f.is_some()).count();
        if present != 0 && present != smtp_fields.len() {
            return Err(ConfigError::IncompleteSmtp);
        }

        Ok(())
    }

    /// `BIND_ADDR:PORT`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Allowed CORS origins, trimmed, empties dropped.
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// SMTP settings when host, user and password are all set.
    ///
    /// The sender defaults to the SMTP user.
    pub fn smtp(&self) -> Option<SmtpSettings> {
        let host = self.email_host.clone()?;
        let user = self.email_user.clone()?;
        let pass = self.email_pass.clone()?;
        let from = self.email_from.clone().unwrap_or_else(|| user.clone());

        Some(SmtpSettings {
            host,
            port: self.email_port,
            secure: self.email_secure,
            user,
            pass,
            from,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("SMTP partially configured: EMAIL_HOST, EMAIL_USER and EMAIL_PASS must be set together")]
    IncompleteSmtp,

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
}
