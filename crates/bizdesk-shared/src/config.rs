//! Configuration management
//!
//! Layering: built-in defaults, `config/default.toml`, `config/{APP_ENV}.toml`,
//! then `BIZDESK__SECTION__KEY` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub log: LogSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub security: SecuritySettings,
    pub llm: LlmSettings,
    pub search: SearchSettings,
    pub openfactura: OpenFacturaSettings,
    pub image_host: ImageHostSettings,
    pub mail: MailSettings,
    pub payroll: PayrollSettings,
    pub limits: LimitsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
    /// Daily rolling files are written here when set.
    pub directory: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecuritySettings {
    /// Key accepted in `x-api-key` for service-to-service calls that name
    /// their tenant with `x-tenant-id`. Empty disables that path.
    pub service_api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmSettings {
    pub timeout_seconds: u64,
    pub gemini_base_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub openai_base_url: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub premium_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchSettings {
    pub base_url: String,
    pub api_key: String,
    pub engine_id: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenFacturaSettings {
    pub base_url: String,
    pub api_key: String,
    pub chunk_days: u32,
    pub request_delay_ms: u64,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageHostSettings {
    pub upload_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailSettings {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PayrollSettings {
    pub pension_rate: f64,
    pub health_rate: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsSettings {
    /// Concurrent enrichment requests allowed per process.
    pub enrichment_concurrency: usize,
    pub acquire_timeout_ms: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Self::defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("BIZDESK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        config.try_deserialize()
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "bizdesk-server")?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("log.level", "info,bizdesk=debug")?
            .set_default("log.json", true)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_seconds", 3)?
            .set_default("database.run_migrations", true)?
            .set_default("jwt.access_token_expiry", crate::constants::DEFAULT_ACCESS_TOKEN_EXPIRY)?
            .set_default("security.service_api_key", "")?
            .set_default("llm.timeout_seconds", 60)?
            .set_default("llm.gemini_base_url", "https://generativelanguage.googleapis.com/v1beta")?
            .set_default("llm.gemini_api_key", "")?
            .set_default("llm.gemini_model", "gemini-1.5-flash")?
            .set_default("llm.openai_base_url", "https://api.openai.com/v1")?
            .set_default("llm.openai_api_key", "")?
            .set_default("llm.openai_model", "gpt-4o-mini")?
            .set_default("llm.premium_model", "gpt-4o")?
            .set_default("llm.temperature", 0.4)?
            .set_default("llm.max_tokens", 800)?
            .set_default("search.base_url", "https://www.googleapis.com/customsearch/v1")?
            .set_default("search.api_key", "")?
            .set_default("search.engine_id", "")?
            .set_default("search.timeout_seconds", 20)?
            .set_default("openfactura.base_url", "https://api.haulmer.com")?
            .set_default("openfactura.api_key", "")?
            .set_default("openfactura.chunk_days", 30)?
            .set_default("openfactura.request_delay_ms", 400)?
            .set_default("openfactura.timeout_seconds", 30)?
            .set_default("image_host.upload_url", "https://api.imgbb.com/1/upload")?
            .set_default("image_host.api_key", "")?
            .set_default("image_host.timeout_seconds", 30)?
            .set_default("mail.enabled", false)?
            .set_default("mail.smtp_host", "localhost")?
            .set_default("mail.smtp_port", 587)?
            .set_default("mail.username", "")?
            .set_default("mail.password", "")?
            .set_default("mail.from_address", "BizDesk <no-reply@bizdesk.local>")?
            .set_default("payroll.pension_rate", 0.10)?
            .set_default("payroll.health_rate", 0.07)?
            .set_default("limits.enrichment_concurrency", 4)?
            .set_default("limits.acquire_timeout_ms", 5000)
    }

    /// Checks the values serde cannot express.
    pub fn validate(&self) -> Result<(), crate::AppError> {
        if self.jwt.secret.len() < 32 {
            return Err(crate::AppError::InvalidConfig(
                "jwt.secret must be at least 32 characters".to_string(),
            ));
        }
        if self.openfactura.chunk_days == 0 {
            return Err(crate::AppError::InvalidConfig(
                "openfactura.chunk_days must be positive".to_string(),
            ));
        }
        for (name, rate) in [
            ("payroll.pension_rate", self.payroll.pension_rate),
            ("payroll.health_rate", self.payroll.health_rate),
        ] {
            if !(0.0..1.0).contains(&rate) {
                return Err(crate::AppError::InvalidConfig(format!(
                    "{} must be in [0, 1)",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_from_toml(toml: &str) -> AppConfig {
        AppConfig::defaults(Config::builder())
            .unwrap()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_everything_but_secrets() {
        let cfg = load_from_toml(
            r#"
            [database]
            url = "postgres://localhost/bizdesk"
            [jwt]
            secret = "0123456789abcdef0123456789abcdef"
            "#,
        );
        assert_eq!(cfg.app.port, 8080);
        assert_eq!(cfg.openfactura.chunk_days, 30);
        assert_eq!(cfg.openfactura.request_delay_ms, 400);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let cfg = load_from_toml(
            r#"
            [database]
            url = "postgres://localhost/bizdesk"
            [jwt]
            secret = "short"
            "#,
        );
        assert!(cfg.validate().is_err());
    }
}
