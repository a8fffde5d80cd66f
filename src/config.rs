use dotenv::dotenv;
use log::LevelFilter;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

// 验证码有效期上限：一天
pub const MAX_OTP_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("缺少环境变量: {0}")]
    Missing(&'static str),

    #[error("环境变量 {name} 的值无效: {value}")]
    Invalid { name: &'static str, value: String },
}

/// 角色授予所在的网络
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Optimism,
    OptimismSepolia,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Optimism => 10,
            Network::OptimismSepolia => 11155420,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Optimism => "optimism",
            Network::OptimismSepolia => "optimism-sepolia",
        }
    }
}

impl FromStr for Network {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "optimism" => Ok(Network::Optimism),
            "optimism-sepolia" => Ok(Network::OptimismSepolia),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub allowed_email_domain: String,
    pub otp_ttl_secs: i64,
    pub smtp: SmtpConfig,
    pub hat_id: String,
    pub network: Network,
    pub log_dir: PathBuf,
    pub log_level: LevelFilter,
}

impl AppConfig {
    /// 从进程环境读取配置（先加载 .env）
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_vars(&env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());
        let or_default = |name: &str, default: &str| get(name).unwrap_or(default).to_string();
        let required = |name: &'static str| {
            get(name)
                .map(str::to_string)
                .ok_or(ConfigError::Missing(name))
        };

        let port = parse_var("PORT", get("PORT"), 3001u16)?;
        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 5u32)?;
        let otp_ttl_secs = parse_var("OTP_TTL_SECS", get("OTP_TTL_SECS"), 300i64)?;
        if otp_ttl_secs <= 0 || otp_ttl_secs > MAX_OTP_TTL_SECS {
            return Err(ConfigError::Invalid {
                name: "OTP_TTL_SECS",
                value: otp_ttl_secs.to_string(),
            });
        }

        let network = match get("NETWORK") {
            None => Network::OptimismSepolia,
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "NETWORK",
                value: v.to_string(),
            })?,
        };

        let log_level = parse_var("LOG_LEVEL", get("LOG_LEVEL"), LevelFilter::Debug)?;

        let mut allowed_email_domain = or_default("ALLOWED_EMAIL_DOMAIN", "@pse.dev").to_lowercase();
        if !allowed_email_domain.starts_with('@') {
            allowed_email_domain.insert(0, '@');
        }

        let hat_id = or_default("HAT_ID", "0");
        if !hat_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid {
                name: "HAT_ID",
                value: hat_id,
            });
        }

        Ok(AppConfig {
            host: or_default("HOST", "0.0.0.0"),
            port,
            database_url: or_default("DATABASE_URL", "sqlite://db.db"),
            db_max_connections,
            allowed_email_domain,
            otp_ttl_secs,
            smtp: SmtpConfig {
                host: or_default("SMTP_HOST", "smtp.gmail.com"),
                user: required("EMAIL_USER")?,
                password: required("APP_PASSWORD")?,
            },
            hat_id,
            network,
            log_dir: PathBuf::from(or_default("LOG_DIR", "logs")),
            log_level,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, raw: Option<&str>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
            name,
            value: v.to_string(),
        }),
    }
}
