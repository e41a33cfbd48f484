use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub environment: String,
    pub app_url: String,
    pub jwt_secret: String,
    pub jwt_expires_days: i64,
    pub cookie_expires_days: i64,
    pub geocoder_url: String,
    pub geocoder_api_key: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_encryption: String,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub upload_dir: String,
    pub max_file_size: usize,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            app_url: get_env("APP_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_expires_days: get_env_parse("JWT_EXPIRES_DAYS")?,
            cookie_expires_days: get_env_parse("COOKIE_EXPIRES_DAYS")?,
            geocoder_url: get_env("GEOCODER_URL")?,
            geocoder_api_key: get_env("GEOCODER_API_KEY")?,
            smtp_host: get_env("SMTP_HOST")?,
            smtp_port: get_env_parse("SMTP_PORT")?,
            smtp_encryption: env::var("SMTP_ENCRYPTION").unwrap_or_else(|_| "starttls".to_string()),
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: get_env("SMTP_FROM")?,
            upload_dir: get_env("UPLOAD_DIR")?,
            max_file_size: get_env_parse("MAX_FILE_SIZE")?,
            rate_limit_max: get_env_parse("RATE_LIMIT_MAX")?,
            rate_limit_window_secs: get_env_parse("RATE_LIMIT_WINDOW_SECS")?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
