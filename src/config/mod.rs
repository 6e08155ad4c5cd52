mod logging;
pub use logging::{init_logging, rotate_log_file, DEFAULT_MAX_LOG_BYTES};

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use zeroize::Zeroizing;

use crate::models::messages::string_or_number;

pub const DEFAULT_CONFIG_PATH: &str = "config_skiptrade.json";
pub const DEFAULT_SKIP_API_URL: &str = "https://api.skip.build/v2/fungible/route";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_CHAIN_BINARY: &str = "osmosisd";

const ENV_ACCOUNT_PASSWORD: &str = "SKIPTRADE_ACCOUNT_PASSWORD";
const ENV_SKIP_API_KEY: &str = "SKIP_API_KEY";

/// String that is wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    pub fn new<T: Into<String>>(value: T) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(***)")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString::new)
    }
}

#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Key name in the local keyring, used as `--from` when signing.
    pub name: String,
    pub address: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: SecretString,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub assets_config_path: PathBuf,
    pub command_output_path: PathBuf,
    pub log_file_path: PathBuf,
    pub max_log_bytes: u64,
    pub chain_id: String,
    pub chain_binary: String,
    pub node: Option<String>,
    pub keyring_backend: Option<String>,
    pub gas_adjustment: Decimal,
    pub fees: u64,
    pub gas_token: String,
    pub slippage_percent: Decimal,
    pub account: AccountConfig,
    pub skip_api_url: String,
    pub skip_api_key: Option<String>,
    pub route_timeout: Duration,
    pub chain_client_timeout: Option<Duration>,
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    assets_config_path: PathBuf,
    command_output_path: PathBuf,
    log_file_path: PathBuf,
    #[serde(default = "default_max_log_bytes")]
    max_log_bytes: u64,
    chain_id: String,
    #[serde(default = "default_chain_binary")]
    chain_binary: String,
    #[serde(default)]
    node: Option<String>,
    #[serde(default)]
    keyring_backend: Option<String>,
    gas_adjustment: Decimal,
    fees: u64,
    gas_token: String,
    #[serde(default = "default_slippage_percent")]
    slippage_percent: Decimal,
    account_name: String,
    #[serde(default)]
    account_password: Option<SecretString>,
    account_address: String,
    #[serde(default = "default_skip_api_url")]
    skip_api_url: String,
    #[serde(default)]
    skip_api_key: Option<String>,
    #[serde(default = "default_route_timeout_ms")]
    route_timeout_ms: u64,
    #[serde(default)]
    chain_client_timeout_secs: Option<u64>,
    #[serde(default)]
    telegram_bot_username: Option<String>,
    #[serde(default)]
    telegram_usernames: Vec<String>,
    #[serde(default)]
    bot_config_path: Option<PathBuf>,
    #[serde(default = "default_telegram_api_url")]
    telegram_api_url: String,
}

fn default_max_log_bytes() -> u64 {
    DEFAULT_MAX_LOG_BYTES
}

fn default_chain_binary() -> String {
    DEFAULT_CHAIN_BINARY.to_string()
}

fn default_slippage_percent() -> Decimal {
    Decimal::new(15, 1)
}

fn default_skip_api_url() -> String {
    DEFAULT_SKIP_API_URL.to_string()
}

fn default_route_timeout_ms() -> u64 {
    15_000
}

fn default_telegram_api_url() -> String {
    DEFAULT_TELEGRAM_API_URL.to_string()
}

#[derive(Debug, Deserialize)]
struct BotConfig {
    #[serde(default)]
    bots: Vec<BotEntry>,
    #[serde(default)]
    users: Vec<UserEntry>,
}

#[derive(Debug, Deserialize)]
struct BotEntry {
    username: String,
    token: SecretString,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    username: String,
    #[serde(deserialize_with = "string_or_number")]
    id: String,
}

/// Loads the JSON config file, applies environment overrides and resolves
/// the Telegram credentials it points at.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    dotenv::dotenv().ok();

    let mut raw: FileConfig = read_json(path)?;
    apply_env_overrides(&mut raw, |key| env::var(key).ok());
    build_config(raw)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env_overrides<F>(raw: &mut FileConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(password) = lookup(ENV_ACCOUNT_PASSWORD).filter(|value| !value.is_empty()) {
        raw.account_password = Some(SecretString::new(password));
    }
    if let Some(key) = lookup(ENV_SKIP_API_KEY).filter(|value| !value.is_empty()) {
        raw.skip_api_key = Some(key);
    }
}

fn build_config(raw: FileConfig) -> Result<AppConfig, ConfigError> {
    if raw.slippage_percent.is_sign_negative() || raw.slippage_percent > Decimal::from(100u32) {
        return Err(ConfigError::Invalid(format!(
            "slippage_percent must be within 0..=100, got {}",
            raw.slippage_percent
        )));
    }
    if raw.gas_adjustment <= Decimal::ZERO {
        return Err(ConfigError::Invalid(
            "gas_adjustment must be > 0".to_string(),
        ));
    }
    for (field, value) in [
        ("chain_id", &raw.chain_id),
        ("chain_binary", &raw.chain_binary),
        ("gas_token", &raw.gas_token),
        ("account_name", &raw.account_name),
        ("account_address", &raw.account_address),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{field} must not be empty")));
        }
    }
    if raw.route_timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "route_timeout_ms must be > 0".to_string(),
        ));
    }
    let password = raw
        .account_password
        .filter(|secret| !secret.is_empty())
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "account_password must be set in the config file or {ENV_ACCOUNT_PASSWORD}"
            ))
        })?;

    let telegram = match raw.telegram_bot_username.as_deref() {
        Some(bot_username) => Some(resolve_telegram(
            bot_username,
            &raw.telegram_usernames,
            raw.bot_config_path.as_deref(),
            raw.telegram_api_url,
        )?),
        None => None,
    };

    Ok(AppConfig {
        assets_config_path: raw.assets_config_path,
        command_output_path: raw.command_output_path,
        log_file_path: raw.log_file_path,
        max_log_bytes: raw.max_log_bytes,
        chain_id: raw.chain_id,
        chain_binary: raw.chain_binary,
        node: raw.node,
        keyring_backend: raw.keyring_backend,
        gas_adjustment: raw.gas_adjustment,
        fees: raw.fees,
        gas_token: raw.gas_token,
        slippage_percent: raw.slippage_percent,
        account: AccountConfig {
            name: raw.account_name,
            address: raw.account_address,
            password,
        },
        skip_api_url: raw.skip_api_url,
        skip_api_key: raw.skip_api_key,
        route_timeout: Duration::from_millis(raw.route_timeout_ms),
        chain_client_timeout: raw
            .chain_client_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs),
        telegram,
    })
}

fn resolve_telegram(
    bot_username: &str,
    usernames: &[String],
    bot_config_path: Option<&Path>,
    api_url: String,
) -> Result<TelegramConfig, ConfigError> {
    let path = bot_config_path.ok_or_else(|| {
        ConfigError::Invalid("bot_config_path is required when telegram_bot_username is set".into())
    })?;
    let bot_config: BotConfig = read_json(path)?;

    let bot_token = bot_config
        .bots
        .iter()
        .find(|bot| bot.username == bot_username)
        .map(|bot| bot.token.clone())
        .ok_or_else(|| ConfigError::UnknownBot(bot_username.to_string()))?;

    let recipients = usernames
        .iter()
        .map(|username| {
            bot_config
                .users
                .iter()
                .find(|user| &user.username == username)
                .map(|user| user.id.clone())
                .ok_or_else(|| ConfigError::UnknownUser(username.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TelegramConfig {
        api_url,
        bot_token,
        recipients,
    })
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Invalid(String),
    UnknownBot(String),
    UnknownUser(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse {}: {}", path.display(), source)
            }
            ConfigError::Invalid(message) => write!(f, "invalid configuration: {}", message),
            ConfigError::UnknownBot(name) => write!(f, "bot {} not found", name),
            ConfigError::UnknownUser(name) => write!(f, "user {} not found", name),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}
