use crate::error::{Error, Result};
use crate::services::discovery_service::DiscoveryProfile;
use crate::services::fetch_service::LinkPolicy;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Firestore {
        service_account_path: PathBuf,
        emulator_host: Option<String>,
        project_id: Option<String>,
    },
    Postgres {
        database_url: String,
    },
    Memory,
}

impl StoreConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StoreConfig::Firestore { .. } => "firestore",
            StoreConfig::Postgres { .. } => "postgres",
            StoreConfig::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub serper_api_key: String,
    pub anthropic_api_key: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub store: StoreConfig,
    pub profile: DiscoveryProfile,
    pub discovery_timeout: Duration,
    pub link_check_timeout: Duration,
    pub link_policy: LinkPolicy,
    pub fetch_interval: Duration,
    pub fetch_cooldown: Duration,
    pub scheduler_enabled: bool,
    pub trigger_rps: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let store = match get_env_or("STORE_BACKEND", "firestore")
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => StoreConfig::Firestore {
                service_account_path: PathBuf::from(get_env("FIREBASE_SERVICE_ACCOUNT_PATH")?),
                emulator_host: env::var("FIRESTORE_EMULATOR_HOST").ok(),
                project_id: env::var("FIRESTORE_PROJECT_ID").ok(),
            },
            "postgres" => StoreConfig::Postgres {
                database_url: get_env("DATABASE_URL")?,
            },
            "memory" => StoreConfig::Memory,
            other => {
                return Err(Error::Config(format!(
                    "Invalid value for STORE_BACKEND: {}",
                    other
                )))
            }
        };

        let profile = match env::var("DISCOVERY_PROFILE_PATH") {
            Ok(path) => DiscoveryProfile::load_from_file(&path)?,
            Err(_) => {
                let name = get_env_or("DISCOVERY_PROFILE", "standard");
                DiscoveryProfile::builtin(&name).ok_or_else(|| {
                    Error::Config(format!("Unknown discovery profile: {}", name))
                })?
            }
        };

        let link_policy = if get_env_parse_or("DROP_INVALID_LINKS", false)? {
            LinkPolicy::Drop
        } else {
            LinkPolicy::Flag
        };

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8000"),
            serper_api_key: get_env("SERPER_API_KEY")?,
            anthropic_api_key: get_env("ANTHROPIC_API_KEY")?,
            llm_model: get_env_or("LLM_MODEL", "claude-3-opus-20240229"),
            llm_temperature: get_env_parse_or("LLM_TEMPERATURE", 0.7)?,
            llm_max_tokens: get_env_parse_or("LLM_MAX_TOKENS", 4096)?,
            store,
            profile,
            discovery_timeout: Duration::from_secs(get_env_parse_or(
                "DISCOVERY_TIMEOUT_SECS",
                900,
            )?),
            link_check_timeout: Duration::from_secs(get_env_parse_or(
                "LINK_CHECK_TIMEOUT_SECS",
                10,
            )?),
            link_policy,
            fetch_interval: Duration::from_secs(get_env_parse_or("FETCH_INTERVAL_SECS", 1800)?),
            fetch_cooldown: Duration::from_secs(get_env_parse_or("FETCH_COOLDOWN_SECS", 60)?),
            scheduler_enabled: get_env_parse_or("SCHEDULER_ENABLED", true)?,
            trigger_rps: get_env_parse_or("TRIGGER_RPS", 1)?,
        })
    }
}

pub fn get_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::Config(format!(
            "Missing environment variable: {}",
            name
        ))),
    }
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
