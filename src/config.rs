use solana_pubkey::Pubkey;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Deriverse program ids tracked when no override is configured.
pub const DEFAULT_PROGRAM_IDS: [&str; 2] = [
    "CDESjex4EDBKLwx9ZPzVbjiHEHatasb5fhSJZMzNfvw2",
    "Drvrseg8AQLP8B96DBGmHRjFGviFNYTkHueY9g3k27Gu",
];

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// Largest page `getSignaturesForAddress` accepts.
pub const MAX_SIGNATURE_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub rpc_url: String,
    /// Programs whose transactions are considered venue activity.
    pub program_ids: Vec<Pubkey>,
    /// Maximum number of signatures listed per sync.
    pub signature_limit: usize,
    /// Maximum number of transaction fetches in flight.
    pub fetch_concurrency: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let rpc_url = env_map
            .get("SOLANA_RPC_URL")
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let program_ids = parse_program_ids_from_map(&env_map)?;

        let signature_limit = parse_positive(&env_map, "SIGNATURE_LIMIT", MAX_SIGNATURE_LIMIT)?;
        if signature_limit > MAX_SIGNATURE_LIMIT {
            return Err(ConfigError::InvalidValue(
                "SIGNATURE_LIMIT".to_string(),
                format!("must be at most {}", MAX_SIGNATURE_LIMIT),
            ));
        }
        let fetch_concurrency = parse_positive(&env_map, "FETCH_CONCURRENCY", 10)?;

        Ok(Config {
            port,
            database_path,
            rpc_url,
            program_ids,
            signature_limit,
            fetch_concurrency,
        })
    }
}

/// `PROGRAM_IDS` (comma separated), then `PROGRAM_ID`, then the defaults.
/// Duplicates are dropped, first occurrence wins.
fn parse_program_ids_from_map(
    env_map: &HashMap<String, String>,
) -> Result<Vec<Pubkey>, ConfigError> {
    let mut raw: Vec<(&str, String)> = Vec::new();
    if let Some(list) = env_map.get("PROGRAM_IDS") {
        raw.extend(
            list.split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| ("PROGRAM_IDS", s.to_string())),
        );
    }
    if let Some(single) = env_map.get("PROGRAM_ID").filter(|s| !s.trim().is_empty()) {
        raw.push(("PROGRAM_ID", single.trim().to_string()));
    }
    raw.extend(DEFAULT_PROGRAM_IDS.iter().map(|s| ("default", s.to_string())));

    let mut program_ids = Vec::new();
    for (source, value) in raw {
        let key = Pubkey::from_str(&value).map_err(|_| {
            ConfigError::InvalidValue(source.to_string(), format!("invalid program id {}", value))
        })?;
        if !program_ids.contains(&key) {
            program_ids.push(key);
        }
    }
    Ok(program_ids)
}

fn parse_positive(
    env_map: &HashMap<String, String>,
    name: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    match env_map.get(name) {
        None => Ok(default),
        Some(s) => match s.trim().parse::<usize>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(ConfigError::InvalidValue(
                name.to_string(),
                "must be a positive integer".to_string(),
            )),
        },
    }
}
