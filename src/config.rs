use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub llm: LLMConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_upload_bytes: usize,
    /// Directory for spooled uploads; the system temp dir when unset.
    pub spool_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
    pub chat_model: String,
    pub max_document_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            server: ServerConfig {
                port: parse_or(&var, "PORT", 8000)?,
                host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                cors_allowed_origins: var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            upload: UploadConfig {
                max_upload_bytes: parse_or(&var, "MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?,
                spool_dir: var("UPLOAD_SPOOL_DIR").map(PathBuf::from),
            },
            llm: LLMConfig {
                openai_api_key: var("OPENAI_API_KEY"),
                openai_api_base: var("OPENAI_API_BASE"),
                chat_model: var("CHAT_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
                max_document_chars: parse_or(&var, "CHAT_MAX_DOCUMENT_CHARS", 100_000)?,
            },
            logging: LoggingConfig {
                log_dir: var("LOG_DIR").map(PathBuf::from),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        // No variables set: every field takes its default, which always parses.
        Self {
            server: ServerConfig {
                port: 8000,
                host: "0.0.0.0".to_string(),
                cors_allowed_origins: vec!["*".to_string()],
            },
            upload: UploadConfig {
                max_upload_bytes: 50 * 1024 * 1024,
                spool_dir: None,
            },
            llm: LLMConfig {
                openai_api_key: None,
                openai_api_base: None,
                chat_model: "gpt-3.5-turbo".to_string(),
                max_document_chars: 100_000,
            },
            logging: LoggingConfig { log_dir: None },
        }
    }
}

fn parse_or<T, F>(var: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number, got {:?}", name, raw)),
        None => Ok(default),
    }
}
