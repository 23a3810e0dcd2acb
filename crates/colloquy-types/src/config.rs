//! Service configuration types.
//!
//! Deserialized from `{data_dir}/config.toml` by the infra layer; every
//! section has serde defaults so a missing or partial file yields a
//! working configuration.

use serde::{Deserialize, Serialize};

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub quota: QuotaConfig,
    pub context: ContextConfig,
    pub cache: CacheConfig,
    /// Model alias table; empty means the built-in catalog is used.
    pub models: Vec<ModelAliasConfig>,
    pub default_model: DefaultModel,
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7700,
        }
    }
}

/// Monthly unit allotments per membership tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    pub free_units: i64,
    pub basic_units: i64,
    pub premium_units: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_units: 1_000,
            basic_units: 900_000,
            premium_units: 1_800_000,
        }
    }
}

/// Prompt assembly settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub system_prompt: String,
    /// Most recent turns kept when assembling history; `None` keeps all.
    pub max_history_turns: Option<usize>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".to_string(),
            max_history_turns: Some(50),
        }
    }
}

/// Thread-list cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub thread_list_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            thread_list_ttl_secs: 3_600,
        }
    }
}

/// One model alias entry: short name to provider model id plus its
/// maximum-output-token budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAliasConfig {
    pub alias: String,
    pub id: String,
    pub max_output_tokens: u32,
}

/// The alias used when a request names no model (or an unknown one).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefaultModel(pub String);

impl Default for DefaultModel {
    fn default() -> Self {
        Self("sonnet".to_string())
    }
}
