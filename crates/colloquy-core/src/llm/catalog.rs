//! Model alias resolution.
//!
//! Maps short aliases ("opus", "sonnet", "haiku") to concrete provider
//! model ids with an associated maximum-output-token budget. An
//! unrecognized or absent alias falls back to the catalog default rather
//! than failing the request.

use std::collections::HashMap;

use colloquy_types::config::ModelAliasConfig;

/// A concrete provider model with its output budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: String,
    pub max_output_tokens: u32,
}

/// Alias-to-model table with a default fallback.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    aliases: HashMap<String, ModelSpec>,
    default_alias: String,
}

impl ModelCatalog {
    /// The built-in catalog: opus, sonnet, haiku.
    pub fn builtin() -> Self {
        let mut aliases = HashMap::new();
        aliases.insert(
            "opus".to_string(),
            ModelSpec {
                id: "claude-opus-4-20250514".to_string(),
                max_output_tokens: 10_000,
            },
        );
        aliases.insert(
            "sonnet".to_string(),
            ModelSpec {
                id: "claude-sonnet-4-20250514".to_string(),
                max_output_tokens: 8_000,
            },
        );
        aliases.insert(
            "haiku".to_string(),
            ModelSpec {
                id: "claude-3-5-haiku-latest".to_string(),
                max_output_tokens: 3_000,
            },
        );
        Self {
            aliases,
            default_alias: "sonnet".to_string(),
        }
    }

    /// Build a catalog from configuration entries; an empty entry list
    /// yields the built-in catalog. The default alias must resolve, else
    /// it falls back to the built-in default.
    pub fn from_config(entries: &[ModelAliasConfig], default_alias: &str) -> Self {
        if entries.is_empty() {
            let mut catalog = Self::builtin();
            if catalog.aliases.contains_key(default_alias) {
                catalog.default_alias = default_alias.to_string();
            }
            return catalog;
        }

        let aliases: HashMap<String, ModelSpec> = entries
            .iter()
            .map(|e| {
                (
                    e.alias.to_lowercase(),
                    ModelSpec {
                        id: e.id.clone(),
                        max_output_tokens: e.max_output_tokens,
                    },
                )
            })
            .collect();

        let default_alias = if aliases.contains_key(default_alias) {
            default_alias.to_string()
        } else {
            aliases.keys().next().cloned().unwrap_or_default()
        };

        Self {
            aliases,
            default_alias,
        }
    }

    /// Resolve an alias to its model spec; unknown or absent aliases
    /// resolve to the default.
    pub fn resolve(&self, alias: Option<&str>) -> &ModelSpec {
        alias
            .and_then(|a| self.aliases.get(&a.to_lowercase()))
            .unwrap_or_else(|| &self.aliases[&self.default_alias])
    }
}
