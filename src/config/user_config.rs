//! User-level judge credentials
//!
//! Supports loading keys from:
//! - Environment variables
//! - `[ai]` in `~/.config/clarifier/config.toml`

use super::project_config::user_config_path;
use crate::ai::LlmBackend;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub ai: AiKeys,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AiKeys {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    /// Local model name for the Ollama backend
    pub ollama_model: Option<String>,
}

impl UserConfig {
    /// Load keys from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/clarifier/config.toml)
    pub fn load() -> Self {
        let mut config = UserConfig::default();

        if let Some(user_config) = user_config_path()
            .filter(|p| p.exists())
            .and_then(|p| std::fs::read_to_string(&p).ok())
            .and_then(|content| toml::from_str::<UserConfig>(&content).ok())
        {
            config.merge(user_config);
        }

        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Environment values override file values; empty values are ignored
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let read = |backend: LlmBackend| var(backend.env_key()).filter(|v| !v.trim().is_empty());
        if let Some(key) = read(LlmBackend::Anthropic) {
            self.ai.anthropic_api_key = Some(key);
        }
        if let Some(key) = read(LlmBackend::OpenAi) {
            self.ai.openai_api_key = Some(key);
        }
        if let Some(key) = read(LlmBackend::OpenRouter) {
            self.ai.openrouter_api_key = Some(key);
        }
        if let Some(model) = read(LlmBackend::Ollama) {
            self.ai.ollama_model = Some(model);
        }
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        if other.ai.anthropic_api_key.is_some() {
            self.ai.anthropic_api_key = other.ai.anthropic_api_key;
        }
        if other.ai.openai_api_key.is_some() {
            self.ai.openai_api_key = other.ai.openai_api_key;
        }
        if other.ai.openrouter_api_key.is_some() {
            self.ai.openrouter_api_key = other.ai.openrouter_api_key;
        }
        if other.ai.ollama_model.is_some() {
            self.ai.ollama_model = other.ai.ollama_model;
        }
    }

    /// Credential for a backend. Ollama needs none and yields its model name.
    pub fn api_key(&self, backend: LlmBackend) -> Option<&str> {
        match backend {
            LlmBackend::Anthropic => self.ai.anthropic_api_key.as_deref(),
            LlmBackend::OpenAi => self.ai.openai_api_key.as_deref(),
            LlmBackend::OpenRouter => self.ai.openrouter_api_key.as_deref(),
            LlmBackend::Ollama => self.ai.ollama_model.as_deref(),
        }
    }

    /// Check if the backend can be used
    pub fn has_credentials(&self, backend: LlmBackend) -> bool {
        !backend.requires_api_key() || self.api_key(backend).is_some()
    }

    /// Initialize the user config directory and create an example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path =
            user_config_path().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let example = r#"# Clarifier User Configuration
# Settings from clarifier.toml sections ([engine], [judge], ...) are also
# accepted here and apply when a project has no clarifier.toml.

[ai]
# anthropic_api_key = "sk-ant-..."
# openai_api_key = "sk-..."
# openrouter_api_key = "sk-or-..."

# For the Ollama backend (free, runs locally)
# ollama_model = "llama3.1:8b"
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert!(!config.has_credentials(LlmBackend::Anthropic));
        assert!(config.has_credentials(LlmBackend::Ollama));
        assert!(config.api_key(LlmBackend::OpenAi).is_none());
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
[ai]
anthropic_api_key = "sk-test-123"
ollama_model = "qwen2.5"

[engine]
vagueness_threshold = 40
"#;
        let config: UserConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_key(LlmBackend::Anthropic), Some("sk-test-123"));
        assert_eq!(config.api_key(LlmBackend::Ollama), Some("qwen2.5"));
        assert!(config.has_credentials(LlmBackend::Anthropic));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: UserConfig =
            toml::from_str("[ai]\nopenai_api_key = \"from-file\"\n").unwrap();
        config.apply_env(|name| match name {
            "OPENAI_API_KEY" => Some("from-env".to_string()),
            "ANTHROPIC_API_KEY" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.api_key(LlmBackend::OpenAi), Some("from-env"));
        assert_eq!(config.api_key(LlmBackend::Anthropic), None);
    }

    #[test]
    fn test_merge_keeps_existing_when_other_missing() {
        let mut base = UserConfig::default();
        base.ai.openrouter_api_key = Some("keep".into());
        base.merge(UserConfig::default());
        assert_eq!(base.api_key(LlmBackend::OpenRouter), Some("keep"));
    }
}
