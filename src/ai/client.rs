//! LLM API client supporting Anthropic and OpenAI-compatible backends
//!
//! Uses ureq (sync HTTP), so no async runtime is needed. The engine runs
//! judge calls on a worker thread and enforces its own deadline on top of
//! the client's global timeout.

use super::{JudgeError, JudgeResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openrouter")]
    OpenRouter,
    Ollama,
}

impl LlmBackend {
    pub fn env_key(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::OpenRouter => "OPENROUTER_API_KEY",
            LlmBackend::Ollama => "OLLAMA_MODEL",
        }
    }

    pub fn signup_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://console.anthropic.com/settings/keys",
            LlmBackend::OpenAi => "https://platform.openai.com/api-keys",
            LlmBackend::OpenRouter => "https://openrouter.ai/keys",
            LlmBackend::Ollama => "https://ollama.ai (no key needed, just run locally)",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "claude-3-5-haiku-latest",
            LlmBackend::OpenAi => "gpt-4o-mini",
            LlmBackend::OpenRouter => "anthropic/claude-3.5-haiku",
            LlmBackend::Ollama => "llama3.1:8b",
        }
    }

    pub fn api_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://api.anthropic.com/v1/messages",
            LlmBackend::OpenAi => "https://api.openai.com/v1/chat/completions",
            LlmBackend::OpenRouter => "https://openrouter.ai/api/v1/chat/completions",
            LlmBackend::Ollama => "http://localhost:11434/v1/chat/completions",
        }
    }

    pub fn is_openai_compatible(&self) -> bool {
        !matches!(self, LlmBackend::Anthropic)
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmBackend::Ollama)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "anthropic",
            LlmBackend::OpenAi => "openai",
            LlmBackend::OpenRouter => "openrouter",
            LlmBackend::Ollama => "ollama",
        }
    }
}

impl FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmBackend::Anthropic),
            "openai" | "gpt" => Ok(LlmBackend::OpenAi),
            "openrouter" => Ok(LlmBackend::OpenRouter),
            "ollama" => Ok(LlmBackend::Ollama),
            other => Err(format!(
                "unknown judge backend '{other}' (expected anthropic, openai, openrouter or ollama)"
            )),
        }
    }
}

impl std::fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend: LlmBackend,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            model: None,
            max_tokens: 512,
            temperature: 0.0,
            timeout: Duration::from_secs(15),
        }
    }
}

impl ClientConfig {
    pub fn for_backend(backend: LlmBackend) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }
}

/// Unified LLM client over sync HTTP
pub struct LlmClient {
    config: ClientConfig,
    api_key: String,
    agent: ureq::Agent,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("backend", &self.config.backend)
            .field("model", &self.config.model())
            .finish_non_exhaustive()
    }
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl LlmClient {
    pub fn new(config: ClientConfig, api_key: impl Into<String>) -> Self {
        let agent = make_agent(config.timeout);
        Self {
            config,
            api_key: api_key.into(),
            agent,
        }
    }

    /// Read the API key for the configured backend from the environment
    pub fn from_env(mut config: ClientConfig) -> JudgeResult<Self> {
        if !config.backend.requires_api_key() {
            if let Ok(model) = env::var("OLLAMA_MODEL") {
                config.model = Some(model);
            }
            return Ok(Self::new(config, "ollama"));
        }

        let env_key = config.backend.env_key();
        let api_key = env::var(env_key)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| JudgeError::MissingApiKey {
                env_var: env_key.to_string(),
                signup_url: config.backend.signup_url().to_string(),
            })?;

        Ok(Self::new(config, api_key))
    }

    pub fn backend(&self) -> LlmBackend {
        self.config.backend
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Send the rubric and the text under judgment; return the text reply
    pub fn complete(&self, instructions: &str, text: &str) -> JudgeResult<String> {
        let backend = self.config.backend;
        let body = request_body(backend, self.config.model(), instructions, text, &self.config);

        let mut req = self
            .agent
            .post(backend.api_url())
            .header("Content-Type", "application/json");
        if backend == LlmBackend::Anthropic {
            req = req
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01");
        } else if backend.requires_api_key() {
            req = req.header("Authorization", &format!("Bearer {}", self.api_key));
        }

        let response = req.send_json(&body).map_err(|e| self.transport_error(e))?;
        if backend.is_openai_compatible() {
            let reply: ChatCompletion = read_success(response)?;
            reply
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| JudgeError::Unavailable("no response choices".to_string()))
        } else {
            let reply: AnthropicReply = read_success(response)?;
            reply
                .content
                .into_iter()
                .find(|block| block.kind == "text")
                .map(|block| block.text)
                .ok_or_else(|| JudgeError::Unavailable("no text content in response".to_string()))
        }
    }

    fn transport_error(&self, err: ureq::Error) -> JudgeError {
        match err {
            ureq::Error::Timeout(_) => JudgeError::Timeout(self.config.timeout),
            other => JudgeError::Unavailable(other.to_string()),
        }
    }
}

fn read_success<T: serde::de::DeserializeOwned>(
    response: ureq::http::Response<ureq::Body>,
) -> JudgeResult<T> {
    let status = response.status().as_u16();
    if status >= 400 {
        let error_text = response.into_body().read_to_string().unwrap_or_default();
        return Err(JudgeError::Unavailable(format!("HTTP {status}: {error_text}")));
    }
    response
        .into_body()
        .read_json()
        .map_err(|e| JudgeError::Unavailable(format!("unreadable response envelope: {e}")))
}

/// One chat turn on the wire
#[derive(Debug, Serialize, PartialEq)]
struct Turn<'a> {
    role: &'static str,
    content: &'a str,
}

/// Request body for both API families. Anthropic takes the rubric as a
/// top-level `system` field; OpenAI-compatible APIs take it as the first turn.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Turn<'a>>,
}

fn request_body<'a>(
    backend: LlmBackend,
    model: &'a str,
    instructions: &'a str,
    text: &'a str,
    config: &ClientConfig,
) -> CompletionRequest<'a> {
    let user = Turn {
        role: "user",
        content: text,
    };
    let (system, messages) = if backend.is_openai_compatible() {
        let rubric = Turn {
            role: "system",
            content: instructions,
        };
        (None, vec![rubric, user])
    } else {
        (Some(instructions), vec![user])
    };
    CompletionRequest {
        model,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        system,
        messages,
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

#[derive(Deserialize)]
struct AnthropicReply {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("OpenAI".parse::<LlmBackend>(), Ok(LlmBackend::OpenAi));
        assert_eq!("ollama".parse::<LlmBackend>(), Ok(LlmBackend::Ollama));
        assert!("deepmind".parse::<LlmBackend>().is_err());
        assert_eq!(LlmBackend::OpenRouter.to_string(), "openrouter");
    }

    #[test]
    fn test_config_model() {
        let config = ClientConfig::default();
        assert_eq!(config.model(), LlmBackend::Anthropic.default_model());

        let config = ClientConfig {
            model: Some("custom-model".to_string()),
            ..Default::default()
        };
        assert_eq!(config.model(), "custom-model");
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let client = LlmClient::from_env(ClientConfig::for_backend(LlmBackend::Ollama)).unwrap();
        assert_eq!(client.backend(), LlmBackend::Ollama);
        assert!(!LlmBackend::Ollama.requires_api_key());
        assert!(LlmBackend::Ollama.is_openai_compatible());
    }

    #[test]
    fn test_openai_body_puts_rubric_first() {
        let config = ClientConfig::for_backend(LlmBackend::OpenAi);
        let body = request_body(LlmBackend::OpenAi, "m", "rubric", "text", &config);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "rubric");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "text");
        assert_eq!(json["model"], "m");
    }

    #[test]
    fn test_anthropic_body_uses_system_field() {
        let config = ClientConfig::default();
        let body = request_body(LlmBackend::Anthropic, "m", "rubric", "text", &config);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["system"], "rubric");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], config.max_tokens);
    }

    #[test]
    fn test_backend_serde_names() {
        let b: LlmBackend = serde_json::from_str("\"openrouter\"").unwrap();
        assert_eq!(b, LlmBackend::OpenRouter);
        assert_eq!(serde_json::to_string(&LlmBackend::OpenAi).unwrap(), "\"openai\"");
    }
}
