//! HTTP client for the coaching endpoint.

use serde_json::json;

use crate::biometrics::VitalSigns;
use crate::error::CoachError;
use crate::storage::CoachConfig;

use super::endpoint::CoachEndpoint;
use super::prompt::PromptFactory;

/// Fallback path for Ollama-style local servers.
const FALLBACK_PATH: &str = "/api/chat";

/// Parsed coach reply.
#[derive(Debug, Clone, PartialEq)]
pub struct CoachReply {
    pub focus_minutes: u32,
    pub rest_minutes: u32,
    pub phrase: String,
}

/// Client for an OpenAI-style chat endpoint.
pub struct CoachClient {
    endpoint: CoachEndpoint,
    model: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl CoachClient {
    pub fn new(config: &CoachConfig, api_key: Option<String>) -> Result<Self, CoachError> {
        let endpoint = CoachEndpoint::from(config);
        // Validate the base URL up front so a typo fails fast.
        endpoint.primary_url()?;
        Ok(Self {
            endpoint,
            model: config.model.clone(),
            api_key,
            http: reqwest::Client::new(),
        })
    }

    /// One POST to `path` with a single user message. Returns the
    /// assistant content.
    async fn request_once(&self, path: &str, prompt: &str) -> Result<String, CoachError> {
        let url = self.endpoint.url(path)?;
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.6,
            "stream": false,
        });

        let mut req = self.http.post(url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header(
                self.endpoint.api_key_header.as_str(),
                self.endpoint.auth_value(key),
            );
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CoachError::Status(status.as_u16()));
        }

        let data: serde_json::Value = resp.json().await?;
        extract_content(&data).ok_or(CoachError::EmptyContent)
    }

    /// Send `prompt`, trying the configured path first and the Ollama
    /// chat path second. Any primary failure -- transport error, bad
    /// status, empty content -- buys one attempt on the fallback before
    /// giving up.
    pub async fn call(&self, prompt: &str) -> Result<String, CoachError> {
        match self.request_once(&self.endpoint.path, prompt).await {
            Ok(content) => Ok(content),
            Err(primary) => {
                if self.endpoint.path == FALLBACK_PATH {
                    return Err(primary);
                }
                match self.request_once(FALLBACK_PATH, prompt).await {
                    Ok(content) => Ok(content),
                    // The configured endpoint's error is the one worth
                    // reporting.
                    Err(_) => Err(primary),
                }
            }
        }
    }

    /// Ask for a session recommendation.
    pub async fn coach(
        &self,
        focus_base: u32,
        rest_base: u32,
        vitals: &VitalSigns,
    ) -> Result<CoachReply, CoachError> {
        let prompt = PromptFactory::coach(focus_base, rest_base, vitals);
        let content = self.call(&prompt).await?;
        parse_reply(&content).ok_or(CoachError::EmptyContent)
    }

    /// Cheap connectivity probe. Returns (ok, detail).
    pub async fn test_connectivity(&self) -> (bool, String) {
        match self.call(&PromptFactory::ping()).await {
            Ok(content) => (true, content),
            Err(e) => (false, e.to_string()),
        }
    }
}

/// Pull the assistant text out of either an OpenAI-style
/// `{choices:[{message:{content}}]}` body or an Ollama-style
/// `{message:{content}}` body.
fn extract_content(data: &serde_json::Value) -> Option<String> {
    let content = data["choices"][0]["message"]["content"]
        .as_str()
        .or_else(|| data["message"]["content"].as_str())?;
    let content = content.trim();
    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}

/// Parse "`<focus> <rest> <phrase...>`" leniently: the first two integers
/// anywhere in the text are taken as minutes, the rest is the phrase.
fn parse_reply(content: &str) -> Option<CoachReply> {
    let mut numbers = Vec::new();
    let mut phrase_start = 0;
    for (i, token) in content.split_whitespace().enumerate() {
        if numbers.len() < 2 {
            if let Ok(n) = token.trim_matches(|c: char| !c.is_ascii_digit()).parse::<u32>() {
                numbers.push(n);
                phrase_start = i + 1;
                continue;
            }
        }
        if numbers.len() == 2 {
            break;
        }
    }
    if numbers.len() < 2 {
        return None;
    }
    let phrase = content
        .split_whitespace()
        .skip(phrase_start)
        .collect::<Vec<_>>()
        .join(" ");
    Some(CoachReply {
        focus_minutes: numbers[0],
        rest_minutes: numbers[1],
        phrase,
    })
}
