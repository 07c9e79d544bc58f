//! Gemini-backed transcript parsing.
//!
//! The only contract with the model is "produce a structured item payload":
//! one JSON object with an optional customer name and a list of spoken
//! items. The client is constructed once at startup and injected through
//! `AppState`; everything downstream of the JSON extraction is local code.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const INTENT_PROMPT: &str = r#"You are a billing assistant.

Return ONLY valid JSON.
Do NOT add markdown.
Do NOT explain.
Do NOT add extra text.

JSON format:
{
  "customer_name": string | null,
  "items": [
    {
      "name": string,
      "quantity": number | null,
      "price": number | null
    }
  ]
}"#;

#[derive(Debug, Error)]
pub enum VoiceAiError {
    #[error("Voice parser request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Voice parser returned an unusable reply: {0}")]
    BadReply(String),
}

/// A single item as heard in the transcript, before catalog resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct SpokenItem {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Structured billing intent extracted from spoken text.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingIntent {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<SpokenItem>,
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Construct from `GEMINI_API_KEY` / `GEMINI_MODEL`. Voice parsing is
    /// optional: without a key the rest of the backend still serves.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        let model = std::env::var("GEMINI_MODEL").ok();
        Some(Self::new(api_key, model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        parts: Vec<serde_json::Value>,
        json_output: bool,
    ) -> Result<String, VoiceAiError> {
        let url = format!(
            "{API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let mut config = json!({
            "temperature": 0.1,
            "maxOutputTokens": 512,
        });
        if json_output {
            config["responseMimeType"] = json!("application/json");
        }

        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": config,
        });

        let reply: serde_json::Value = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        reply["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| VoiceAiError::BadReply("reply carried no text part".into()))
    }

    /// Round-trip health check against the configured model.
    pub async fn ping(&self) -> Result<String, VoiceAiError> {
        let reply = self
            .generate(vec![json!({ "text": "Reply with exactly: OK" })], false)
            .await?;
        Ok(reply.trim().to_string())
    }

    pub async fn parse_billing_intent(
        &self,
        transcript: &str,
    ) -> Result<BillingIntent, VoiceAiError> {
        let raw = self
            .generate(
                vec![
                    json!({ "text": INTENT_PROMPT }),
                    json!({ "text": format!("Spoken input: \"{transcript}\"") }),
                ],
                true,
            )
            .await?;

        let value = extract_json(&raw).map_err(VoiceAiError::BadReply)?;
        serde_json::from_value(value).map_err(|e| VoiceAiError::BadReply(e.to_string()))
    }
}

static FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```(?:json)?").unwrap());
static OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Pull the first JSON object out of a model reply, tolerating markdown
/// fences and stray prose around it.
pub fn extract_json(text: &str) -> Result<serde_json::Value, String> {
    if text.trim().is_empty() {
        return Err("empty reply".into());
    }

    let cleaned = FENCE_RE.replace_all(text, "");
    let object = OBJECT_RE
        .find(cleaned.trim())
        .ok_or_else(|| format!("no JSON object in reply: {text}"))?;

    serde_json::from_str(object.as_str()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_json() {
        let value = extract_json(r#"{"customer_name": "ramesh", "items": []}"#).unwrap();
        assert_eq!(value["customer_name"], "ramesh");
    }

    #[test]
    fn extracts_fenced_json() {
        let value = extract_json("```json\n{\"items\": [{\"name\": \"cement\"}]}\n```").unwrap();
        assert_eq!(value["items"][0]["name"], "cement");
    }

    #[test]
    fn extracts_json_surrounded_by_prose() {
        let value =
            extract_json("Here is the result:\n{\"items\": []}\nHope that helps!").unwrap();
        assert!(value["items"].as_array().unwrap().is_empty());
    }

    #[test]
    fn rejects_replies_without_an_object() {
        assert!(extract_json("").is_err());
        assert!(extract_json("no json here").is_err());
        assert!(extract_json("{not valid json}").is_err());
    }

    #[test]
    fn intent_deserializes_with_missing_fields() {
        let value = extract_json(r#"{"items": [{"name": "cement"}]}"#).unwrap();
        let intent: BillingIntent = serde_json::from_value(value).unwrap();
        assert!(intent.customer_name.is_none());
        assert_eq!(intent.items.len(), 1);
        assert!(intent.items[0].quantity.is_none());
    }
}
