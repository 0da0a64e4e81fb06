//! Turns free-text expense descriptions into structured drafts by asking an
//! OpenAI-compatible chat-completions endpoint.
//!
//! The model receives the participant roster inline so it can resolve names
//! to real ids; everything it returns is still a draft that the caller must
//! validate before money moves.

use api_types::roster::Roster;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Hosted OpenAI API base; override for proxies or compatible servers.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const SYSTEM_PROMPT: &str = "You are a helpful assistant that converts natural language \
    transaction descriptions to structured Splitwise data. You have access to the user's \
    friends list and can map names to correct user IDs. Only include friends that are \
    explicitly mentioned in the transaction text.";

const RESPONSE_SCHEMA: &str = r#"Return only valid JSON in this format:
{
    "amount": float,
    "description": string,
    "split_type": string (one of: "equal", "percentage", "exact"),
    "paid_by": {
        "user_id": string,
        "name": string
    },
    "split_with": [
        {
            "user_id": string,
            "name": string,
            "split_value": float (for percentage: 0-100, for exact: the actual amount, for equal: ignored)
        }
    ]
}

Do not include any markdown formatting or code block markers. Return only the raw JSON."#;

#[derive(Clone, Debug)]
pub struct NormalizerConfig {
    pub api_key: String,
    /// Chat model name; [`DEFAULT_MODEL`] when absent.
    pub model: Option<String>,
    /// API base or full chat-completions URL; [`DEFAULT_ENDPOINT`] when absent.
    pub endpoint: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("model API error {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("model returned no usable content")]
    EmptyResponse,
    #[error("malformed draft: {0}")]
    Malformed(String),
}

/// A structured expense as drafted by the model. Ids come from the roster
/// the model was shown, but nothing here is validated yet.
#[derive(Clone, Debug, PartialEq)]
pub struct DraftExpense {
    pub amount: f64,
    pub description: String,
    pub split_type: String,
    pub paid_by: DraftParticipant,
    pub split_with: Vec<DraftShare>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftParticipant {
    pub user_id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DraftShare {
    pub user_id: i64,
    pub name: String,
    /// Percentage or exact amount depending on `split_type`; absent for
    /// equal splits.
    pub split_value: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct OpenAiNormalizer {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// The model is told to emit string ids but often answers with numbers;
/// accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawUserId {
    Number(i64),
    Text(String),
}

impl RawUserId {
    fn parse(self) -> Result<i64, NormalizeError> {
        match self {
            Self::Number(id) => Ok(id),
            Self::Text(raw) => raw
                .trim()
                .parse()
                .map_err(|_| NormalizeError::Malformed(format!("non-numeric user id: {raw:?}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawParticipant {
    user_id: RawUserId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawShare {
    user_id: RawUserId,
    name: String,
    split_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawDraft {
    amount: f64,
    description: String,
    split_type: String,
    paid_by: RawParticipant,
    #[serde(default)]
    split_with: Vec<RawShare>,
}

impl RawDraft {
    fn into_draft(self) -> Result<DraftExpense, NormalizeError> {
        let paid_by = DraftParticipant {
            user_id: self.paid_by.user_id.parse()?,
            name: self.paid_by.name,
        };
        let mut split_with = Vec::with_capacity(self.split_with.len());
        for share in self.split_with {
            split_with.push(DraftShare {
                user_id: share.user_id.parse()?,
                name: share.name,
                split_value: share.split_value,
            });
        }
        Ok(DraftExpense {
            amount: self.amount,
            description: self.description,
            split_type: self.split_type,
            paid_by,
            split_with,
        })
    }
}

impl OpenAiNormalizer {
    #[must_use]
    pub fn new(client: Client, config: NormalizerConfig) -> Self {
        Self {
            client,
            api_key: config.api_key,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint: resolve_endpoint(config.endpoint.as_deref()),
        }
    }

    /// Asks the model to turn `message` into a draft expense, grounding it
    /// in `roster` so names map to real participant ids.
    pub async fn draft(
        &self,
        message: &str,
        roster: &Roster,
    ) -> Result<DraftExpense, NormalizeError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt(message, roster)},
            ],
            "temperature": 0,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NormalizeError::Api {
                status,
                message: truncate(&body, 320),
            });
        }

        let body = response.text().await?;
        let completion: ChatCompletion = serde_json::from_str(&body).map_err(|err| {
            NormalizeError::Malformed(format!("unexpected completion shape: {err}"))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(NormalizeError::EmptyResponse)?;

        let cleaned = strip_code_fence(content.trim());
        if cleaned.is_empty() {
            return Err(NormalizeError::EmptyResponse);
        }
        tracing::debug!(chars = cleaned.len(), "model draft received");

        let raw: RawDraft = serde_json::from_str(cleaned)
            .map_err(|err| NormalizeError::Malformed(format!("draft is not valid JSON: {err}")))?;
        raw.into_draft()
    }
}

fn resolve_endpoint(endpoint: Option<&str>) -> String {
    let endpoint = endpoint.unwrap_or(DEFAULT_ENDPOINT);
    if endpoint.contains("/chat/completions") {
        endpoint.to_string()
    } else {
        format!("{}/chat/completions", endpoint.trim_end_matches('/'))
    }
}

fn user_prompt(message: &str, roster: &Roster) -> String {
    let friends_context = roster
        .friends
        .iter()
        .map(|friend| {
            format!(
                "- {} (ID: {}, Email: {})",
                friend.name,
                friend.id,
                friend.email.as_deref().unwrap_or("unknown")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Convert the following transaction text to a JSON format suitable for Splitwise.\n\
         The current user is {name} (ID: {id}).\n\n\
         Available friends:\n\
         {friends_context}\n\n\
         Important rules:\n\
         1. Only include friends that are explicitly mentioned in the transaction text\n\
         2. Do not assume all friends should be included\n\
         3. If a specific friend is mentioned (e.g., \"with Ben\"), only include that friend\n\
         4. Names can be partial matches (e.g., \"Ben\" matches \"Benjamin\")\n\n\
         Transaction text: {message}\n\n\
         {RESPONSE_SCHEMA}",
        name = roster.current_user.name,
        id = roster.current_user.id,
    )
}

/// Drops a Markdown code fence around `content`, with an optional `json`
/// language tag. Models add one despite instructions.
fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    rest.trim()
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}...")
    } else {
        truncated
    }
}
