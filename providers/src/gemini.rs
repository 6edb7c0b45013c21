use aether_types::{
    KindId, TokenKind, first_grapheme, sanitize_display_text, truncate_with_ellipsis,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    ApiKey, DEFAULT_GEMINI_MODEL, GEMINI_API_BASE_URL, Oracle, OracleError, OracleFut,
    OracleVerdict, http_client, http_client_for, read_capped_error_body,
    retry::{RetryConfig, RetryOutcome, send_with_retry},
};

const MAX_NAME_GRAPHEMES: usize = 40;
const MAX_DESCRIPTION_GRAPHEMES: usize = 160;
const FALLBACK_GLYPH: &str = "✨";
const FALLBACK_COLOR: &str = "#9ca3af";

// ============================================================================
// Settings
// ============================================================================

/// Connection settings for [`GeminiOracle`].
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: ApiKey,
    pub model: String,
    pub base_url: String,
    pub retry: RetryConfig,
}

impl GeminiSettings {
    #[must_use]
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: GEMINI_API_BASE_URL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

// ============================================================================
// Oracle
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiOracle {
    client: reqwest::Client,
    settings: GeminiSettings,
}

impl GeminiOracle {
    pub fn new(settings: GeminiSettings) -> Result<Self, OracleError> {
        let client = if settings.base_url == GEMINI_API_BASE_URL {
            http_client().clone()
        } else {
            http_client_for(&settings.base_url)
                .map_err(|e| OracleError::Unavailable(format!("HTTP client: {e}")))?
        };
        Ok(Self { client, settings })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url, self.settings.model
        )
    }

    async fn request(&self, a: &TokenKind, b: &TokenKind) -> Result<OracleVerdict, OracleError> {
        let url = self.endpoint();
        let body = build_request_body(a, b);
        let api_key = self.settings.api_key.expose_secret();

        let outcome = send_with_retry(
            || {
                self.client
                    .post(&url)
                    .header("x-goog-api-key", api_key)
                    .header("content-type", "application/json")
                    .json(&body)
            },
            &self.settings.retry,
        )
        .await;

        let response = match outcome {
            RetryOutcome::Success(response) => response,
            RetryOutcome::HttpError(response) => {
                let status = response.status().as_u16();
                let body = read_capped_error_body(response).await;
                return Err(OracleError::Http { status, body });
            }
            RetryOutcome::Transport { attempts, source } => {
                return Err(OracleError::Transport {
                    attempts,
                    message: source.to_string(),
                });
            }
        };

        let payload: Value = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(format!("response body is not JSON: {e}")))?;
        parse_response(&payload)
    }
}

impl Oracle for GeminiOracle {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn combine<'a>(&'a self, a: &'a TokenKind, b: &'a TokenKind) -> OracleFut<'a> {
        Box::pin(self.request(a, b))
    }
}

// ============================================================================
// Request
// ============================================================================

fn describe(kind: &TokenKind) -> String {
    if kind.description.trim().is_empty() {
        format!("\"{}\" {}", kind.name, kind.glyph)
    } else {
        format!("\"{}\" {} ({})", kind.name, kind.glyph, kind.description)
    }
}

fn build_prompt(a: &TokenKind, b: &TokenKind) -> String {
    format!(
        "You are the rules engine of an alchemy game.\n\
         Two elements are being combined: {} and {}.\n\n\
         Decide what single new element results from combining them.\n\
         - Answer with one noun, for example \"Steam\", \"Life\" or \"Robot\".\n\
         - Be inventive, but the result must follow plausibly from both inputs.\n\
         - Pick one emoji and a hex color that suit the result.\n\
         - Write a short, witty one-sentence description.\n\
         - Only if the two truly cannot produce anything, set success to false.\n\n\
         Reply with JSON only.",
        describe(a),
        describe(b)
    )
}

/// Build the `generateContent` body.
///
/// Note: Gemini's REST surface mixes casing; `generationConfig`,
/// `responseMimeType` and `responseSchema` are camelCase.
fn build_request_body(a: &TokenKind, b: &TokenKind) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": build_prompt(a, b) }]
        }],
        "generationConfig": {
            "temperature": 1.0,
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "success": { "type": "BOOLEAN" },
                    "name": { "type": "STRING" },
                    "emoji": { "type": "STRING" },
                    "color": {
                        "type": "STRING",
                        "description": "Hex color code matching the element"
                    },
                    "description": {
                        "type": "STRING",
                        "description": "A witty short description"
                    }
                },
                "required": ["success", "name", "emoji", "color", "description"]
            }
        }
    })
}

// ============================================================================
// Response
// ============================================================================

mod typed {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Response {
        pub candidates: Option<Vec<Candidate>>,
        pub error: Option<ErrorInfo>,
        pub prompt_feedback: Option<PromptFeedback>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Candidate {
        pub content: Option<Content>,
        pub finish_reason: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Content {
        pub parts: Option<Vec<Part>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Part {
        pub text: Option<String>,
        #[serde(default)]
        pub thought: bool,
    }

    #[derive(Debug, Deserialize)]
    pub struct ErrorInfo {
        pub message: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PromptFeedback {
        pub block_reason: Option<String>,
    }
}

/// The JSON object the model is asked to produce.
#[derive(Debug, Deserialize)]
struct Synthesis {
    success: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    emoji: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn parse_response(payload: &Value) -> Result<OracleVerdict, OracleError> {
    let response: typed::Response = serde_json::from_value(payload.clone())
        .map_err(|e| OracleError::Malformed(format!("unexpected response shape: {e}")))?;

    if let Some(error) = response.error {
        return Err(OracleError::Malformed(
            error.message.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(OracleError::Malformed(format!("prompt blocked: {reason}")));
    }

    let candidate = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .ok_or_else(|| OracleError::Malformed("no candidates".to_string()))?;

    if let Some(reason) = candidate.finish_reason.as_deref()
        && !matches!(reason, "STOP" | "MAX_TOKENS" | "FINISH_REASON_UNSPECIFIED")
    {
        return Err(OracleError::Malformed(format!("finish reason {reason}")));
    }

    let text: String = candidate
        .content
        .and_then(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        return Err(OracleError::Malformed("empty response text".to_string()));
    }

    let synthesis: Synthesis = serde_json::from_str(strip_code_fence(&text))
        .map_err(|e| OracleError::Malformed(format!("result is not valid JSON: {e}")))?;

    into_verdict(synthesis)
}

/// Models occasionally wrap JSON in a Markdown fence despite the mime type.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn into_verdict(synthesis: Synthesis) -> Result<OracleVerdict, OracleError> {
    if !synthesis.success {
        return Ok(OracleVerdict::NoCombination);
    }

    let raw_name = synthesis
        .name
        .ok_or_else(|| OracleError::Malformed("success without a name".to_string()))?;
    let full_name = sanitize_display_text(&raw_name);
    // The id comes from the full name; only the display copy is clamped.
    let id = KindId::from_display_name(&full_name)
        .map_err(|e| OracleError::Malformed(format!("unusable name {raw_name:?}: {e}")))?;
    let name = truncate_with_ellipsis(&full_name, MAX_NAME_GRAPHEMES);

    let glyph = synthesis
        .emoji
        .as_deref()
        .map(sanitize_display_text)
        .and_then(|glyph| first_grapheme(&glyph).map(str::to_string))
        .unwrap_or_else(|| FALLBACK_GLYPH.to_string());

    let color = synthesis
        .color
        .as_deref()
        .map(|color| sanitize_display_text(color).trim().to_string())
        .filter(|color| !color.is_empty())
        .unwrap_or_else(|| FALLBACK_COLOR.to_string());

    let description = synthesis
        .description
        .as_deref()
        .map(|d| truncate_with_ellipsis(&sanitize_display_text(d), MAX_DESCRIPTION_GRAPHEMES))
        .unwrap_or_default();

    Ok(OracleVerdict::Discovered(TokenKind {
        id,
        name,
        glyph,
        color,
        description,
    }))
}
