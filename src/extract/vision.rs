//! Vision-model stage backend interface and the Gemini implementation.

use base64::Engine as _;
use serde_json::json;

/// Vision-model backend used for stage 1 of the extraction chain.
///
/// `submit` may fail on auth/quota/network problems; the chain treats any
/// error as stage-1 failure and falls through to OCR.
pub trait VisionModel: Send + Sync {
    /// Submit an image plus an instruction, returning the model's raw text.
    fn submit(&self, image_bytes: &[u8], instruction: &str) -> anyhow::Result<String>;
}

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Google Gemini vision backend.
///
/// The API key is an explicit constructor parameter; nothing is read from the
/// environment. Calls are synchronous and blocking, with the client's request
/// timeout as the only deadline; no retries.
pub struct GeminiVision {
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl GeminiVision {
    /// Create a backend for the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Override the model name (e.g. `gemini-1.5-pro`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl std::fmt::Debug for GeminiVision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiVision")
            .field("model", &self.model)
            .finish()
    }
}

impl VisionModel for GeminiVision {
    fn submit(&self, image_bytes: &[u8], instruction: &str) -> anyhow::Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image_bytes);
        let payload = json!({
            "contents": [{
                "parts": [
                    { "text": instruction },
                    { "inline_data": { "mime_type": "image/png", "data": encoded } }
                ]
            }]
        });

        let url = format!("{GEMINI_ENDPOINT}/{model}:generateContent", model = self.model);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            anyhow::bail!("gemini request failed with status {status}: {body}");
        }

        let body: serde_json::Value = response.json()?;
        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("gemini response missing candidate text"))
    }
}

/// Strip markdown code fences from a model response.
///
/// Models often wrap tabular output in ```` ```csv ```` fences despite being
/// told not to; the fenced body is what gets parsed.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let Some(start) = text.find("```") else {
        return text;
    };
    let after = &text[start + 3..];
    let body = match after.find("```") {
        Some(end) => &after[..end],
        None => after,
    };
    // Drop a language tag like "csv" on the fence line.
    match body.split_once('\n') {
        Some((first, rest)) if !first.trim().is_empty() && !first.contains(',') => rest,
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::strip_code_fences;

    #[test]
    fn strips_fenced_csv() {
        let text = "Here you go:\n```csv\na,b\n1,2\n```";
        assert_eq!(strip_code_fences(text), "a,b\n1,2\n");
    }

    #[test]
    fn keeps_unfenced_text() {
        assert_eq!(strip_code_fences("a,b\n1,2"), "a,b\n1,2");
    }

    #[test]
    fn keeps_first_line_when_it_is_data() {
        let text = "```\na,b\n1,2\n```";
        assert_eq!(strip_code_fences(text), "\na,b\n1,2\n");
    }
}
