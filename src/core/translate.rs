//! Machine translation ahead of synthesis.
//!
//! [`GoogleTranslator`] talks to the Cloud Translation v2 REST API with an API
//! key. When no key is configured the service uses [`DisabledTranslator`],
//! which fails every call, so a request that asks for translation never
//! silently falls back to the untranslated text.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the API key, so the key never appears in a request URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Empty text provided for translation")]
    EmptyText,

    #[error("Missing target_language")]
    MissingTarget,

    #[error("Translation is not configured")]
    NotConfigured,

    #[error("Translation request failed: {0}")]
    Request(String),

    #[error("Translation provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Invalid translation response: {0}")]
    InvalidResponse(String),
}

impl TranslationError {
    /// Caller mistakes, as opposed to provider or transport failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyText | Self::MissingTarget)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    pub translated_text: String,
    pub source_language: Option<String>,
    pub target_language: String,
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Translation, TranslationError>;
}

/// Reject blank input before any provider call.
fn check_input(text: &str, target_language: &str) -> Result<(), TranslationError> {
    if text.trim().is_empty() {
        return Err(TranslationError::EmptyText);
    }
    if target_language.trim().is_empty() {
        return Err(TranslationError::MissingTarget);
    }
    Ok(())
}

pub struct DisabledTranslator;

#[async_trait]
impl Translator for DisabledTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Translation, TranslationError> {
        check_input(text, target_language)?;
        Err(TranslationError::NotConfigured)
    }
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<TranslatedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedItem {
    translated_text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleTranslator {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, TranslationError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| TranslationError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Translation, TranslationError> {
        check_input(text, target_language)?;
        debug!(
            target_language,
            chars = text.chars().count(),
            "Translating text"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&json!({
                "q": text,
                "target": target_language,
                "format": "text",
                "model": "nmt",
            }))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(request_error)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(TranslationError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TranslateResponse = serde_json::from_str(&body)
            .map_err(|e| TranslationError::InvalidResponse(e.to_string()))?;
        let item = parsed
            .data
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| TranslationError::InvalidResponse("no translations returned".into()))?;

        info!(
            source = item.detected_source_language.as_deref().unwrap_or("unknown"),
            target = target_language,
            "Translation completed"
        );

        Ok(Translation {
            translated_text: unescape_entities(&item.translated_text),
            source_language: item.detected_source_language,
            target_language: target_language.to_string(),
        })
    }
}

fn request_error(e: reqwest::Error) -> TranslationError {
    TranslationError::Request(e.without_url().to_string())
}

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|([A-Za-z][A-Za-z0-9]{1,7}));")
        .expect("entity pattern is valid")
});

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "iexcl" => '\u{a1}',
        "iquest" => '\u{bf}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "deg" => '\u{b0}',
        "euro" => '\u{20ac}',
        _ => return None,
    };
    Some(c)
}

/// The API can still return HTML character references even in text mode.
///
/// Decimal and hex references are decoded to their code point; unknown names
/// and invalid code points are left as written. One pass, so `&amp;lt;`
/// becomes `&lt;`.
fn unescape_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let decoded = if let Some(dec) = caps.get(1) {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else if let Some(hex) = caps.get(2) {
                u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32)
            } else {
                caps.get(3).and_then(|name| named_entity(name.as_str()))
            };
            match decoded {
                Some(c) if c != '\0' => c.to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}
