//! Extraction request and result types, plus input validation

use std::time::Duration;
use url::Url;

use crate::error::ExtractionError;

/// Longest URL accepted from a caller
pub const MAX_URL_LEN: usize = 2048;

/// Longest single language tag
pub const MAX_LANGUAGE_TAG_LEN: usize = 35;

macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

/// One extraction, as asked for by the caller. Not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub url: String,
    /// Preferred subtitle languages, first available wins
    pub languages: Vec<String>,
    pub timeout: Duration,
}

/// Subtitle text exactly as the tool printed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub raw_text: String,
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    /// Caller's URL, trimmed but otherwise untouched
    pub url: String,
    pub languages: Vec<String>,
    pub timeout: Duration,
}

impl ExtractionRequest {
    pub fn new(url: impl Into<String>, languages: Vec<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            languages,
            timeout,
        }
    }

    /// Check the request before anything is spawned.
    pub fn validate(&self, max_languages: usize) -> Result<ValidatedRequest, ExtractionError> {
        let url = validate_url(&self.url)?;
        let languages = validate_languages(&self.languages, max_languages)?;

        if self.timeout.is_zero() {
            return Err(ExtractionError::InvalidInput(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(ValidatedRequest {
            url,
            languages,
            timeout: self.timeout,
        })
    }
}

fn validate_url(raw: &str) -> Result<String, ExtractionError> {
    let invalid = |reason: &str| Err(ExtractionError::InvalidInput(reason.to_string()));

    let url = raw.trim();
    if url.is_empty() {
        return invalid("url must not be empty");
    }
    if url.len() > MAX_URL_LEN {
        return invalid("url is too long");
    }
    if url.chars().any(char::is_control) {
        return invalid("url contains control characters");
    }

    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => return Err(ExtractionError::InvalidInput(format!("url is not valid: {}", e))),
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return invalid("url scheme must be http or https");
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return invalid("url must have a host");
    }

    Ok(url.to_string())
}

fn validate_languages(
    languages: &[String],
    max_languages: usize,
) -> Result<Vec<String>, ExtractionError> {
    if languages.is_empty() {
        return Err(ExtractionError::InvalidInput(
            "at least one language is required".to_string(),
        ));
    }
    if languages.len() > max_languages {
        return Err(ExtractionError::InvalidInput(format!(
            "at most {} languages are allowed",
            max_languages
        )));
    }

    languages
        .iter()
        .map(|lang| {
            let lang = lang.trim();
            if !is_valid_language_tag(lang) {
                Err(ExtractionError::InvalidInput(format!(
                    "invalid language tag: {:?}",
                    lang
                )))
            } else {
                Ok(lang.to_string())
            }
        })
        .collect()
}

/// Whether `tag` is usable as one entry of the tool's language list.
pub fn is_valid_language_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag.len() <= MAX_LANGUAGE_TAG_LEN
        && regex!(r"^[A-Za-z0-9_-]+$").is_match(tag)
}

/// Split a comma separated `lang` query value into tags.
pub fn parse_language_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
