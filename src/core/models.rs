//! Core data models for translation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::errors::{Result, TranslationError};

/// Source language marker asking the model to detect the language itself
pub const AUTO_DETECT: &str = "auto";

/// Supported language codes and their English names
pub const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("ar", "Arabic"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese (Simplified)"),
    ("zh-TW", "Chinese (Traditional)"),
    ("hi", "Hindi"),
    ("tr", "Turkish"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("sv", "Swedish"),
    ("da", "Danish"),
    ("no", "Norwegian"),
    ("fi", "Finnish"),
    ("el", "Greek"),
    ("he", "Hebrew"),
    ("th", "Thai"),
    ("vi", "Vietnamese"),
    ("id", "Indonesian"),
    ("ms", "Malay"),
    ("cs", "Czech"),
    ("hu", "Hungarian"),
    ("ro", "Romanian"),
    ("uk", "Ukrainian"),
];

/// Look up the English name of a language code
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Document category selecting the base instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Legal,
    Certificate,
    Bank,
    Medical,
    Academic,
    Business,
    Technical,
    Government,
    Casual,
    /// Generic professional translation; unknown tags land here
    #[default]
    #[serde(other)]
    General,
}

impl Domain {
    /// All domains, fallback last
    pub const ALL: [Domain; 10] = [
        Domain::Legal,
        Domain::Certificate,
        Domain::Bank,
        Domain::Medical,
        Domain::Academic,
        Domain::Business,
        Domain::Technical,
        Domain::Government,
        Domain::Casual,
        Domain::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Legal => "legal",
            Domain::Certificate => "certificate",
            Domain::Bank => "bank",
            Domain::Medical => "medical",
            Domain::Academic => "academic",
            Domain::Business => "business",
            Domain::Technical => "technical",
            Domain::Government => "government",
            Domain::Casual => "casual",
            Domain::General => "general",
        }
    }

    /// Parse a tag, falling back to [`Domain::General`]
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == tag)
            .unwrap_or_default()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

/// Translation register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Literal and precise
    Strict,
    /// Natural, native-sounding
    Human,
    #[default]
    #[serde(other)]
    Balanced,
}

impl Style {
    pub const ALL: [Style; 3] = [Style::Strict, Style::Human, Style::Balanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Strict => "strict",
            Style::Human => "human",
            Style::Balanced => "balanced",
        }
    }

    /// Parse a tag, falling back to [`Style::Balanced`]
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.as_str() == tag)
            .unwrap_or_default()
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

/// Translation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub domain: Domain,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub model: Option<String>,
}

fn default_source_lang() -> String {
    AUTO_DETECT.to_string()
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_lang: AUTO_DETECT.to_string(),
            target_lang: target_lang.into(),
            domain: Domain::General,
            style: Style::Balanced,
            model: None,
        }
    }

    pub fn with_source_lang(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = source_lang.into();
        self
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Same request applied to another piece of text
    pub fn for_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }

    pub fn is_auto_detect(&self) -> bool {
        self.source_lang == AUTO_DETECT
    }

    /// Check the language pair before any remote call is made
    pub fn validate_languages(&self) -> Result<()> {
        if !self.is_auto_detect() && language_name(&self.source_lang).is_none() {
            return Err(TranslationError::UnsupportedLanguage {
                code: self.source_lang.clone(),
            });
        }
        if language_name(&self.target_lang).is_none() {
            return Err(TranslationError::UnsupportedLanguage {
                code: self.target_lang.clone(),
            });
        }
        if !self.is_auto_detect() && self.source_lang == self.target_lang {
            return Err(TranslationError::SameLanguage);
        }
        Ok(())
    }
}

/// Token counts reported by the API for a single call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenCounts {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Translation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translation: String,
    pub detected_source_lang: Option<String>,
    pub tokens: TokenCounts,
    pub model_used: String,
    pub request_id: Option<String>,
}

/// Chat participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat-completion message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Count whitespace-separated words of the trimmed text
pub fn word_count(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}
