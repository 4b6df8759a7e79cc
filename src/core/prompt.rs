//! System prompt construction and temperature selection

use serde::Serialize;

use crate::core::errors::{Result, TranslationError};
use crate::core::models::{language_name, Domain, Style, TranslationRequest, AUTO_DETECT};

/// Marker line the model appends when asked to detect the source language
pub const DETECTED_MARKER: &str = "DETECTED:";

const CASUAL_INSTRUCTION: &str = "Translate conversationally like a native speaker in everyday language. Make it sound natural and friendly, as if texting or chatting. Use colloquial expressions when appropriate.";

const PRESERVE_INSTRUCTION: &str = "IMPORTANT: Preserve all numbers, dates, IDs, and proper names exactly as they appear. Return ONLY the translated text without any explanations.";

/// Sampling temperatures, lowest first
pub mod temperature {
    pub const STRICT: f32 = 0.1;
    /// Balanced style on legal, certificate, bank, medical and government
    /// text. Chosen to sit between `STRICT` and `FLEXIBLE` so the strict
    /// style stays the lowest setting.
    pub const PRECISE: f32 = 0.15;
    pub const FLEXIBLE: f32 = 0.2;
    pub const BALANCED: f32 = 0.3;
    pub const NATURAL: f32 = 0.4;
}

/// Base instruction for a domain; `None` for casual, which ignores style
fn domain_instruction(domain: Domain) -> Option<&'static str> {
    let text = match domain {
        Domain::Legal => "You are a certified legal translator. Use precise legal terminology. Preserve structure and formatting exactly. Keep all article numbers, dates, names, and IDs unchanged.",
        Domain::Certificate => "Translate in official government certificate style. Keep names, numbers, dates, seals, and stamps unchanged. Use formal government language.",
        Domain::Bank => "Translate using formal banking and financial terminology. Keep account numbers, amounts, dates, and reference codes unchanged. Use standard banking language.",
        Domain::Medical => "Translate medical reports using accurate medical terminology. Keep patient names, dates, test results, and measurements unchanged. Maintain clinical precision.",
        Domain::Academic => "Translate academic documents with scholarly terminology. Keep citations, dates, names, and numerical data unchanged. Maintain academic tone.",
        Domain::Business => "Translate business contracts and documents using formal business language. Keep company names, dates, amounts, and clause numbers unchanged.",
        Domain::Technical => "Translate technical manuals using precise technical terminology. Keep model numbers, specifications, measurements, and codes unchanged.",
        Domain::Government => "Translate official government documents using formal administrative language. Keep all reference numbers, dates, names, and official codes unchanged.",
        Domain::General => "You are a professional translator.",
        Domain::Casual => return None,
    };
    Some(text)
}

fn style_instruction(style: Style) -> &'static str {
    match style {
        Style::Strict => "Translate literally and precisely. Maintain exact sentence structure. Use formal terminology.",
        Style::Human => "Translate naturally as a native speaker would say it. Prioritize readability and natural flow over literal accuracy.",
        Style::Balanced => "Balance accuracy with natural language. Keep it professional but readable.",
    }
}

/// Build the system instruction for a translation.
///
/// `source_lang` is either [`AUTO_DETECT`] or the English name of the source
/// language; `target_language` is the English name of the target.
pub fn build_system_prompt(
    source_lang: &str,
    target_language: &str,
    domain: Domain,
    style: Style,
) -> String {
    let base = match domain_instruction(domain) {
        Some(instruction) => format!("{} {}", instruction, style_instruction(style)),
        None => CASUAL_INSTRUCTION.to_string(),
    };

    if source_lang == AUTO_DETECT {
        format!(
            "{} Detect the source language and translate to {}. {} At the very end, on a new line, write \"{}\" followed by the detected language name in English.",
            base, target_language, PRESERVE_INSTRUCTION, DETECTED_MARKER
        )
    } else {
        format!(
            "{} Translate from {} to {}. {}",
            base, source_lang, target_language, PRESERVE_INSTRUCTION
        )
    }
}

/// Pick the sampling temperature: style first, then domain
pub fn temperature_for(domain: Domain, style: Style) -> f32 {
    match style {
        Style::Strict => return temperature::STRICT,
        Style::Human => return temperature::NATURAL,
        Style::Balanced => {}
    }

    match domain {
        Domain::Legal
        | Domain::Certificate
        | Domain::Bank
        | Domain::Medical
        | Domain::Government => temperature::PRECISE,
        Domain::Academic | Domain::Business | Domain::Technical => temperature::FLEXIBLE,
        Domain::Casual => temperature::NATURAL,
        Domain::General => temperature::BALANCED,
    }
}

/// System instruction and temperature derived from a request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptSpec {
    pub system_prompt: String,
    pub temperature: f32,
}

impl PromptSpec {
    /// Derive the prompt for a request, resolving language codes to names
    pub fn for_request(request: &TranslationRequest) -> Result<Self> {
        let target = language_name(&request.target_lang).ok_or_else(|| {
            TranslationError::UnsupportedLanguage {
                code: request.target_lang.clone(),
            }
        })?;

        let source = if request.is_auto_detect() {
            AUTO_DETECT
        } else {
            language_name(&request.source_lang).ok_or_else(|| {
                TranslationError::UnsupportedLanguage {
                    code: request.source_lang.clone(),
                }
            })?
        };

        Ok(Self {
            system_prompt: build_system_prompt(source, target, request.domain, request.style),
            temperature: temperature_for(request.domain, request.style),
        })
    }
}

/// Split a trailing detected-language marker off a model reply.
///
/// Returns the translation and the detected language, if any.
pub fn split_detected_language(reply: &str) -> (String, Option<String>) {
    match reply.rfind(DETECTED_MARKER) {
        Some(pos) => {
            let translation = reply[..pos].trim().to_string();
            let detected = reply[pos + DETECTED_MARKER.len()..].trim();
            let detected = (!detected.is_empty()).then(|| detected.to_string());
            (translation, detected)
        }
        None => (reply.trim().to_string(), None),
    }
}
