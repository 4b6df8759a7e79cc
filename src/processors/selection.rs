//! Selection translation: plain text, paragraphs with formatting, table cells

use regex::Regex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

use crate::core::client::ChatClient;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{word_count, TokenCounts, TranslationRequest, TranslationResult};
use crate::core::usage::UsageTracker;
use crate::document::DocumentHost;

/// Separator used when several paragraphs share one request
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// How the selection was translated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Text,
    Paragraphs,
    Table,
}

/// What a finished translate action did
#[derive(Debug, Clone, Serialize)]
pub struct TranslationSummary {
    pub mode: SelectionMode,
    /// Segments written back (selection, paragraphs or cells)
    pub translated: usize,
    /// Non-empty segments found
    pub attempted: usize,
    pub words: u64,
    pub tokens: TokenCounts,
    pub detected_language: Option<String>,
}

impl TranslationSummary {
    fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            translated: 0,
            attempted: 0,
            words: 0,
            tokens: TokenCounts::default(),
            detected_language: None,
        }
    }

    fn add_tokens(&mut self, tokens: TokenCounts) {
        self.tokens.input_tokens += tokens.input_tokens;
        self.tokens.output_tokens += tokens.output_tokens;
    }

    /// One-line status for the user
    pub fn status_message(&self) -> String {
        let detected = self
            .detected_language
            .as_ref()
            .map(|lang| format!(" (Detected: {})", lang))
            .unwrap_or_default();

        match self.mode {
            SelectionMode::Table => format!("✅ Translated {} cells successfully!", self.translated),
            SelectionMode::Paragraphs if self.translated > 1 => format!(
                "✅ Translated {} paragraphs with formatting preserved!{}",
                self.translated, detected
            ),
            _ => format!("✅ Translation completed!{}", detected),
        }
    }
}

/// Split a multi-paragraph reply on blank lines, dropping empty chunks
pub fn split_paragraph_chunks(reply: &str) -> Vec<String> {
    static BLANK_LINE: OnceLock<Regex> = OnceLock::new();
    let blank_line = BLANK_LINE.get_or_init(|| Regex::new(r"\n[ \t\r]*\n").expect("valid regex"));

    blank_line
        .split(reply)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resets the in-flight flag when an action ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Translates the current selection of a document host and keeps usage
/// statistics up to date
#[derive(Debug, Clone)]
pub struct DocumentTranslator {
    client: ChatClient,
    usage: UsageTracker,
    in_flight: Arc<AtomicBool>,
}

impl DocumentTranslator {
    pub fn new(client: ChatClient, usage: UsageTracker) -> Self {
        Self {
            client,
            usage,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    fn begin(&self) -> Result<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TranslationError::Busy)?;
        Ok(InFlight(&self.in_flight))
    }

    /// Translate a standalone string and record usage.
    ///
    /// `options.text` is the text to translate.
    pub async fn translate_string(&self, options: &TranslationRequest) -> Result<TranslationResult> {
        options.validate_languages()?;
        if options.text.trim().is_empty() {
            return Err(TranslationError::NoSelection);
        }

        let result = self.client.translate(options).await?;
        self.usage
            .record(word_count(&options.text), result.tokens, &result.model_used)
            .await?;
        Ok(result)
    }

    /// Translate the selection, choosing table, paragraph or plain mode from
    /// what the selection contains.
    ///
    /// `options.text` is ignored; the text comes from the host.
    pub async fn translate_selection<H: DocumentHost + ?Sized>(
        &self,
        host: &mut H,
        options: &TranslationRequest,
    ) -> Result<TranslationSummary> {
        let _guard = self.begin()?;
        options.validate_languages()?;

        if host.table_cells()?.iter().any(|c| !c.text.trim().is_empty()) {
            debug!("Selection contains tables, translating cell by cell");
            return self.tables_inner(host, options).await;
        }

        if host.paragraphs()?.is_empty() {
            return self.text_inner(host, options).await;
        }

        self.paragraphs_inner(host, options).await
    }

    /// Translate the selection as one block of text
    pub async fn translate_text<H: DocumentHost + ?Sized>(
        &self,
        host: &mut H,
        options: &TranslationRequest,
    ) -> Result<TranslationSummary> {
        let _guard = self.begin()?;
        options.validate_languages()?;
        self.text_inner(host, options).await
    }

    /// Translate selected paragraphs, reapplying each paragraph's font
    pub async fn translate_paragraphs<H: DocumentHost + ?Sized>(
        &self,
        host: &mut H,
        options: &TranslationRequest,
    ) -> Result<TranslationSummary> {
        let _guard = self.begin()?;
        options.validate_languages()?;
        self.paragraphs_inner(host, options).await
    }

    /// Translate every non-empty table cell, one request per cell
    pub async fn translate_tables<H: DocumentHost + ?Sized>(
        &self,
        host: &mut H,
        options: &TranslationRequest,
    ) -> Result<TranslationSummary> {
        let _guard = self.begin()?;
        options.validate_languages()?;
        self.tables_inner(host, options).await
    }

    async fn text_inner<H: DocumentHost + ?Sized>(
        &self,
        host: &mut H,
        options: &TranslationRequest,
    ) -> Result<TranslationSummary> {
        let text = host.selection_text()?;
        if text.trim().is_empty() {
            return Err(TranslationError::NoSelection);
        }

        let words = word_count(&text);
        let result = self.client.translate(&options.for_text(text)).await?;
        host.replace_selection(&result.translation)?;
        self.usage
            .record(words, result.tokens, &result.model_used)
            .await?;

        let mut summary = TranslationSummary::new(SelectionMode::Text);
        summary.translated = 1;
        summary.attempted = 1;
        summary.words = words;
        summary.add_tokens(result.tokens);
        summary.detected_language = result.detected_source_lang;
        Ok(summary)
    }

    async fn paragraphs_inner<H: DocumentHost + ?Sized>(
        &self,
        host: &mut H,
        options: &TranslationRequest,
    ) -> Result<TranslationSummary> {
        let paragraphs: Vec<_> = host
            .paragraphs()?
            .into_iter()
            .filter(|p| !p.text.trim().is_empty())
            .collect();

        if paragraphs.is_empty() {
            return Err(TranslationError::NoSelection);
        }

        let mut summary = TranslationSummary::new(SelectionMode::Paragraphs);
        summary.attempted = paragraphs.len();

        if let [paragraph] = paragraphs.as_slice() {
            let words = word_count(&paragraph.text);
            let result = self
                .client
                .translate(&options.for_text(paragraph.text.trim()))
                .await?;
            host.replace_paragraph(paragraph.index, &result.translation, Some(&paragraph.font))?;
            self.usage
                .record(words, result.tokens, &result.model_used)
                .await?;

            summary.translated = 1;
            summary.words = words;
            summary.add_tokens(result.tokens);
            summary.detected_language = result.detected_source_lang;
            return Ok(summary);
        }

        let joined = paragraphs
            .iter()
            .map(|p| p.text.trim())
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR);
        let words = word_count(&joined);

        info!("Translating {} paragraphs in one request", paragraphs.len());
        let result = self.client.translate(&options.for_text(joined)).await?;
        self.usage
            .record(words, result.tokens, &result.model_used)
            .await?;

        let chunks = split_paragraph_chunks(&result.translation);
        if chunks.len() != paragraphs.len() {
            warn!(
                "Paragraph count {} does not match translated chunk count {}",
                paragraphs.len(),
                chunks.len()
            );
            return Err(TranslationError::AlignmentMismatch {
                paragraphs: paragraphs.len(),
                chunks: chunks.len(),
            });
        }

        for (paragraph, chunk) in paragraphs.iter().zip(&chunks) {
            host.replace_paragraph(paragraph.index, chunk, Some(&paragraph.font))?;
        }

        summary.translated = paragraphs.len();
        summary.words = words;
        summary.add_tokens(result.tokens);
        summary.detected_language = result.detected_source_lang;
        Ok(summary)
    }

    async fn tables_inner<H: DocumentHost + ?Sized>(
        &self,
        host: &mut H,
        options: &TranslationRequest,
    ) -> Result<TranslationSummary> {
        let mut summary = TranslationSummary::new(SelectionMode::Table);

        for cell in host.table_cells()? {
            let text = cell.text.trim();
            if text.is_empty() {
                continue;
            }

            summary.attempted += 1;
            if summary.attempted % 10 == 0 {
                info!("Translating cell {}...", summary.attempted);
            }

            let result = match self.client.translate(&options.for_text(text)).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        "Error translating cell {}/{}/{}: {}",
                        cell.address.table, cell.address.row, cell.address.cell, e
                    );
                    // Every remaining call would fail the same way
                    if matches!(
                        e,
                        TranslationError::Authentication { .. } | TranslationError::QuotaExceeded { .. }
                    ) {
                        if summary.translated == 0 {
                            return Err(e);
                        }
                        // Cells already written stay written
                        warn!(
                            "Stopping after {}/{} cells: {}",
                            summary.translated, summary.attempted, e
                        );
                        return Err(TranslationError::PartialFailure {
                            translated: summary.translated,
                            attempted: summary.attempted,
                        });
                    }
                    continue;
                }
            };

            // The call consumed tokens whether or not the write lands
            let words = word_count(text);
            self.usage
                .record(words, result.tokens, &result.model_used)
                .await?;

            if let Err(e) = host.replace_cell(cell.address, &result.translation) {
                warn!("Failed to write cell: {}", e);
                continue;
            }

            summary.translated += 1;
            summary.words += words;
            summary.add_tokens(result.tokens);
        }

        if summary.attempted == 0 {
            return Err(TranslationError::NoSelection);
        }

        if summary.translated < summary.attempted {
            return Err(TranslationError::PartialFailure {
                translated: summary.translated,
                attempted: summary.attempted,
            });
        }

        Ok(summary)
    }
}
