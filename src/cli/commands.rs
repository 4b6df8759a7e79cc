//! CLI command definitions and handlers

use clap::{Args, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::core::chat::ChatSession;
use crate::core::client::ChatClient;
use crate::core::config::TranslatorConfig;
use crate::core::models::{Domain, Style, TranslationRequest, AUTO_DETECT, LANGUAGES};
use crate::core::pricing::{pricing_for, priced_models};
use crate::core::store::{save_api_key, FileStore, KeyValueStore};
use crate::core::usage::{UsageStats, UsageTracker};
use crate::document::memory::Document;
use crate::processors::selection::DocumentTranslator;

/// Commands for ChatGPT Translator
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate a document (.json document model or plain text, one paragraph per line)
    Translate {
        /// Input file (required)
        #[arg(short, long)]
        file: PathBuf,

        /// Output file (default: <name>_translated.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: TranslateArgs,

        /// How to walk the selection
        #[arg(long, value_enum, default_value_t = SelectionArg::Auto)]
        mode: SelectionArg,
    },

    /// Translate a single piece of text and print it
    Text {
        /// Text to translate
        text: String,

        #[command(flatten)]
        options: TranslateArgs,
    },

    /// Chat with the model (/clear resets the conversation, /exit quits)
    Chat {
        /// Model to chat with (default: configured model)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show usage statistics
    Usage {
        /// Reset all counters
        #[arg(long)]
        reset: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Save the OpenAI API key to the settings store
    SetKey {
        /// Key starting with sk-
        key: String,
    },

    /// List supported languages and priced models
    Languages,

    /// Serve the task pane files and the JSON API
    Serve {
        /// Bind address (default: 127.0.0.1)
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Listen port (default: 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,

        /// Directory to serve files from
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
}

/// Language and style options shared by translate commands
#[derive(Args, Debug, Clone)]
pub struct TranslateArgs {
    /// Source language code, or "auto" to detect
    #[arg(short, long, default_value = AUTO_DETECT)]
    pub source_lang: String,

    /// Target language code
    #[arg(short, long, default_value = "en")]
    pub target_lang: String,

    /// Document domain: legal, certificate, bank, medical, academic,
    /// business, technical, government, casual, general
    #[arg(short, long, default_value = "general")]
    pub domain: Domain,

    /// Translation style: strict, human, balanced
    #[arg(long, default_value = "balanced")]
    pub style: Style,

    /// Model (default: configured model)
    #[arg(short, long)]
    pub model: Option<String>,
}

impl TranslateArgs {
    fn to_request(&self, text: impl Into<String>) -> TranslationRequest {
        let request = TranslationRequest::new(text, self.target_lang.clone())
            .with_source_lang(self.source_lang.clone())
            .with_domain(self.domain)
            .with_style(self.style);
        match &self.model {
            Some(model) => request.with_model(model.clone()),
            None => request,
        }
    }
}

/// Selection walking strategy
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionArg {
    /// Tables cell by cell if present, otherwise paragraphs
    Auto,
    /// Whole selection as one text
    Text,
    /// Paragraphs with formatting preserved
    Paragraphs,
    /// Table cells only
    Tables,
}

fn open_store(config: &TranslatorConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(FileStore::open(&config.store_path)?))
}

fn build_translator(
    config: TranslatorConfig,
    store: Arc<dyn KeyValueStore>,
) -> anyhow::Result<DocumentTranslator> {
    let config = config.with_saved_key(store.as_ref())?;
    let client = ChatClient::new(config)?;
    let usage = UsageTracker::load(store)?;
    Ok(DocumentTranslator::new(client, usage))
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn default_output(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let name = match file.extension() {
        Some(ext) => format!("{}_translated.{}", stem, ext.to_string_lossy()),
        None => format!("{}_translated", stem),
    };
    file.with_file_name(name)
}

/// Digits grouped by thousands
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn print_usage(stats: &UsageStats) {
    println!("📊 Usage since {}", stats.since.format("%Y-%m-%d %H:%M UTC"));
    println!("   Translations:  {}", group_digits(stats.total_translations));
    println!("   Words:         {}", group_digits(stats.total_words));
    println!("   Input tokens:  {}", group_digits(stats.total_input_tokens));
    println!("   Output tokens: {}", group_digits(stats.total_output_tokens));
    println!("   Total cost:    ${:.4}", stats.total_cost);
}

/// Handle document translation command
pub async fn handle_translate(
    config: TranslatorConfig,
    file: PathBuf,
    output: Option<PathBuf>,
    options: TranslateArgs,
    mode: SelectionArg,
) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    let translator = build_translator(config, store)?;
    let output = output.unwrap_or_else(|| default_output(&file));

    info!("Input: {}", file.display());
    info!("Output: {}", output.display());
    info!("Target language: {}", options.target_lang);

    let mut document = Document::load(&file)?;
    let original = document.clone();
    let request = options.to_request("");

    let pb = spinner("⏳ Translating...");
    let result = match mode {
        SelectionArg::Auto => translator.translate_selection(&mut document, &request).await,
        SelectionArg::Text => translator.translate_text(&mut document, &request).await,
        SelectionArg::Paragraphs => translator.translate_paragraphs(&mut document, &request).await,
        SelectionArg::Tables => translator.translate_tables(&mut document, &request).await,
    };
    pb.finish_and_clear();

    match result {
        Ok(summary) => {
            document.save(&output)?;
            println!("{}", summary.status_message());
            println!("   Output: {}", output.display());
            println!(
                "   Tokens: {} in / {} out",
                group_digits(summary.tokens.input_tokens),
                group_digits(summary.tokens.output_tokens)
            );
            Ok(())
        }
        Err(e) => {
            // Anything already translated (and billed) is kept
            if document != original {
                document.save(&output)?;
                println!("   Output: {}", output.display());
            }
            Err(e.into())
        }
    }
}

/// Handle single text translation command
pub async fn handle_text(
    config: TranslatorConfig,
    text: String,
    options: TranslateArgs,
) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    let translator = build_translator(config, store)?;

    let pb = spinner("⏳ Translating...");
    let result = translator.translate_string(&options.to_request(text)).await;
    pb.finish_and_clear();

    let result = result?;
    println!("{}", result.translation);
    if let Some(lang) = result.detected_source_lang {
        eprintln!("✅ Translation completed! (Detected: {})", lang);
    }
    Ok(())
}

/// Handle interactive chat command
pub async fn handle_chat(config: TranslatorConfig, model: Option<String>) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    let config = config.with_saved_key(store.as_ref())?;
    let client = ChatClient::new(config)?;

    let mut session = ChatSession::new(client);
    if let Some(model) = model {
        session = session.with_model(model);
    }

    println!("💬 Chat ready. /clear resets the conversation, /exit quits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        match message {
            "" => continue,
            "/exit" | "/quit" => break,
            "/clear" => {
                session.clear();
                println!("🧹 Conversation cleared");
                continue;
            }
            _ => {}
        }

        let pb = spinner("typing...");
        let reply = session.send(message).await;
        pb.finish_and_clear();

        match reply {
            Ok(reply) => println!("🤖 {}\n", reply),
            Err(e) => println!("⚠️  {}\n", e),
        }
    }

    Ok(())
}

/// Handle usage command
pub async fn handle_usage(config: TranslatorConfig, reset: bool, yes: bool) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    let tracker = UsageTracker::load(store)?;

    if !reset {
        print_usage(&tracker.get_stats().await);
        return Ok(());
    }

    if !yes {
        println!("Are you sure you want to reset all usage statistics? [y/N]");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let answer = lines.next_line().await?.unwrap_or_default();
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Reset cancelled");
            return Ok(());
        }
    }

    let stats = tracker.reset().await?;
    println!("✅ Statistics reset successfully");
    print_usage(&stats);
    Ok(())
}

/// Handle set-key command
pub async fn handle_set_key(config: TranslatorConfig, key: String) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    save_api_key(store.as_ref(), &key)?;
    println!("✅ API Key saved successfully");
    Ok(())
}

/// Handle languages command
pub async fn handle_languages() -> anyhow::Result<()> {
    println!("{:<8} Auto-detect (source only)", AUTO_DETECT);
    for (code, name) in LANGUAGES {
        println!("{:<8} {}", code, name);
    }

    println!("\nPriced models (USD per 1M tokens):");
    for model in priced_models() {
        if let Some(pricing) = pricing_for(model) {
            println!(
                "{:<12} input ${:.3}  output ${:.3}",
                model, pricing.input_per_million, pricing.output_per_million
            );
        }
    }
    Ok(())
}

/// Handle server command
pub async fn handle_serve(
    config: TranslatorConfig,
    host: String,
    port: u16,
    root: PathBuf,
) -> anyhow::Result<()> {
    use crate::server::run_server;

    let store = open_store(&config)?;
    let translator = build_translator(config, store)?;

    println!("✅ Server running at http://{}:{}/", host, port);
    println!("📄 Taskpane: http://{}:{}/taskpane.html", host, port);
    println!("🛑 Press Ctrl+C to stop");

    run_server(translator, host, port, root).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1,000");
        assert_eq!(group_digits(12_345_678), "12,345,678");
    }

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("docs/contract.json")),
            PathBuf::from("docs/contract_translated.json")
        );
        assert_eq!(
            default_output(Path::new("notes")),
            PathBuf::from("notes_translated")
        );
    }

    #[test]
    fn test_translate_args_build_request() {
        let args = TranslateArgs {
            source_lang: "en".to_string(),
            target_lang: "ar".to_string(),
            domain: Domain::Medical,
            style: Style::Strict,
            model: Some("gpt-4o-mini".to_string()),
        };
        let request = args.to_request("Blood pressure 120/80");
        assert_eq!(request.source_lang, "en");
        assert_eq!(request.domain, Domain::Medical);
        assert_eq!(request.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[tokio::test]
    async fn test_translate_saves_cells_written_before_quota_stop() {
        use serde_json::json;
        use wiremock::matchers::{body_string_contains, method};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Alpha"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Alfa"}}],
                "usage": {"prompt_tokens": 50, "completion_tokens": 5}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "quota", "code": "insufficient_quota"}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sheet.json");
        std::fs::write(&input, r#"{"tables":[{"rows":[["Alpha","Bravo"]]}]}"#).unwrap();
        let output = dir.path().join("sheet_es.json");

        let config = TranslatorConfig {
            api_key: "sk-test".to_string(),
            api_endpoint: server.uri(),
            store_path: dir.path().join("settings.json"),
            ..Default::default()
        };
        let options = TranslateArgs {
            source_lang: "en".to_string(),
            target_lang: "es".to_string(),
            domain: Domain::General,
            style: Style::Balanced,
            model: None,
        };

        let result = handle_translate(
            config,
            input,
            Some(output.clone()),
            options,
            SelectionArg::Tables,
        )
        .await;
        assert!(result.is_err());

        let saved = Document::load(&output).unwrap();
        assert_eq!(saved.tables[0].rows[0], vec!["Alfa", "Bravo"]);

        let store = FileStore::open(dir.path().join("settings.json")).unwrap();
        let stats = UsageTracker::load(Arc::new(store)).unwrap().get_stats().await;
        assert_eq!(stats.total_translations, 1);
    }

    #[tokio::test]
    async fn test_translate_failure_before_any_write_saves_nothing() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, "Hello\n").unwrap();
        let output = dir.path().join("notes_es.txt");

        let config = TranslatorConfig {
            api_key: "sk-test".to_string(),
            api_endpoint: server.uri(),
            store_path: dir.path().join("settings.json"),
            ..Default::default()
        };
        let options = TranslateArgs {
            source_lang: "en".to_string(),
            target_lang: "es".to_string(),
            domain: Domain::General,
            style: Style::Balanced,
            model: None,
        };

        let result =
            handle_translate(config, input, Some(output.clone()), options, SelectionArg::Auto).await;
        assert!(result.is_err());
        assert!(!output.exists());
    }
}
