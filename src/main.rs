//! Main entry point for ChatGPT Translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatgpt_translator::cli::commands::{self, Commands};
use chatgpt_translator::TranslatorConfig;

/// ChatGPT Translator - translate documents through the OpenAI API
#[derive(Parser, Debug)]
#[command(name = "chatgpt-translator", version, about, long_about = None)]
struct Args {
    /// API key (optional, defaults to OPENAI_API_KEY or the saved key)
    #[arg(long)]
    api_key: Option<String>,

    /// Config file name without extension (default: translator)
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

async fn run(command: Commands, config: TranslatorConfig) -> anyhow::Result<()> {
    match command {
        Commands::Translate {
            file,
            output,
            options,
            mode,
        } => commands::handle_translate(config, file, output, options, mode).await,
        Commands::Text { text, options } => commands::handle_text(config, text, options).await,
        Commands::Chat { model } => commands::handle_chat(config, model).await,
        Commands::Usage { reset, yes } => commands::handle_usage(config, reset, yes).await,
        Commands::SetKey { key } => commands::handle_set_key(config, key).await,
        Commands::Languages => commands::handle_languages().await,
        Commands::Serve { host, port, root } => {
            commands::handle_serve(config, host, port, root).await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}={}", env!("CARGO_CRATE_NAME"), default_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = args.command else {
        println!("Please specify a command. Use --help for more information.");
        return Ok(());
    };

    let mut config = match &args.config {
        Some(name) => TranslatorConfig::load_from(name)?,
        None => TranslatorConfig::load()?,
    };

    // Override config with CLI args if provided
    if let Some(api_key) = args.api_key {
        config.api_key = api_key;
    }

    if let Err(e) = run(command, config).await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
