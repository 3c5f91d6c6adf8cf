//! taxi-gateway: Taxi Support Bot Main Binary
//!
//! Usage:
//!   taxi-gateway                 - Start server mode (HTTP API + WhatsApp webhook)
//!   taxi-gateway --cli           - Start interactive CLI mode
//!   taxi-gateway --ask <text>    - Answer one question and exit
//!   taxi-gateway --check         - Show which settings are present
//!   taxi-gateway --help          - Show help

mod check;
mod cli;

use std::sync::Arc;

use taxi_core::{Config, HistoryStore, SqliteHistory};
use taxi_support::faq::knowledge;
use taxi_support::{
    CannedReplies, FaqMatcher, Generator, KnowledgeBase, LlmGenerator, Responder, ResponsePolicy,
    SupportAgent,
};
use taxi_whatsapp::{CloudApiClient, WhatsAppState};
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq)]
enum RunMode {
    /// Server mode (HTTP API + WhatsApp webhook)
    Server,
    /// Interactive CLI mode
    Cli,
    /// Answer a single question
    Ask(String),
    /// Environment check
    Check,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = parse_args(&args);

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("taxi-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    if mode == RunMode::Check {
        check::print_report(&config);
        return Ok(());
    }

    tracing::info!("Starting taxi-gateway...");
    let agent = Arc::new(build_agent(&config)?);

    match mode {
        RunMode::Cli => {
            tracing::info!("Running in CLI mode");
            cli::run_cli(agent).await
        }
        RunMode::Ask(question) => {
            let reply = agent.handle(cli::CLI_USER, &question).await;
            println!("{}", reply.text);
            println!("[source: {}, confidence: {:.2}]", reply.source, reply.confidence);
            Ok(())
        }
        RunMode::Server => run_server(&config, agent).await,
        _ => Ok(()),
    }
}

/// Parse command line arguments (program name excluded)
fn parse_args(args: &[String]) -> RunMode {
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--cli" | "-c" => return RunMode::Cli,
            "--ask" | "-a" => {
                let question = iter.map(String::as_str).collect::<Vec<_>>().join(" ");
                let question = question.trim();
                return if question.is_empty() {
                    RunMode::Help
                } else {
                    RunMode::Ask(question.to_string())
                };
            }
            "--check" => return RunMode::Check,
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("taxi-gateway - Taxi customer support bot");
    println!();
    println!("Usage:");
    println!("  taxi-gateway                Start server mode (HTTP API + WhatsApp webhook)");
    println!("  taxi-gateway --cli          Start interactive CLI mode");
    println!("  taxi-gateway --ask <text>   Answer one question and exit");
    println!("  taxi-gateway --check        Show which settings are present");
    println!("  taxi-gateway --help         Show this help message");
    println!("  taxi-gateway --version      Show version");
    println!();
    println!("Environment Variables:");
    println!("  LLM_API_KEY            LLM API key (empty: offline mode)");
    println!("  LLM_PROVIDER           openai, claude or gemini (default: openai)");
    println!("  LLM_MODEL              Model name (default depends on provider)");
    println!("  META_TOKEN             WhatsApp Cloud API access token");
    println!("  META_PHONE_NUMBER_ID   WhatsApp business phone number id");
    println!("  WEBHOOK_VERIFY_TOKEN   Token for webhook verification");
    println!("  META_APP_SECRET        App secret for webhook signatures (optional)");
    println!("  API_KEY                Bearer key for /chat and /history (optional)");
    println!("  API_PORT               HTTP port (default: 8000)");
    println!("  FAQ_DATA_PATH          FAQ CSV file (default: bot-data.csv)");
    println!("  DB_PATH                History database (default: data/taxi-support.db)");
    println!();
    println!("Settings can also be placed in {}.", taxi_core::config::CONFIG_FILE);
}

/// Wire the knowledge base, generator and history store into an agent
fn build_agent(config: &Config) -> anyhow::Result<SupportAgent> {
    let knowledge = match knowledge::load_from_path(&config.faq.data_path) {
        Ok(knowledge) => knowledge,
        Err(e) => {
            tracing::warn!("FAQ data unavailable ({}), continuing with an empty knowledge base", e);
            KnowledgeBase::default()
        }
    };
    let matcher = FaqMatcher::new(Arc::new(knowledge), &config.faq);

    let generator: Option<Arc<dyn Generator>> = if config.llm.is_configured() {
        match LlmGenerator::from_config(&config.llm, &config.support.phone) {
            Ok(generator) => {
                tracing::info!(
                    "Generation enabled: {:?} / {}",
                    config.llm.provider,
                    generator.model()
                );
                let generator: Arc<dyn Generator> = Arc::new(generator);
                Some(generator)
            }
            Err(e) => {
                tracing::warn!("Generation disabled: {}", e);
                None
            }
        }
    } else {
        tracing::info!("No LLM API key configured, running in offline mode");
        None
    };

    let history: Arc<dyn HistoryStore> = match SqliteHistory::new(&config.history.db_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!("History database unavailable ({}), using in-memory history", e);
            Arc::new(SqliteHistory::in_memory()?)
        }
    };

    let responder = Responder::new(
        matcher,
        generator,
        CannedReplies::new(config.support.phone.clone()),
        ResponsePolicy::from(&config.faq),
    );

    Ok(SupportAgent::new(responder, history, config.history.limit))
}

/// Run server mode (HTTP API + WhatsApp webhook)
async fn run_server(config: &Config, agent: Arc<SupportAgent>) -> anyhow::Result<()> {
    let webhook = if config.whatsapp.is_configured() {
        let client = CloudApiClient::new(&config.whatsapp)?;
        if config.whatsapp.verify_token.is_empty() {
            tracing::warn!("WEBHOOK_VERIFY_TOKEN is empty, webhook verification will fail");
        }
        tracing::info!("WhatsApp webhook enabled at /webhook");
        Some(taxi_whatsapp::router(WhatsAppState {
            agent: Arc::clone(&agent),
            sender: Arc::new(client),
            verify_token: config.whatsapp.verify_token.clone(),
            app_secret: config.whatsapp.app_secret.clone(),
        }))
    } else {
        tracing::info!("WhatsApp disabled (no access token or phone number id configured)");
        None
    };

    let state = taxi_api::AppState {
        agent,
        api_key: config.api.key.clone(),
    };
    let app = taxi_api::build_app(state, webhook, config.api.allowed_origins.as_deref());

    tracing::info!("Press Ctrl+C to exit");
    taxi_api::start_server(config.api.port, app, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    tracing::info!("Shutting down...");
}
