use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use juridique_core::export;
use juridique_core::{
    tr, BlockKind, Config, Conversation, HttpTransport, Language, Outcome, UiText, ViewState,
};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

const LOG_ENV: &str = "JURIDIQUE_LOG";
const DEFAULT_LOG_FILTER: &str = "juridique_core=info,juridique_tui=info";

#[derive(Parser)]
#[command(name = "juridique", version)]
#[command(about = "Terminal client for the Tunisian legal-assistant chat service")]
struct Cli {
    /// Chat endpoint URL
    #[arg(long, env = "JURIDIQUE_ENDPOINT")]
    endpoint: Option<String>,
    /// Answer language: auto, french or tunisian
    #[arg(short, long, value_parser = parse_language)]
    language: Option<Language>,
    /// Reuse an existing conversation id instead of generating one
    #[arg(long)]
    conversation_id: Option<String>,
    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Directory the transcript export is written to
    #[arg(long)]
    export_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
    },
}

fn parse_language(s: &str) -> Result<Language, String> {
    Language::from_str(s).ok_or_else(|| format!("unknown language '{}' (auto, french, tunisian)", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = cli.command.is_none();
    init_logging(interactive);

    let mut config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not read config, using defaults");
        Config::new()
    });
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = Some(timeout);
    }

    let endpoint = cli.endpoint.unwrap_or_else(|| config.endpoint());
    let transport = HttpTransport::new(&endpoint, config.timeout())?;

    let view = ViewState {
        language: cli.language.unwrap_or_else(|| config.language()),
        ..ViewState::default()
    };
    let conversation_id = cli
        .conversation_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let conversation = Conversation::new(&conversation_id, view);
    tracing::info!(
        conversation_id = conversation.conversation_id(),
        endpoint = transport.endpoint(),
        "starting"
    );

    match cli.command {
        Some(Commands::Ask { question }) => ask(conversation, &transport, &question).await,
        None => {
            let export_dir = cli.export_dir.unwrap_or_else(export::default_export_dir);
            run_tui(conversation, Arc::new(transport), export_dir).await
        }
    }
}

/// Log to a file while the terminal UI owns the screen, to stderr otherwise.
fn init_logging(interactive: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    if !interactive {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();
        return;
    }

    let Ok(log_file) = open_log_file() else {
        // No usable log location; run without logging rather than corrupt the screen
        return;
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .try_init();
}

fn open_log_file() -> Result<fs::File> {
    let dir = Config::config_dir()?;
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join("juridique.log");
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))
}

async fn ask(mut conversation: Conversation, transport: &HttpTransport, question: &str) -> Result<()> {
    conversation.set_input(question);

    match conversation.submit(transport).await {
        Some(Outcome::Replied) => {}
        Some(Outcome::Failed(err)) => bail!(err.banner(conversation.view.locale())),
        Some(Outcome::Discarded) | None => bail!("question is empty"),
    }

    let rendered = conversation.rendered();
    let Some(reply) = rendered.last() else {
        return Ok(());
    };

    for block in &reply.blocks {
        match block.kind {
            BlockKind::Bullet => println!("  • {}", block.text()),
            _ => println!("{}", block.text()),
        }
    }

    if !reply.sources.is_empty() {
        println!();
        println!("{}", tr(UiText::SourcesTitle, conversation.view.locale()).trim());
        for (i, source) in reply.sources.iter().enumerate() {
            println!("  {}. {}", i + 1, source);
        }
    }

    Ok(())
}

async fn run_tui(
    conversation: Conversation,
    transport: Arc<HttpTransport>,
    export_dir: PathBuf,
) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(conversation, transport, export_dir, events.sender());

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event);
    }
    Ok(())
}
