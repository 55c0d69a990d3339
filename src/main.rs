use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colloquy::cli::{Cli, Commands};
use colloquy::events::{spawn_session_feed, spawn_store_writer};
use colloquy::{
    utils, ChatSession, CompletionClient, ConversationDirectory, ConversationStore, Event,
    EventBus, FileStore, HttpCompletionClient, MemoryStore, Settings,
};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::new()?;
    init_tracing(&settings);

    let cli = Cli::parse();
    match cli.command {
        Commands::Ask { prompt } => handle_ask(prompt, settings).await,
        Commands::Interactive {
            storage_dir,
            ephemeral,
        } => handle_interactive(storage_dir, ephemeral, settings).await,
        Commands::List { storage_dir } => handle_list(storage_dir, settings).await,
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn handle_ask(prompt: String, settings: Settings) -> Result<()> {
    let api_key = Settings::api_key()?;
    let client = HttpCompletionClient::new(api_key, settings.llm);

    utils::print_notice("Sending request...");
    let reply = client.complete(&prompt).await?;
    println!("\n{}", reply);
    Ok(())
}

async fn handle_interactive(
    storage_dir: Option<String>,
    ephemeral: bool,
    settings: Settings,
) -> Result<()> {
    let api_key = Settings::api_key()?;

    let store: Arc<dyn ConversationStore> = if ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        let dir = storage_dir.unwrap_or_else(|| settings.storage.dir.clone());
        Arc::new(FileStore::new(PathBuf::from(dir)).await?)
    };

    let bus = EventBus::new(settings.system.channel_buffer_size);
    let client = Arc::new(HttpCompletionClient::new(api_key, settings.llm.clone()));
    let session = Arc::new(ChatSession::new(client, store.clone(), bus.clone()));
    let directory = Arc::new(ConversationDirectory::new(store.clone(), bus.clone()));
    directory.hydrate().await?;

    let _store_writer = spawn_store_writer(&bus, directory.clone(), store.clone());
    let _session_feed = spawn_session_feed(&bus, session.clone());

    utils::print_banner("colloquy");
    utils::print_notice("Type a message, or /new, /list, /open <n>, /regen, /quit");

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        utils::prompt_marker();
        std::io::stdout().flush().ok();

        let mut input = String::new();
        if reader.read_line(&mut input).await? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(rest) = input.strip_prefix('/') {
            let mut parts = rest.split_whitespace();
            match parts.next() {
                Some("quit") | Some("q") => break,
                Some("new") => {
                    bus.publish(Event::NewChatRequested);
                    utils::print_notice("Started a new chat");
                }
                Some("list") => print_conversation_list(&directory, &session).await,
                Some("open") => {
                    open_conversation(parts.next(), &directory, &session).await;
                }
                Some("regen") => match session.regenerate().await {
                    Ok(()) => print_last_reply(&session).await,
                    Err(err) => utils::print_error(&err.to_string()),
                },
                _ => utils::print_error("Unknown command"),
            }
            continue;
        }

        match session.send_message(input).await {
            Ok(()) => print_last_reply(&session).await,
            Err(err) => utils::print_error(&err.to_string()),
        }
    }

    Ok(())
}

async fn print_conversation_list(directory: &ConversationDirectory, session: &ChatSession) {
    let summaries = directory.summaries().await;
    if summaries.is_empty() {
        utils::print_notice("No conversations yet");
        return;
    }

    let active = session.conversation_id().await;
    for (position, summary) in summaries.iter().enumerate() {
        utils::print_summary(position + 1, summary, active == Some(summary.id));
    }
}

async fn open_conversation(
    raw_position: Option<&str>,
    directory: &ConversationDirectory,
    session: &ChatSession,
) {
    let Some(position) = raw_position.and_then(|raw| raw.parse::<usize>().ok()) else {
        utils::print_error("Usage: /open <number>");
        return;
    };

    let summaries = directory.summaries().await;
    let Some(summary) = position.checked_sub(1).and_then(|index| summaries.get(index)) else {
        utils::print_error("No such conversation");
        return;
    };

    directory.select(summary.id).await;

    // Selection travels bus -> session feed; give the feed a beat to load.
    tokio::time::sleep(Duration::from_millis(50)).await;
    for message in session.messages().await {
        utils::print_message(&message);
    }
}

async fn print_last_reply(session: &ChatSession) {
    if let Some(message) = session.messages().await.last() {
        utils::print_message(message);
    }
}

async fn handle_list(storage_dir: Option<String>, settings: Settings) -> Result<()> {
    let dir = storage_dir.unwrap_or(settings.storage.dir);
    let store = FileStore::new(PathBuf::from(dir)).await?;

    let records = store.load_all().await?;
    if records.is_empty() {
        utils::print_notice("No conversations yet");
        return Ok(());
    }

    for (position, record) in records.iter().enumerate() {
        println!(
            "{:>2}. {} ({} messages)",
            position + 1,
            record.title,
            record.messages.len()
        );
    }
    Ok(())
}
