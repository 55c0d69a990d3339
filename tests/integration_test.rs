//! End-to-end wiring: session, directory, store writer and storage connected
//! over the event bus, the way `main` wires them.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use colloquy::events::{spawn_session_feed, spawn_store_writer};
use colloquy::{
    ChatSession, CompletionClient, CompletionError, ConversationDirectory, ConversationStore,
    Event, EventBus, FileStore, MemoryStore, MessageStatus,
};
use tokio::sync::Mutex;

struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
}

impl ScriptedClient {
    fn with_replies(replies: Vec<Result<String, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
        })
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(CompletionError::MalformedResponse))
    }
}

struct Wiring {
    bus: EventBus,
    session: Arc<ChatSession>,
    directory: Arc<ConversationDirectory>,
    store: Arc<dyn ConversationStore>,
}

async fn wire_up(store: Arc<dyn ConversationStore>, client: Arc<dyn CompletionClient>) -> Wiring {
    let bus = EventBus::new(64);
    let session = Arc::new(ChatSession::new(client, store.clone(), bus.clone()));
    let directory = Arc::new(ConversationDirectory::new(store.clone(), bus.clone()));
    directory.hydrate().await.unwrap();

    spawn_store_writer(&bus, directory.clone(), store.clone());
    spawn_session_feed(&bus, session.clone());

    Wiring {
        bus,
        session,
        directory,
        store,
    }
}

/// Let the subscriber tasks drain the bus.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

#[tokio::test]
async fn send_persists_and_registers_the_conversation() {
    let client = ScriptedClient::with_replies(vec![Ok("Hi there".to_string())]);
    let wiring = wire_up(Arc::new(MemoryStore::new()), client).await;

    wiring.session.send_message("Hello").await.unwrap();
    settle().await;

    let summaries = wiring.directory.summaries().await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].title, "Hello");

    let record = wiring.store.load(summaries[0].id).await.unwrap().unwrap();
    assert_eq!(record.messages.len(), 2);
    assert_eq!(record.messages[0].text, "Hello");
    assert_eq!(record.messages[1].text, "Hi there");
    assert_eq!(record.messages[1].status, MessageStatus::Final);
}

#[tokio::test]
async fn new_chat_then_select_restores_the_previous_conversation() {
    let client = ScriptedClient::with_replies(vec![
        Ok("first reply".to_string()),
        Ok("second reply".to_string()),
    ]);
    let wiring = wire_up(Arc::new(MemoryStore::new()), client).await;

    wiring.session.send_message("Hello").await.unwrap();
    wiring.session.send_message("More").await.unwrap();
    settle().await;
    let id = wiring.session.conversation_id().await.unwrap();

    wiring.bus.publish(Event::NewChatRequested);
    settle().await;
    assert!(wiring.session.messages().await.is_empty());
    assert!(!wiring.session.is_started().await);

    wiring.directory.select(id).await;
    settle().await;

    let messages = wiring.session.messages().await;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3].text, "second reply");
    assert_eq!(wiring.session.conversation_id().await, Some(id));
}

#[tokio::test]
async fn two_conversations_are_listed_in_creation_order() {
    let client =
        ScriptedClient::with_replies(vec![Ok("one".to_string()), Ok("two".to_string())]);
    let wiring = wire_up(Arc::new(MemoryStore::new()), client).await;

    wiring.session.send_message("First topic").await.unwrap();
    wiring.bus.publish(Event::NewChatRequested);
    settle().await;

    // Ids are millisecond timestamps; keep the second one distinct.
    tokio::time::sleep(Duration::from_millis(2)).await;
    wiring.session.send_message("Second topic").await.unwrap();
    settle().await;

    let titles: Vec<String> = wiring
        .directory
        .summaries()
        .await
        .into_iter()
        .map(|summary| summary.title)
        .collect();
    assert_eq!(titles, vec!["First topic", "Second topic"]);
}

#[tokio::test]
async fn failed_completion_is_persisted_as_an_error_message() {
    let client = ScriptedClient::with_replies(vec![Err(CompletionError::MalformedResponse)]);
    let wiring = wire_up(Arc::new(MemoryStore::new()), client).await;

    wiring.session.send_message("Hello").await.unwrap();
    settle().await;

    let id = wiring.session.conversation_id().await.unwrap();
    let record = wiring.store.load(id).await.unwrap().unwrap();
    assert_eq!(record.messages.len(), 2);
    assert_eq!(record.messages[1].status, MessageStatus::Error);
}

#[tokio::test]
async fn file_store_conversations_survive_a_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    let id = {
        let store = Arc::new(FileStore::new(dir.path().to_path_buf()).await.unwrap());
        let client = ScriptedClient::with_replies(vec![Ok("Hi there".to_string())]);
        let wiring = wire_up(store, client).await;

        wiring.session.send_message("Hello").await.unwrap();
        settle().await;
        wiring.session.conversation_id().await.unwrap()
    };

    // Fresh wiring over the same directory, as after a process restart.
    let store = Arc::new(FileStore::new(dir.path().to_path_buf()).await.unwrap());
    let client = ScriptedClient::with_replies(vec![]);
    let wiring = wire_up(store, client).await;

    let summaries = wiring.directory.summaries().await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, id);
    assert_eq!(summaries[0].title, "Hello");

    wiring.directory.select(id).await;
    settle().await;
    let messages = wiring.session.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, "Hi there");
}
