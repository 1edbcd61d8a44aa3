use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{
    assistant::{collect_final_text, AssistantPort},
    conversation::{ChatLocks, ConversationStore},
    domain::{ChatId, ThreadId},
    messaging::{
        port::MessagingPort,
        types::{ChatAction, IncomingMessage},
    },
    typing::TypingThrottle,
    Result,
};

/// Synthetic starter message posted to a freshly reset thread.
const NEW_CONVERSATION_PROMPT: &str = "Let's start a new conversation.";

/// Product copy, kept verbatim from the original bot.
const WELCOME_BODY: &str = "Я создан чтобы генерировать ответы на переживания и впоросы людей. По поводу гэмблинга. Просто перешлите мне сообщение и я попробую помочь вам в ответе.";

/// Classified incoming text. Commands are exact, case-sensitive literal
/// matches; everything else (including the empty string) is forwarded to
/// the assistant as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    New,
    Text(String),
}

impl Command {
    pub fn classify(text: &str) -> Self {
        match text {
            "/start" => Self::Start,
            "/new" => Self::New,
            other => Self::Text(other.to_string()),
        }
    }
}

/// Routes each incoming message to one of three behaviors (welcome, reset,
/// forward) and owns all per-chat state: the thread mapping, the per-chat
/// locks, and the typing throttle. Injected, never ambient.
pub struct MessageDispatcher {
    assistant: Arc<dyn AssistantPort>,
    messenger: Arc<dyn MessagingPort>,
    store: ConversationStore,
    chat_locks: ChatLocks,
    typing: Mutex<TypingThrottle>,
}

impl MessageDispatcher {
    pub fn new(
        assistant: Arc<dyn AssistantPort>,
        messenger: Arc<dyn MessagingPort>,
        typing_throttle: Duration,
    ) -> Self {
        Self {
            assistant,
            messenger,
            store: ConversationStore::new(),
            chat_locks: ChatLocks::default(),
            typing: Mutex::new(TypingThrottle::new(typing_throttle)),
        }
    }

    /// Handle one incoming message to completion.
    ///
    /// Errors are local to this message; the caller decides how to surface
    /// them. Messages from the same chat are serialized by the chat lock,
    /// held until the reply is delivered (or the handling fails).
    pub async fn handle(&self, msg: IncomingMessage) -> Result<()> {
        let Some(text) = msg.text else {
            tracing::debug!(chat_id = msg.chat_id.0, "ignoring non-text update");
            return Ok(());
        };

        match Command::classify(&text) {
            Command::Start => {
                self.messenger
                    .send_text(msg.chat_id, &welcome_text(msg.username.as_deref()))
                    .await
            }
            Command::New => {
                let _guard = self.chat_locks.lock_chat(msg.chat_id).await;
                let thread = self.store.reset(msg.chat_id, self.assistant.as_ref()).await?;
                self.relay(msg.chat_id, &thread, NEW_CONVERSATION_PROMPT).await
            }
            Command::Text(body) => {
                let _guard = self.chat_locks.lock_chat(msg.chat_id).await;
                let thread = self
                    .store
                    .get_or_create(msg.chat_id, self.assistant.as_ref())
                    .await?;
                self.relay(msg.chat_id, &thread, &body).await
            }
        }
    }

    /// Post `text` to the thread, run the assistant, deliver the final
    /// aggregated reply.
    async fn relay(&self, chat_id: ChatId, thread: &ThreadId, text: &str) -> Result<()> {
        self.assistant.post_user_message(thread, text).await?;
        self.signal_typing(chat_id).await;

        let stream = self.assistant.run_stream(thread).await?;
        let reply = collect_final_text(stream).await?;

        self.messenger.send_text(chat_id, &reply).await
    }

    /// Best-effort typing hint, throttled per chat. A failed chat action
    /// must not fail the message.
    async fn signal_typing(&self, chat_id: ChatId) {
        let should = self
            .typing
            .lock()
            .await
            .should_signal(chat_id, Instant::now());
        if !should {
            return;
        }
        if let Err(e) = self
            .messenger
            .send_chat_action(chat_id, ChatAction::Typing)
            .await
        {
            tracing::warn!(chat_id = chat_id.0, error = %e, "typing indicator failed");
        }
    }
}

fn welcome_text(username: Option<&str>) -> String {
    match username {
        Some(name) => format!("Hello @{name}!\n{WELCOME_BODY}"),
        None => format!("Hello!\n{WELCOME_BODY}"),
    }
}
