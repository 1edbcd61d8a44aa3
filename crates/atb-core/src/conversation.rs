use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    assistant::AssistantPort,
    domain::{ChatId, ThreadId},
    Result,
};

/// In-memory ChatId -> ThreadId mapping. No persistence; lost on restart.
///
/// The store itself does not serialize concurrent callers for the same
/// chat; the dispatcher holds a [`ChatLocks`] guard across the whole
/// ensure-post-run span, which is what prevents duplicate thread creation.
#[derive(Default)]
pub struct ConversationStore {
    threads: Mutex<HashMap<ChatId, ThreadId>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the thread for `chat_id`, creating one via the backend on
    /// first use.
    pub async fn get_or_create(
        &self,
        chat_id: ChatId,
        assistant: &dyn AssistantPort,
    ) -> Result<ThreadId> {
        if let Some(existing) = self.threads.lock().await.get(&chat_id).cloned() {
            return Ok(existing);
        }

        let created = assistant.create_thread().await?;
        self.threads.lock().await.insert(chat_id, created.clone());
        Ok(created)
    }

    /// Unconditionally creates a fresh thread for `chat_id`, replacing any
    /// prior one. The old thread is simply abandoned on the backend.
    pub async fn reset(&self, chat_id: ChatId, assistant: &dyn AssistantPort) -> Result<ThreadId> {
        let created = assistant.create_thread().await?;
        self.threads.lock().await.insert(chat_id, created.clone());
        Ok(created)
    }

    pub async fn thread_for(&self, chat_id: ChatId) -> Option<ThreadId> {
        self.threads.lock().await.get(&chat_id).cloned()
    }
}

/// One mutex per chat, created on demand. Held by the dispatcher for the
/// duration of a message's assistant round trip so messages from the same
/// chat are processed one at a time.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<ChatId, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: ChatId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
