use crate::domain::ChatId;

/// Cross-messenger incoming message model.
///
/// `text` is `None` for non-text updates (stickers, photos, ...); those are
/// ignored by the dispatcher. Messenger-specific fields stay in the adapter.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub username: Option<String>,
    pub text: Option<String>,
}

/// Outgoing "chat action" hint shown to the user while a reply is pending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_chat_actions: bool,
    pub max_message_len: usize,
}
