/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Assistant-backend conversation thread id (string).
///
/// At most one thread is associated with a chat at any instant; the mapping
/// lives in [`crate::conversation::ConversationStore`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ThreadId(pub String);
