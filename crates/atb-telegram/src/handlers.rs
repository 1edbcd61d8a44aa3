use std::sync::Arc;

use teloxide::prelude::*;

use atb_core::{domain::ChatId, messaging::types::IncomingMessage};

use crate::router::AppState;

const FAILURE_NOTICE: &str =
    "Sorry, something went wrong while answering. Please try again in a moment.";

/// One inbound Telegram message -> one dispatcher invocation.
///
/// A failed message only affects its own chat: the error is logged, the
/// user gets a generic notice, and polling continues.
pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = ChatId(msg.chat.id.0);

    let incoming = IncomingMessage {
        chat_id,
        username: msg.chat.username().map(|s| s.to_string()),
        text: msg.text().map(|s| s.to_string()),
    };

    if let Err(e) = state.dispatcher.handle(incoming).await {
        tracing::error!(chat_id = chat_id.0, error = %e, "message handling failed");
        if let Err(notice_err) = state.messenger.send_text(chat_id, FAILURE_NOTICE).await {
            tracing::warn!(chat_id = chat_id.0, error = %notice_err, "failure notice undeliverable");
        }
    }

    Ok(())
}
