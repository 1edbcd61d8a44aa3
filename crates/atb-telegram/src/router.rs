use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use atb_core::{
    assistant::AssistantPort, config::Config, dispatcher::MessageDispatcher,
    messaging::port::MessagingPort,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<MessageDispatcher>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Build the bot and run long polling until shutdown.
pub async fn run_polling(cfg: Arc<Config>, assistant: Arc<dyn AssistantPort>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        tracing::info!(username = me.username(), "bot started");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let caps = messenger.capabilities();
    tracing::info!(
        max_message_len = caps.max_message_len,
        chat_actions = caps.supports_chat_actions,
        "messenger ready"
    );

    let state = Arc::new(AppState {
        dispatcher: Arc::new(MessageDispatcher::new(
            assistant,
            messenger.clone(),
            cfg.typing_throttle,
        )),
        messenger,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
