use std::sync::Arc;

use atb_core::{assistant::AssistantPort, config::Config};
use atb_openai::OpenAiAssistant;

#[tokio::main]
async fn main() -> Result<(), atb_core::Error> {
    atb_core::logging::init("atb")?;

    let cfg = Arc::new(Config::load()?);
    let assistant: Arc<dyn AssistantPort> = Arc::new(OpenAiAssistant::new(&cfg));

    atb_telegram::router::run_polling(cfg, assistant)
        .await
        .map_err(|e| atb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
