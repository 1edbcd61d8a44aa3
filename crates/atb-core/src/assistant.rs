use async_trait::async_trait;

use futures::{stream::BoxStream, StreamExt};

use crate::{domain::ThreadId, errors::Error, Result};

/// One event of a streamed assistant run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunEvent {
    /// Incremental text chunk.
    TextDelta(String),
    /// The complete response text, emitted once the message is finalized.
    TextDone(String),
    /// The run finished; no further events follow.
    Completed,
}

/// Lazy, finite event sequence for one run. Dropping it cancels the run
/// stream on the adapter side.
pub type ReplyStream = BoxStream<'static, Result<RunEvent>>;

/// Port for the conversation-completion backend.
///
/// A thread must exist before messages are posted on its behalf; the
/// conversation store enforces that ordering.
#[async_trait]
pub trait AssistantPort: Send + Sync {
    async fn create_thread(&self) -> Result<ThreadId>;

    /// Post a user-role message to an existing thread. Fails with
    /// [`Error::InvalidThread`] when the backend rejects the id.
    async fn post_user_message(&self, thread: &ThreadId, text: &str) -> Result<()>;

    /// Start an assistant run over the thread and stream its events until
    /// the backend signals completion.
    async fn run_stream(&self, thread: &ThreadId) -> Result<ReplyStream>;
}

/// Drain a reply stream to its final aggregated text.
///
/// Prefers the finalized `TextDone` value and falls back to the
/// concatenated deltas, so adapters that never emit a finalized message
/// still produce a reply.
pub async fn collect_final_text(mut stream: ReplyStream) -> Result<String> {
    let mut deltas = String::new();
    let mut done: Option<String> = None;

    while let Some(event) = stream.next().await {
        match event? {
            RunEvent::TextDelta(chunk) => deltas.push_str(&chunk),
            RunEvent::TextDone(text) => done = Some(text),
            RunEvent::Completed => break,
        }
    }

    let text = done.unwrap_or(deltas);
    if text.trim().is_empty() {
        return Err(Error::External(
            "assistant run produced no reply text".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_of(events: Vec<RunEvent>) -> ReplyStream {
        futures::stream::iter(events.into_iter().map(Ok)).boxed()
    }

    #[tokio::test]
    async fn prefers_finalized_text_over_deltas() {
        let stream = stream_of(vec![
            RunEvent::TextDelta("hi ".to_string()),
            RunEvent::TextDelta("the".to_string()),
            RunEvent::TextDone("hi there".to_string()),
            RunEvent::Completed,
        ]);
        assert_eq!(collect_final_text(stream).await.unwrap(), "hi there");
    }

    #[tokio::test]
    async fn falls_back_to_concatenated_deltas() {
        let stream = stream_of(vec![
            RunEvent::TextDelta("hi ".to_string()),
            RunEvent::TextDelta("there".to_string()),
            RunEvent::Completed,
        ]);
        assert_eq!(collect_final_text(stream).await.unwrap(), "hi there");
    }

    #[tokio::test]
    async fn stops_consuming_at_completion() {
        let stream = stream_of(vec![
            RunEvent::TextDone("done".to_string()),
            RunEvent::Completed,
            RunEvent::TextDone("late".to_string()),
        ]);
        assert_eq!(collect_final_text(stream).await.unwrap(), "done");
    }

    #[tokio::test]
    async fn empty_run_is_an_error() {
        let stream = stream_of(vec![RunEvent::Completed]);
        assert!(collect_final_text(stream).await.is_err());
    }

    #[tokio::test]
    async fn stream_errors_propagate() {
        let stream = futures::stream::iter(vec![
            Ok(RunEvent::TextDelta("partial".to_string())),
            Err(Error::Transport("connection reset".to_string())),
        ])
        .boxed();
        assert!(matches!(
            collect_final_text(stream).await,
            Err(Error::Transport(_))
        ));
    }
}
