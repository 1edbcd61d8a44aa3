//! Minimal server-sent-events decoding for Assistants run streams.
//!
//! The run stream emits `event:`/`data:` frames separated by blank lines;
//! the events this bot cares about are `thread.message.delta` (incremental
//! text), `thread.message.completed` (finalized text) and the run
//! lifecycle terminators.

use serde::Deserialize;

use atb_core::{assistant::RunEvent, errors::Error, Result};

/// One parsed SSE frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental frame splitter. Chunks from the network can cut frames (and
/// UTF-8 sequences) anywhere, so bytes are buffered until a blank-line
/// separator completes a frame.
#[derive(Debug, Default)]
pub(crate) struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let raw: Vec<u8> = self.buf.drain(..pos + 2).collect();
            if let Some(frame) = parse_frame(&String::from_utf8_lossy(&raw)) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn parse_frame(raw: &str) -> Option<SseFrame> {
    let mut event = String::new();
    let mut data = String::new();

    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }

    if event.is_empty() && data.is_empty() {
        None
    } else {
        Some(SseFrame { event, data })
    }
}

/// Map a frame to a run event. Unknown event kinds (run steps, message
/// creation, ...) are skipped.
pub(crate) fn decode_frame(frame: SseFrame) -> Option<Result<RunEvent>> {
    if frame.data == "[DONE]" {
        return Some(Ok(RunEvent::Completed));
    }

    match frame.event.as_str() {
        "thread.message.delta" => Some(parse_delta(&frame.data)),
        "thread.message.completed" => Some(parse_completed_message(&frame.data)),
        "thread.run.completed" => Some(Ok(RunEvent::Completed)),
        "thread.run.failed" | "thread.run.expired" | "thread.run.cancelled" => {
            let reason: String = frame.data.chars().take(200).collect();
            Some(Err(Error::External(format!(
                "assistant run did not complete ({}): {reason}",
                frame.event
            ))))
        }
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct MessageDeltaObject {
    delta: DeltaBody,
}

#[derive(Debug, Deserialize)]
struct DeltaBody {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    #[serde(default)]
    content: Vec<ContentPart>,
}

/// Non-text parts (image_file, ...) deserialize with `text: None` and are
/// skipped.
#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    #[serde(default)]
    value: String,
}

fn parse_delta(data: &str) -> Result<RunEvent> {
    let obj: MessageDeltaObject = serde_json::from_str(data)?;
    Ok(RunEvent::TextDelta(join_text(&obj.delta.content)))
}

fn parse_completed_message(data: &str) -> Result<RunEvent> {
    let obj: MessageObject = serde_json::from_str(data)?;
    Ok(RunEvent::TextDone(join_text(&obj.content)))
}

fn join_text(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .filter_map(|p| p.text.as_ref())
        .map(|t| t.value.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(decoder: &mut FrameDecoder, chunk: &str) -> Vec<RunEvent> {
        decoder
            .push(chunk.as_bytes())
            .into_iter()
            .filter_map(decode_frame)
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn splits_frames_on_blank_lines() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(b"event: a\ndata: 1\n\nevent: b\ndata: 2\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event, "a");
        assert_eq!(frames[0].data, "1");
        assert_eq!(frames[1].event, "b");
    }

    #[test]
    fn buffers_frames_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"event: thread.message.del").is_empty());
        assert!(decoder
            .push(b"ta\ndata: {\"delta\":{\"content\":[]}}\n")
            .is_empty());
        let frames = decoder.push(b"\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "thread.message.delta");
    }

    #[test]
    fn delta_frames_carry_incremental_text() {
        let mut decoder = FrameDecoder::new();
        let events = decode_all(
            &mut decoder,
            "event: thread.message.delta\n\
             data: {\"id\":\"msg_1\",\"delta\":{\"content\":[{\"index\":0,\"type\":\"text\",\"text\":{\"value\":\"hi \"}}]}}\n\n",
        );
        assert_eq!(events, vec![RunEvent::TextDelta("hi ".to_string())]);
    }

    #[test]
    fn completed_message_carries_the_full_text() {
        let mut decoder = FrameDecoder::new();
        let events = decode_all(
            &mut decoder,
            "event: thread.message.completed\n\
             data: {\"id\":\"msg_1\",\"content\":[{\"type\":\"text\",\"text\":{\"value\":\"hi there\",\"annotations\":[]}}]}\n\n",
        );
        assert_eq!(events, vec![RunEvent::TextDone("hi there".to_string())]);
    }

    #[test]
    fn run_completion_and_done_sentinel_terminate() {
        let mut decoder = FrameDecoder::new();
        let events = decode_all(
            &mut decoder,
            "event: thread.run.completed\ndata: {\"id\":\"run_1\"}\n\n\
             event: done\ndata: [DONE]\n\n",
        );
        assert_eq!(events, vec![RunEvent::Completed, RunEvent::Completed]);
    }

    #[test]
    fn unknown_events_are_skipped() {
        let mut decoder = FrameDecoder::new();
        let events = decode_all(
            &mut decoder,
            "event: thread.run.step.created\ndata: {\"id\":\"step_1\"}\n\n",
        );
        assert!(events.is_empty());
    }

    #[test]
    fn failed_runs_surface_as_errors() {
        let mut decoder = FrameDecoder::new();
        let results: Vec<_> = decoder
            .push(b"event: thread.run.failed\ndata: {\"last_error\":\"boom\"}\n\n")
            .into_iter()
            .filter_map(decode_frame)
            .collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn non_text_content_parts_are_ignored() {
        let mut decoder = FrameDecoder::new();
        let events = decode_all(
            &mut decoder,
            "event: thread.message.completed\n\
             data: {\"content\":[{\"type\":\"image_file\",\"image_file\":{\"file_id\":\"f1\"}},{\"type\":\"text\",\"text\":{\"value\":\"ok\"}}]}\n\n",
        );
        assert_eq!(events, vec![RunEvent::TextDone("ok".to_string())]);
    }
}
