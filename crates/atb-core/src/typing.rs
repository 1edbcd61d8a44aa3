use std::{collections::HashMap, time::Duration};

use tokio::time::Instant;

use crate::domain::ChatId;

/// Per-chat throttle for the "typing" chat action.
///
/// Telegram shows the indicator for a few seconds per signal, so re-sending
/// more often than the interval only spams the API. The first call for a
/// chat always signals.
#[derive(Debug)]
pub struct TypingThrottle {
    interval: Duration,
    last_signal: HashMap<ChatId, Instant>,
}

impl TypingThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_signal: HashMap::new(),
        }
    }

    /// Returns true when a typing signal should be sent for `chat_id`, and
    /// records `now` as the last signal time as a side effect.
    pub fn should_signal(&mut self, chat_id: ChatId, now: Instant) -> bool {
        if let Some(&last) = self.last_signal.get(&chat_id) {
            if now.duration_since(last) < self.interval {
                return false;
            }
        }
        self.last_signal.insert(chat_id, now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(5_000);

    #[test]
    fn first_signal_always_fires() {
        let mut throttle = TypingThrottle::new(INTERVAL);
        assert!(throttle.should_signal(ChatId(1), Instant::now()));
    }

    #[test]
    fn signals_at_most_once_per_interval() {
        let mut throttle = TypingThrottle::new(INTERVAL);
        let t0 = Instant::now();

        assert!(throttle.should_signal(ChatId(1), t0));
        assert!(!throttle.should_signal(ChatId(1), t0 + Duration::from_millis(1_000)));
        assert!(throttle.should_signal(ChatId(1), t0 + Duration::from_millis(6_000)));
    }

    #[test]
    fn chats_are_throttled_independently() {
        let mut throttle = TypingThrottle::new(INTERVAL);
        let t0 = Instant::now();

        assert!(throttle.should_signal(ChatId(1), t0));
        assert!(throttle.should_signal(ChatId(2), t0));
        assert!(!throttle.should_signal(ChatId(1), t0 + Duration::from_millis(100)));
    }

    #[test]
    fn suppressed_calls_do_not_extend_the_window() {
        let mut throttle = TypingThrottle::new(INTERVAL);
        let t0 = Instant::now();

        assert!(throttle.should_signal(ChatId(1), t0));
        // A suppressed call must not push the next allowed slot forward.
        assert!(!throttle.should_signal(ChatId(1), t0 + Duration::from_millis(4_900)));
        assert!(throttle.should_signal(ChatId(1), t0 + Duration::from_millis(5_000)));
    }
}
