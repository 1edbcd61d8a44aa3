use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Typed configuration, loaded from the environment once at startup and
/// fixed for the process lifetime.
#[derive(Clone, Debug)]
pub struct Config {
    // Required secrets
    pub telegram_bot_token: String,
    pub openai_api_key: String,
    pub openai_assistant_id: String,

    // Backend tunables
    pub openai_base_url: String,
    pub request_timeout: Duration,

    // Typing indicator
    pub typing_throttle: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = require("TELEGRAM_BOT_TOKEN")?;
        let openai_api_key = require("OPENAI_API_KEY")?;
        let openai_assistant_id = require("OPENAI_ASSISTANT_ID")?;

        let openai_base_url = env_str("OPENAI_BASE_URL")
            .and_then(non_empty)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        // Applies to thread creation and message posting only; streamed runs
        // carry no overall deadline.
        let request_timeout =
            Duration::from_millis(env_u64("OPENAI_REQUEST_TIMEOUT_MS").unwrap_or(30_000));

        let typing_throttle = Duration::from_millis(env_u64("TYPING_THROTTLE_MS").unwrap_or(5_000));

        Ok(Self {
            telegram_bot_token,
            openai_api_key,
            openai_assistant_id,
            openai_base_url,
            request_timeout,
            typing_throttle,
        })
    }
}

fn require(key: &str) -> Result<String> {
    env_str(key)
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}
