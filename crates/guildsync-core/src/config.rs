use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Settings for the OpenAI-compatible translation endpoint.
///
/// `base_url`, `api_key` and `model` may be loaded empty; the translator calls
/// [`TranslationConfig::validate`] at construction so a missing value fails
/// startup rather than the first translation.
#[derive(Clone, Debug)]
pub struct TranslationConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub request_timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl TranslationConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
            temperature: 0.2,
            max_tokens: 1000,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("LLM_BASE_URL", &self.base_url),
            ("LLM_API_KEY", &self.api_key),
            ("LLM_MODEL", &self.model),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!(
                    "{key} environment variable is required"
                )));
            }
        }
        Ok(())
    }
}

/// Typed configuration for the relay bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub command_prefix: String,
    pub webhook_name: String,

    // Translation provider
    pub translation: TranslationConfig,

    // Storage
    pub data_file: PathBuf,

    // Behavior flags
    pub relay_bot_messages: bool,
    pub reaction_translation: bool,

    // Outbound pacing
    pub channel_min_interval: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let discord_token = env_str("DISCORD_TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("DISCORD_TOKEN environment variable is required".to_string())
            })?;

        let mut translation = TranslationConfig::new(
            env_str("LLM_BASE_URL").unwrap_or_default(),
            env_str("LLM_API_KEY").unwrap_or_default(),
            env_str("LLM_MODEL").unwrap_or_default(),
        );
        if let Some(n) = env_u32("LLM_MAX_RETRIES") {
            translation.max_retries = n;
        }
        if let Some(ms) = env_u64("LLM_INITIAL_DELAY_MS") {
            translation.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("LLM_TIMEOUT_MS") {
            translation.request_timeout = Duration::from_millis(ms);
        }
        if let Some(t) = env_f32("LLM_TEMPERATURE") {
            translation.temperature = t;
        }
        if let Some(n) = env_u32("LLM_MAX_TOKENS") {
            translation.max_tokens = n;
        }

        let command_prefix = env_str("GUILDSYNC_COMMAND_PREFIX")
            .and_then(non_empty)
            .unwrap_or_else(|| "!guildsync".to_string());
        let webhook_name = env_str("GUILDSYNC_WEBHOOK_NAME")
            .and_then(non_empty)
            .unwrap_or_else(|| "GuildSync".to_string());

        let data_file = PathBuf::from(
            env_str("GUILDSYNC_DATA_FILE")
                .and_then(non_empty)
                .unwrap_or_else(|| "guildsync.json".to_string()),
        );

        let relay_bot_messages = env_bool("GUILDSYNC_RELAY_BOTS").unwrap_or(false);
        let reaction_translation = env_bool("GUILDSYNC_REACTIONS").unwrap_or(true);
        let channel_min_interval =
            Duration::from_millis(env_u64("GUILDSYNC_CHANNEL_INTERVAL_MS").unwrap_or(250));

        Ok(Self {
            discord_token,
            command_prefix,
            webhook_name,
            translation,
            data_file,
            relay_bot_messages,
            reaction_translation,
            channel_min_interval,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
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

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| parse_bool(&s))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_f32(key: &str) -> Option<f32> {
    env_str(key).and_then(|s| s.trim().parse::<f32>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_config_requires_all_three_values() {
        assert!(TranslationConfig::new("http://x", "k", "m").validate().is_ok());

        let err = TranslationConfig::new("", "k", "m").validate().unwrap_err();
        assert!(err.to_string().contains("LLM_BASE_URL"));

        let err = TranslationConfig::new("http://x", "  ", "m")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("LLM_API_KEY"));

        let err = TranslationConfig::new("http://x", "k", "")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("LLM_MODEL")));
    }

    #[test]
    fn translation_defaults_match_provider_contract() {
        let cfg = TranslationConfig::new("http://x", "k", "m");
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.initial_delay, Duration::from_millis(500));
        assert_eq!(cfg.max_tokens, 1000);
    }

    #[test]
    fn dotenv_parser_skips_comments_and_strips_quotes() {
        let parsed = parse_dotenv(
            "# comment\n\nDISCORD_TOKEN=\"abc\"\nLLM_MODEL='gpt'\n=novalue\nBROKEN\nLLM_BASE_URL = http://h/v1 \n",
        );
        assert_eq!(
            parsed,
            vec![
                ("DISCORD_TOKEN".to_string(), "abc".to_string()),
                ("LLM_MODEL".to_string(), "gpt".to_string()),
                ("LLM_BASE_URL".to_string(), "http://h/v1".to_string()),
            ]
        );
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" on "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("off"));
        assert!(!parse_bool(""));
    }
}
