/// Core error type for GuildSync.
///
/// Adapter crates map their specific errors into this type so the relay core
/// can tell configuration problems, store failures and platform failures apart.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("translation to '{language}' unavailable after {attempts} attempts: {reason}")]
    TranslationUnavailable {
        language: String,
        attempts: u32,
        reason: String,
    },

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
