use thiserror::Error;

pub type MusicResult<T> = ::std::result::Result<T, MusicError>;

#[derive(Debug, Error)]
pub enum MusicError {
    #[error("No playable media was found for `{0}`.")]
    Resolution(String),
    #[error("Unable to join the voice channel: {0}")]
    Connection(String),
    #[error("The bot is not connected to a voice channel.")]
    NotConnected,
    #[error("Audio sink failure: {0}")]
    Sink(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Discord request failed: {0}")]
    Discord(#[from] serenity::Error),
}

impl MusicError {
    /// Whether the failure comes from the requested media rather than the bot itself.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution(_))
    }
}

impl From<songbird::error::JoinError> for MusicError {
    fn from(e: songbird::error::JoinError) -> MusicError {
        Self::Connection(e.to_string())
    }
}

impl From<songbird::tracks::ControlError> for MusicError {
    fn from(e: songbird::tracks::ControlError) -> MusicError {
        Self::Sink(e.to_string())
    }
}

pub type StoreResult<T> = ::std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Already checked in today.")]
    DuplicateCheckin,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable `{0}`.")]
    MissingEnvVar(String),
    #[error("Environment variable `{name}` has an invalid value `{value}`.")]
    InvalidEnvVar { name: String, value: String },
}
