use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),
}

impl CoreError {
    /// Returns `true` if the host forgot to inject a required bridge.
    pub fn is_capability_missing(&self) -> bool {
        matches!(self, CoreError::Runtime(err) if err.is_capability_missing())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
