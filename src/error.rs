pub type TtyreelResult<T> = Result<T, TtyreelError>;

#[derive(thiserror::Error, Debug)]
pub enum TtyreelError {
    /// The byte stream is not a structurally valid ttyrec recording.
    #[error("malformed recording: {0}")]
    MalformedRecording(String),

    /// An operation was attempted in a state that cannot service it,
    /// e.g. seeking before any recording is loaded.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The transport failed to produce bytes for a source URL.
    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TtyreelError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRecording(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
