use thiserror::Error;

/// Failures reported by a single [`Stream`](crate::Stream).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("stream already listened to")]
    AlreadyListening,

    #[error("stream isn't listened to")]
    NotListening,

    #[error("stream was disposed")]
    AlreadyDisposed,

    #[error("position '{requested}' out of range '{len}'")]
    PositionOutOfRange { requested: usize, len: usize },

    #[error("stream capacity must be greater than zero")]
    ZeroCapacity,

    #[error("no tokio runtime available to run the stream consumer")]
    NoRuntime,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlocError {
    #[error("event stream: {0}")]
    EventStream(#[source] StreamError),

    #[error("state stream: {0}")]
    StateStream(#[source] StreamError),

    /// Both streams were asked to dispose; at least one refused.
    #[error("dispose failed (event stream: {event:?}, state stream: {state:?})")]
    Dispose {
        event: Option<StreamError>,
        state: Option<StreamError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}
