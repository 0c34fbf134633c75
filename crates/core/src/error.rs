/// Result alias that carries the custom [`InfinityError`] type.
pub type Result<T> = std::result::Result<T, InfinityError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum InfinityError {
    /// The caller-supplied draw buffer cannot hold a single render band.
    #[error("draw buffer too small: {actual} bytes supplied, {required} bytes required")]
    DrawBufferTooSmall { required: usize, actual: usize },
    /// Configuration values that cannot produce a working display or scene.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A redraw was requested for a line the sink never created.
    #[error("unknown line handle {0}")]
    UnknownLine(usize),
    /// Free-form message, such as a rejected command-line value.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration files that fail to parse.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl InfinityError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}
