/// Crate-wide result alias.
pub type PlacardResult<T> = Result<T, PlacardError>;

/// Error taxonomy for the composition and export engine.
///
/// Input-data anomalies (empty gradient color lists, zero-size surfaces,
/// out-of-range positions) are deliberately *not* represented here: they are
/// recovered locally with documented fallback values. These variants cover
/// contract validation and resource/encoding failures only.
#[derive(thiserror::Error, Debug)]
pub enum PlacardError {
    /// A caller-supplied value violates a documented contract.
    #[error("validation error: {0}")]
    Validation(String),

    /// A rendering primitive could not be constructed or executed.
    #[error("render error: {0}")]
    Render(String),

    /// The raster frame could not be encoded to the requested format.
    #[error("encode error: {0}")]
    Encode(String),

    /// The persistence collaborator rejected the encoded output.
    #[error("persist error: {0}")]
    Persist(String),

    /// Wrapped error from an underlying library.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlacardError {
    /// Build a [`PlacardError::Validation`] from any message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PlacardError::Render`] from any message.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PlacardError::Encode`] from any message.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`PlacardError::Persist`] from any message.
    pub fn persist(msg: impl Into<String>) -> Self {
        Self::Persist(msg.into())
    }
}
