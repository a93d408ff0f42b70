use crate::loader::SourceKey;

/// Every failure the visualizer can hit. None of these are shown to the user;
/// the worst visible outcome is the placeholder frame staying up.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    #[error("source {0} is not loaded")]
    SourceUnavailable(SourceKey),

    #[error("no image source could be loaded")]
    NoSources,

    #[error("failed to read image source: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("dimension mismatch: {key} is {actual:?}, working size is {expected:?}")]
    DimensionMismatch {
        key: SourceKey,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("invalid colour: {0}")]
    InvalidColor(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Task(String),
}
