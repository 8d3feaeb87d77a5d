use thiserror::Error;

/// Errors raised while configuring, restoring or hosting a meter.
#[derive(Error, Debug)]
pub enum MeterError {
    #[error("invalid value range: min {min} must be finite and below max {max}")]
    InvalidRange { min: f32, max: f32 },
    #[error("mark parts must be at least 1, got {0}")]
    InvalidMarkParts(i64),
    #[error("{name} must be positive, got {value}")]
    InvalidDimension { name: &'static str, value: f64 },
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("invalid value for option `{name}`: {reason}")]
    InvalidOption { name: String, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("saved state truncated: expected {expected} bytes, got {actual}")]
    TruncatedState { expected: usize, actual: usize },
    #[error("font error: {0}")]
    Font(String),
    #[error("window error: {0}")]
    Window(String),
}

pub type Result<T> = std::result::Result<T, MeterError>;
