use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Required catalog columns could not be resolved from the header line.
    #[error("Required field not found, unmapped headings: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Search engine error: {status}: {reason}")]
    Search { status: u16, reason: String },

    #[error("Unexpected end of file in {file} after line {line}")]
    UnexpectedEof { file: String, line: usize },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Convert anyhow errors to IndexError
impl From<anyhow::Error> for IndexError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<IndexError>() {
            Ok(index_error) => index_error,
            Err(other) => IndexError::Unknown(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
