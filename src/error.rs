use std::fmt;

/// Result type for synapse operations
pub type Result<T> = std::result::Result<T, NetError>;

/// Main error type for the synapse library
#[derive(Debug)]
pub enum NetError {
    /// Malformed or internally inconsistent serialized network data
    InvalidData(String),

    /// Stream transport failure (including unexpected end of stream)
    IoError(String),

    /// Snapshot serialization/deserialization errors
    SerializationError(String),
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::InvalidData(msg) => write!(f, "Invalid network data: {}", msg),
            NetError::IoError(msg) => write!(f, "IO error: {}", msg),
            NetError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for NetError {}

// Conversion from std::io::Error
impl From<std::io::Error> for NetError {
    fn from(err: std::io::Error) -> Self {
        NetError::IoError(err.to_string())
    }
}

// Conversion from bincode::Error
impl From<bincode::Error> for NetError {
    fn from(err: bincode::Error) -> Self {
        NetError::SerializationError(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for NetError {
    fn from(err: serde_json::Error) -> Self {
        NetError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl NetError {
    pub fn invalid_data<S: Into<String>>(msg: S) -> Self {
        NetError::InvalidData(msg.into())
    }
}
