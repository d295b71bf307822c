/// Everything that can go wrong turning bytes into an `ObjectId` or back.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("invalid hash length: expected {expected} bytes, got {actual}")]
    InvalidHashLength { expected: usize, actual: usize },

    #[error("invalid hex length: expected {expected}, got {actual}")]
    InvalidHexLength { expected: usize, actual: usize },

    #[error("invalid hex character at position {position}: '{character}'")]
    InvalidHex { position: usize, character: char },

    #[error("ambiguous object name: prefix '{prefix}' matches multiple objects")]
    AmbiguousPrefix { prefix: String },

    #[error("SHA-1 collision detected")]
    Sha1Collision,
}
