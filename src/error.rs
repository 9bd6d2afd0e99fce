//! Error types for avistar.

/// Result type alias for avistar operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for avistar.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// No valid image inputs found.
    #[error("no valid image files found in the provided paths")]
    NoValidImageFiles,

    /// Image could not be decoded.
    #[error("failed to decode image '{source_name}'")]
    ImageDecode {
        /// Path or URL of the image.
        source_name: String,
        /// Underlying decode error.
        #[source]
        source: image::ImageError,
    },

    /// Image could not be fetched from a remote URL.
    #[error("failed to fetch image from '{url}'")]
    ImageFetch {
        /// URL that failed.
        url: String,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: std::path::PathBuf,
    },

    /// Failed to load the detection model.
    #[error("failed to load detection model: {reason}")]
    ModelLoad {
        /// Description of the load failure.
        reason: String,
    },

    /// Inference execution failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Model output tensor has a shape the decoder cannot interpret.
    #[error("invalid model output shape: expected {expected}, got {got}")]
    InvalidOutputShape {
        /// Shape the decoder expected.
        expected: String,
        /// Shape the model produced.
        got: String,
    },

    /// A stopped stream controller cannot be started again.
    #[error("stream controller cannot be restarted once stopped")]
    StreamRestart,

    /// Failed to write a captured frame.
    #[error("failed to write capture file '{path}'")]
    CaptureWrite {
        /// Path to the capture file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to write JSON results.
    #[error("failed to write results file '{path}'")]
    ResultWrite {
        /// Path to the results file.
        path: std::path::PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}
