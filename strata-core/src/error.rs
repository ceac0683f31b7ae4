/// Top-level Strata error type.
///
/// All fallible operations in `strata-core` return [`Result<T, StrataError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum StrataError {
    /// Error reading the saved scan-results directory.
    #[error("Scan input error: {0}")]
    Scan(#[from] ScanError),

    /// Error during method extraction (file IO, grammar loading).
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Error communicating with the text-generation backend.
    #[error("Backend error: {0}")]
    Llm(#[from] LlmError),

    /// Error from the node store layer (`SQLite` operations).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors reading the scan collaborator's saved results.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The scan directory has no `summary.txt`.
    #[error("Missing summary.txt in {0}")]
    MissingSummary(String),

    /// `summary.txt` exists but carries no `root:` entry.
    #[error("summary.txt missing 'root' key: {0}")]
    MissingRoot(String),

    /// The scan directory does not follow the `<base>/<app>/<run>` layout.
    #[error("Scan directory must be <base>/<app>/<run>: {0}")]
    Layout(String),

    /// Filesystem I/O error reading scan inputs.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors during method extraction.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// A tree-sitter grammar could not be installed on the parser.
    #[error("Grammar load failed for {language}: {message}")]
    Grammar {
        /// Language identifier whose grammar failed to load.
        language: String,
        /// Description of the loader failure.
        message: String,
    },

    /// Filesystem I/O error reading a source file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from backend interactions.
#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    /// Network-level failure reaching the backend.
    #[error("Network error: {0}")]
    Network(String),

    /// Backend returned a non-success HTTP status.
    #[error("API error (HTTP {status}): {body}")]
    Api {
        /// HTTP status code from the backend.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Backend response body could not be parsed into the expected shape.
    #[error("Response parse error: {0}")]
    Parse(String),

    /// Backend reply carried no `choices[0].message.content`.
    #[error("Response missing choices[0].message.content")]
    MissingContent,

    /// Repaired backend text still failed to decode as a JSON object.
    #[error("Lenient decode failed: {0}")]
    Decode(String),

    /// Request payload serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend configuration is missing or invalid (base URL, model).
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors from the SQLite-backed node store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Underlying `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization/deserialization of a node record failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors in Strata configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Convenience alias for `Result<T, StrataError>`.
pub type Result<T> = std::result::Result<T, StrataError>;
