/// The error type for resolver configuration queries.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Text could not be handed to the foreign runtime
    #[error("Invalid text for foreign string: {reason}")]
    InvalidText { reason: String },

    /// A foreign value was neither a string, an array nor a dictionary
    #[error("Unsupported foreign type: {type_name}")]
    UnsupportedForeignType { type_name: String },

    /// An element of a foreign container failed to convert
    #[error("Failed to convert {container} element: {source}")]
    ConversionFailure {
        container: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// The DNS record has no `ServerAddresses` field
    #[error("empty server list")]
    EmptyServerList,

    /// The configuration service refused to open a session
    #[error("Failed to open configuration session (status {status})")]
    SessionOpen { status: i32 },

    /// The configuration service could not be queried
    #[error("Failed to fetch configuration value (status {status})")]
    Fetch { status: i32 },

    /// Nothing is stored under the requested key
    #[error("No value stored under '{key}'")]
    MissingRecord { key: String },

    /// The stored value has the wrong shape
    #[error("Value stored under '{key}' is {found}, expected a dictionary")]
    UnexpectedRecord { key: String, found: &'static str },

    /// Feature not supported on this platform
    #[error("Feature '{feature}' not supported on {platform}")]
    UnsupportedPlatform { feature: String, platform: String },

    /// A background task running the query did not complete
    #[error("Query task failed: {0}")]
    Task(String),
}

impl Error {
    /// Create a new invalid text error
    pub fn invalid_text(reason: impl Into<String>) -> Self {
        Self::InvalidText {
            reason: reason.into(),
        }
    }

    /// Create a new unsupported foreign type error
    pub fn unsupported_foreign_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedForeignType {
            type_name: type_name.into(),
        }
    }

    /// Wrap the failure of a nested element
    pub fn conversion_failure(container: &'static str, source: Self) -> Self {
        Self::ConversionFailure {
            container,
            source: Box::new(source),
        }
    }

    /// Create a new missing record error
    pub fn missing_record(key: impl Into<String>) -> Self {
        Self::MissingRecord { key: key.into() }
    }

    /// Create a new unexpected record error
    pub fn unexpected_record(key: impl Into<String>, found: &'static str) -> Self {
        Self::UnexpectedRecord {
            key: key.into(),
            found,
        }
    }

    /// Create a new unsupported platform error
    pub fn unsupported_platform(feature: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            feature: feature.into(),
            platform: std::env::consts::OS.to_string(),
        }
    }

    /// The innermost error behind any number of `ConversionFailure` layers
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::ConversionFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A specialized `Result` type for resolver configuration queries.
pub type Result<T> = std::result::Result<T, Error>;
