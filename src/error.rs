//! Error types for the SV2 wizard.

/// Top-level error type for the wizard.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Step graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Artifact sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Step graph integrity errors, raised when a graph is loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Initial step '{0}' not found in graph")]
    MissingInitialStep(String),

    #[error("Step '{step}' references unknown next step '{target}'")]
    DanglingReference { step: String, target: String },

    #[error("Step registered under key '{key}' declares id '{id}'")]
    MismatchedId { key: String, id: String },

    #[error("Question step '{0}' has no options")]
    EmptyQuestion(String),

    #[error("Failed to parse step graph: {0}")]
    Parse(String),
}

/// Errors from rejected navigation intents. State is unchanged when returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("Step '{0}' is not part of the wizard graph")]
    UnknownStep(String),

    #[error("Cannot {intent} from {kind} step '{step}'")]
    InvalidIntent {
        intent: &'static str,
        kind: &'static str,
        step: String,
    },

    #[error("Step '{step}' has no option '{option}'")]
    UnknownOption { step: String, option: String },
}

/// Configuration template errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Unknown config kind: {0}")]
    UnknownConfigKind(String),

    #[error("Invalid value for field {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Unresolved token {{{{{token}}}}} in {kind} template")]
    UnresolvedToken { kind: String, token: String },
}

/// Artifact delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Refusing to write artifact outside the output directory: {0}")]
    InvalidFileName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the wizard.
pub type Result<T> = std::result::Result<T, Error>;
