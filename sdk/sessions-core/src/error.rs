#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Unable to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),
    #[error("Client key '{0}' is not a valid client key")]
    InvalidClientKey(String),
    #[error("Client key does not match the environment '{0}'")]
    ClientKeyEnvironmentMismatch(common_enums::Environment),
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("Invalid log filtering directive: {0}")]
    InvalidDirective(String),
    #[error("A global tracing subscriber is already installed")]
    SubscriberAlreadySet,
}

/// Integration errors raised by the session entry points. These are programming errors on the
/// merchant side and are never turned into result values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(
        "Sessions flow was already taken over in a previous call, {method} should be implemented"
    )]
    MethodNotImplemented { method: String },
}
