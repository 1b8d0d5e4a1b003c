#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum ApiClientError {
    #[error("Header map construction failed")]
    HeaderMapConstructionFailed,
    #[error("Invalid proxy configuration")]
    InvalidProxyConfiguration,
    #[error("Client construction failed")]
    ClientConstructionFailed,
    #[error("Request body serialization failed")]
    BodySerializationFailed,
    #[error("URL encoding of request payload failed")]
    UrlEncodingFailed,
    #[error("Failed to send request to checkout api {0}")]
    RequestNotSent(String),
    #[error("Failed to decode response")]
    ResponseDecodingFailed,
    #[error("Failed to deserialize {0} response")]
    ResponseDeserializationFailed(&'static str),
    #[error("Server responded with Request Timeout")]
    RequestTimeoutReceived,
    #[error("Server responded with {status_code}: {message}")]
    ErrorResponseReceived { status_code: u16, message: String },
    #[error("Server responded with unexpected response")]
    UnexpectedServerResponse,
}

/// Failure raised while routing an action to its handler.
#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum ActionError {
    #[error("Action type not supported by the SDK - {0}")]
    UnsupportedActionType(String),
}

/// Error published on the delegates' exception streams.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckoutError {
    /// Generic component failure, e.g. a missing token or an unexpected call order.
    #[error("{0}")]
    Component(String),
    /// The shopper closed the 3DS2 challenge.
    #[error("{0}")]
    Cancelled3ds2(String),
    #[error("{0}")]
    Authentication3ds2(String),
    /// The Checkout API could not be reached or answered with an error.
    #[error("{0}")]
    Http(String),
    #[error("{0}")]
    Permission(String),
}

impl CheckoutError {
    pub fn component(message: impl Into<String>) -> Self {
        Self::Component(message.into())
    }

    /// Flattens an error report into a message, keeping the top level context first.
    pub fn from_report<C>(message: &str, report: &error_stack::Report<C>) -> Self
    where
        C: error_stack::Context,
    {
        Self::Component(format!("{message}: {}", report.current_context()))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Component(message)
            | Self::Cancelled3ds2(message)
            | Self::Authentication3ds2(message)
            | Self::Http(message)
            | Self::Permission(message) => message,
        }
    }
}
