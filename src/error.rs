//! Session error types

/// Boxed error from the underlying table client
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during session store operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Error returned by DynamoDB (or the SDK), passed through untouched
    #[error("DynamoDB error: {0}")]
    Dynamo(#[source] BoxError),

    /// Error from a non-DynamoDB table backend
    #[error("Session store error: {0}")]
    Store(String),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored item could not be interpreted as a session record
    #[error("Malformed session record: {0}")]
    Malformed(String),

    /// Invalid store options
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SessionError {
    /// Wrap any client error as [`SessionError::Dynamo`]
    pub fn dynamo<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        SessionError::Dynamo(err.into())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}

#[cfg(feature = "dynamodb")]
impl<E, R> From<aws_sdk_dynamodb::error::SdkError<E, R>> for SessionError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    fn from(err: aws_sdk_dynamodb::error::SdkError<E, R>) -> Self {
        SessionError::Dynamo(Box::new(err))
    }
}
