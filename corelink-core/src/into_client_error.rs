//! Map transport-level errors to ClientError. For custom HttpTransport implementations.

use crate::ClientError;

/// Convert any error to `ClientError::Transport`. Use in transports: `.map_err(IntoClientError::into_transport_error)`.
pub trait IntoClientError {
    fn into_transport_error(self) -> ClientError;
}

impl<E: std::error::Error + Send + Sync + 'static> IntoClientError for E {
    fn into_transport_error(self) -> ClientError {
        ClientError::Transport(self.to_string())
    }
}
