//! Session setup with bounded retry

use crate::retry::RetryPolicy;

use super::transport::{Connector, Credentials, Session, TransportError};

/// Connection attempts exhausted
#[derive(Debug, thiserror::Error)]
#[error("Failed to connect to Jenkins with url '{endpoint}': {source}")]
pub struct ConnectError {
    pub endpoint: String,
    pub attempts: u32,
    pub source: TransportError,
}

/// Open a session, retrying transient failures per `policy`
pub fn connect_with_retry(
    connector: &dyn Connector,
    endpoint: &str,
    credentials: &Credentials,
    policy: &RetryPolicy,
) -> Result<Box<dyn Session>, ConnectError> {
    let outcome = policy.run_observed(
        |_| {
            tracing::info!("Connecting to Jenkins: {}", endpoint);
            connector.connect(endpoint, credentials)
        },
        |attempt, err| {
            tracing::warn!(
                "(Try {}) Failed to connect to Jenkins with url '{}' - Error: '{}'",
                attempt,
                endpoint,
                err
            );
        },
    );

    match outcome {
        Ok(done) => {
            tracing::info!("Successfully connected to Jenkins after '{}' try", done.attempts);
            Ok(done.value)
        }
        Err(exhausted) => Err(ConnectError {
            endpoint: endpoint.to_string(),
            attempts: exhausted.attempts,
            source: exhausted.last_error,
        }),
    }
}
