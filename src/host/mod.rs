//! Orchestrator access
//!
//! Session traits, the Jenkins REST implementation and retried connection
//! setup.

pub mod connect;
pub mod jenkins;
pub mod transport;

pub use connect::{connect_with_retry, ConnectError};
pub use jenkins::{JenkinsConfig, JenkinsConnector, JenkinsSession};
pub use transport::{Artifact, Connector, Credentials, Session, StaticArtifact, TransportError};
