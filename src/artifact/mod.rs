//! Build artifact retrieval
//!
//! The primary result artifact is published by the build shortly before or
//! after it finishes, so fetching it retries with a fixed delay and never
//! fails the invocation.

mod retriever;

pub use retriever::{ArtifactRetriever, DEFAULT_FETCH_ATTEMPTS, DEFAULT_FETCH_DELAY};
