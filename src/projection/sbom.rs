//! Bill-of-materials download for raw staging repositories

use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use xmake_protocol::stage::FORMAT_RAW;
use xmake_protocol::{StageRepository, StageResult};

use crate::host::{Credentials, TransportError};
use crate::workspace::Workspace;

/// Reports manifest glob covering downloaded SBOM files
pub const SBOM_REPORT_GLOB: &str = "**/sbom/**/*";

/// Directory SBOM files are written below
pub const SBOM_DIR: &str = "sbom";

/// Downloads SBOM documents from a staging repository
pub trait SbomFetcher {
    fn fetch(&self, url: &str, credentials: &Credentials) -> Result<Vec<u8>, TransportError>;
}

/// SBOM download over HTTP with basic auth
#[derive(Debug, Clone)]
pub struct HttpSbomFetcher {
    client: Client,
}

impl HttpSbomFetcher {
    /// Create a new fetcher
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("error creating HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl SbomFetcher for HttpSbomFetcher {
    fn fetch(&self, url: &str, credentials: &Credentials) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&credentials.username, Some(&credentials.token))
            .send()
            .map_err(|e| TransportError::Connection(format!("error sending HTTP request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| TransportError::Connection(format!("error reading response body: {}", e)))
    }
}

fn repository_name(repository: &StageRepository) -> String {
    repository
        .credentials
        .as_ref()
        .and_then(|c| c.repository.clone())
        .unwrap_or_default()
}

/// Asset URLs of a repository; the repository itself when it lists none
pub fn artifact_urls(repository: &StageRepository) -> Vec<String> {
    let urls: Vec<String> = repository
        .components
        .iter()
        .flat_map(|c| c.assets.iter())
        .filter_map(|a| a.url.clone().filter(|u| !u.is_empty()))
        .collect();
    if urls.is_empty() {
        vec![format!("{}sbom", repository_name(repository))]
    } else {
        urls
    }
}

/// Asset file names of a repository; `sbom` when it lists none
pub fn artifact_names(repository: &StageRepository) -> Vec<String> {
    let names: Vec<String> = repository
        .components
        .iter()
        .flat_map(|c| c.assets.iter())
        .filter_map(|a| a.file_name.clone().filter(|n| !n.is_empty()))
        .collect();
    if names.is_empty() {
        vec!["sbom".to_string()]
    } else {
        names
    }
}

/// Download the documents of every raw repository into `sbom/<repository>/`.
///
/// Returns the files written. Failed downloads and writes are logged and
/// skipped.
pub fn download_sboms(stage: &StageResult, fetcher: &dyn SbomFetcher, workspace: &Workspace) -> Vec<PathBuf> {
    let mut written = Vec::new();

    for repository in stage.repositories_with_format(FORMAT_RAW) {
        let credentials = repository.credentials.clone().unwrap_or_default();
        let auth = Credentials::new(
            credentials.user.clone().unwrap_or_default(),
            credentials.password.clone().unwrap_or_default(),
        );
        let directory = PathBuf::from(SBOM_DIR).join(repository_name(repository));
        let names = artifact_names(repository);

        for (index, url) in artifact_urls(repository).iter().enumerate() {
            let data = match fetcher.fetch(url, &auth) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("failed to fetch stageBom file from {}: {}", url, e);
                    continue;
                }
            };

            let file_name = names.get(index).cloned().unwrap_or_else(|| format!("sbom_{}", index));
            match workspace.write_file(directory.join(&file_name), &data) {
                Ok(path) => {
                    tracing::debug!("wrote sbom file {}", path.display());
                    written.push(path);
                }
                Err(e) => tracing::warn!("failed to write sbom file '{}': {}", file_name, e),
            }
        }
    }

    written
}
