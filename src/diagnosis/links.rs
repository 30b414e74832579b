//! Downstream build links

use std::fmt;

/// Marker that separates a build URL from its console page
pub const CONSOLE_MARKER: &str = "/consoleFull";

/// Link decomposition errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("invalid xmake build url: {0}")]
    TooShort(String),

    #[error("invalid build number '{number}' in url '{url}'")]
    InvalidNumber { url: String, number: String },
}

/// A failed downstream build, decomposed from its URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownstreamLink {
    /// The URL as found in the artifact
    pub url: String,
    /// `folder/job/name`
    pub job_path: String,
    pub job_name: String,
    pub number: u64,
}

impl DownstreamLink {
    /// Decompose a console URL (`.../job/<folder>/job/<name>/<n>/consoleFull...`)
    pub fn from_console_url(url: &str) -> Result<Self, LinkError> {
        let build_url = url.split(CONSOLE_MARKER).next().unwrap_or(url);
        Self::decompose(url, build_url)
    }

    /// Decompose a build URL (`.../job/<folder>/job/<name>/<n>/`)
    pub fn from_build_url(url: &str) -> Result<Self, LinkError> {
        Self::decompose(url, url)
    }

    fn decompose(url: &str, build_url: &str) -> Result<Self, LinkError> {
        let parts: Vec<&str> = build_url.trim_end_matches('/').split('/').collect();
        if parts.len() < 5 {
            return Err(LinkError::TooShort(build_url.to_string()));
        }

        let folder = parts[parts.len() - 4];
        let job_name = parts[parts.len() - 2];
        let number_segment = parts[parts.len() - 1];
        let number = number_segment
            .parse::<u64>()
            .map_err(|_| LinkError::InvalidNumber {
                url: build_url.to_string(),
                number: number_segment.to_string(),
            })?;

        Ok(Self {
            url: url.to_string(),
            job_path: format!("{}/job/{}", folder, job_name),
            job_name: job_name.to_string(),
            number,
        })
    }

    /// Console page of this build
    pub fn console_url(&self) -> String {
        if self.url.contains(CONSOLE_MARKER) {
            self.url.clone()
        } else {
            format!("{}{}", self.url.trim_end_matches('/'), CONSOLE_MARKER)
        }
    }
}

impl fmt::Display for DownstreamLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.job_path, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_url_with_fragment() {
        let link = DownstreamLink::from_console_url("https://host/job/a/job/b/17/consoleFull#L237").unwrap();
        assert_eq!(link.job_path, "a/job/b");
        assert_eq!(link.job_name, "b");
        assert_eq!(link.number, 17);
        assert_eq!(link.url, "https://host/job/a/job/b/17/consoleFull#L237");
    }

    #[test]
    fn test_build_url_with_trailing_slash() {
        let link = DownstreamLink::from_build_url("https://host/job/folder/job/lib-build/4/").unwrap();
        assert_eq!(link.job_path, "folder/job/lib-build");
        assert_eq!(link.number, 4);
        assert_eq!(link.console_url(), "https://host/job/folder/job/lib-build/4/consoleFull");
    }

    #[test]
    fn test_too_short() {
        assert_eq!(
            DownstreamLink::from_console_url("a/b/3/consoleFull"),
            Err(LinkError::TooShort("a/b/3".to_string()))
        );
    }

    #[test]
    fn test_non_numeric_number() {
        let err = DownstreamLink::from_console_url("https://host/job/a/job/b/lastBuild/consoleFull").unwrap_err();
        assert!(matches!(err, LinkError::InvalidNumber { ref number, .. } if number == "lastBuild"));
    }

    #[test]
    fn test_display() {
        let link = DownstreamLink::from_build_url("https://host/job/a/job/b/17").unwrap();
        assert_eq!(link.to_string(), "a/job/b #17");
    }
}
