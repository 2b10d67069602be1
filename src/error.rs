//! Error types shared by every stage of a download run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Accepted identifier formats, shown when classification fails.
pub const EXPECTED_ID_FORMAT: &str =
    "a PIRSA video ID (8 digits, e.g. 20200101) or collection ID (C + 5 digits, e.g. C00042)";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Invalid identifier '{raw}': expected {expected}")]
    InvalidIdentifier { raw: String, expected: &'static str },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Unexpected page content at {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{failed} of {total} videos failed to download")]
    PartialFailure { failed: usize, total: usize },

    #[error("Download cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, DownloadError>;

/// Whether an I/O timeout sits anywhere in the error's source chain.
fn caused_by_timeout(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

impl DownloadError {
    pub fn invalid_identifier(raw: &str) -> Self {
        Self::InvalidIdentifier {
            raw: raw.to_string(),
            expected: EXPECTED_ID_FORMAT,
        }
    }

    pub fn network(url: &str, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Wrap a reqwest failure, calling out timeouts explicitly.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() || caused_by_timeout(&err) {
            format!("timed out ({})", err)
        } else if let Some(status) = err.status() {
            format!("HTTP {}", status)
        } else {
            err.to_string()
        };
        Self::network(url, message)
    }

    pub fn parse(url: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Process exit status for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::PartialFailure { .. } => 1,
            Self::InvalidIdentifier { .. } => 2,
            Self::Network { .. } => 3,
            Self::Parse { .. } => 4,
            Self::Filesystem { .. } => 5,
            Self::Cancelled => 130,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_culprit() {
        let err = DownloadError::invalid_identifier("C1234");
        assert!(err.to_string().contains("'C1234'"));
        assert!(err.to_string().contains("8 digits"));

        let err = DownloadError::network("http://pirsa.org/C00042/1", "HTTP 500");
        assert_eq!(
            err.to_string(),
            "Network error for http://pirsa.org/C00042/1: HTTP 500"
        );

        let err = DownloadError::filesystem(
            "My-Series",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().starts_with("Filesystem error at My-Series"));
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            DownloadError::PartialFailure {
                failed: 1,
                total: 2,
            }
            .exit_code(),
            DownloadError::invalid_identifier("x").exit_code(),
            DownloadError::network("u", "m").exit_code(),
            DownloadError::parse("u", "m").exit_code(),
            DownloadError::filesystem("p", io::Error::other("x")).exit_code(),
            DownloadError::Cancelled.exit_code(),
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
        assert!(codes.iter().all(|c| *c != 0));
    }
}
