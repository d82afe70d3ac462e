use url::Url;

use crate::{FailureKind, ServiceError};

/// Base used when no API base is configured. A browser would fall back to its
/// own origin; a native client talks to the backend on its default port.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Normalized service base URL and the four call URLs derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    base: Url,
}

impl ServiceEndpoint {
    /// Parses a configured base. Empty means the default backend; one trailing
    /// slash is ignored so `https://host/api/` and `https://host/api` match.
    pub fn parse(base: &str) -> Result<Self, ServiceError> {
        let trimmed = base.trim();
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let raw = if trimmed.is_empty() {
            DEFAULT_BASE_URL
        } else {
            trimmed
        };

        let base = Url::parse(raw)
            .map_err(|err| ServiceError::new(FailureKind::InvalidBaseUrl, err.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ServiceError::new(
                FailureKind::InvalidBaseUrl,
                format!("unsupported scheme {}", base.scheme()),
            ));
        }
        if base.cannot_be_a_base() {
            return Err(ServiceError::new(
                FailureKind::InvalidBaseUrl,
                "url cannot be used as a base",
            ));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn validate_url(&self) -> Url {
        self.join(&["validate"])
    }

    pub fn convert_url(&self) -> Url {
        self.join(&["convert"])
    }

    pub fn progress_url(&self, progress_id: &str) -> Url {
        self.join(&["progress", progress_id])
    }

    pub fn download_url(&self, progress_id: &str) -> Url {
        self.join(&["download", progress_id])
    }

    fn join(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `parse` rejected cannot-be-a-base URLs, so the segments are always editable.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
