use thiserror::Error;

/// User-facing failure of one attempt. None of these are fatal to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    ConversionRequest(String),
    #[error("connection error: {0}")]
    Transport(String),
    /// The service reported `status: error` while polling.
    #[error("{0}")]
    RemoteJob(String),
    #[error("download failed: {0}")]
    Download(String),
}

/// Outcome of a request that did not succeed, as reported back by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// The service answered and refused the request.
    Rejected(String),
    /// The request never produced a usable answer.
    Transport(String),
}
