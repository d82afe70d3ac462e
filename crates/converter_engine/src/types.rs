use std::fmt;
use std::path::PathBuf;

pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration_secs: Option<u64>,
    pub view_count: Option<u64>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Converting,
    Completed,
    Error,
}

impl JobStatus {
    /// Maps the service's status string. The backend also reports intermediate
    /// stages (`downloading`, `processing`) which all count as converting, and
    /// `not_found` for ids it no longer knows.
    pub fn from_wire(status: &str) -> Self {
        match status {
            "pending" | "starting" => JobStatus::Pending,
            "completed" => JobStatus::Completed,
            "error" | "not_found" => JobStatus::Error,
            _ => JobStatus::Converting,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub status: JobStatus,
    pub percent: u8,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ValidationCompleted {
        request: RequestId,
        result: Result<VideoInfo, ServiceError>,
    },
    ConversionStarted {
        request: RequestId,
        result: Result<String, ServiceError>,
    },
    Progress {
        progress_id: String,
        snapshot: ProgressSnapshot,
    },
    /// The poll loop for `progress_id` hit a transport failure and stopped.
    PollFailed {
        progress_id: String,
        error: ServiceError,
    },
    DownloadCompleted {
        progress_id: String,
        result: Result<PathBuf, ServiceError>,
    },
    TimerElapsed {
        token: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// True when the service answered and refused the request, as opposed to
    /// the request failing on the way.
    pub fn is_rejection(&self) -> bool {
        self.kind == FailureKind::Rejected
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidBaseUrl,
    /// The service understood the request and said no; `message` is its reason.
    Rejected,
    HttpStatus(u16),
    Timeout,
    Network,
    /// The body was not the JSON shape the call expects.
    Decode,
    TooLarge {
        max_bytes: u64,
        actual: Option<u64>,
    },
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidBaseUrl => write!(f, "invalid base url"),
            FailureKind::Rejected => write!(f, "rejected"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::TooLarge { max_bytes, .. } => {
                write!(f, "response over {max_bytes} bytes")
            }
            FailureKind::Io => write!(f, "io error"),
        }
    }
}
