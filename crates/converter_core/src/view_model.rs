use crate::{DownloadState, Phase, ProgressId, ProgressStatus};

/// Everything a renderer needs, with display strings already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub input: String,
    pub can_validate: bool,
    pub can_convert: bool,
    pub can_download: bool,
    pub metadata: Option<MetadataView>,
    pub progress: Option<ProgressView>,
    pub download: Option<DownloadView>,
    pub error_message: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataView {
    pub title: String,
    pub uploader: String,
    pub duration: String,
    pub views: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub progress_id: ProgressId,
    pub status: ProgressStatus,
    pub percent: u8,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadView {
    pub progress_id: ProgressId,
    /// Service-relative path, e.g. `/download/p1`.
    pub path: String,
    pub state: DownloadState,
}
