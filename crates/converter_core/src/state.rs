use std::fmt;

use crate::view_model::{AppViewModel, DownloadView, MetadataView, ProgressView};
use crate::{format_duration, format_views, ClientError};

pub type RequestId = u64;
pub type NoticeId = u64;

/// Opaque identifier the service hands out for one conversion job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressId(String);

impl ProgressId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Service-relative path of the converted file for a job.
pub fn download_path(progress_id: &ProgressId) -> String {
    format!("/download/{}", progress_id.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    Validated,
    Converting,
    Completed,
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressStatus {
    #[default]
    Pending,
    Converting,
    Completed,
    Error,
}

impl ProgressStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProgressStatus::Completed | ProgressStatus::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration_secs: Option<u64>,
    pub view_count: Option<u64>,
    pub thumbnail: Option<String>,
}

/// One poll answer, already normalized to 0..=100 percent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub status: ProgressStatus,
    pub percent: u8,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub source_url: String,
    pub progress_id: ProgressId,
    pub status: ProgressStatus,
    pub percent: u8,
    pub message: String,
}

pub(crate) const DEFAULT_PROGRESS_MESSAGE: &str = "Processing...";

impl ConversionJob {
    fn new(source_url: String, progress_id: ProgressId) -> Self {
        Self {
            source_url,
            progress_id,
            status: ProgressStatus::Pending,
            percent: 0,
            message: DEFAULT_PROGRESS_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadState {
    Available,
    Saving,
    Saved { location: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notice {
    pub(crate) id: NoticeId,
    pub(crate) error: ClientError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingRequest {
    Validate(RequestId),
    Convert { request: RequestId, url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    input: String,
    phase: Phase,
    metadata: Option<VideoMetadata>,
    job: Option<ConversionJob>,
    download: Option<(ProgressId, DownloadState)>,
    notice: Option<Notice>,
    pending: Option<PendingRequest>,
    last_request_id: RequestId,
    last_notice_id: NoticeId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn job(&self) -> Option<&ConversionJob> {
        self.job.as_ref()
    }

    /// The job whose poll loop should currently be running, if any.
    pub fn active_poll(&self) -> Option<&ProgressId> {
        match (&self.phase, &self.job) {
            (Phase::Converting, Some(job)) if !job.status.is_terminal() => Some(&job.progress_id),
            _ => None,
        }
    }

    /// The error currently shown to the user, if any.
    pub fn notice(&self) -> Option<&ClientError> {
        self.notice.as_ref().map(|notice| &notice.error)
    }

    /// Returns whether anything visible changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn can_validate(&self) -> bool {
        !self.input.trim().is_empty() && self.phase != Phase::Validating
    }

    pub fn can_convert(&self) -> bool {
        self.metadata.is_some()
            && matches!(
                self.phase,
                Phase::Validated | Phase::Completed | Phase::Errored
            )
    }

    pub fn can_download(&self) -> bool {
        self.phase == Phase::Completed
            && matches!(
                self.download,
                Some((_, DownloadState::Available | DownloadState::Saved { .. }))
            )
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase,
            input: self.input.clone(),
            can_validate: self.can_validate(),
            can_convert: self.can_convert(),
            can_download: self.can_download(),
            metadata: self.metadata.as_ref().map(|meta| MetadataView {
                title: meta
                    .title
                    .clone()
                    .unwrap_or_else(|| "Title unavailable".to_string()),
                uploader: meta
                    .uploader
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                duration: format_duration(meta.duration_secs),
                views: format_views(meta.view_count),
                thumbnail: meta.thumbnail.clone(),
            }),
            progress: self.job.as_ref().map(|job| ProgressView {
                progress_id: job.progress_id.clone(),
                status: job.status,
                percent: job.percent,
                message: job.message.clone(),
            }),
            download: self
                .download
                .as_ref()
                .map(|(progress_id, state)| DownloadView {
                    progress_id: progress_id.clone(),
                    path: download_path(progress_id),
                    state: state.clone(),
                }),
            error_message: self.notice.as_ref().map(|notice| notice.error.to_string()),
            dirty: self.dirty,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Replaces the input text. Returns false when the text did not change.
    pub(crate) fn set_input(&mut self, text: String) -> bool {
        if self.input == text {
            return false;
        }
        self.input = text;
        self.mark_dirty();
        true
    }

    /// Drops metadata, job, download and notice, and forgets any pending request.
    /// Returns the progress id whose poll must be stopped, if one was running.
    pub(crate) fn clear_attempt(&mut self) -> Option<ProgressId> {
        let stop = self.active_poll().cloned();
        self.phase = Phase::Idle;
        self.metadata = None;
        self.job = None;
        self.download = None;
        self.notice = None;
        self.pending = None;
        self.mark_dirty();
        stop
    }

    pub(crate) fn begin_validation(&mut self) -> (RequestId, Option<ProgressId>) {
        let stop = self.clear_attempt();
        let request = self.next_request_id();
        self.pending = Some(PendingRequest::Validate(request));
        self.phase = Phase::Validating;
        (request, stop)
    }

    /// True when `request` is the validation the state is waiting for.
    pub(crate) fn take_pending_validation(&mut self, request: RequestId) -> bool {
        if self.phase == Phase::Validating
            && self.pending == Some(PendingRequest::Validate(request))
        {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn apply_metadata(&mut self, metadata: VideoMetadata) {
        self.metadata = Some(metadata);
        self.phase = Phase::Validated;
        self.mark_dirty();
    }

    pub(crate) fn begin_conversion(&mut self, url: String) -> RequestId {
        let request = self.next_request_id();
        self.pending = Some(PendingRequest::Convert {
            request,
            url,
        });
        self.phase = Phase::Converting;
        self.job = None;
        self.download = None;
        self.notice = None;
        self.mark_dirty();
        request
    }

    /// Returns the source URL when `request` is the conversion start being awaited.
    pub(crate) fn take_pending_conversion(&mut self, request: RequestId) -> Option<String> {
        if self.phase != Phase::Converting || self.job.is_some() {
            return None;
        }
        match self.pending.take() {
            Some(PendingRequest::Convert { request: pending, url }) if pending == request => {
                Some(url)
            }
            other => {
                self.pending = other;
                None
            }
        }
    }

    pub(crate) fn track_job(&mut self, source_url: String, progress_id: ProgressId) {
        self.job = Some(ConversionJob::new(source_url, progress_id));
        self.mark_dirty();
    }

    /// Mutable access to the job only while it is the one being polled under `progress_id`.
    pub(crate) fn polled_job_mut(&mut self, progress_id: &ProgressId) -> Option<&mut ConversionJob> {
        if self.active_poll() != Some(progress_id) {
            return None;
        }
        self.mark_dirty();
        self.job.as_mut()
    }

    pub(crate) fn complete(&mut self, progress_id: ProgressId) {
        self.phase = Phase::Completed;
        self.download = Some((progress_id, DownloadState::Available));
        self.mark_dirty();
    }

    /// Moves to `Errored` and raises a notice for `error`.
    pub(crate) fn fail(&mut self, error: ClientError) -> NoticeId {
        self.phase = Phase::Errored;
        self.pending = None;
        self.raise_notice(error)
    }

    pub(crate) fn raise_notice(&mut self, error: ClientError) -> NoticeId {
        self.last_notice_id += 1;
        let id = self.last_notice_id;
        self.notice = Some(Notice { id, error });
        self.mark_dirty();
        id
    }

    /// Clears the notice if it is still `notice_id`; an errored attempt falls back
    /// to the phase the user can act from.
    pub(crate) fn dismiss_notice(&mut self, notice_id: NoticeId) {
        if self.notice.as_ref().map(|notice| notice.id) != Some(notice_id) {
            return;
        }
        self.notice = None;
        if self.phase == Phase::Errored {
            self.phase = if self.metadata.is_some() {
                Phase::Validated
            } else {
                Phase::Idle
            };
        }
        self.mark_dirty();
    }

    /// Marks the download as in flight. Returns the id to fetch when allowed.
    pub(crate) fn begin_download(&mut self) -> Option<ProgressId> {
        if !self.can_download() {
            return None;
        }
        let (progress_id, state) = self.download.as_mut()?;
        *state = DownloadState::Saving;
        let progress_id = progress_id.clone();
        self.mark_dirty();
        Some(progress_id)
    }

    /// Mutable download state while a save for `progress_id` is in flight.
    pub(crate) fn saving_download_mut(
        &mut self,
        progress_id: &ProgressId,
    ) -> Option<&mut DownloadState> {
        match self.download.as_mut() {
            Some((id, state)) if id == progress_id && *state == DownloadState::Saving => {
                self.dirty = true;
                Some(state)
            }
            _ => None,
        }
    }

    fn next_request_id(&mut self) -> RequestId {
        self.last_request_id += 1;
        self.last_request_id
    }
}
