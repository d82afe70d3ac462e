//! Converter core: pure state machine and view-model helpers.
mod effect;
mod error;
mod format;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, NOTICE_DISPLAY};
pub use error::{ClientError, RequestFailure};
pub use format::{format_duration, format_views};
pub use msg::Msg;
pub use state::{
    download_path, AppState, ConversionJob, DownloadState, NoticeId, Phase, ProgressId,
    ProgressReport, ProgressStatus, RequestId, VideoMetadata,
};
pub use update::update;
pub use view_model::{AppViewModel, DownloadView, MetadataView, ProgressView};
