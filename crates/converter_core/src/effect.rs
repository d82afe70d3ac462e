use std::time::Duration;

use crate::{NoticeId, ProgressId, RequestId};

/// How long an error notice stays visible before it is dismissed.
pub const NOTICE_DISPLAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// POST the URL to `/validate`; answer with `Msg::ValidationFinished`.
    Validate { request: RequestId, url: String },
    /// POST the URL to `/convert`; answer with `Msg::ConversionStartFinished`.
    StartConversion { request: RequestId, url: String },
    /// Begin the fixed-interval poll of `/progress/{id}`, replacing any other poll.
    StartPolling { progress_id: ProgressId },
    StopPolling { progress_id: ProgressId },
    /// Fetch `/download/{id}` to disk; answer with `Msg::DownloadFinished`.
    Download { progress_id: ProgressId },
    /// Deliver `Msg::NoticeExpired` once `after` has elapsed.
    ScheduleNoticeDismiss { notice_id: NoticeId, after: Duration },
}
