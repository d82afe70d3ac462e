use crate::{NoticeId, ProgressId, ProgressReport, RequestFailure, RequestId, VideoMetadata};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the URL input. Abandons the current attempt.
    InputChanged(String),
    /// User asked to validate the current input.
    ValidateClicked,
    /// Engine answer to `Effect::Validate`.
    ValidationFinished {
        request: RequestId,
        result: Result<VideoMetadata, RequestFailure>,
    },
    /// User asked to convert the validated URL.
    ConvertClicked,
    /// Engine answer to `Effect::StartConversion`.
    ConversionStartFinished {
        request: RequestId,
        result: Result<ProgressId, RequestFailure>,
    },
    /// One poll tick answered by the service.
    ProgressReported {
        progress_id: ProgressId,
        report: ProgressReport,
    },
    /// One poll tick failed in transport; polling has stopped.
    PollFailed {
        progress_id: ProgressId,
        message: String,
    },
    /// User asked to save the converted file.
    DownloadClicked,
    /// Engine answer to `Effect::Download`: saved location or failure reason.
    DownloadFinished {
        progress_id: ProgressId,
        result: Result<String, String>,
    },
    /// Display time of a notice ran out.
    NoticeExpired { notice_id: NoticeId },
    /// User asked to return to the input phase.
    ResetClicked,
    NoOp,
}
