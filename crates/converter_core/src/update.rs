use crate::state::DEFAULT_PROGRESS_MESSAGE;
use crate::{
    AppState, ClientError, DownloadState, Effect, Msg, NoticeId, ProgressStatus, RequestFailure,
    NOTICE_DISPLAY,
};

const EMPTY_INPUT: &str = "Please enter a valid URL";
const MISSING_URL: &str = "URL missing";
const REMOTE_JOB_FAILED: &str = "Conversion failed";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            if !state.set_input(text) {
                return (state, Vec::new());
            }
            stop_polling(state.clear_attempt())
        }
        Msg::ValidateClicked => {
            let url = state.input().trim().to_string();
            if url.is_empty() {
                let notice_id = state.raise_notice(ClientError::Input(EMPTY_INPUT.to_string()));
                return (state, vec![schedule_dismiss(notice_id)]);
            }
            if !state.can_validate() {
                return (state, Vec::new());
            }
            let (request, stop) = state.begin_validation();
            let mut effects = stop_polling(stop);
            effects.push(Effect::Validate { request, url });
            effects
        }
        Msg::ValidationFinished { request, result } => {
            if !state.take_pending_validation(request) {
                return (state, Vec::new());
            }
            match result {
                Ok(metadata) => {
                    state.apply_metadata(metadata);
                    Vec::new()
                }
                Err(failure) => {
                    let error = match failure {
                        RequestFailure::Rejected(reason) => ClientError::Validation(reason),
                        RequestFailure::Transport(detail) => ClientError::Transport(detail),
                    };
                    vec![schedule_dismiss(state.fail(error))]
                }
            }
        }
        Msg::ConvertClicked => {
            if !state.can_convert() {
                return (state, Vec::new());
            }
            let url = state.input().trim().to_string();
            if url.is_empty() {
                let notice_id = state.raise_notice(ClientError::Input(MISSING_URL.to_string()));
                return (state, vec![schedule_dismiss(notice_id)]);
            }
            let request = state.begin_conversion(url.clone());
            vec![Effect::StartConversion { request, url }]
        }
        Msg::ConversionStartFinished { request, result } => {
            let Some(source_url) = state.take_pending_conversion(request) else {
                return (state, Vec::new());
            };
            match result {
                Ok(progress_id) => {
                    state.track_job(source_url, progress_id.clone());
                    vec![Effect::StartPolling { progress_id }]
                }
                Err(failure) => {
                    let error = match failure {
                        RequestFailure::Rejected(reason) => ClientError::ConversionRequest(reason),
                        RequestFailure::Transport(detail) => ClientError::Transport(detail),
                    };
                    vec![schedule_dismiss(state.fail(error))]
                }
            }
        }
        Msg::ProgressReported {
            progress_id,
            report,
        } => {
            let Some(job) = state.polled_job_mut(&progress_id) else {
                return (state, Vec::new());
            };
            job.status = report.status;
            job.percent = report.percent.min(100);
            job.message = report
                .message
                .clone()
                .unwrap_or_else(|| DEFAULT_PROGRESS_MESSAGE.to_string());

            match report.status {
                ProgressStatus::Completed => {
                    state.complete(progress_id.clone());
                    vec![Effect::StopPolling { progress_id }]
                }
                ProgressStatus::Error => {
                    let reason = report
                        .message
                        .unwrap_or_else(|| REMOTE_JOB_FAILED.to_string());
                    let notice_id = state.fail(ClientError::RemoteJob(reason));
                    vec![
                        Effect::StopPolling { progress_id },
                        schedule_dismiss(notice_id),
                    ]
                }
                ProgressStatus::Pending | ProgressStatus::Converting => Vec::new(),
            }
        }
        Msg::PollFailed {
            progress_id,
            message,
        } => {
            let Some(job) = state.polled_job_mut(&progress_id) else {
                return (state, Vec::new());
            };
            job.status = ProgressStatus::Error;
            let notice_id = state.fail(ClientError::Transport(message));
            vec![
                Effect::StopPolling { progress_id },
                schedule_dismiss(notice_id),
            ]
        }
        Msg::DownloadClicked => match state.begin_download() {
            Some(progress_id) => vec![Effect::Download { progress_id }],
            None => Vec::new(),
        },
        Msg::DownloadFinished {
            progress_id,
            result,
        } => {
            let Some(download) = state.saving_download_mut(&progress_id) else {
                return (state, Vec::new());
            };
            match result {
                Ok(location) => {
                    *download = DownloadState::Saved { location };
                    Vec::new()
                }
                Err(reason) => {
                    *download = DownloadState::Available;
                    let notice_id = state.raise_notice(ClientError::Download(reason));
                    vec![schedule_dismiss(notice_id)]
                }
            }
        }
        Msg::NoticeExpired { notice_id } => {
            state.dismiss_notice(notice_id);
            Vec::new()
        }
        Msg::ResetClicked => stop_polling(state.clear_attempt()),
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn stop_polling(progress_id: Option<crate::ProgressId>) -> Vec<Effect> {
    progress_id
        .map(|progress_id| Effect::StopPolling { progress_id })
        .into_iter()
        .collect()
}

fn schedule_dismiss(notice_id: NoticeId) -> Effect {
    Effect::ScheduleNoticeDismiss {
        notice_id,
        after: NOTICE_DISPLAY,
    }
}
