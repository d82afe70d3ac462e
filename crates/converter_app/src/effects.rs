use std::sync::mpsc;
use std::thread;

use converter_core::{
    Effect, Msg, ProgressId, ProgressReport, ProgressStatus, RequestFailure, VideoMetadata,
};
use converter_engine::{
    EngineCommand, EngineEvent, EngineHandle, JobStatus, ProgressSnapshot, ServiceError,
    VideoInfo,
};
use converter_logging::{converter_debug, converter_info, converter_warn};

use crate::app::Inbox;

/// Executes reducer effects against the engine and feeds engine events back
/// into the inbox as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    inbox: mpsc::Sender<Inbox>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, inbox: mpsc::Sender<Inbox>) -> Self {
        let runner = Self { engine, inbox };
        runner.spawn_event_loop();
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Validate { request, url } => {
                    converter_info!("Validate request={} url={}", request, url);
                    self.engine.send(EngineCommand::Validate { request, url });
                }
                Effect::StartConversion { request, url } => {
                    converter_info!("StartConversion request={} url={}", request, url);
                    self.engine.send(EngineCommand::Convert { request, url });
                }
                Effect::StartPolling { progress_id } => {
                    self.engine.send(EngineCommand::StartPolling {
                        progress_id: progress_id.as_str().to_string(),
                    });
                }
                Effect::StopPolling { progress_id } => {
                    converter_debug!("StopPolling progress_id={}", progress_id);
                    self.engine.send(EngineCommand::StopPolling {
                        progress_id: progress_id.as_str().to_string(),
                    });
                }
                Effect::Download { progress_id } => {
                    converter_info!("Download progress_id={}", progress_id);
                    self.engine.send(EngineCommand::Download {
                        progress_id: progress_id.as_str().to_string(),
                    });
                }
                Effect::ScheduleNoticeDismiss { notice_id, after } => {
                    self.engine.send(EngineCommand::ScheduleTimer {
                        token: notice_id,
                        after,
                    });
                }
            }
        }
    }

    /// Forwards engine events until the engine shuts down or the inbox closes.
    fn spawn_event_loop(&self) {
        let events = self.engine.events();
        let inbox = self.inbox.clone();
        thread::spawn(move || {
            while let Some(event) = events.recv() {
                if inbox.send(Inbox::Msg(event_to_msg(event))).is_err() {
                    break;
                }
            }
            converter_debug!("engine event loop stopped");
        });
    }
}

fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ValidationCompleted { request, result } => Msg::ValidationFinished {
            request,
            result: result.map(map_metadata).map_err(map_failure),
        },
        EngineEvent::ConversionStarted { request, result } => Msg::ConversionStartFinished {
            request,
            result: result.map(ProgressId::new).map_err(map_failure),
        },
        EngineEvent::Progress {
            progress_id,
            snapshot,
        } => Msg::ProgressReported {
            progress_id: ProgressId::new(progress_id),
            report: map_report(snapshot),
        },
        EngineEvent::PollFailed { progress_id, error } => {
            converter_warn!("Polling {} stopped: {}", progress_id, error);
            Msg::PollFailed {
                progress_id: ProgressId::new(progress_id),
                message: error.message,
            }
        }
        EngineEvent::DownloadCompleted {
            progress_id,
            result,
        } => Msg::DownloadFinished {
            progress_id: ProgressId::new(progress_id),
            result: result
                .map(|path| path.display().to_string())
                .map_err(|err| err.message),
        },
        // Timers are only scheduled for notices.
        EngineEvent::TimerElapsed { token } => Msg::NoticeExpired { notice_id: token },
    }
}

fn map_metadata(info: VideoInfo) -> VideoMetadata {
    VideoMetadata {
        title: info.title,
        uploader: info.uploader,
        duration_secs: info.duration_secs,
        view_count: info.view_count,
        thumbnail: info.thumbnail,
    }
}

fn map_report(snapshot: ProgressSnapshot) -> ProgressReport {
    ProgressReport {
        status: map_status(snapshot.status),
        percent: snapshot.percent,
        message: snapshot.message,
    }
}

fn map_status(status: JobStatus) -> ProgressStatus {
    match status {
        JobStatus::Pending => ProgressStatus::Pending,
        JobStatus::Converting => ProgressStatus::Converting,
        JobStatus::Completed => ProgressStatus::Completed,
        JobStatus::Error => ProgressStatus::Error,
    }
}

fn map_failure(err: ServiceError) -> RequestFailure {
    if err.is_rejection() {
        RequestFailure::Rejected(err.message)
    } else {
        RequestFailure::Transport(err.to_string())
    }
}
