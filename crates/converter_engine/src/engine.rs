use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use converter_logging::{converter_debug, converter_info};

use crate::poll::{run_poll_loop, ChannelEventSink, PollSlot};
use crate::{ConversionService, EngineEvent, RequestId, ServiceSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Validate { request: RequestId, url: String },
    Convert { request: RequestId, url: String },
    StartPolling { progress_id: String },
    StopPolling { progress_id: String },
    Download { progress_id: String },
    /// Emits [`EngineEvent::TimerElapsed`] with `token` once `after` has passed.
    ScheduleTimer { token: u64, after: Duration },
}

/// Runs service calls on a background tokio runtime and reports back through
/// [`EngineEvent`]s. At most one poll loop is alive at any time.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(
        service: Arc<dyn ConversionService>,
        settings: ServiceSettings,
    ) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            let mut polls = PollSlot::new();
            while let Ok(command) = cmd_rx.recv() {
                handle_command(
                    &runtime,
                    &service,
                    &settings,
                    &mut polls,
                    command,
                    &event_tx,
                );
            }
            polls.cancel_active();
            converter_debug!("engine command loop stopped");
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    /// Receiving end that does not keep the engine alive. Once every handle
    /// is dropped the engine shuts down and [`EngineEvents::recv`] returns `None`.
    pub fn events(&self) -> EngineEvents {
        EngineEvents {
            event_rx: Arc::clone(&self.event_rx),
        }
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }
}

#[derive(Clone)]
pub struct EngineEvents {
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineEvents {
    /// Blocks for the next event; `None` once the engine has shut down.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv().ok()
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    service: &Arc<dyn ConversionService>,
    settings: &ServiceSettings,
    polls: &mut PollSlot,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Validate { request, url } => {
            let service = service.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = service.validate(&url).await;
                let _ = event_tx.send(EngineEvent::ValidationCompleted { request, result });
            });
        }
        EngineCommand::Convert { request, url } => {
            let service = service.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = service.start_conversion(&url).await;
                let _ = event_tx.send(EngineEvent::ConversionStarted { request, result });
            });
        }
        EngineCommand::StartPolling { progress_id } => {
            converter_info!("start polling progress_id={}", progress_id);
            let token = polls.start(&progress_id);
            let service = service.clone();
            let sink = ChannelEventSink::new(event_tx.clone());
            let period = settings.poll_interval;
            runtime.spawn(async move {
                run_poll_loop(service.as_ref(), &progress_id, period, token, &sink).await;
            });
        }
        EngineCommand::StopPolling { progress_id } => {
            polls.stop(&progress_id);
        }
        EngineCommand::Download { progress_id } => {
            let service = service.clone();
            let event_tx = event_tx.clone();
            let dest: PathBuf = settings.output_dir.clone();
            runtime.spawn(async move {
                let result = service.download(&progress_id, &dest).await;
                let _ = event_tx.send(EngineEvent::DownloadCompleted {
                    progress_id,
                    result,
                });
            });
        }
        EngineCommand::ScheduleTimer { token, after } => {
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                tokio::time::sleep(after).await;
                let _ = event_tx.send(EngineEvent::TimerElapsed { token });
            });
        }
    }
}
