use std::process::ExitCode;
use std::sync::{mpsc, Arc};

use anyhow::Context;
use chrono::Local;
use converter_core::{update, AppState, AppViewModel, DownloadState, Msg, Phase};
use converter_engine::{EngineHandle, ReqwestService, ServiceEndpoint};
use converter_logging::{converter_debug, converter_info, converter_warn};

use crate::config::ClientConfig;
use crate::effects::EffectRunner;
use crate::input::{spawn_stdin_reader, HELP};
use crate::render::render;

/// Everything the main loop reacts to.
#[derive(Debug)]
pub enum Inbox {
    Msg(Msg),
    Quit,
}

pub struct RunOptions {
    /// URL validated right after startup.
    pub initial_url: Option<String>,
    /// Convert and download without waiting for commands, then exit.
    pub auto: bool,
}

pub fn run_app(config: ClientConfig, options: RunOptions) -> anyhow::Result<ExitCode> {
    if options.auto && options.initial_url.is_none() {
        anyhow::bail!("--auto needs a URL argument");
    }
    let endpoint = ServiceEndpoint::parse(&config.api_base)
        .with_context(|| format!("invalid service base URL {:?}", config.api_base))?;
    let settings = config.service_settings();
    let service = ReqwestService::new(endpoint.clone(), &settings)
        .context("failed to build HTTP client")?;
    let engine = EngineHandle::new(Arc::new(service), settings)
        .context("failed to start engine runtime")?;
    converter_info!("Using conversion service at {}", endpoint.base());

    let (tx, rx) = mpsc::channel::<Inbox>();
    let runner = EffectRunner::new(engine, tx.clone());
    spawn_stdin_reader(tx.clone(), !options.auto);

    if let Some(url) = options.initial_url {
        let _ = tx.send(Inbox::Msg(Msg::InputChanged(url)));
        let _ = tx.send(Inbox::Msg(Msg::ValidateClicked));
    }
    if !options.auto {
        println!("{HELP}");
    }

    let mut autopilot = options.auto.then(Autopilot::default);
    let mut state = AppState::new();
    let mut shown: Vec<String> = Vec::new();

    let code = loop {
        let msg = match rx.recv() {
            Ok(Inbox::Msg(msg)) => msg,
            Ok(Inbox::Quit) | Err(_) => break ExitCode::SUCCESS,
        };
        converter_debug!("dispatch {:?}", msg);
        let (next, effects) = update(state, msg);
        state = next;
        runner.enqueue(effects);

        if !state.consume_dirty() {
            continue;
        }
        let view = state.view();
        print_changes(&mut shown, render(&view, &endpoint));

        if let Some(pilot) = autopilot.as_mut() {
            match pilot.next_step(&view) {
                Step::Wait => {}
                Step::Send(msg) => {
                    let _ = tx.send(Inbox::Msg(msg));
                }
                Step::Exit { success: true } => break ExitCode::SUCCESS,
                Step::Exit { success: false } => break ExitCode::FAILURE,
            }
        }
    };

    // Stops any poll loop still running before the process exits.
    let (_, effects) = update(state, Msg::ResetClicked);
    runner.enqueue(effects);
    Ok(code)
}

/// Prints the lines of `frame` that differ from the previous frame.
fn print_changes(shown: &mut Vec<String>, frame: Vec<String>) {
    let stamp = Local::now().format("%H:%M:%S");
    for line in frame.iter().filter(|line| !shown.contains(line)) {
        println!("[{stamp}] {line}");
    }
    *shown = frame;
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Wait,
    Send(Msg),
    Exit { success: bool },
}

/// Drives one URL through convert and download for unattended runs.
#[derive(Debug, Default)]
struct Autopilot {
    convert_sent: bool,
    download_sent: bool,
}

impl Autopilot {
    fn next_step(&mut self, view: &AppViewModel) -> Step {
        if view.phase == Phase::Errored {
            converter_warn!("autopilot stopping: {:?}", view.error_message);
            return Step::Exit { success: false };
        }
        if let Some(download) = &view.download {
            if matches!(download.state, DownloadState::Saved { .. }) {
                return Step::Exit { success: true };
            }
        }
        if self.download_sent && view.error_message.is_some() {
            return Step::Exit { success: false };
        }
        if view.phase == Phase::Validated && view.can_convert && !self.convert_sent {
            self.convert_sent = true;
            return Step::Send(Msg::ConvertClicked);
        }
        if view.phase == Phase::Completed && view.can_download && !self.download_sent {
            self.download_sent = true;
            return Step::Send(Msg::DownloadClicked);
        }
        // A notice during validation leaves the phase at Idle.
        if view.phase == Phase::Idle && view.error_message.is_some() {
            return Step::Exit { success: false };
        }
        Step::Wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converter_core::{DownloadView, ProgressId};

    fn view(phase: Phase) -> AppViewModel {
        AppViewModel {
            phase,
            ..AppViewModel::default()
        }
    }

    #[test]
    fn autopilot_converts_once_then_downloads_once() {
        let mut pilot = Autopilot::default();
        let validated = AppViewModel {
            can_convert: true,
            ..view(Phase::Validated)
        };
        assert_eq!(pilot.next_step(&validated), Step::Send(Msg::ConvertClicked));
        assert_eq!(pilot.next_step(&validated), Step::Wait);

        let completed = AppViewModel {
            can_download: true,
            ..view(Phase::Completed)
        };
        assert_eq!(pilot.next_step(&completed), Step::Send(Msg::DownloadClicked));
        assert_eq!(pilot.next_step(&completed), Step::Wait);
    }

    #[test]
    fn autopilot_exits_when_the_file_is_saved() {
        let mut pilot = Autopilot::default();
        let saved = AppViewModel {
            download: Some(DownloadView {
                progress_id: ProgressId::new("p1"),
                path: "/download/p1".to_string(),
                state: DownloadState::Saved {
                    location: "downloads/p1.mp3".to_string(),
                },
            }),
            ..view(Phase::Completed)
        };
        assert_eq!(pilot.next_step(&saved), Step::Exit { success: true });
    }

    #[test]
    fn autopilot_fails_on_errors() {
        let mut pilot = Autopilot::default();
        assert_eq!(
            pilot.next_step(&view(Phase::Errored)),
            Step::Exit { success: false }
        );
        let rejected = AppViewModel {
            error_message: Some("Unsupported URL".to_string()),
            ..view(Phase::Idle)
        };
        assert_eq!(pilot.next_step(&rejected), Step::Exit { success: false });
    }

    #[test]
    fn only_changed_lines_are_kept_as_shown() {
        let mut shown = vec!["Status: Validating...".to_string()];
        print_changes(&mut shown, vec!["Status: Ready to convert".to_string()]);
        assert_eq!(shown, vec!["Status: Ready to convert".to_string()]);
    }
}
