use converter_core::{AppViewModel, DownloadState, Phase, ProgressStatus};
use converter_engine::ServiceEndpoint;

const BAR_WIDTH: usize = 20;

/// Turns a view-model into the lines of one status frame.
pub fn render(view: &AppViewModel, endpoint: &ServiceEndpoint) -> Vec<String> {
    let mut lines = vec![format!("Status: {}", phase_label(view.phase))];

    if let Some(meta) = &view.metadata {
        lines.push(format!("Title: {}", meta.title));
        lines.push(format!("Uploader: {}", meta.uploader));
        lines.push(format!("Duration: {} | Views: {}", meta.duration, meta.views));
        if let Some(thumbnail) = &meta.thumbnail {
            lines.push(format!("Thumbnail: {thumbnail}"));
        }
    }

    // The download line replaces the progress bar once the job is done.
    match (&view.download, &view.progress) {
        (Some(download), _) => {
            let link = endpoint.download_url(download.progress_id.as_str());
            lines.push(match &download.state {
                DownloadState::Available => format!("Download: {link}"),
                DownloadState::Saving => format!("Download: {link} (saving...)"),
                DownloadState::Saved { location } => {
                    format!("Download: {link} (saved to {location})")
                }
            });
        }
        (None, Some(progress)) => {
            let marker = match progress.status {
                ProgressStatus::Error => " failed",
                _ => "",
            };
            lines.push(format!(
                "{} {:>3}% {}{}",
                progress_bar(progress.percent),
                progress.percent,
                progress.message,
                marker
            ));
        }
        (None, None) => {}
    }

    if let Some(message) = &view.error_message {
        lines.push(format!("Error: {message}"));
    }

    let actions = available_actions(view);
    if !actions.is_empty() {
        lines.push(format!("Actions: {}", actions.join(", ")));
    }
    lines
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Waiting for a URL",
        Phase::Validating => "Validating...",
        Phase::Validated => "Ready to convert",
        Phase::Converting => "Converting...",
        Phase::Completed => "Conversion finished",
        Phase::Errored => "Failed",
    }
}

fn available_actions(view: &AppViewModel) -> Vec<&'static str> {
    let mut actions = Vec::new();
    if view.can_convert {
        actions.push("convert");
    }
    if view.can_download {
        actions.push("download");
    }
    if view.phase != Phase::Idle {
        actions.push("reset");
    }
    actions
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
