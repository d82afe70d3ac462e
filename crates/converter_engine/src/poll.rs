use std::sync::mpsc;
use std::time::Duration;

use converter_logging::{converter_debug, converter_warn};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{ConversionService, EngineEvent};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Holds the token of the one poll loop allowed to run.
#[derive(Debug, Default)]
pub struct PollSlot {
    active: Option<(String, CancellationToken)>,
}

impl PollSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels whatever poll is running and hands out a fresh token for `progress_id`.
    pub fn start(&mut self, progress_id: &str) -> CancellationToken {
        self.cancel_active();
        let token = CancellationToken::new();
        self.active = Some((progress_id.to_string(), token.clone()));
        token
    }

    /// Cancels the poll for `progress_id` if it is the active one.
    pub fn stop(&mut self, progress_id: &str) -> bool {
        let is_active = self
            .active
            .as_ref()
            .is_some_and(|(active_id, _)| active_id == progress_id);
        if is_active {
            self.cancel_active();
        }
        is_active
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active
            .as_ref()
            .filter(|(_, token)| !token.is_cancelled())
            .map(|(id, _)| id.as_str())
    }

    pub fn cancel_active(&mut self) {
        if let Some((progress_id, token)) = self.active.take() {
            converter_debug!("cancel poll progress_id={}", progress_id);
            token.cancel();
        }
    }
}

/// Polls `/progress/{id}` every `period` until a terminal status, a transport
/// failure, or cancellation. The first request goes out one period after start.
///
/// Nothing is emitted once `token` is cancelled, including answers to a request
/// that was already in flight.
pub async fn run_poll_loop(
    service: &dyn ConversionService,
    progress_id: &str,
    period: Duration,
    token: CancellationToken,
    sink: &dyn EventSink,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = token.cancelled() => return,
            result = service.progress(progress_id) => result,
        };
        if token.is_cancelled() {
            return;
        }

        match result {
            Ok(snapshot) => {
                let terminal = snapshot.status.is_terminal();
                sink.emit(EngineEvent::Progress {
                    progress_id: progress_id.to_string(),
                    snapshot,
                });
                if terminal {
                    converter_debug!("poll finished progress_id={}", progress_id);
                    return;
                }
            }
            Err(error) => {
                converter_warn!("poll failed progress_id={} error={}", progress_id, error);
                sink.emit(EngineEvent::PollFailed {
                    progress_id: progress_id.to_string(),
                    error,
                });
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_a_poll_cancels_the_previous_one() {
        let mut slot = PollSlot::new();
        let first = slot.start("p1");
        let second = slot.start("p2");

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(slot.active_id(), Some("p2"));
    }

    #[test]
    fn stop_only_cancels_the_matching_poll() {
        let mut slot = PollSlot::new();
        let token = slot.start("p1");

        assert!(!slot.stop("p0"));
        assert!(!token.is_cancelled());

        assert!(slot.stop("p1"));
        assert!(token.is_cancelled());
        assert_eq!(slot.active_id(), None);
    }
}
