//! Converter engine: HTTP calls to the conversion service and effect execution.
mod client;
mod endpoint;
mod engine;
mod persist;
mod poll;
mod types;
mod wire;

pub use client::{ConversionService, ReqwestService, ServiceSettings};
pub use endpoint::{ServiceEndpoint, DEFAULT_BASE_URL};
pub use engine::{EngineCommand, EngineEvents, EngineHandle};
pub use persist::{ensure_output_dir, sanitize_filename, PendingFile, PersistError};
pub use poll::{run_poll_loop, ChannelEventSink, EventSink, PollSlot};
pub use types::{
    EngineEvent, FailureKind, JobStatus, ProgressSnapshot, RequestId, ServiceError, VideoInfo,
};
