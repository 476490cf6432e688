//! Consumer-side visualization widgets for waveline decks
//!
//! This crate drives the analysis in `waveline-core` from a single
//! timer-driven consumer thread. Heavy work goes to a bounded worker pool and
//! comes back through one-shot, generation-tagged results; the consumer owns
//! every frame buffer and never blocks on a job.
//!
//! ## Architecture
//!
//! - **Worker pool** (`WorkerPool`, `PendingJob`): runs jobs off the consumer
//!   thread, turning panics into `ComputeFailure`
//! - **Frame buffer** (`FrameBuffer`, `DirtyRect`): owned RGBA pixels plus
//!   the software drawing primitives both displays share
//! - **Waveform** (`WaveformDisplay`): scrolling band-colored envelope with
//!   beat markers, time ticks and a playhead
//! - **Spectrogram** (`SpectrogramDisplay`): two-pass whole-track heat map
//!   with EQ band tints
//!
//! Painting the frames and rasterizing text labels is left to the host.

pub mod frame_buffer;
pub mod spectrogram;
pub mod theme;
pub mod waveform;
pub mod worker;

// Re-export commonly used items
pub use frame_buffer::{DirtyRect, FrameBuffer, Rgba};
pub use worker::{JobPoll, PendingJob, WorkerPool};

pub use waveform::{
    FrameState, FrameUpdate, RenderRequest, RenderSegment, TimeTick, Viewport, WaveformDisplay,
    ERROR_MESSAGE, LOAD_TRACK_MESSAGE,
};

pub use spectrogram::{SpectrogramDisplay, SpectrogramPass};
