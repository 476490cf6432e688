//! Scrolling waveform pipeline
//!
//! A band-colored amplitude envelope that scrolls under a fixed playhead.
//!
//! ## Architecture
//!
//! - **Viewport** (`Viewport`): visible time span and its column mapping
//! - **Precompute** (`TrackPrecomputer`): one background pass per track that
//!   produces the color timeline, single-flight and generation-tagged
//! - **Render job** (`render_segments`): one envelope + color per column,
//!   run on a worker from an owned `RenderRequest` snapshot
//! - **Drawing** (`draw_frame`, `restore_columns`): software rasterization
//!   into the owned `FrameBuffer`
//! - **Frame manager** (`WaveformDisplay`): the consumer-side state machine
//!   that ties the above together
//!
//! ## Usage
//!
//! ```ignore
//! let mut display = WaveformDisplay::new(&config, pool, Some(analyzer), Some(cache));
//! display.resize(800, 120)?;
//! display.set_samples(samples, &beats);
//!
//! // Every refresh tick:
//! display.set_viewport(position_ms, duration_ms, Some(&beats));
//! match display.poll() {
//!     FrameUpdate::Full => upload(display.frame()),
//!     FrameUpdate::Partial(rect) => upload_rect(display.frame(), rect),
//!     FrameUpdate::None => {}
//! }
//! ```

mod display;
mod draw;
mod precomputer;
mod render;
mod viewport;

pub use display::{FrameState, FrameUpdate, WaveformDisplay, ERROR_MESSAGE, LOAD_TRACK_MESSAGE};

pub use draw::{draw_frame, draw_placeholder, draw_playhead, playhead_strip, restore_columns, FrameOverlay};

pub use precomputer::{PrecomputeEvent, TrackPrecomputer};

pub use render::{
    coalesce_runs, render_segments, time_ticks, visible_beats, ColorRun, RenderRequest, RenderSegment,
    TimeTick,
};

pub use viewport::Viewport;
