//! Core library for the Infinity Comet display animation.
//!
//! Three lemniscate paths are sampled once at startup. Each path is animated
//! by its own timeline, which slides a fixed-size window ("frame") along the
//! path and hands it to a render sink on every pump, producing a comet that
//! chases itself around the figure.

pub mod config;
pub mod curve;
pub mod error;
pub mod frame;
pub mod render;
pub mod scene;
pub mod timeline;

pub use config::{AnimationConfig, AppConfig, CurveConfig, DisplayConfig, StyleConfig};
pub use curve::{
    compute_all_paths, lemniscate, AsymmetryPolicy, CurveKind, CurveOffsets, CurvePaths, Path,
    Point,
};
pub use error::{InfinityError, Result};
pub use frame::{extract_frame, Frame};
pub use render::{
    Area, Color, Display, FlushTarget, Framebuffer, Line, LineHandle, LineStyle, RenderSink,
    Rotation,
};
pub use scene::{Scene, Track, REGISTRATION_ORDER};
pub use timeline::{ManualClock, MonotonicClock, TickSource, Timeline, TimelineState};
