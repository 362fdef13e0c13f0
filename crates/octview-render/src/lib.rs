//! # OCT Viewer Render
//!
//! Keeps a composited raster of the current scan and its visible overlays in
//! sync with the scan source and the setting groups, and maps pointer
//! positions between the display surface and the image.

pub mod compositor;
pub mod mapper;
pub mod source;
pub mod triggers;

pub use compositor::{Composite, Compositor, CompositorEvent, RenderError, RenderSummary, TriggerMode};
pub use mapper::CoordinateMapper;
pub use source::{BaseImageSource, OctImage, SourceEvent};
