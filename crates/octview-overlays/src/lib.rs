//! # OCT Viewer Overlays
//!
//! Concrete overlays drawn over the OCT scan: traced layer boundaries, scale
//! bars, the LRP selection window and reflectivity peak markers.
//!
//! Overlays draw in image coordinates onto the compositor's canvas. Anything
//! outside the canvas is clipped.

pub mod lrp;
pub mod markers;
pub mod polyline;
pub mod scale_bar;
pub mod z_order;

pub use lrp::{LrpSelection, LRP_SELECTION_NAME};
pub use markers::{PeakMarkers, PEAK_MARKERS_NAME};
pub use polyline::PolyLine;
pub use scale_bar::{ScaleBars, SCALE_BARS_NAME};
