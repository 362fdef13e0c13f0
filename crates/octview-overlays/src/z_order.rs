//! Z-order conventions for the built-in overlays.
//!
//! Lower values are drawn first. Renderers break ties by registration order.

/// Selected LRP column outline, drawn under everything else.
pub const LRP_SELECTION: i32 = 500;
/// Traced layer boundaries.
pub const BOUNDARY_LINES: i32 = 11000;
/// Reflectivity peak markers, above the traces they annotate.
pub const PEAK_MARKERS: i32 = 12000;
/// Scale bars stay on top of all analysis graphics.
pub const SCALE_BARS: i32 = 20000;
