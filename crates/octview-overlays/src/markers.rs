use std::rc::Rc;

use image::Rgba;
use imageproc::drawing::draw_cross_mut;

use octview_core::catalog::display;
use octview_core::{Canvas, ImagePoint, Overlay, SettingGroup};

use crate::z_order;

pub const PEAK_MARKERS_NAME: &str = "lrpPeaks";

/// Small crosses marking detected reflectivity peaks on the scan.
///
/// Drawn only while `showLrpPeaks` is on; the setting is read at render time.
#[derive(Debug)]
pub struct PeakMarkers {
    display: Rc<SettingGroup>,
    peaks: Vec<ImagePoint>,
    color: Rgba<u8>,
    enabled: bool,
}

impl PeakMarkers {
    pub fn new(display: Rc<SettingGroup>) -> Self {
        Self {
            display,
            peaks: Vec::new(),
            color: Rgba([0, 255, 0, 255]),
            enabled: true,
        }
    }

    pub fn set_peaks(&mut self, peaks: Vec<ImagePoint>) {
        self.peaks = peaks;
    }

    pub fn peaks(&self) -> &[ImagePoint] {
        &self.peaks
    }
}

impl Overlay for PeakMarkers {
    fn name(&self) -> &str {
        PEAK_MARKERS_NAME
    }

    fn z_order(&self) -> i32 {
        z_order::PEAK_MARKERS
    }

    fn is_visible(&self) -> bool {
        self.enabled && self.display.get_bool(display::SHOW_LRP_PEAKS).unwrap_or(false)
    }

    fn set_visible(&mut self, visible: bool) {
        self.enabled = visible;
    }

    fn draw(&self, canvas: &mut Canvas) {
        for peak in &self.peaks {
            draw_cross_mut(canvas, self.color, peak.x, peak.y);
        }
    }
}
