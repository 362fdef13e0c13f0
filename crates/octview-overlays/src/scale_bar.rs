use std::rc::Rc;

use image::Rgba;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use log::debug;

use octview_core::catalog::{display, oct};
use octview_core::{Canvas, Overlay, SettingGroup};

use crate::z_order;

pub const SCALE_BARS_NAME: &str = "scaleBars";

/// Horizontal and vertical bars of a fixed physical length in the bottom-left corner.
///
/// Shown only while the display setting for scale bars is on; the setting is
/// read at render time. Bar lengths follow the current micrometre-per-pixel
/// scales of the scan.
#[derive(Debug)]
pub struct ScaleBars {
    display: Rc<SettingGroup>,
    oct: Rc<SettingGroup>,
    length_um: f64,
    thickness: u32,
    margin: u32,
    color: Rgba<u8>,
    enabled: bool,
}

impl ScaleBars {
    pub fn new(display: Rc<SettingGroup>, oct: Rc<SettingGroup>) -> Self {
        Self {
            display,
            oct,
            length_um: 200.0,
            thickness: 3,
            margin: 10,
            color: Rgba([255, 255, 255, 255]),
            enabled: true,
        }
    }

    pub fn with_length_um(mut self, length_um: f64) -> Self {
        self.length_um = length_um;
        self
    }

    pub fn with_thickness(mut self, thickness: u32) -> Self {
        self.thickness = thickness.max(1);
        self
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    /// Bar length in pixels for a given scale, limited to what fits.
    pub fn bar_pixels(&self, um_per_px: f64, available: u32) -> u32 {
        if !um_per_px.is_finite() || um_per_px <= 0.0 {
            return 0;
        }
        let px = (self.length_um / um_per_px).round();
        if px <= 0.0 {
            0
        } else {
            (px as u64).min(available as u64) as u32
        }
    }
}

impl Overlay for ScaleBars {
    fn name(&self) -> &str {
        SCALE_BARS_NAME
    }

    fn z_order(&self) -> i32 {
        z_order::SCALE_BARS
    }

    fn is_visible(&self) -> bool {
        self.enabled
            && self
                .display
                .get_bool(display::DISPLAY_SCALE_BARS_ON_OCT)
                .unwrap_or(false)
    }

    fn set_visible(&mut self, visible: bool) {
        self.enabled = visible;
    }

    fn draw(&self, canvas: &mut Canvas) {
        let (width, height) = canvas.dimensions();
        let inner_w = width.saturating_sub(self.margin.saturating_mul(2));
        let inner_h = height.saturating_sub(self.margin.saturating_mul(2));
        let x_scale = self.oct.get_float(oct::X_SCALE).unwrap_or(0.0);
        let y_scale = self.oct.get_float(oct::Y_SCALE).unwrap_or(0.0);
        let horizontal = self.bar_pixels(x_scale, inner_w);
        let vertical = self.bar_pixels(y_scale, inner_h);
        debug!("Scale bars {}px x {}px for {}um", horizontal, vertical, self.length_um);

        let left = self.margin as i32;
        let bottom = height as i32 - self.margin as i32;
        if horizontal > 0 {
            let rect = Rect::at(left, bottom - self.thickness as i32).of_size(horizontal, self.thickness);
            draw_filled_rect_mut(canvas, rect, self.color);
        }
        if vertical > 0 {
            let rect = Rect::at(left, bottom - vertical as i32).of_size(self.thickness, vertical);
            draw_filled_rect_mut(canvas, rect, self.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octview_core::catalog::{display_settings, oct_settings};

    fn bars() -> (Rc<SettingGroup>, Rc<SettingGroup>, ScaleBars) {
        let display = Rc::new(display_settings());
        let oct = Rc::new(oct_settings());
        let bars = ScaleBars::new(display.clone(), oct.clone())
            .with_length_um(20.0)
            .with_thickness(2)
            .with_margin(5);
        (display, oct, bars)
    }

    #[test]
    fn test_visibility_follows_display_setting() {
        let (display, _oct, mut bars) = bars();
        assert!(bars.is_visible());
        display
            .set(display::DISPLAY_SCALE_BARS_ON_OCT, false)
            .unwrap();
        assert!(!bars.is_visible());
        assert!(display.set(display::DISPLAY_SCALE_BARS_ON_OCT, true).unwrap().is_clean());
        bars.set_visible(false);
        assert!(!bars.is_visible());
    }

    #[test]
    fn test_bar_length_follows_scale() {
        let (_display, oct, bars) = bars();
        let mut canvas = Canvas::new(100, 100);
        bars.draw(&mut canvas);
        // 20um at 1um/px: x in 5..25 on rows 93..95
        assert_eq!(canvas.get_pixel(24, 94).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(25, 94).0, [0, 0, 0, 0]);

        assert!(oct.set(oct::X_SCALE, 2.0).unwrap().is_clean());
        let mut canvas = Canvas::new(100, 100);
        bars.draw(&mut canvas);
        assert_eq!(canvas.get_pixel(14, 94).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(15, 94).0, [0, 0, 0, 0]);
        // vertical bar unaffected: y in 75..95 at x 5..7
        assert_eq!(canvas.get_pixel(5, 75).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(5, 74).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_bar_pixels_edge_cases() {
        let (_display, _oct, bars) = bars();
        assert_eq!(bars.bar_pixels(0.0, 100), 0);
        assert_eq!(bars.bar_pixels(-1.0, 100), 0);
        assert_eq!(bars.bar_pixels(f64::NAN, 100), 0);
        assert_eq!(bars.bar_pixels(0.01, 100), 100);
    }
}
