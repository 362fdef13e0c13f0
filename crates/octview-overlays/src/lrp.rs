use std::rc::Rc;

use image::Rgba;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use octview_core::catalog::lrp;
use octview_core::{Canvas, Overlay, SettingGroup};

use crate::z_order;

pub const LRP_SELECTION_NAME: &str = "lrpSelection";

/// Outline of the window an LRP is sampled from.
///
/// The window is `lrpWidth` columns wide centred on the selected column and
/// `lrpHeight` rows tall centred vertically, both read from the LRP settings
/// at draw time. Nothing is shown until a column is selected.
#[derive(Debug)]
pub struct LrpSelection {
    settings: Rc<SettingGroup>,
    column: Option<i32>,
    visible: bool,
    color: Rgba<u8>,
}

impl LrpSelection {
    pub fn new(settings: Rc<SettingGroup>) -> Self {
        Self {
            settings,
            column: None,
            visible: true,
            color: Rgba([255, 255, 0, 255]),
        }
    }

    pub fn select(&mut self, column: i32) {
        self.column = Some(column);
    }

    pub fn clear(&mut self) {
        self.column = None;
    }

    pub fn column(&self) -> Option<i32> {
        self.column
    }

    /// Window size from the settings, clipped to the canvas.
    fn window_size(&self, canvas_width: u32, canvas_height: u32) -> (u32, u32) {
        let width = self.settings.get_int(lrp::LRP_WIDTH).unwrap_or(1).max(1);
        let height = self.settings.get_int(lrp::LRP_HEIGHT).unwrap_or(1).max(1);
        (
            (width as u64).min(canvas_width as u64) as u32,
            (height as u64).min(canvas_height as u64) as u32,
        )
    }
}

impl Overlay for LrpSelection {
    fn name(&self) -> &str {
        LRP_SELECTION_NAME
    }

    fn z_order(&self) -> i32 {
        z_order::LRP_SELECTION
    }

    fn is_visible(&self) -> bool {
        self.visible && self.column.is_some()
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn draw(&self, canvas: &mut Canvas) {
        let Some(column) = self.column else {
            return;
        };
        let (width, height) = self.window_size(canvas.width(), canvas.height());
        if width == 0 || height == 0 {
            return;
        }
        let left = column as i64 - (width / 2) as i64;
        let right = left + width as i64 - 1;
        if right < 0 || left >= canvas.width() as i64 {
            return;
        }
        // left is now within one window width of the canvas
        let top = ((canvas.height() - height) / 2) as i32;
        draw_hollow_rect_mut(canvas, Rect::at(left as i32, top).of_size(width, height), self.color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octview_core::catalog::lrp_settings;

    const YELLOW: [u8; 4] = [255, 255, 0, 255];

    #[test]
    fn test_hidden_until_selected() {
        let mut selection = LrpSelection::new(Rc::new(lrp_settings()));
        assert!(!selection.is_visible());
        selection.select(4);
        assert!(selection.is_visible());
        selection.set_visible(false);
        assert!(!selection.is_visible());
        selection.set_visible(true);
        selection.clear();
        assert!(!selection.is_visible());
        assert_eq!(selection.column(), None);
    }

    #[test]
    fn test_outline_centred_on_column() {
        let mut selection = LrpSelection::new(Rc::new(lrp_settings()));
        selection.select(10);
        // lrpHeight 450 is clipped to the canvas height
        let mut canvas = Canvas::new(20, 20);
        selection.draw(&mut canvas);
        assert_eq!(canvas.get_pixel(8, 10).0, YELLOW);
        assert_eq!(canvas.get_pixel(12, 10).0, YELLOW);
        assert_eq!(canvas.get_pixel(10, 0).0, YELLOW);
        assert_eq!(canvas.get_pixel(10, 19).0, YELLOW);
        assert_eq!(canvas.get_pixel(10, 10).0, [0, 0, 0, 0]);
        assert_eq!(canvas.get_pixel(7, 10).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_window_follows_settings() {
        let settings = Rc::new(lrp_settings());
        assert!(settings.set(lrp::LRP_WIDTH, 3).unwrap().is_clean());
        assert!(settings.set(lrp::LRP_HEIGHT, 6).unwrap().is_clean());
        let mut selection = LrpSelection::new(settings);
        selection.select(5);
        let mut canvas = Canvas::new(10, 10);
        selection.draw(&mut canvas);
        // columns 4..=6, rows 2..=7
        assert_eq!(canvas.get_pixel(4, 2).0, YELLOW);
        assert_eq!(canvas.get_pixel(6, 7).0, YELLOW);
        assert_eq!(canvas.get_pixel(5, 1).0, [0, 0, 0, 0]);
        assert_eq!(canvas.get_pixel(5, 8).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_window_partly_off_canvas() {
        let mut selection = LrpSelection::new(Rc::new(lrp_settings()));
        selection.select(0);
        let mut canvas = Canvas::new(20, 20);
        selection.draw(&mut canvas);
        // columns -2..=2, only the right edge lands on the canvas
        assert_eq!(canvas.get_pixel(2, 10).0, YELLOW);
        assert_eq!(canvas.get_pixel(0, 10).0, [0, 0, 0, 0]);
        assert_eq!(canvas.get_pixel(0, 0).0, YELLOW);
    }

    #[test]
    fn test_huge_width_is_clipped_to_canvas() {
        let settings = Rc::new(lrp_settings());
        assert!(settings.set(lrp::LRP_WIDTH, 4_000_000_000i64).unwrap().is_clean());
        let mut selection = LrpSelection::new(settings);
        selection.select(10);
        let mut canvas = Canvas::new(20, 20);
        selection.draw(&mut canvas);
        // 20 columns wide starting at column 0
        assert_eq!(canvas.get_pixel(0, 10).0, YELLOW);
        assert_eq!(canvas.get_pixel(19, 10).0, YELLOW);
        assert_eq!(canvas.get_pixel(10, 10).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_off_canvas_columns_draw_nothing() {
        let mut selection = LrpSelection::new(Rc::new(lrp_settings()));
        for column in [i32::MIN, -3, 22, i32::MAX] {
            selection.select(column);
            let mut canvas = Canvas::new(20, 20);
            selection.draw(&mut canvas);
            assert!(canvas.pixels().all(|p| p.0 == [0, 0, 0, 0]));
        }
    }
}
