use image::Rgba;
use imageproc::drawing::draw_line_segment_mut;
use serde::{Deserialize, Serialize};

use octview_core::{Canvas, ImagePoint, Overlay};

use crate::z_order;

pub const MAGENTA: [u8; 4] = [255, 0, 255, 255];

/// A traced boundary drawn as connected line segments through its points.
///
/// New traces start hidden; the analysis tool shows them once computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolyLine {
    name: String,
    z_order: i32,
    points: Vec<ImagePoint>,
    color: [u8; 4],
    visible: bool,
}

impl PolyLine {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            z_order: z_order::BOUNDARY_LINES,
            points: Vec::new(),
            color: MAGENTA,
            visible: false,
        }
    }

    pub fn with_z_order(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    pub fn with_color(mut self, r: u8, g: u8, b: u8) -> Self {
        self.color = [r, g, b, 255];
        self
    }

    pub fn with_points(mut self, points: Vec<ImagePoint>) -> Self {
        self.points = points;
        self
    }

    pub fn push(&mut self, point: ImagePoint) {
        self.points.push(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[ImagePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Overlay for PolyLine {
    fn name(&self) -> &str {
        &self.name
    }

    fn z_order(&self) -> i32 {
        self.z_order
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn draw(&self, canvas: &mut Canvas) {
        let color = Rgba(self.color);
        match self.points.as_slice() {
            [] => {}
            [only] => {
                if only.x >= 0
                    && only.y >= 0
                    && (only.x as u32) < canvas.width()
                    && (only.y as u32) < canvas.height()
                {
                    canvas.put_pixel(only.x as u32, only.y as u32, color);
                }
            }
            points => {
                for segment in points.windows(2) {
                    draw_line_segment_mut(canvas, segment[0].to_f32(), segment[1].to_f32(), color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draws_segments_in_magenta() {
        let line = PolyLine::new("ilm").with_points(vec![
            ImagePoint::new(0, 5),
            ImagePoint::new(9, 5),
            ImagePoint::new(9, 9),
        ]);
        let mut canvas = Canvas::new(10, 10);
        line.draw(&mut canvas);
        assert_eq!(*canvas.get_pixel(4, 5), Rgba(MAGENTA));
        assert_eq!(*canvas.get_pixel(9, 8), Rgba(MAGENTA));
        assert_eq!(*canvas.get_pixel(4, 4), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_defaults_and_clipping() {
        let mut line = PolyLine::new("rpe");
        assert!(!line.is_visible());
        assert_eq!(line.z_order(), z_order::BOUNDARY_LINES);

        line.push(ImagePoint::new(-20, -20));
        line.push(ImagePoint::new(40, 40));
        let mut canvas = Canvas::new(8, 8);
        line.draw(&mut canvas);
        assert_eq!(*canvas.get_pixel(3, 3), Rgba(MAGENTA));

        line.clear();
        line.push(ImagePoint::new(100, 100));
        let mut untouched = Canvas::new(8, 8);
        line.draw(&mut untouched);
        assert!(untouched.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }
}
