use serde::{Deserialize, Serialize};

use octview_core::{Dimensions, ImagePoint, SurfacePoint};

/// Maps between display-surface and image coordinates.
///
/// When the surface is larger than the image on an axis, the image is centred
/// on that axis; otherwise it is pinned to the surface origin. The mapper is a
/// pure function of the two sizes, so build a fresh one whenever either
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateMapper {
    pub image: Dimensions,
    pub surface: Dimensions,
}

impl CoordinateMapper {
    pub fn new(image: Dimensions, surface: Dimensions) -> Self {
        Self { image, surface }
    }

    /// Surface position of the image's top-left pixel.
    pub fn offsets(&self) -> (i32, i32) {
        (
            centering_offset(self.surface.width, self.image.width),
            centering_offset(self.surface.height, self.image.height),
        )
    }

    /// Whether a surface point falls on a pixel of the displayed image.
    ///
    /// The image occupies `[offset, offset + extent)` on each axis: edge pixels
    /// are inside, while the coordinate one past the last pixel is outside (a
    /// closed `[offset, offset + extent]` test would map it to a pixel that does
    /// not exist). Any point is outside when no image is loaded.
    pub fn contains(&self, point: SurfacePoint) -> bool {
        if self.image.is_empty() {
            return false;
        }
        let (offset_x, offset_y) = self.offsets();
        within(point.x, offset_x, self.image.width) && within(point.y, offset_y, self.image.height)
    }

    /// Surface point to image pixel, or `None` for points outside the image.
    pub fn to_image_space(&self, point: SurfacePoint) -> Option<ImagePoint> {
        if !self.contains(point) {
            return None;
        }
        let (offset_x, offset_y) = self.offsets();
        Some(ImagePoint::new(point.x - offset_x, point.y - offset_y))
    }

    /// Image pixel to surface point. Defined for any image point, including
    /// ones outside the image, so overlay geometry can be placed freely;
    /// results saturate at the `i32` range.
    pub fn to_surface_space(&self, point: ImagePoint) -> SurfacePoint {
        let (offset_x, offset_y) = self.offsets();
        SurfacePoint::new(point.x.saturating_add(offset_x), point.y.saturating_add(offset_y))
    }
}

/// `max(0, (surface - image) / 2)` with integer division.
pub fn centering_offset(surface: u32, image: u32) -> i32 {
    if surface > image {
        ((surface - image) / 2) as i32
    } else {
        0
    }
}

fn within(value: i32, offset: i32, extent: u32) -> bool {
    let value = value as i64;
    let start = offset as i64;
    value >= start && value < start + extent as i64
}

/// Free-function form of [`CoordinateMapper::to_image_space`].
pub fn to_image_space(
    point: SurfacePoint,
    image_width: u32,
    image_height: u32,
    surface_width: u32,
    surface_height: u32,
) -> Option<ImagePoint> {
    CoordinateMapper::new(
        Dimensions::new(image_width, image_height),
        Dimensions::new(surface_width, surface_height),
    )
    .to_image_space(point)
}

/// Free-function form of [`CoordinateMapper::to_surface_space`].
pub fn to_surface_space(
    point: ImagePoint,
    image_width: u32,
    image_height: u32,
    surface_width: u32,
    surface_height: u32,
) -> SurfacePoint {
    CoordinateMapper::new(
        Dimensions::new(image_width, image_height),
        Dimensions::new(surface_width, surface_height),
    )
    .to_surface_space(point)
}
