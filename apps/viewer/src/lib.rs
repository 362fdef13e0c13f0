use std::cell::RefCell;
use std::rc::{Rc, Weak};

use image::DynamicImage;
use log::info;

use octview_core::catalog::{analysis_settings, display_settings, lrp_settings, oct_settings};
use octview_core::{
    shared, DispatchReport, Dimensions, ImagePoint, OverlayRegistry, SettingGroup, SharedOverlay,
    SurfacePoint,
};
use octview_overlays::{LrpSelection, ScaleBars, LRP_SELECTION_NAME};
use octview_render::triggers::{DISPLAY_TRIGGERS, LRP_TRIGGERS, OCT_TRIGGERS};
use octview_render::{Composite, Compositor, OctImage, RenderError};

/// The OCT display: setting groups, scan source, overlays and compositor wired together.
pub struct Viewer {
    pub display: Rc<SettingGroup>,
    pub oct: Rc<SettingGroup>,
    pub lrp: Rc<SettingGroup>,
    pub analysis: Rc<SettingGroup>,
    source: Rc<OctImage>,
    registry: Rc<OverlayRegistry>,
    compositor: Rc<Compositor>,
    lrp_selection: Rc<RefCell<LrpSelection>>,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewer {
    pub fn new() -> Self {
        let display = Rc::new(display_settings());
        let oct = Rc::new(oct_settings());
        let lrp = Rc::new(lrp_settings());
        let analysis = Rc::new(analysis_settings());
        let source = Rc::new(OctImage::new());
        let registry = Rc::new(OverlayRegistry::new());

        let compositor = Compositor::new(source.clone(), registry.clone());
        compositor.watch_settings(&display, DISPLAY_TRIGGERS);
        compositor.watch_settings(&oct, OCT_TRIGGERS);
        let weak_registry: Weak<OverlayRegistry> = Rc::downgrade(&registry);
        compositor.watch_settings_when(&lrp, LRP_TRIGGERS, move || {
            weak_registry
                .upgrade()
                .is_some_and(|registry| registry.is_visible(LRP_SELECTION_NAME))
        });
        compositor.watch_registry();

        // No raster is loaded yet, so these registrations cannot fail a render.
        let scale_bars: SharedOverlay = shared(ScaleBars::new(display.clone(), oct.clone()));
        let _ = registry.add(scale_bars);
        let lrp_selection = shared(LrpSelection::new(lrp.clone()));
        let handle: SharedOverlay = lrp_selection.clone();
        let _ = registry.add(handle);

        Self {
            display,
            oct,
            lrp,
            analysis,
            source,
            registry,
            compositor,
            lrp_selection,
        }
    }

    /// Show a new scan; renders immediately.
    pub fn load_image(&self, image: DynamicImage) -> DispatchReport {
        info!("Loading {}x{} scan", image.width(), image.height());
        self.source.load(image)
    }

    /// Select the LRP at image column `x` and re-render.
    pub fn select_lrp(&self, x: i32) -> Result<Option<Rc<Composite>>, RenderError> {
        self.lrp_selection.borrow_mut().select(x);
        self.compositor.trigger()
    }

    pub fn clear_lrp_selection(&self) -> Result<Option<Rc<Composite>>, RenderError> {
        self.lrp_selection.borrow_mut().clear();
        self.compositor.trigger()
    }

    pub fn selected_lrp(&self) -> Option<i32> {
        self.lrp_selection.borrow().column()
    }

    /// Map a pointer position on a display surface of size `surface` to the scan.
    pub fn surface_to_image(&self, point: SurfacePoint, surface: Dimensions) -> Option<ImagePoint> {
        self.compositor.map_surface_point(point, surface)
    }

    pub fn source(&self) -> &Rc<OctImage> {
        &self.source
    }

    pub fn registry(&self) -> &Rc<OverlayRegistry> {
        &self.registry
    }

    pub fn compositor(&self) -> &Rc<Compositor> {
        &self.compositor
    }

    pub fn current(&self) -> Option<Rc<Composite>> {
        self.compositor.current()
    }
}

/// Initialise `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;
    use octview_core::catalog::{display, lrp, oct};
    use octview_overlays::SCALE_BARS_NAME;

    fn scan(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, image::Luma([40])))
    }

    #[test]
    fn test_default_overlays_registered() {
        let viewer = Viewer::default();
        assert!(viewer.registry().contains(SCALE_BARS_NAME));
        assert!(viewer.registry().contains(LRP_SELECTION_NAME));
        assert!(viewer.current().is_none());
    }

    #[test]
    fn test_load_and_processing_settings_render() {
        init_logging();
        let viewer = Viewer::new();
        assert!(viewer.load_image(scan(40, 30)).is_clean());
        assert_eq!(viewer.compositor().render_count(), 1);
        let composite = viewer.current().unwrap();
        assert_eq!(composite.summary.dimensions, Dimensions::new(40, 30));
        assert_eq!(composite.image.get_pixel(20, 2).0, [40, 40, 40, 255]);

        assert!(viewer.oct.set(oct::X_SCALE, 0.5).unwrap().is_clean());
        assert_eq!(viewer.compositor().render_count(), 2);
        assert!(viewer.display.set(display::DISPLAY_SCALE_BARS_ON_OCT, false).unwrap().is_clean());
        assert_eq!(viewer.compositor().render_count(), 3);
        assert!(viewer.current().unwrap().summary.overlays.is_empty());

        // not a trigger
        assert!(viewer.display.set(display::SHOW_FWHM_ON_LRP, true).unwrap().is_clean());
        assert_eq!(viewer.compositor().render_count(), 3);
    }

    #[test]
    fn test_lrp_sizing_renders_only_with_selection() {
        let viewer = Viewer::new();
        assert!(viewer.load_image(scan(20, 20)).is_clean());
        let before = viewer.compositor().render_count();

        assert!(viewer.lrp.set(lrp::LRP_WIDTH, 3).unwrap().is_clean());
        assert_eq!(viewer.compositor().render_count(), before);

        let composite = viewer.select_lrp(10).unwrap().unwrap();
        assert_eq!(viewer.selected_lrp(), Some(10));
        assert!(composite.summary.overlays.contains(&LRP_SELECTION_NAME.to_string()));
        assert_eq!(composite.image.get_pixel(9, 10).0, [255, 255, 0, 255]);

        assert!(viewer.lrp.set(lrp::LRP_WIDTH, 7).unwrap().is_clean());
        assert_eq!(viewer.compositor().render_count(), before + 2);
        assert_eq!(viewer.current().unwrap().image.get_pixel(7, 10).0, [255, 255, 0, 255]);

        viewer.clear_lrp_selection().unwrap();
        assert!(viewer.lrp.set(lrp::LRP_HEIGHT, 10).unwrap().is_clean());
        assert_eq!(viewer.compositor().render_count(), before + 3);
        assert_eq!(viewer.current().unwrap().image.get_pixel(7, 10).0, [40, 40, 40, 255]);
    }

    #[test]
    fn test_surface_to_image() {
        let viewer = Viewer::new();
        let surface = Dimensions::new(500, 400);
        assert_eq!(viewer.surface_to_image(SurfacePoint::new(250, 200), surface), None);

        assert!(viewer.load_image(scan(400, 300)).is_clean());
        assert_eq!(
            viewer.surface_to_image(SurfacePoint::new(100, 100), surface),
            Some(ImagePoint::new(50, 50))
        );
        assert_eq!(viewer.surface_to_image(SurfacePoint::new(10, 10), surface), None);
    }

    #[test]
    fn test_registry_visibility_rerenders() {
        let viewer = Viewer::new();
        assert!(viewer.load_image(scan(8, 8)).is_clean());
        let before = viewer.compositor().render_count();
        assert!(viewer.registry().set_visible(SCALE_BARS_NAME, false).is_clean());
        assert_eq!(viewer.compositor().render_count(), before + 1);
    }
}
