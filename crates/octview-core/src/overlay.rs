use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The ARGB drawing surface overlays paint on, in image space.
pub type Canvas = image::RgbaImage;

/// Shared handle to an overlay. The producer keeps a clone and may mutate the
/// overlay between renders; it must not hold a mutable borrow across a render.
pub type SharedOverlay = Rc<RefCell<dyn Overlay>>;

/// A named, z-ordered, toggleable drawable layer.
///
/// Lower z-order values are drawn first (further back). Visibility and
/// z-order are read on demand at render time, never cached by the registry.
pub trait Overlay: fmt::Debug {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// Compositing priority.
    fn z_order(&self) -> i32;

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// Paint onto a canvas sized to the base image. Later overlays may paint over this one.
    fn draw(&self, canvas: &mut Canvas);
}

/// Wrap an overlay for registration while keeping a typed handle for its owner.
pub fn shared<O: Overlay + 'static>(overlay: O) -> Rc<RefCell<O>> {
    Rc::new(RefCell::new(overlay))
}
