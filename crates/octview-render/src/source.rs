use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use image::DynamicImage;
use log::info;

use octview_core::{Dimensions, DispatchReport, ListenerId, ListenerResult, ListenerSet};

/// Events emitted by a base-image source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    ImageLoaded { dimensions: Dimensions },
    ImageCleared,
    /// The processing chain was re-run and the transformed raster changed.
    ProcessingChanged,
}

/// Callback type accepted by [`BaseImageSource::subscribe`].
pub type SourceListener = Box<dyn Fn(&SourceEvent) -> ListenerResult>;

/// Provider of the current transformed scan raster.
///
/// The declared `width`/`height` are what the compositor sizes its canvas to;
/// a raster whose actual size disagrees is rejected at render time.
pub trait BaseImageSource {
    /// The current transformed raster, or `None` when nothing is loaded yet.
    fn current_raster(&self) -> Option<Rc<DynamicImage>>;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    fn subscribe(&self, listener: SourceListener) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId) -> bool;
}

/// In-memory source holding the latest transformed scan.
///
/// The acquisition and processing pipeline pushes results in through
/// [`load`](Self::load) or [`replace`](Self::replace).
pub struct OctImage {
    raster: RefCell<Option<Rc<DynamicImage>>>,
    declared: Cell<Dimensions>,
    listeners: ListenerSet<SourceEvent>,
}

impl OctImage {
    pub fn new() -> Self {
        Self {
            raster: RefCell::new(None),
            declared: Cell::new(Dimensions::default()),
            listeners: ListenerSet::new(),
        }
    }

    /// Publish a new raster whose own size becomes the declared size.
    pub fn load(&self, image: DynamicImage) -> DispatchReport {
        let dimensions = Dimensions::new(image.width(), image.height());
        self.replace(image, dimensions)
    }

    /// Publish a raster together with the size reported by the upstream pipeline.
    pub fn replace(&self, image: DynamicImage, declared: Dimensions) -> DispatchReport {
        info!("Loaded OCT raster, declared {}", declared);
        *self.raster.borrow_mut() = Some(Rc::new(image));
        self.declared.set(declared);
        self.listeners
            .dispatch(&SourceEvent::ImageLoaded { dimensions: declared })
    }

    pub fn clear(&self) -> DispatchReport {
        info!("Cleared OCT raster");
        *self.raster.borrow_mut() = None;
        self.declared.set(Dimensions::default());
        self.listeners.dispatch(&SourceEvent::ImageCleared)
    }

    /// Swap in a re-processed raster of the same scan and notify subscribers.
    pub fn processing_changed(&self, image: DynamicImage) -> DispatchReport {
        *self.raster.borrow_mut() = Some(Rc::new(image));
        self.listeners.dispatch(&SourceEvent::ProcessingChanged)
    }

    pub fn is_loaded(&self) -> bool {
        self.raster.borrow().is_some()
    }
}

impl BaseImageSource for OctImage {
    fn current_raster(&self) -> Option<Rc<DynamicImage>> {
        self.raster.borrow().clone()
    }

    fn width(&self) -> u32 {
        self.declared.get().width
    }

    fn height(&self) -> u32 {
        self.declared.get().height
    }

    fn subscribe(&self, listener: SourceListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

impl Default for OctImage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OctImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OctImage")
            .field("loaded", &self.is_loaded())
            .field("declared", &self.declared.get())
            .field("listeners", &self.listeners)
            .finish()
    }
}
