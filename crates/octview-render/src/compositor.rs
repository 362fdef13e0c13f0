//! The reactive compositor.
//!
//! On every relevant change the compositor fetches the current base raster,
//! copies it into a freshly allocated ARGB canvas of the declared size, paints
//! the visible overlays in ascending z-order on top (painter's algorithm) and
//! publishes the result, notifying its own listeners once per completed render.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use image::{Rgb, Rgba};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use octview_core::{
    Canvas, Dimensions, DispatchError, ImagePoint, ListenerId, ListenerResult, ListenerSet,
    OverlayRegistry, SettingEvent, SettingGroup, SurfacePoint,
};

use crate::mapper::CoordinateMapper;
use crate::source::{BaseImageSource, SourceEvent};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The source's raster does not have the size the source reports for it.
    #[error("Base raster is {actual} but the source declares {declared}")]
    DimensionMismatch {
        declared: Dimensions,
        actual: Dimensions,
    },
}

/// When a subscribed change turns into a render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerMode {
    /// Render synchronously on every trigger.
    #[default]
    Immediate,
    /// Mark the output dirty; [`Compositor::flush`] renders once.
    Deferred,
}

/// What a completed render produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSummary {
    /// 1 for the first render, incremented by every completed render.
    pub generation: u64,
    pub dimensions: Dimensions,
    /// Names of the overlays drawn, in drawing order.
    pub overlays: Vec<String>,
}

/// Events emitted by a [`Compositor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositorEvent {
    RenderCompleted(RenderSummary),
}

/// A published composited raster. Never mutated after publication.
#[derive(Debug)]
pub struct Composite {
    pub image: Canvas,
    pub summary: RenderSummary,
}

enum Subscription {
    Source(ListenerId),
    Settings(Weak<SettingGroup>, ListenerId),
    Registry(ListenerId),
}

pub struct Compositor {
    source: Rc<dyn BaseImageSource>,
    registry: Rc<OverlayRegistry>,
    mode: Cell<TriggerMode>,
    dirty: Cell<bool>,
    output: RefCell<Option<Rc<Composite>>>,
    generation: Cell<u64>,
    listeners: ListenerSet<CompositorEvent>,
    listener_failures: RefCell<Option<DispatchError>>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl Compositor {
    /// Create a compositor and subscribe it to `source`.
    ///
    /// Setting groups and registry events are opted into separately with
    /// [`watch_settings`](Self::watch_settings) and
    /// [`watch_registry`](Self::watch_registry).
    pub fn new(source: Rc<dyn BaseImageSource>, registry: Rc<OverlayRegistry>) -> Rc<Self> {
        let compositor = Rc::new(Self {
            source,
            registry,
            mode: Cell::new(TriggerMode::Immediate),
            dirty: Cell::new(false),
            output: RefCell::new(None),
            generation: Cell::new(0),
            listeners: ListenerSet::new(),
            listener_failures: RefCell::new(None),
            subscriptions: RefCell::new(Vec::new()),
        });

        let weak = Rc::downgrade(&compositor);
        let id = compositor
            .source
            .subscribe(Box::new(move |event: &SourceEvent| {
                debug!("Source changed: {:?}", event);
                Self::trigger_weak(&weak)
            }));
        compositor
            .subscriptions
            .borrow_mut()
            .push(Subscription::Source(id));
        compositor
    }

    /// Re-render whenever one of `fields` of `group` is set.
    pub fn watch_settings(self: &Rc<Self>, group: &Rc<SettingGroup>, fields: &[&str]) -> ListenerId {
        self.watch_settings_when(group, fields, || true)
    }

    /// Like [`watch_settings`](Self::watch_settings), but only while `guard` holds
    /// at the time of the change.
    pub fn watch_settings_when<G>(
        self: &Rc<Self>,
        group: &Rc<SettingGroup>,
        fields: &[&str],
        guard: G,
    ) -> ListenerId
    where
        G: Fn() -> bool + 'static,
    {
        let fields: HashSet<String> = fields.iter().map(|f| f.to_string()).collect();
        let weak = Rc::downgrade(self);
        let id = group.add_listener(move |event: &SettingEvent| {
            if !fields.contains(event.field()) || !guard() {
                return Ok(());
            }
            Self::trigger_weak(&weak)
        });
        self.subscriptions
            .borrow_mut()
            .push(Subscription::Settings(Rc::downgrade(group), id));
        id
    }

    /// Re-render on every registry mutation made through the registry API.
    pub fn watch_registry(self: &Rc<Self>) -> ListenerId {
        let weak = Rc::downgrade(self);
        let id = self.registry.add_listener(move |event| {
            debug!("Registry changed: {:?}", event);
            Self::trigger_weak(&weak)
        });
        self.subscriptions
            .borrow_mut()
            .push(Subscription::Registry(id));
        id
    }

    /// Unregister from the source, setting groups and registry.
    pub fn detach(&self) {
        for subscription in self.subscriptions.borrow_mut().drain(..) {
            match subscription {
                Subscription::Source(id) => {
                    self.source.unsubscribe(id);
                }
                Subscription::Settings(group, id) => {
                    if let Some(group) = group.upgrade() {
                        group.remove_listener(id);
                    }
                }
                Subscription::Registry(id) => {
                    self.registry.remove_listener(id);
                }
            }
        }
    }

    fn trigger_weak(weak: &Weak<Self>) -> ListenerResult {
        if let Some(compositor) = weak.upgrade() {
            compositor.trigger()?;
        }
        Ok(())
    }

    /// React to a change according to the current [`TriggerMode`].
    pub fn trigger(&self) -> Result<Option<Rc<Composite>>, RenderError> {
        match self.mode.get() {
            TriggerMode::Immediate => self.render(),
            TriggerMode::Deferred => {
                self.dirty.set(true);
                Ok(None)
            }
        }
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        self.mode.get()
    }

    /// Switching back to `Immediate` does not render pending changes; call
    /// [`flush`](Self::flush) for that.
    pub fn set_trigger_mode(&self, mode: TriggerMode) {
        self.mode.set(mode);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Render once if anything triggered since the last render.
    pub fn flush(&self) -> Result<Option<Rc<Composite>>, RenderError> {
        if self.dirty.get() {
            self.render()
        } else {
            Ok(None)
        }
    }

    /// Composite the current base raster and visible overlays.
    ///
    /// Returns `Ok(None)` without touching the previous output when the source
    /// has no raster yet. A raster whose size differs from the declared size is
    /// a [`RenderError::DimensionMismatch`] and nothing is published.
    pub fn render(&self) -> Result<Option<Rc<Composite>>, RenderError> {
        self.dirty.set(false);

        let Some(raster) = self.source.current_raster() else {
            debug!("No base raster, skipping render");
            return Ok(None);
        };

        let declared = self.source.dimensions();
        let actual = Dimensions::new(raster.width(), raster.height());
        if declared != actual {
            return Err(RenderError::DimensionMismatch { declared, actual });
        }

        let mut canvas = Canvas::new(declared.width, declared.height);
        let base = raster.to_rgb8();
        for (x, y, Rgb([r, g, b])) in base.enumerate_pixels() {
            canvas.put_pixel(x, y, Rgba([*r, *g, *b, u8::MAX]));
        }

        let visible = self.registry.visible_sorted_by_z();
        let mut drawn = Vec::with_capacity(visible.len());
        for overlay in &visible {
            let overlay = overlay.borrow();
            debug!("Drawing overlay '{}' (z={})", overlay.name(), overlay.z_order());
            overlay.draw(&mut canvas);
            drawn.push(overlay.name().to_string());
        }

        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        let summary = RenderSummary {
            generation,
            dimensions: declared,
            overlays: drawn,
        };
        let composite = Rc::new(Composite {
            image: canvas,
            summary: summary.clone(),
        });
        *self.output.borrow_mut() = Some(composite.clone());
        info!(
            "Rendered {} with {} overlay(s), generation {}",
            declared,
            summary.overlays.len(),
            generation
        );

        let report = self
            .listeners
            .dispatch(&CompositorEvent::RenderCompleted(summary));
        *self.listener_failures.borrow_mut() = report.into_result().err();
        Ok(Some(composite))
    }

    /// Failures of this compositor's own listeners during the most recent
    /// completed render, including errors of renders they re-triggered.
    ///
    /// The render itself has already been published when these happen, so
    /// they are kept here rather than in [`render`](Self::render)'s result.
    pub fn take_listener_failures(&self) -> Option<DispatchError> {
        self.listener_failures.borrow_mut().take()
    }

    /// The most recently published composite.
    pub fn current(&self) -> Option<Rc<Composite>> {
        self.output.borrow().clone()
    }

    /// Number of completed renders.
    pub fn render_count(&self) -> u64 {
        self.generation.get()
    }

    /// Mapper for the current image on a surface of the given size, or `None`
    /// while no raster is loaded.
    pub fn mapper(&self, surface: Dimensions) -> Option<CoordinateMapper> {
        self.source.current_raster()?;
        Some(CoordinateMapper::new(self.source.dimensions(), surface))
    }

    pub fn map_surface_point(&self, point: SurfacePoint, surface: Dimensions) -> Option<ImagePoint> {
        self.mapper(surface)?.to_image_space(point)
    }

    pub fn source(&self) -> &Rc<dyn BaseImageSource> {
        &self.source
    }

    pub fn registry(&self) -> &Rc<OverlayRegistry> {
        &self.registry
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&CompositorEvent) -> ListenerResult + 'static,
    {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

impl Drop for Compositor {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Compositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compositor")
            .field("mode", &self.mode.get())
            .field("dirty", &self.dirty.get())
            .field("generation", &self.generation.get())
            .field("registry", &self.registry)
            .finish()
    }
}
