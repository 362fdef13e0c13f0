use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::events::{DispatchReport, ListenerId, ListenerResult, ListenerSet};
use crate::overlay::{Overlay, SharedOverlay};

/// Events emitted by an [`OverlayRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    OverlayAdded { name: String },
    /// An overlay was registered under a name that was already taken.
    OverlayReplaced { name: String },
    OverlayRemoved { name: String },
    VisibilityChanged { name: String, visible: bool },
}

impl RegistryEvent {
    pub fn name(&self) -> &str {
        match self {
            RegistryEvent::OverlayAdded { name }
            | RegistryEvent::OverlayReplaced { name }
            | RegistryEvent::OverlayRemoved { name }
            | RegistryEvent::VisibilityChanged { name, .. } => name,
        }
    }
}

struct Entry {
    /// Registration sequence, the z-order tie-break.
    seq: u64,
    overlay: SharedOverlay,
}

/// Overlays keyed by unique name.
///
/// Registering a name that is already present replaces the previous overlay
/// (last write wins) and gives it a fresh registration sequence, so it sorts
/// after overlays of equal z-order that were registered earlier.
///
/// # Panics
///
/// Reading an overlay that its owner currently holds mutably borrowed panics,
/// like any [`RefCell`] conflict. Owners must release their borrows before
/// triggering a render or mutating the registry.
pub struct OverlayRegistry {
    entries: RefCell<HashMap<String, Entry>>,
    next_seq: Cell<u64>,
    listeners: ListenerSet<RegistryEvent>,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            next_seq: Cell::new(0),
            listeners: ListenerSet::new(),
        }
    }

    /// Insert an overlay, replacing any overlay registered under the same name.
    pub fn add(&self, overlay: SharedOverlay) -> DispatchReport {
        let name = overlay.borrow().name().to_string();
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);

        let replaced = self
            .entries
            .borrow_mut()
            .insert(name.clone(), Entry { seq, overlay })
            .is_some();
        debug!("Registered overlay '{}' (replaced: {})", name, replaced);

        let event = if replaced {
            RegistryEvent::OverlayReplaced { name }
        } else {
            RegistryEvent::OverlayAdded { name }
        };
        self.listeners.dispatch(&event)
    }

    /// Remove the overlay registered under `name`. Absent names are a no-op
    /// and notify nobody.
    pub fn remove(&self, name: &str) -> DispatchReport {
        let removed = self.entries.borrow_mut().remove(name);
        match removed {
            Some(_) => {
                debug!("Removed overlay '{}'", name);
                self.listeners.dispatch(&RegistryEvent::OverlayRemoved {
                    name: name.to_string(),
                })
            }
            None => DispatchReport::default(),
        }
    }

    /// Remove whatever is registered under this overlay's name.
    pub fn remove_overlay<O: Overlay + ?Sized>(&self, overlay: &RefCell<O>) -> DispatchReport {
        let name = overlay.borrow().name().to_string();
        self.remove(&name)
    }

    pub fn get(&self, name: &str) -> Option<SharedOverlay> {
        self.entries.borrow().get(name).map(|e| e.overlay.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    /// Whether the named overlay is registered and currently visible.
    pub fn is_visible(&self, name: &str) -> bool {
        self.get(name)
            .map(|overlay| overlay.borrow().is_visible())
            .unwrap_or(false)
    }

    /// Toggle an overlay's visibility through the registry so observers hear about it.
    /// Absent names are a no-op.
    pub fn set_visible(&self, name: &str, visible: bool) -> DispatchReport {
        let Some(overlay) = self.get(name) else {
            return DispatchReport::default();
        };
        overlay.borrow_mut().set_visible(visible);
        self.listeners.dispatch(&RegistryEvent::VisibilityChanged {
            name: name.to_string(),
            visible,
        })
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Visible overlays in drawing order: ascending z-order, ties broken by
    /// registration order.
    ///
    /// Visibility and z-order are read now; the returned sequence can be
    /// iterated any number of times.
    pub fn visible_sorted_by_z(&self) -> VisibleOverlays {
        let entries = self.entries.borrow();
        let mut ordered: Vec<(i32, u64, SharedOverlay)> = entries
            .values()
            .filter_map(|entry| {
                let overlay = entry.overlay.borrow();
                if !overlay.is_visible() {
                    return None;
                }
                let z = overlay.z_order();
                Some((z, entry.seq, entry.overlay.clone()))
            })
            .collect();
        ordered.sort_by_key(|(z, seq, _)| (*z, *seq));
        VisibleOverlays {
            overlays: ordered.into_iter().map(|(_, _, overlay)| overlay).collect(),
        }
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&RegistryEvent) -> ListenerResult + 'static,
    {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

impl Default for OverlayRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OverlayRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayRegistry")
            .field("names", &self.names())
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Snapshot of the visible overlays in drawing order.
#[derive(Clone, Default)]
pub struct VisibleOverlays {
    overlays: Vec<SharedOverlay>,
}

impl VisibleOverlays {
    pub fn iter(&self) -> impl Iterator<Item = &SharedOverlay> + '_ {
        self.overlays.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.overlays
            .iter()
            .map(|overlay| overlay.borrow().name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

impl<'a> IntoIterator for &'a VisibleOverlays {
    type Item = &'a SharedOverlay;
    type IntoIter = std::slice::Iter<'a, SharedOverlay>;

    fn into_iter(self) -> Self::IntoIter {
        self.overlays.iter()
    }
}

impl fmt::Debug for VisibleOverlays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{shared, Canvas};

    #[derive(Debug)]
    struct Stub {
        name: String,
        z: i32,
        visible: bool,
    }

    impl Stub {
        fn new(name: &str, z: i32, visible: bool) -> Rc<RefCell<Stub>> {
            shared(Stub {
                name: name.to_string(),
                z,
                visible,
            })
        }
    }

    impl Overlay for Stub {
        fn name(&self) -> &str {
            &self.name
        }
        fn z_order(&self) -> i32 {
            self.z
        }
        fn is_visible(&self) -> bool {
            self.visible
        }
        fn set_visible(&mut self, visible: bool) {
            self.visible = visible;
        }
        fn draw(&self, _canvas: &mut Canvas) {}
    }

    #[test]
    fn test_sorted_by_z_and_filters_hidden() {
        let registry = OverlayRegistry::new();
        assert!(registry.add(Stub::new("boundary", 11000, true)).is_clean());
        assert!(registry.add(Stub::new("cursor", 500, true)).is_clean());
        assert!(registry.add(Stub::new("hidden", 0, false)).is_clean());
        assert!(registry.add(Stub::new("peaks", 12000, true)).is_clean());

        let visible = registry.visible_sorted_by_z();
        assert_eq!(visible.names(), vec!["cursor", "boundary", "peaks"]);

        let zs: Vec<i32> = visible.iter().map(|o| o.borrow().z_order()).collect();
        assert!(zs.windows(2).all(|w| w[0] <= w[1]));
        // restartable
        assert_eq!(visible.iter().count(), 3);
        assert_eq!((&visible).into_iter().count(), 3);
    }

    #[test]
    fn test_ties_follow_registration_order() {
        let registry = OverlayRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            assert!(registry.add(Stub::new(name, 7, true)).is_clean());
        }
        assert_eq!(registry.visible_sorted_by_z().names(), vec!["zeta", "alpha", "mid"]);

        // Re-registering moves the overlay behind earlier peers of equal z.
        assert!(registry.add(Stub::new("zeta", 7, true)).is_clean());
        assert_eq!(registry.visible_sorted_by_z().names(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_add_replaces_by_name() {
        let registry = OverlayRegistry::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        registry.add_listener(move |e| {
            sink.borrow_mut().push(e.clone());
            Ok(())
        });

        assert!(registry.add(Stub::new("boundary", 1, true)).is_clean());
        assert!(registry.add(Stub::new("boundary", 2, false)).is_clean());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("boundary").unwrap().borrow().z_order(), 2);
        assert_eq!(
            *events.borrow(),
            vec![
                RegistryEvent::OverlayAdded { name: "boundary".into() },
                RegistryEvent::OverlayReplaced { name: "boundary".into() },
            ]
        );
    }

    #[test]
    fn test_remove_by_name_and_handle() {
        let registry = OverlayRegistry::new();
        let a = Stub::new("a", 1, true);
        assert!(registry.add(a.clone()).is_clean());
        assert!(registry.add(Stub::new("b", 2, true)).is_clean());

        assert_eq!(registry.remove("missing").notified, 0);
        assert!(registry.remove_overlay(&a).is_clean());
        assert!(!registry.contains("a"));
        assert!(registry.remove("b").is_clean());
        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
    }

    #[test]
    fn test_owner_mutation_is_seen_at_enumeration() {
        let registry = OverlayRegistry::new();
        let a = Stub::new("a", 1, true);
        assert!(registry.add(a.clone()).is_clean());
        a.borrow_mut().visible = false;
        assert!(registry.visible_sorted_by_z().is_empty());
        a.borrow_mut().visible = true;
        a.borrow_mut().z = -5;
        assert!(registry.add(Stub::new("b", 0, true)).is_clean());
        assert_eq!(registry.visible_sorted_by_z().names(), vec!["a", "b"]);
    }

    #[test]
    fn test_set_visible_emits_event() {
        let registry = OverlayRegistry::new();
        assert!(registry.add(Stub::new("a", 1, true)).is_clean());
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        registry.add_listener(move |e| {
            if let RegistryEvent::VisibilityChanged { visible, .. } = e {
                assert!(!visible);
                c.set(c.get() + 1);
            }
            Ok(())
        });
        assert!(registry.set_visible("a", false).is_clean());
        assert!(registry.set_visible("missing", false).is_clean());
        assert_eq!(count.get(), 1);
        assert!(!registry.is_visible("a"));
        assert!(!registry.is_visible("missing"));
    }
}
