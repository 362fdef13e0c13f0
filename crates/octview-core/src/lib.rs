//! # OCT Viewer Core
//!
//! Observable setting groups, typed change events, the overlay contract and
//! the overlay registry shared by the compositor and the overlay producers.
//!
//! Everything here is single-threaded: listeners run synchronously on the
//! thread that performed the mutation.

pub mod catalog;
pub mod events;
pub mod geometry;
pub mod overlay;
pub mod registry;
pub mod settings;

pub use events::{DispatchError, DispatchReport, ListenerError, ListenerId, ListenerResult, ListenerSet};
pub use geometry::{Dimensions, ImagePoint, SurfacePoint};
pub use overlay::{shared, Canvas, Overlay, SharedOverlay};
pub use registry::{OverlayRegistry, RegistryEvent, VisibleOverlays};
pub use settings::{FieldChange, SettingEvent, SettingGroup, SettingKind, SettingValue, SettingsError};
