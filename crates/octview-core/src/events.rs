//! Typed listener sets.
//!
//! Every observable component owns a [`ListenerSet`] over its own event enum
//! and dispatches synchronously on the calling thread. A failing listener is
//! recorded in the [`DispatchReport`] and logged; the remaining listeners still
//! run.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type returned by a listener callback.
pub type ListenerError = Box<dyn std::error::Error>;

/// Result type returned by a listener callback.
pub type ListenerResult = Result<(), ListenerError>;

/// Handle identifying a registered listener, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Callback<E> = Rc<dyn Fn(&E) -> ListenerResult>;

/// An unordered set of callbacks for events of type `E`.
pub struct ListenerSet<E> {
    listeners: RefCell<Vec<(ListenerId, Callback<E>)>>,
}

impl<E> ListenerSet<E> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&E) -> ListenerResult + 'static,
    {
        let id = ListenerId::new();
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Unregister a listener. Returns false if the id was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Call every listener registered at the moment of dispatch.
    ///
    /// The list is snapshotted first, so listeners may register, unregister or
    /// re-trigger the emitting component without conflicting borrows.
    pub fn dispatch(&self, event: &E) -> DispatchReport {
        let snapshot: Vec<(ListenerId, Callback<E>)> = self.listeners.borrow().clone();
        let mut report = DispatchReport::default();
        for (id, listener) in snapshot {
            report.notified += 1;
            if let Err(error) = listener(event) {
                warn!("Listener {} failed: {}", id, error);
                report.failures.push(ListenerFailure { listener: id, error });
            }
        }
        report
    }
}

impl<E> Default for ListenerSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ListenerSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}

/// A single listener that returned an error during dispatch.
#[derive(Debug)]
pub struct ListenerFailure {
    pub listener: ListenerId,
    pub error: ListenerError,
}

/// Outcome of one dispatch: how many listeners ran and which of them failed.
#[must_use = "listener failures, including renders triggered by the event, are only reported here"]
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub notified: usize,
    pub failures: Vec<ListenerFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one (used by bulk operations).
    pub fn merge(&mut self, other: DispatchReport) {
        self.notified += other.notified;
        self.failures.extend(other.failures);
    }

    /// Surface listener failures to the caller as an error.
    pub fn into_result(self) -> Result<usize, DispatchError> {
        if self.failures.is_empty() {
            Ok(self.notified)
        } else {
            Err(DispatchError {
                notified: self.notified,
                failures: self.failures,
            })
        }
    }
}

/// One or more listeners failed while handling an event.
#[derive(Error, Debug)]
#[error("{} of {} listener(s) failed", .failures.len(), .notified)]
pub struct DispatchError {
    pub notified: usize,
    pub failures: Vec<ListenerFailure>,
}

impl DispatchError {
    /// Find the first failure whose error is of type `T`.
    pub fn find<T: std::error::Error + 'static>(&self) -> Option<&T> {
        self.failures
            .iter()
            .find_map(|failure| failure.error.downcast_ref::<T>())
    }
}
