//! Named interaction hooks
//!
//! A hook bundles lifecycle callbacks and per-event metadata extractors so
//! the host framework can attach custom behavior to visualization elements
//! by name. The registry performs no element scanning itself; the framework
//! consults it when an element declares a hook and injects the element into
//! every callback.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{json, Value};
use tracing::warn;

use airlink_core::{to_local, Point2D, TransformTarget};

/// Pointer event kinds with extractor support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    Click,
}

/// A pointer event in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub client_x: f64,
    pub client_y: f64,
}

impl PointerEvent {
    pub fn click(client_x: f64, client_y: f64) -> Self {
        Self {
            kind: PointerEventKind::Click,
            client_x,
            client_y,
        }
    }

    /// The event position as a screen-space point
    pub fn position(&self) -> Point2D {
        Point2D::new(self.client_x, self.client_y)
    }
}

/// Metadata computed for a server-bound event
#[derive(Debug, Clone, PartialEq)]
pub enum EventMetadata {
    /// Pointer position in the target element's local space
    LocalPoint(Point2D),
}

impl EventMetadata {
    /// The object merged into the outgoing event payload
    pub fn to_value(&self) -> Value {
        match self {
            EventMetadata::LocalPoint(p) => json!({"x": p.x, "y": p.y}),
        }
    }
}

/// Lifecycle callback invoked with the bound element
pub type LifecycleCallback = Box<dyn Fn(&dyn TransformTarget) + Send + Sync>;

/// Extractor computing per-event metadata before dispatch to the server
pub type MetadataExtractor = Box<
    dyn Fn(&PointerEvent, &dyn TransformTarget) -> airlink_core::Result<EventMetadata>
        + Send
        + Sync,
>;

/// A named bundle of lifecycle callbacks and metadata extractors
#[derive(Default)]
pub struct Hook {
    on_mount: Option<LifecycleCallback>,
    on_update: Option<LifecycleCallback>,
    on_destroy: Option<LifecycleCallback>,
    extractors: HashMap<PointerEventKind, MetadataExtractor>,
}

impl Hook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback invoked when the element is first bound
    pub fn on_mount(mut self, f: impl Fn(&dyn TransformTarget) + Send + Sync + 'static) -> Self {
        self.on_mount = Some(Box::new(f));
        self
    }

    /// Callback invoked when the element is re-rendered
    pub fn on_update(mut self, f: impl Fn(&dyn TransformTarget) + Send + Sync + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    /// Callback invoked when the element is removed
    pub fn on_destroy(mut self, f: impl Fn(&dyn TransformTarget) + Send + Sync + 'static) -> Self {
        self.on_destroy = Some(Box::new(f));
        self
    }

    /// Register a metadata extractor for an event kind
    pub fn extractor(
        mut self,
        kind: PointerEventKind,
        f: impl Fn(&PointerEvent, &dyn TransformTarget) -> airlink_core::Result<EventMetadata>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.extractors.insert(kind, Box::new(f));
        self
    }

    /// Click extractor mapping screen coordinates into the target's local
    /// space through its live transform
    pub fn with_click_transform(self) -> Self {
        self.extractor(PointerEventKind::Click, |event, element| {
            to_local(event.position(), element).map(EventMetadata::LocalPoint)
        })
    }

    /// Invoke the mount callback, if any
    pub fn mounted(&self, element: &dyn TransformTarget) {
        if let Some(f) = &self.on_mount {
            f(element);
        }
    }

    /// Invoke the update callback, if any
    pub fn updated(&self, element: &dyn TransformTarget) {
        if let Some(f) = &self.on_update {
            f(element);
        }
    }

    /// Invoke the destroy callback, if any
    pub fn destroyed(&self, element: &dyn TransformTarget) {
        if let Some(f) = &self.on_destroy {
            f(element);
        }
    }

    /// Check whether this hook extracts metadata for an event kind
    pub fn has_extractor(&self, kind: PointerEventKind) -> bool {
        self.extractors.contains_key(&kind)
    }

    /// Compute metadata for an event, if an extractor is registered
    pub fn extract(
        &self,
        event: &PointerEvent,
        element: &dyn TransformTarget,
    ) -> Option<airlink_core::Result<EventMetadata>> {
        self.extractors.get(&event.kind).map(|f| f(event, element))
    }
}

/// Registry of named hooks, consulted by the host framework
///
/// Read-only after startup registration. Registering the same name twice
/// is a caller error; the last registration wins.
#[derive(Default)]
pub struct HookRegistry {
    hooks: DashMap<String, Arc<Hook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook under a name
    pub fn register(&self, name: impl Into<String>, hook: Hook) {
        let name = name.into();
        if self.hooks.insert(name.clone(), Arc::new(hook)).is_some() {
            warn!("hook {:?} re-registered, last registration wins", name);
        }
    }

    /// Look up a hook by name
    pub fn get(&self, name: &str) -> Option<Arc<Hook>> {
        self.hooks.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Compute metadata for a server-bound event via the named hook
    pub fn extract_metadata(
        &self,
        name: &str,
        event: &PointerEvent,
        element: &dyn TransformTarget,
    ) -> Option<airlink_core::Result<EventMetadata>> {
        self.get(name).and_then(|hook| hook.extract(event, element))
    }
}
