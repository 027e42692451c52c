//! Backend Selector
//!
//! Owns the registered backend adapters and memoizes which one is active.
//!
//! Probing runs at most once per explicit reset: the first `active_backend`
//! call walks the priority order until a probe succeeds and remembers that
//! choice (or remembers that nothing worked). The operator "caching disabled"
//! flag is deliberately NOT memoized - it is re-checked on every call so
//! toggling it takes effect immediately.

use tracing::{debug, info};

use crate::backend::{probe, BackendKind, StorageBackend, DEFAULT_BACKEND_PRIORITY};

// == Backend Selector ==
/// Selects and memoizes the active storage backend.
///
/// This is an explicit, injectable state object rather than module-level
/// global state; every cache store owns one, and tests construct their own.
pub struct BackendSelector {
    /// Registered adapters, at most one per kind
    backends: Vec<Box<dyn StorageBackend>>,
    /// Candidate order for probing
    priority: Vec<BackendKind>,
    /// None = not yet probed; Some(None) = probed, nothing usable;
    /// Some(Some(kind)) = probed and selected
    selected: Option<Option<BackendKind>>,
    /// Operator override disabling all caching
    disabled: bool,
}

impl BackendSelector {
    // == Constructor ==
    /// Creates a selector over the given adapters with the default priority
    /// order (durable before session-scoped).
    pub fn new(backends: Vec<Box<dyn StorageBackend>>) -> Self {
        Self {
            backends,
            priority: DEFAULT_BACKEND_PRIORITY.to_vec(),
            selected: None,
            disabled: false,
        }
    }

    // == Active Backend ==
    /// Returns the active backend, probing candidates on first use.
    ///
    /// Returns `None` when caching is disabled or no mechanism is usable.
    /// Repeated calls after a successful selection do not re-probe.
    pub fn active_backend(&mut self) -> Option<&dyn StorageBackend> {
        if self.disabled {
            return None;
        }

        let selected = match self.selected {
            Some(selected) => selected,
            None => {
                let selected = self.probe_priority();
                self.selected = Some(selected);
                selected
            }
        };

        self.backend_by_kind(selected?)
    }

    /// Probes candidates in priority order and returns the first usable kind.
    fn probe_priority(&self) -> Option<BackendKind> {
        for kind in &self.priority {
            if let Some(backend) = self.backend_by_kind(*kind) {
                if probe(backend) {
                    info!("selected {:?} storage backend", kind);
                    return Some(*kind);
                }
            }
        }
        debug!("no usable storage backend found");
        None
    }

    fn backend_by_kind(&self, kind: BackendKind) -> Option<&dyn StorageBackend> {
        self.backends
            .iter()
            .find(|backend| backend.kind() == kind)
            .map(|backend| backend.as_ref())
    }

    // == Overrides ==
    /// Force-sets the memoized selection without probing.
    pub fn set_active_backend(&mut self, kind: BackendKind) {
        self.selected = Some(Some(kind));
    }

    /// Replaces the candidate priority order and clears the memoized
    /// selection, forcing re-probing on the next `active_backend` call.
    pub fn set_backend_priority(&mut self, order: Vec<BackendKind>) {
        self.priority = order;
        self.selected = None;
    }

    /// Restores the default priority order and clears the memoized selection.
    pub fn reset_backend_priority(&mut self) {
        self.priority = DEFAULT_BACKEND_PRIORITY.to_vec();
        self.selected = None;
    }

    /// Clears the memoized selection only, forcing re-probing on next use.
    pub fn reset(&mut self) {
        self.selected = None;
    }

    /// Sets the operator "caching disabled" override.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Whether the operator override is currently set.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// The memoized selection, for inspection: `None` before probing,
    /// `Some(None)` when probing found nothing usable.
    pub fn selected_kind(&self) -> Option<Option<BackendKind>> {
        self.selected
    }
}
