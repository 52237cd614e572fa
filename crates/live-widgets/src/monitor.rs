//! The document monitor.
//!
//! A recurring scan walks the document and instantiates widgets for every
//! element that carries `data-widget` but has not yet been stamped with
//! `data-widget-id`. The scan is a full-tree preorder walk on every tick --
//! O(elements), intentionally simple, and idempotent because initialized
//! elements are marked and skipped.

use crate::{
    dom::{Element, ElementId, WIDGET_ATTR, WIDGET_ID_ATTR},
    timer::TimerId,
};

/// Default scan interval in ticks, roughly one animation frame.
pub const DEFAULT_SCAN_INTERVAL: u64 = 33;

/// Monitor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Ticks between scans.
    pub interval: u64,
    /// Subtree to scan; the whole document when unset.
    pub scan_root: Option<ElementId>,
    /// Arm the scan timer when the runtime is constructed.
    pub autostart: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SCAN_INTERVAL,
            scan_root: None,
            autostart: true,
        }
    }
}

/// Monitor state owned by the runtime.
pub(crate) struct Monitor {
    /// Scan configuration.
    pub(crate) config: MonitorConfig,
    /// Active scan timer, if scanning.
    pub(crate) timer: Option<TimerId>,
}

impl Monitor {
    /// Create monitor state from configuration.
    pub(crate) fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            timer: None,
        }
    }
}

/// Is the element eligible for instantiation: widget-marked, but not yet
/// stamped with an instance id?
pub(crate) fn eligible(el: &Element) -> bool {
    el.attr(WIDGET_ATTR).is_some() && el.attr(WIDGET_ID_ATTR).is_none()
}
