//! Built-in widgets for the live-widgets runtime.
//!
//! These are deliberately small consumers of the framework contract: a
//! collapsible drawer, a draggable slider, and a click-to-broadcast trigger.
//! Hosts register them with [`load`] and wire them up purely through markup
//! attributes.

#![warn(missing_docs)]

pub mod drawer;
pub mod event_trigger;
pub mod slider;

use live_widgets::{Result, Runtime};
use tracing::debug;

/// Register every kit widget with the runtime.
pub fn load(rt: &mut Runtime) -> Result<()> {
    drawer::register(rt)?;
    slider::register(rt)?;
    event_trigger::register(rt)?;
    debug!("kit widgets registered");
    Ok(())
}
