use std::result::Result as StdResult;

use thiserror::Error;

/// Result type for live-widgets operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type.
///
/// All variants are non-fatal at the framework boundary: registration errors
/// leave the registry untouched, instantiation errors drop the instance, and
/// delivery errors are isolated per subscriber.
#[derive(PartialEq, Error, Debug, Clone)]
pub enum Error {
    /// A descriptor was registered without a name.
    #[error("widget name missing")]
    MissingName,
    /// A descriptor's name contains invalid characters.
    #[error("invalid widget name: {0}")]
    InvalidName(String),
    /// A controller declares an action that shadows the instance surface.
    #[error("reserved action name: {0}")]
    ReservedAction(String),
    /// No widget is registered under the given name.
    #[error("unknown widget: {0}")]
    UnknownWidget(String),
    /// The instance's controller has no action with the given name.
    #[error("unknown action: {0}")]
    UnknownAction(String),
    /// The element carries no widget attribute.
    #[error("element is not widget-marked")]
    MissingWidgetAttr,
    /// The element is no longer in the document.
    #[error("element not found")]
    ElementNotFound,
    /// The instance is no longer in the instance table.
    #[error("instance not found")]
    InstanceNotFound,
    /// A construct or reinit hook failed during instantiation.
    #[error("instantiation of '{widget}' failed: {message}")]
    Instantiation {
        /// Widget name being instantiated.
        widget: String,
        /// Underlying failure, stringified.
        message: String,
    },
    /// Reentrant message delivery exceeded the depth guard.
    #[error("delivery depth exceeded on channel '{0}'")]
    DeliveryDepth(String),
    /// Failure raised inside a widget hook or action.
    #[error("widget: {0}")]
    Widget(String),
}
