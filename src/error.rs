//! Error type shared by every fallible scene operation.

use crate::element::ElementId;
use crate::surface::SurfaceError;

/// Error returned by geometry validation, scene mutation and lookups.
///
/// Validation errors surface at the call that caused them; a failed insert or
/// membership change leaves its container untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// A coordinate or other numeric attribute is NaN or infinite.
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    /// A radius, dimension or scale factor is zero or negative where it must be positive.
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    /// A range check was given bounds in the wrong order.
    #[error("lower bound {low} is greater than upper bound {high}")]
    InvalidRange { low: f64, high: f64 },
    /// Shape data that cannot describe a drawable outline.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// An aggregate was asked of an empty input.
    #[error("{0} requires at least one input")]
    EmptyInput(&'static str),
    /// Another sibling already uses this name.
    #[error("name \"{0}\" is already used by a sibling")]
    DuplicateName(String),
    /// No sibling carries this name.
    #[error("nothing named \"{0}\"")]
    NotFound(String),
    /// More than one sibling carries this name.
    #[error("more than one sibling is named \"{0}\"")]
    Ambiguous(String),
    /// The id does not belong to this scene.
    #[error("element {0} is not in the scene")]
    UnknownElement(ElementId),
    /// The element was inserted before.
    #[error("element {0} was already added")]
    AlreadyAdded(ElementId),
    /// A composite-only operation was called on a plain element.
    #[error("element {0} is not a composite")]
    NotComposite(ElementId),
    /// Composites own members, not drawables or hitboxes.
    #[error("composites cannot hold {0}")]
    CompositeContent(&'static str),
    /// The element already belongs to this composite.
    #[error("element {member} is already a member of {composite}")]
    AlreadyMember { composite: ElementId, member: ElementId },
    /// The element does not belong to this composite.
    #[error("element {member} is not a member of {composite}")]
    NotMember { composite: ElementId, member: ElementId },
    /// Admitting the member would make the composite contain itself.
    #[error("element {member} cannot join {composite}: membership would form a cycle")]
    MembershipCycle { composite: ElementId, member: ElementId },
    /// Sprite-sheet metadata could not be parsed or is out of range.
    #[error("invalid sprite sheet metadata: {0}")]
    SheetMeta(String),
    /// Configuration could not be parsed or is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The rendering surface rejected an operation.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Shorthand for results carrying a [`SceneError`].
pub type Result<T> = std::result::Result<T, SceneError>;

/// Reject NaN and infinities.
pub(crate) fn finite(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() { Ok(value) } else { Err(SceneError::NonFinite { field, value }) }
}

/// Reject non-finite, zero and negative values.
pub(crate) fn positive(field: &'static str, value: f64) -> Result<f64> {
    let value = finite(field, value)?;
    if value > 0.0 { Ok(value) } else { Err(SceneError::NonPositive { field, value }) }
}
