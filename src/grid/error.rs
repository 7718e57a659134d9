//! Error types for the packing grid

use thiserror::Error;

use super::types::{ContainerId, ItemId};

/// Caller contract violations in the grid core.
///
/// Routine rejections (occupied cell, invalid placement) are not errors;
/// they surface as `false`/`MovementResult` returns. These variants mark
/// requests that a correct caller never makes.
#[derive(Debug, Error)]
pub enum GridError {
    /// The same item was registered twice within one resolution tick.
    #[error("duplicate move request for {0} within one tick")]
    DuplicateMoveRequest(ItemId),

    /// Reference to an item id the board does not own.
    #[error("unknown {0}")]
    UnknownItem(ItemId),

    /// Reference to a container id the board does not own.
    #[error("unknown {0}")]
    UnknownContainer(ContainerId),
}
