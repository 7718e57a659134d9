//! Grid core: containers, the packing board, and movement resolution.

pub mod board;
pub mod container;
pub mod error;
pub mod movement;
pub mod types;

pub use board::{Board, GridEvent};
pub use container::{Container, TileKind};
pub use error::GridError;
pub use movement::{move_all_items, MoveResolver, TickReport};
pub use types::{Cell, ContainerId, ItemId, MovementResult, Orientation, Point, Rotation};
