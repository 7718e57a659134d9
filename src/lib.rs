//! Packgrid - a grid-container packing and movement-resolution engine
//!
//! This library provides the core of a grid-packing puzzle: containers with
//! irregular layout masks, items with rotatable multi-cell footprints, a
//! per-tick movement resolver with dependency ordering and push semantics,
//! perimeter tracing for placement previews, and TOML-defined puzzles with
//! scoring criteria.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use packgrid::{Board, Cell, ItemTemplate, MoveResolver, TileKind};
//!
//! let mut layout = HashMap::new();
//! for x in 0..3 {
//!     layout.insert(Cell::new(x, 0), TileKind::Normal);
//! }
//!
//! let mut board = Board::new();
//! let container = board.add_container(layout, 1.0);
//! let block = ItemTemplate::from_rows("block", &["#"]).unwrap();
//! let item = board.spawn_item(&block);
//! assert!(board.try_add_item(item, container, Cell::new(0, 0)).unwrap());
//!
//! let mut resolver = MoveResolver::new();
//! resolver.register_move(item, Cell::RIGHT).unwrap();
//! let report = resolver.resolve(&mut board).unwrap();
//! assert_eq!(report.moved.len(), 1);
//! ```

pub mod grid;
pub mod item;
pub mod outline;
pub mod puzzle;
pub mod scoring;

pub use grid::{
    move_all_items, Board, Cell, Container, ContainerId, GridError, GridEvent, ItemId,
    MoveResolver, MovementResult, Orientation, Point, Rotation, TickReport, TileKind,
};
pub use item::properties::{PropertyKind, PropertyTag, TileAttribute};
pub use item::{Item, ItemTemplate, Placement, ShapeError};
pub use outline::{trace_perimeter, OutlineError};
pub use puzzle::{Puzzle, PuzzleError, PuzzleSetup};
pub use scoring::{all_criteria_met, Criteria, ProgressRule, ScoreRule};

use thiserror::Error;

/// Errors from any layer of the engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Outline(#[from] OutlineError),

    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
}
