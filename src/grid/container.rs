//! A grid-shaped container: static layout mask plus sparse occupancy.
//!
//! The container never decides placement policy; it answers cell queries
//! and stores which item owns which cell. All mutation goes through the
//! board's packing operations.

use std::collections::{BTreeSet, HashMap};

use super::types::{Cell, ContainerId, ItemId, Point};
use crate::item::properties::TileAttribute;

/// What a layout cell is, beyond being placeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Normal,
    /// Counts toward coverage-style progress criteria.
    Criteria,
    /// Applies an effect to adjacent items.
    Effect(TileAttribute),
}

/// A container built from an irregular layout mask.
#[derive(Debug, Clone)]
pub struct Container {
    id: ContainerId,
    layout: HashMap<Cell, TileKind>,
    cells: HashMap<Cell, ItemId>,
    cell_size: f64,
}

impl Container {
    pub fn new(id: ContainerId, layout: HashMap<Cell, TileKind>, cell_size: f64) -> Self {
        Self {
            id,
            layout,
            cells: HashMap::new(),
            cell_size,
        }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Whether the cell is part of the layout mask at all.
    pub fn is_cell_valid(&self, cell: Cell) -> bool {
        self.layout.contains_key(&cell)
    }

    /// Whether the cell is part of the mask and unoccupied.
    pub fn is_cell_free(&self, cell: Cell) -> bool {
        self.is_cell_valid(cell) && !self.cells.contains_key(&cell)
    }

    /// Whether the cell is currently occupied by the given item.
    pub fn is_cell_owned_by(&self, cell: Cell, item: ItemId) -> bool {
        self.cells.get(&cell) == Some(&item)
    }

    pub fn occupant(&self, cell: Cell) -> Option<ItemId> {
        self.cells.get(&cell).copied()
    }

    /// The occupancy map, cell to owning item.
    pub fn cells(&self) -> &HashMap<Cell, ItemId> {
        &self.cells
    }

    /// Total number of placeable cells in the mask.
    pub fn capacity(&self) -> usize {
        self.layout.len()
    }

    /// Number of currently occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }

    pub fn tile_kind(&self, cell: Cell) -> Option<TileKind> {
        self.layout.get(&cell).copied()
    }

    /// All layout cells with their tile kinds, in unspecified order.
    pub fn tiles(&self) -> impl Iterator<Item = (Cell, TileKind)> + '_ {
        self.layout.iter().map(|(&cell, &kind)| (cell, kind))
    }

    /// The cells currently occupied by `item`, sorted for determinism.
    pub fn cells_of_item(&self, item: ItemId) -> Vec<Cell> {
        let mut owned: Vec<Cell> = self
            .cells
            .iter()
            .filter(|&(_, &owner)| owner == item)
            .map(|(&cell, _)| cell)
            .collect();
        owned.sort();
        owned
    }

    /// The distinct items occupying at least one cell, sorted.
    pub fn contained_items(&self) -> Vec<ItemId> {
        let set: BTreeSet<ItemId> = self.cells.values().copied().collect();
        set.into_iter().collect()
    }

    /// The world-space center of a cell, from the grid pitch.
    pub fn snap_to_cell(&self, cell: Cell) -> Point {
        Point::new(cell.x as f64 * self.cell_size, cell.y as f64 * self.cell_size)
    }

    /// Effect attributes of layout tiles edge-adjacent to any of `cells`.
    pub fn adjacent_effects(&self, cells: &[Cell]) -> BTreeSet<TileAttribute> {
        let mut active = BTreeSet::new();
        for &cell in cells {
            for neighbor in cell.neighbors() {
                if let Some(TileKind::Effect(attribute)) = self.tile_kind(neighbor) {
                    active.insert(attribute);
                }
            }
        }
        active
    }

    pub(crate) fn occupy(&mut self, cell: Cell, item: ItemId) {
        self.cells.insert(cell, item);
    }

    pub(crate) fn vacate(&mut self, cell: Cell) {
        self.cells.remove(&cell);
    }
}
