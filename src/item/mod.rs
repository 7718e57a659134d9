//! Packable items: anchor-relative footprints, orientation, and rotation.
//!
//! An item's authoritative position lives in its container's occupancy map;
//! the item itself only carries the footprint (a list of offsets relative to
//! the anchor cell) plus a non-owning back-reference to its placement.

pub mod properties;

use log::warn;
use thiserror::Error;

use crate::grid::types::{Cell, ContainerId, Orientation, Rotation};
use self::properties::{PropertyKind, TileAttribute};

use std::collections::BTreeSet;

/// Errors constructing an item footprint template.
#[derive(Debug, Error)]
pub enum ShapeError {
    /// The template rows contained no occupied cells.
    #[error("shape template '{name}' has no occupied cells")]
    EmptyShape { name: String },

    /// The template rows contained a symbol other than `#`, `@`, or `.`.
    #[error("shape template '{name}' contains unknown symbol '{symbol}'")]
    UnknownSymbol { name: String, symbol: char },
}

/// A reusable footprint definition from which items are spawned.
///
/// Templates are scanned row-major from the top row down, so the offset
/// list's order is deterministic. The anchor is the `@`-marked cell, or the
/// first occupied cell when no `@` is given; the offset list always contains
/// the zero offset.
#[derive(Debug, Clone)]
pub struct ItemTemplate {
    pub name: String,
    pub cells: Vec<Cell>,
    pub properties: Vec<PropertyKind>,
}

impl ItemTemplate {
    /// Build a template from shape rows (`#` occupied, `.` empty, `@` an
    /// occupied cell that is also the anchor).
    ///
    /// Rows are given top-to-bottom; the y axis points up, so the bottom row
    /// has the smallest y. Without an explicit `@`, the first occupied cell
    /// in scan order is the anchor.
    pub fn from_rows(name: impl Into<String>, rows: &[&str]) -> Result<Self, ShapeError> {
        let name = name.into();
        let height = rows.len() as i32;

        let mut marked = Vec::new();
        let mut explicit_anchor = None;
        for (row_index, row) in rows.iter().enumerate() {
            let y = height - 1 - row_index as i32;
            for (col, symbol) in row.chars().enumerate() {
                let cell = Cell::new(col as i32, y);
                match symbol {
                    '#' => marked.push(cell),
                    '@' => {
                        marked.push(cell);
                        explicit_anchor = Some(cell);
                    }
                    '.' => {}
                    other => {
                        return Err(ShapeError::UnknownSymbol {
                            name,
                            symbol: other,
                        })
                    }
                }
            }
        }

        let Some(&first) = marked.first() else {
            return Err(ShapeError::EmptyShape { name });
        };
        let anchor = explicit_anchor.unwrap_or(first);

        let cells = marked.iter().map(|&cell| cell - anchor).collect();
        Ok(Self {
            name,
            cells,
            properties: Vec::new(),
        })
    }

    /// Attach a property to items spawned from this template.
    pub fn with_property(mut self, property: PropertyKind) -> Self {
        self.properties.push(property);
        self
    }
}

/// Where a contained item currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub container: ContainerId,
    pub anchor: Cell,
}

/// A packable shape.
///
/// The footprint always contains the zero offset (the anchor cell itself);
/// see [`Item::remove_local_cell`].
#[derive(Debug, Clone)]
pub struct Item {
    name: String,
    cells: Vec<Cell>,
    orientation: Orientation,
    placement: Option<Placement>,
    properties: Vec<PropertyKind>,
    effects: BTreeSet<TileAttribute>,
}

impl Item {
    pub(crate) fn from_template(template: &ItemTemplate) -> Self {
        Self {
            name: template.name.clone(),
            cells: template.cells.clone(),
            orientation: Orientation::Up,
            placement: None,
            properties: template.properties.clone(),
            effects: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The footprint as anchor-relative offsets, in template-scan order.
    pub fn footprint(&self) -> &[Cell] {
        &self.cells
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The container/anchor this item occupies, if any.
    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub(crate) fn set_placement(&mut self, placement: Option<Placement>) {
        self.placement = placement;
    }

    pub fn properties(&self) -> &[PropertyKind] {
        &self.properties
    }

    pub(crate) fn properties_mut(&mut self) -> &mut [PropertyKind] {
        &mut self.properties
    }

    /// Tile effects currently applied by the adjacency pass.
    pub fn effects(&self) -> &BTreeSet<TileAttribute> {
        &self.effects
    }

    /// Replace the active effect set; returns true if it changed.
    pub(crate) fn set_effects(&mut self, effects: BTreeSet<TileAttribute>) -> bool {
        if self.effects == effects {
            return false;
        }
        self.effects = effects;
        true
    }

    /// Rotate the footprint by one 90° step.
    ///
    /// Returns the `(old_degrees, new_degrees)` broadcast payload, or `None`
    /// if the item is currently contained (rotating a placed item is a
    /// silent no-op; the caller may log it).
    pub(crate) fn rotate(&mut self, rotation: Rotation) -> Option<(f64, f64)> {
        if self.placement.is_some() {
            return None;
        }

        for cell in &mut self.cells {
            *cell = match rotation {
                Rotation::Clockwise => cell.rotated_cw(),
                Rotation::CounterClockwise => cell.rotated_ccw(),
            };
        }

        let old_degrees = self.orientation.degrees();
        self.orientation = self.orientation.rotated(rotation);
        Some((old_degrees, self.orientation.degrees()))
    }

    /// Shift the anchor onto the cell currently at `offset`, rebasing every
    /// footprint offset so that cell becomes the zero offset. The placement
    /// anchor is the caller's to update in step.
    pub(crate) fn rebase_anchor(&mut self, offset: Cell) {
        debug_assert!(
            self.cells.contains(&offset),
            "new anchor must be part of the footprint"
        );
        for cell in &mut self.cells {
            *cell = *cell - offset;
        }
    }

    /// Remove one offset from the footprint (partial crushing).
    ///
    /// The zero offset is the anchor and must never be removed; such a
    /// request is refused, leaving the footprint untouched.
    pub(crate) fn remove_local_cell(&mut self, offset: Cell) -> bool {
        if offset == Cell::ZERO {
            warn!("refusing to remove anchor offset from '{}'", self.name);
            debug_assert!(false, "anchor offset removal requested");
            return false;
        }

        let Some(index) = self.cells.iter().position(|&c| c == offset) else {
            warn!(
                "offset {} is not part of '{}' and cannot be removed",
                offset, self.name
            );
            return false;
        };

        self.cells.remove(index);
        true
    }
}
