//! The closed capability set items can carry.
//!
//! Properties participate in two phases of a resolution tick: movement
//! validation (a collision set may be declared resolvable) and the
//! post-commit property pass (heavy items crush or break what is beneath
//! them). Tile attributes on the container layout grant properties to
//! adjacent items through a fixed table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::grid::container::Container;
use crate::grid::types::{Cell, ItemId};
use crate::item::{Item, Placement};

/// Property discriminant, used for capability queries and scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyTag {
    Heavy,
    Crushable,
    Fragile,
}

/// A capability attached to an item, with any per-item state it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Only moves when its collision set is exactly the items resting
    /// directly below it. Crushes crushable items beneath it each tick.
    Heavy,
    /// Loses its contact row when crushed from above; crushes at most once.
    Crushable { crushed: bool },
    /// Breaks (permanently) when a heavy item rests on it.
    Fragile { broken: bool },
}

impl PropertyKind {
    pub fn crushable() -> Self {
        PropertyKind::Crushable { crushed: false }
    }

    pub fn fragile() -> Self {
        PropertyKind::Fragile { broken: false }
    }

    pub fn tag(&self) -> PropertyTag {
        match self {
            PropertyKind::Heavy => PropertyTag::Heavy,
            PropertyKind::Crushable { .. } => PropertyTag::Crushable,
            PropertyKind::Fragile { .. } => PropertyTag::Fragile,
        }
    }

    /// Whether this property takes part in movement validation.
    pub fn is_movement_validator(&self) -> bool {
        matches!(
            self,
            PropertyKind::Heavy | PropertyKind::Crushable { .. }
        )
    }

    /// Judge a nonempty collision set for a trial move of the owning item.
    ///
    /// `current_cells` are the mover's absolute cells before the move,
    /// `trial_cells` the absolute cells the move would occupy. Properties
    /// that are not movement validators accept unconditionally.
    pub(crate) fn can_resolve_collision(
        &self,
        mover: ItemId,
        current_cells: &[Cell],
        trial_cells: &[Cell],
        collisions: &[ItemId],
        container: &Container,
    ) -> bool {
        match self {
            PropertyKind::Heavy => {
                let below = items_below(mover, current_cells, container);
                let colliding: BTreeSet<ItemId> = collisions.iter().copied().collect();
                below == colliding
            }
            PropertyKind::Crushable { .. } => collisions.iter().all(|&blocker| {
                contact_row(blocker, trial_cells, container)
                    .is_some_and(|row| row_fully_supported(blocker, row, container))
            }),
            PropertyKind::Fragile { .. } => true,
        }
    }
}

/// The items occupying cells directly beneath any of `cells`, excluding
/// the item itself.
pub(crate) fn items_below(item: ItemId, cells: &[Cell], container: &Container) -> BTreeSet<ItemId> {
    let mut below = BTreeSet::new();
    for &cell in cells {
        if let Some(occupant) = container.occupant(cell + Cell::DOWN) {
            if occupant != item {
                below.insert(occupant);
            }
        }
    }
    below
}

/// The highest row of `target`'s cells that sit directly beneath one of
/// the probing cells. `None` when the footprints do not stack.
fn contact_row(target: ItemId, probe_cells: &[Cell], container: &Container) -> Option<i32> {
    probe_cells
        .iter()
        .map(|&cell| cell + Cell::DOWN)
        .filter(|&below| container.occupant(below) == Some(target))
        .map(|below| below.y)
        .max()
}

/// Every cell of `target` in `row` has an occupant directly beneath it.
/// The target's own lower cells count as support.
fn row_fully_supported(target: ItemId, row: i32, container: &Container) -> bool {
    container
        .cells_of_item(target)
        .iter()
        .filter(|cell| cell.y == row)
        .all(|&cell| container.occupant(cell + Cell::DOWN).is_some())
}

/// Outcome of one crush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrushOutcome {
    /// The contact row was removed from the target.
    Crushed,
    /// The target is not crushable, already crushed, or its contact row
    /// is not fully supported.
    Unchanged,
}

/// Crush `target` from above by `crusher`.
///
/// The target's contact row (its highest row directly beneath the crusher)
/// is removed from both the footprint and the occupancy map iff every cell
/// of that row is supported from below. A crushed item is never crushed
/// again. The anchor cell is never removed: when the contact row contains
/// it, the anchor moves to a surviving cell first, and an item whose whole
/// footprint is the contact row is left intact.
pub(crate) fn crush_item_vertical(
    crusher: ItemId,
    target: ItemId,
    items: &mut BTreeMap<ItemId, Item>,
    container: &mut Container,
) -> CrushOutcome {
    let crushable = items.get(&target).is_some_and(|item| {
        item.properties()
            .iter()
            .any(|p| matches!(p, PropertyKind::Crushable { crushed: false }))
    });
    if !crushable {
        return CrushOutcome::Unchanged;
    }

    let crusher_cells = match items.get(&crusher).and_then(|item| {
        item.placement().map(|placement| {
            item.footprint()
                .iter()
                .map(|&offset| placement.anchor + offset)
                .collect::<Vec<_>>()
        })
    }) {
        Some(cells) => cells,
        None => return CrushOutcome::Unchanged,
    };

    let Some(row) = contact_row(target, &crusher_cells, container) else {
        return CrushOutcome::Unchanged;
    };
    if !row_fully_supported(target, row, container) {
        return CrushOutcome::Unchanged;
    }

    let row_cells: Vec<Cell> = container
        .cells_of_item(target)
        .into_iter()
        .filter(|cell| cell.y == row)
        .collect();

    let Some(target_item) = items.get_mut(&target) else {
        return CrushOutcome::Unchanged;
    };
    let Some(placement) = target_item.placement() else {
        return CrushOutcome::Unchanged;
    };
    let mut anchor = placement.anchor;

    if row_cells.contains(&anchor) {
        // cells_of_item is sorted, so the survivor pick is deterministic.
        let survivor = container
            .cells_of_item(target)
            .into_iter()
            .find(|cell| !row_cells.contains(cell));
        let Some(survivor) = survivor else {
            return CrushOutcome::Unchanged;
        };
        target_item.rebase_anchor(survivor - anchor);
        target_item.set_placement(Some(Placement {
            container: placement.container,
            anchor: survivor,
        }));
        anchor = survivor;
    }

    for cell in row_cells {
        if target_item.remove_local_cell(cell - anchor) {
            container.vacate(cell);
        }
    }

    for property in target_item.properties_mut() {
        if let PropertyKind::Crushable { crushed } = property {
            *crushed = true;
        }
    }

    CrushOutcome::Crushed
}

/// Mark the target's fragile property broken. Returns true if the item
/// carries one and it was not already broken.
pub(crate) fn break_fragile(target: &mut Item) -> bool {
    for property in target.properties_mut() {
        if let PropertyKind::Fragile { broken } = property {
            if !*broken {
                *broken = true;
                return true;
            }
        }
    }
    false
}

/// An effect a layout tile applies to adjacent items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TileAttribute {
    CrushableVertical,
    CrushableHorizontal,
}

impl TileAttribute {
    /// The property an item is treated as carrying while this effect is
    /// active on it. The table is closed; new attributes extend the match.
    pub fn granted_property(self) -> PropertyTag {
        match self {
            TileAttribute::CrushableVertical | TileAttribute::CrushableHorizontal => {
                PropertyTag::Crushable
            }
        }
    }
}
