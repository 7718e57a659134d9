//! The board owns every container and item and is the only mutator of
//! container occupancy.
//!
//! Placement follows a validate/commit split: `can_add_item` and
//! `check_add_item` probe hypothetical placements without mutating, so the
//! resolver can compute commit order before touching the grid. Routine
//! rejections return `false` or a [`MovementResult`]; `GridError` is
//! reserved for requests no correct caller makes.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::{debug, warn};

use super::container::{Container, TileKind};
use super::error::GridError;
use super::types::{Cell, ContainerId, ItemId, MovementResult, Rotation};
use crate::item::{Item, ItemTemplate, Placement};

/// Everything observers can be told about.
///
/// All variants dispatch immediately except `ItemsUpdated`, which is queued
/// during mutation and only fires at the settle barrier, after the per-tick
/// property and effect passes have finished.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    ItemAdded {
        container: ContainerId,
        item: ItemId,
    },
    ItemRemoved {
        container: ContainerId,
        item: ItemId,
    },
    /// A placement attempt failed; the grid is unchanged.
    ItemRejected {
        container: ContainerId,
        item: ItemId,
    },
    ItemRotated {
        item: ItemId,
        old_degrees: f64,
        new_degrees: f64,
    },
    /// Settle-deferred; at most one per container per tick.
    ItemsUpdated {
        container: ContainerId,
    },
}

/// Observer registry with a settle-deferred queue.
pub struct Notifier {
    handlers: Vec<Box<dyn FnMut(&GridEvent)>>,
    pending: Vec<GridEvent>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        Self {
            handlers: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, handler: Box<dyn FnMut(&GridEvent)>) {
        self.handlers.push(handler);
    }

    pub(crate) fn emit(&mut self, event: GridEvent) {
        for handler in &mut self.handlers {
            handler(&event);
        }
    }

    /// Queue an event for the next settle. Duplicates are collapsed.
    pub(crate) fn defer(&mut self, event: GridEvent) {
        if !self.pending.contains(&event) {
            self.pending.push(event);
        }
    }

    pub(crate) fn settle(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for event in pending {
            self.emit(event);
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("handlers", &self.handlers.len())
            .field("pending", &self.pending)
            .finish()
    }
}

/// The packing engine: containers, items, and the observer registry.
#[derive(Debug)]
pub struct Board {
    items: BTreeMap<ItemId, Item>,
    containers: BTreeMap<ContainerId, Container>,
    notifier: Notifier,
    next_item: u32,
    next_container: u32,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            containers: BTreeMap::new(),
            notifier: Notifier::new(),
            next_item: 0,
            next_container: 0,
        }
    }

    /// Register an observer for all grid events.
    pub fn subscribe(&mut self, handler: impl FnMut(&GridEvent) + 'static) {
        self.notifier.subscribe(Box::new(handler));
    }

    pub fn add_container(&mut self, layout: HashMap<Cell, TileKind>, cell_size: f64) -> ContainerId {
        let id = ContainerId(self.next_container);
        self.next_container += 1;
        self.containers.insert(id, Container::new(id, layout, cell_size));
        id
    }

    /// Create an uncontained item from a footprint template.
    pub fn spawn_item(&mut self, template: &ItemTemplate) -> ItemId {
        let id = ItemId(self.next_item);
        self.next_item += 1;
        self.items.insert(id, Item::from_template(template));
        id
    }

    pub fn item(&self, id: ItemId) -> Result<&Item, GridError> {
        self.items.get(&id).ok_or(GridError::UnknownItem(id))
    }

    pub fn container(&self, id: ContainerId) -> Result<&Container, GridError> {
        self.containers
            .get(&id)
            .ok_or(GridError::UnknownContainer(id))
    }

    /// Items currently owned by the board, in id order.
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.keys().copied().collect()
    }

    pub(crate) fn parts_mut(
        &mut self,
    ) -> (
        &mut BTreeMap<ItemId, Item>,
        &mut BTreeMap<ContainerId, Container>,
        &mut Notifier,
    ) {
        (&mut self.items, &mut self.containers, &mut self.notifier)
    }

    /// The absolute cells `item` would occupy anchored at `anchor`.
    fn trial_cells(item: &Item, anchor: Cell) -> Vec<Cell> {
        item.footprint().iter().map(|&offset| anchor + offset).collect()
    }

    /// The absolute cells `item` currently occupies, empty if uncontained.
    pub fn cells_of(&self, id: ItemId) -> Result<Vec<Cell>, GridError> {
        let item = self.item(id)?;
        Ok(match item.placement() {
            Some(placement) => Self::trial_cells(item, placement.anchor),
            None => Vec::new(),
        })
    }

    /// Whether every cell of the anchored footprint is free.
    ///
    /// Any invalid or occupied cell rejects the whole placement.
    pub fn can_add_item(
        &self,
        item: ItemId,
        container: ContainerId,
        anchor: Cell,
    ) -> Result<bool, GridError> {
        let item = self.item(item)?;
        let container = self.container(container)?;
        Ok(Self::trial_cells(item, anchor)
            .iter()
            .all(|&cell| container.is_cell_free(cell)))
    }

    /// Place the item, occupying every footprint cell.
    ///
    /// Returns `false` (and emits `ItemRejected`) without mutating when the
    /// placement is not fully free or the item is already contained. On
    /// success emits `ItemAdded` and queues `ItemsUpdated`.
    pub fn try_add_item(
        &mut self,
        id: ItemId,
        container_id: ContainerId,
        anchor: Cell,
    ) -> Result<bool, GridError> {
        if self.item(id)?.placement().is_some() || !self.can_add_item(id, container_id, anchor)? {
            self.notifier.emit(GridEvent::ItemRejected {
                container: container_id,
                item: id,
            });
            return Ok(false);
        }

        let item = self.items.get_mut(&id).ok_or(GridError::UnknownItem(id))?;
        let container = self
            .containers
            .get_mut(&container_id)
            .ok_or(GridError::UnknownContainer(container_id))?;
        for &offset in item.footprint() {
            container.occupy(anchor + offset, id);
        }
        item.set_placement(Some(Placement {
            container: container_id,
            anchor,
        }));

        self.notifier.emit(GridEvent::ItemAdded {
            container: container_id,
            item: id,
        });
        self.notifier.defer(GridEvent::ItemsUpdated {
            container: container_id,
        });
        Ok(true)
    }

    /// Vacate every cell the item occupies and clear its placement.
    ///
    /// Removing an uncontained item is a caller invariant violation; it is
    /// logged and reported as `false` with no mutation.
    pub fn try_remove_item(&mut self, id: ItemId) -> Result<bool, GridError> {
        let item = self.items.get_mut(&id).ok_or(GridError::UnknownItem(id))?;
        let Some(placement) = item.placement() else {
            warn!("{id} is not contained anywhere and cannot be removed");
            return Ok(false);
        };

        let container = self
            .containers
            .get_mut(&placement.container)
            .ok_or(GridError::UnknownContainer(placement.container))?;
        for &offset in item.footprint() {
            container.vacate(placement.anchor + offset);
        }
        item.set_placement(None);

        self.notifier.emit(GridEvent::ItemRemoved {
            container: placement.container,
            item: id,
        });
        self.notifier.defer(GridEvent::ItemsUpdated {
            container: placement.container,
        });
        Ok(true)
    }

    /// Non-mutating trial placement.
    ///
    /// An invalid anchor cell short-circuits to `can_move == false` with no
    /// collision set. Otherwise every trial cell occupied by another item
    /// contributes its occupant to `collisions` (first-seen order, no
    /// duplicates); cells owned by the item itself never self-block.
    /// A nonempty collision set is judged by the item's movement-validator
    /// properties: `can_move` stays true when every validator accepts it,
    /// and an item with no validators accepts any set, which is what lets
    /// plain items push their neighbors.
    pub fn check_add_item(
        &self,
        id: ItemId,
        container_id: ContainerId,
        anchor: Cell,
    ) -> Result<MovementResult, GridError> {
        let item = self.item(id)?;
        let container = self.container(container_id)?;

        if !container.is_cell_valid(anchor) {
            return Ok(MovementResult {
                can_move: false,
                collisions: Vec::new(),
            });
        }

        let trial_cells = Self::trial_cells(item, anchor);
        let mut collisions = Vec::new();
        for &cell in &trial_cells {
            if let Some(occupant) = container.occupant(cell) {
                if occupant != id && !collisions.contains(&occupant) {
                    collisions.push(occupant);
                }
            }
        }

        let can_move = if collisions.is_empty() {
            true
        } else {
            let current_cells = match item.placement() {
                Some(placement) => Self::trial_cells(item, placement.anchor),
                None => Vec::new(),
            };
            item.properties()
                .iter()
                .filter(|property| property.is_movement_validator())
                .all(|property| {
                    property.can_resolve_collision(
                        id,
                        &current_cells,
                        &trial_cells,
                        &collisions,
                        container,
                    )
                })
        };

        Ok(MovementResult { can_move, collisions })
    }

    /// Whether `cell` is occupied by exactly this item.
    pub fn is_cell_owned_by_item(
        &self,
        id: ItemId,
        container_id: ContainerId,
        cell: Cell,
    ) -> Result<bool, GridError> {
        Ok(self.container(container_id)?.is_cell_owned_by(cell, id))
    }

    /// Rotate an uncontained item by one 90° step, emitting `ItemRotated`.
    ///
    /// Rotating a contained item is a no-op; occupancy stays authoritative.
    pub fn rotate_item(&mut self, id: ItemId, rotation: Rotation) -> Result<(), GridError> {
        let item = self.items.get_mut(&id).ok_or(GridError::UnknownItem(id))?;
        match item.rotate(rotation) {
            Some((old_degrees, new_degrees)) => {
                self.notifier.emit(GridEvent::ItemRotated {
                    item: id,
                    old_degrees,
                    new_degrees,
                });
            }
            None => debug!("{id} is contained, rotation ignored"),
        }
        Ok(())
    }

    /// Dispatch all settle-deferred notifications.
    ///
    /// Called once per tick after mutation, property, and effect passes; may
    /// also be called directly after out-of-tick mutations (a player drop).
    pub fn settle(&mut self) {
        self.notifier.settle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn board_with_square(side: i32) -> (Board, ContainerId) {
        let mut board = Board::new();
        let mut layout = HashMap::new();
        for x in 0..side {
            for y in 0..side {
                layout.insert(Cell::new(x, y), TileKind::Normal);
            }
        }
        let container = board.add_container(layout, 1.0);
        (board, container)
    }

    fn domino() -> ItemTemplate {
        ItemTemplate::from_rows("domino", &["##"]).unwrap()
    }

    #[test]
    fn test_add_occupies_footprint() {
        let (mut board, container) = board_with_square(3);
        let item = board.spawn_item(&domino());

        assert!(board.try_add_item(item, container, Cell::new(0, 0)).unwrap());
        let grid = board.container(container).unwrap();
        assert_eq!(grid.occupant(Cell::new(0, 0)), Some(item));
        assert_eq!(grid.occupant(Cell::new(1, 0)), Some(item));
        assert_eq!(
            board.item(item).unwrap().placement(),
            Some(Placement {
                container,
                anchor: Cell::new(0, 0)
            })
        );
    }

    #[test]
    fn test_overlapping_add_mutates_nothing() {
        let (mut board, container) = board_with_square(3);
        let first = board.spawn_item(&domino());
        let second = board.spawn_item(&domino());

        assert!(board.try_add_item(first, container, Cell::new(0, 0)).unwrap());
        assert!(!board.try_add_item(second, container, Cell::new(1, 0)).unwrap());

        assert_eq!(board.item(second).unwrap().placement(), None);
        assert_eq!(
            board.container(container).unwrap().occupant(Cell::new(1, 0)),
            Some(first)
        );
    }

    #[test]
    fn test_add_out_of_mask_rejected() {
        let (mut board, container) = board_with_square(2);
        let item = board.spawn_item(&domino());
        // (1,0) is valid but (2,0) falls outside the mask.
        assert!(!board.try_add_item(item, container, Cell::new(1, 0)).unwrap());
        assert_eq!(board.container(container).unwrap().occupied_count(), 0);
    }

    #[test]
    fn test_remove_twice_returns_false() {
        let (mut board, container) = board_with_square(3);
        let item = board.spawn_item(&domino());
        board.try_add_item(item, container, Cell::new(0, 0)).unwrap();

        assert!(board.try_remove_item(item).unwrap());
        assert!(!board.try_remove_item(item).unwrap());
        assert!(!board.try_remove_item(item).unwrap());
        assert_eq!(board.container(container).unwrap().occupied_count(), 0);
    }

    #[test]
    fn test_check_add_anchor_invalid_short_circuits() {
        let (mut board, container) = board_with_square(2);
        let blocker = board.spawn_item(&domino());
        board.try_add_item(blocker, container, Cell::new(0, 0)).unwrap();

        let item = board.spawn_item(&domino());
        let result = board.check_add_item(item, container, Cell::new(-1, 0)).unwrap();
        assert!(!result.can_move);
        assert!(result.collisions.is_empty(), "anchor-invalid reports no collisions");
    }

    #[test]
    fn test_check_add_collects_each_collider_once() {
        let (mut board, container) = board_with_square(3);
        let blocker = board.spawn_item(&domino());
        board.try_add_item(blocker, container, Cell::new(0, 0)).unwrap();

        let item = board.spawn_item(&domino());
        let result = board.check_add_item(item, container, Cell::new(0, 0)).unwrap();
        // No validator properties, so the collision set is acceptable.
        assert!(result.can_move);
        assert_eq!(result.collisions, vec![blocker]);
    }

    #[test]
    fn test_check_add_consults_validator_properties() {
        use crate::item::properties::PropertyKind;

        let (mut board, container) = board_with_square(3);
        let blocker = board.spawn_item(&domino());
        board.try_add_item(blocker, container, Cell::new(0, 1)).unwrap();

        let heavy = board.spawn_item(&domino().with_property(PropertyKind::Heavy));
        board.try_add_item(heavy, container, Cell::new(0, 0)).unwrap();

        // The collision is not the set of items below the mover, so the
        // heavy validator rejects the trial.
        let result = board.check_add_item(heavy, container, Cell::new(0, 1)).unwrap();
        assert!(!result.can_move);
        assert_eq!(result.collisions, vec![blocker]);
    }

    #[test]
    fn test_check_add_ignores_own_cells() {
        let (mut board, container) = board_with_square(3);
        let item = board.spawn_item(&domino());
        board.try_add_item(item, container, Cell::new(0, 0)).unwrap();

        // Shifting one cell right overlaps the item's own old footprint.
        let result = board.check_add_item(item, container, Cell::new(1, 0)).unwrap();
        assert!(result.can_move);
        assert!(result.collisions.is_empty());
    }

    #[test]
    fn test_events_and_settle_order() {
        let (mut board, container) = board_with_square(3);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        board.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let item = board.spawn_item(&domino());
        board.try_add_item(item, container, Cell::new(0, 0)).unwrap();
        assert_eq!(
            seen.borrow().as_slice(),
            &[GridEvent::ItemAdded { container, item }],
            "ItemsUpdated waits for the settle barrier"
        );

        board.settle();
        assert_eq!(
            seen.borrow().last(),
            Some(&GridEvent::ItemsUpdated { container })
        );
    }

    #[test]
    fn test_rejection_event() {
        let (mut board, container) = board_with_square(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        board.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let item = board.spawn_item(&domino());
        assert!(!board.try_add_item(item, container, Cell::new(0, 0)).unwrap());
        assert_eq!(
            seen.borrow().as_slice(),
            &[GridEvent::ItemRejected { container, item }]
        );
    }

    #[test]
    fn test_rotation_event_payload() {
        let (mut board, _) = board_with_square(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        board.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let item = board.spawn_item(&domino());
        board.rotate_item(item, Rotation::Clockwise).unwrap();
        assert_eq!(
            seen.borrow().as_slice(),
            &[GridEvent::ItemRotated {
                item,
                old_degrees: 0.0,
                new_degrees: 90.0
            }]
        );
    }

    #[test]
    fn test_rotating_contained_item_emits_nothing() {
        let (mut board, container) = board_with_square(3);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        board.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let item = board.spawn_item(&domino());
        board.try_add_item(item, container, Cell::new(0, 0)).unwrap();
        seen.borrow_mut().clear();

        board.rotate_item(item, Rotation::Clockwise).unwrap();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let board = Board::new();
        assert!(matches!(
            board.item(ItemId(9)),
            Err(GridError::UnknownItem(ItemId(9)))
        ));
        assert!(matches!(
            board.container(ContainerId(9)),
            Err(GridError::UnknownContainer(ContainerId(9)))
        ));
    }
}
