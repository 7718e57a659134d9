//! Per-tick movement resolution.
//!
//! Requests collect between ticks; `resolve` orders them so blockers commit
//! before the items depending on them, commits each move with a
//! restore-on-failure fallback, runs the crush and tile-effect passes, and
//! finally releases the settle-deferred notifications. A tick never aborts:
//! an individual failed move degrades to a no-op for that item.

use log::{debug, warn};

use super::board::{Board, GridEvent};
use super::error::GridError;
use super::types::{Cell, ContainerId, ItemId, Point};
use crate::item::properties::{
    break_fragile, crush_item_vertical, items_below, CrushOutcome, PropertyTag,
};

/// What one resolution tick did.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Items that moved, with the world-space snap point of their anchor.
    pub moved: Vec<(ItemId, Point)>,
    /// Items whose requested move failed and were restored in place.
    pub blocked: Vec<ItemId>,
    /// Items that lost their contact row to a heavy item this tick.
    pub crushed: Vec<ItemId>,
    /// Fragile items broken by a heavy item this tick.
    pub broken: Vec<ItemId>,
}

/// Collects movement requests and resolves them in dependency order.
#[derive(Debug, Default)]
pub struct MoveResolver {
    requests: Vec<(ItemId, Cell)>,
}

impl MoveResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a desired offset for an item this tick.
    ///
    /// At most one request per item per tick; a second registration for the
    /// same item is a caller contract violation.
    pub fn register_move(&mut self, item: ItemId, offset: Cell) -> Result<(), GridError> {
        if self.requests.iter().any(|&(id, _)| id == item) {
            return Err(GridError::DuplicateMoveRequest(item));
        }
        self.requests.push((item, offset));
        Ok(())
    }

    /// Queue the same offset for every item in the container (a gravity or
    /// conveyor step). Items registered earlier this tick are skipped.
    pub fn register_all(
        &mut self,
        board: &Board,
        container: ContainerId,
        offset: Cell,
    ) -> Result<(), GridError> {
        for item in board.container(container)?.contained_items() {
            if self.requests.iter().any(|&(id, _)| id == item) {
                continue;
            }
            self.requests.push((item, offset));
        }
        Ok(())
    }

    /// Run one tick: order, commit, property pass, effect pass, settle.
    ///
    /// Request state is cleared whether or not any move succeeds.
    pub fn resolve(&mut self, board: &mut Board) -> Result<TickReport, GridError> {
        let chain = self.execution_order(board)?;
        debug!("resolving {} request(s), chain length {}", self.requests.len(), chain.len());

        let mut report = TickReport::default();
        self.execute(board, &chain, &mut report)?;
        property_pass(board, &mut report)?;
        effect_pass(board)?;
        board.settle();

        self.requests.clear();
        Ok(report)
    }

    /// Build the commit order: for each request, pull in its blockers ahead
    /// of it; unresolvable or anchor-invalid requests go in alone at the
    /// end (they get their attempt and fail at commit, staying in place).
    fn execution_order(&self, board: &Board) -> Result<Vec<ItemId>, GridError> {
        let mut chain: Vec<ItemId> = Vec::new();

        for &(item, offset) in &self.requests {
            if chain.contains(&item) {
                continue;
            }

            let Some(placement) = board.item(item)?.placement() else {
                warn!("{item} has a move request but is not contained, skipping");
                continue;
            };

            let trial_anchor = placement.anchor + offset;
            let result = board.check_add_item(item, placement.container, trial_anchor)?;

            if result.collisions.is_empty() || !result.can_move {
                // A clean move, an invalid anchor, or a collision set the
                // item's validators reject; all commit (or fail) without
                // dependencies.
                chain.push(item);
                continue;
            }

            for &blocker in &result.collisions {
                if !chain.contains(&blocker) {
                    chain.push(blocker);
                }
            }
            chain.push(item);
        }

        Ok(chain)
    }

    /// Walk the chain, committing each requested move. A failed re-add at
    /// the target restores the item at its original anchor so no item ends
    /// a tick unowned.
    fn execute(
        &self,
        board: &mut Board,
        chain: &[ItemId],
        report: &mut TickReport,
    ) -> Result<(), GridError> {
        for &item in chain {
            // Blockers pulled into the chain without a request of their own
            // have nowhere to go.
            let Some(&(_, offset)) = self.requests.iter().find(|&&(id, _)| id == item) else {
                continue;
            };

            let Some(placement) = board.item(item)?.placement() else {
                continue;
            };
            if !board.try_remove_item(item)? {
                continue;
            }

            let target = placement.anchor + offset;
            if board.try_add_item(item, placement.container, target)? {
                let snap = board.container(placement.container)?.snap_to_cell(target);
                report.moved.push((item, snap));
            } else {
                let restored = board.try_add_item(item, placement.container, placement.anchor)?;
                if !restored {
                    warn!("{item} could not be restored at {}", placement.anchor);
                    debug_assert!(restored, "restore at the original anchor must succeed");
                }
                report.blocked.push(item);
            }
        }
        Ok(())
    }
}

/// Post-commit property pass: every contained heavy item crushes crushable
/// items and breaks fragile items resting directly beneath it.
fn property_pass(board: &mut Board, report: &mut TickReport) -> Result<(), GridError> {
    let heavy_ids: Vec<ItemId> = board
        .item_ids()
        .into_iter()
        .filter(|&id| {
            board.item(id).is_ok_and(|item| {
                item.placement().is_some()
                    && item.properties().iter().any(|p| p.tag() == PropertyTag::Heavy)
            })
        })
        .collect();

    for heavy in heavy_ids {
        let cells = board.cells_of(heavy)?;
        let Some(placement) = board.item(heavy)?.placement() else {
            continue;
        };
        let container_id = placement.container;
        let below: Vec<ItemId> = {
            let container = board.container(container_id)?;
            items_below(heavy, &cells, container).into_iter().collect()
        };

        for target in below {
            let (items, containers, notifier) = board.parts_mut();
            let container = containers
                .get_mut(&container_id)
                .ok_or(GridError::UnknownContainer(container_id))?;

            if crush_item_vertical(heavy, target, items, container) == CrushOutcome::Crushed {
                debug!("{heavy} crushed {target}");
                report.crushed.push(target);
                notifier.defer(GridEvent::ItemsUpdated {
                    container: container_id,
                });
            }

            let target_item = items.get_mut(&target).ok_or(GridError::UnknownItem(target))?;
            if break_fragile(target_item) {
                debug!("{heavy} broke {target}");
                report.broken.push(target);
            }
        }
    }
    Ok(())
}

/// Recompute the active tile-effect set of every contained item from the
/// layout tiles adjacent to its occupied cells.
fn effect_pass(board: &mut Board) -> Result<(), GridError> {
    for id in board.item_ids() {
        let Some(placement) = board.item(id)?.placement() else {
            continue;
        };
        let cells = board.cells_of(id)?;
        let active = board.container(placement.container)?.adjacent_effects(&cells);

        let (items, _, notifier) = board.parts_mut();
        let item = items.get_mut(&id).ok_or(GridError::UnknownItem(id))?;
        if item.set_effects(active) {
            notifier.defer(GridEvent::ItemsUpdated {
                container: placement.container,
            });
        }
    }
    Ok(())
}

/// Shift every item in the container by the same offset, item by item with
/// restore on failure. Returns how many items actually moved.
pub fn move_all_items(
    board: &mut Board,
    container: ContainerId,
    offset: Cell,
) -> Result<usize, GridError> {
    let mut moved = 0;
    for item in board.container(container)?.contained_items() {
        let Some(placement) = board.item(item)?.placement() else {
            continue;
        };
        if !board.try_remove_item(item)? {
            continue;
        }
        if board.try_add_item(item, container, placement.anchor + offset)? {
            moved += 1;
        } else if !board.try_add_item(item, container, placement.anchor)? {
            warn!("{item} could not be restored at {}", placement.anchor);
        }
    }
    Ok(moved)
}
