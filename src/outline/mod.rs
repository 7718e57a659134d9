//! Perimeter tracing for placement previews.
//!
//! Given an unordered set of occupied cells, produces an ordered vertex
//! polygon a line renderer can draw in one stroke. Corners are kept on an
//! integer lattice (corner `(cx, cy)` is the south-west corner of cell
//! `(cx, cy)`) until the final world-space conversion, so vertex identity
//! is exact integer equality rather than float comparison.

use std::collections::{BTreeMap, BTreeSet};

use log::warn;
use thiserror::Error;

use crate::grid::types::{Cell, Point};

#[derive(Debug, Error, PartialEq)]
pub enum OutlineError {
    /// Disjoint regions have no single perimeter; the caller must skip
    /// rendering instead.
    #[error("cell region is not contiguous")]
    NotContiguous,

    #[error("cell region is empty")]
    EmptyRegion,
}

/// Every cell shares at least one edge with another cell in the set.
/// Trivially true for a single cell.
pub fn is_contiguous(cells: &BTreeSet<Cell>) -> bool {
    if cells.len() <= 1 {
        return true;
    }
    cells
        .iter()
        .all(|cell| cell.neighbors().iter().any(|n| cells.contains(n)))
}

/// Empty cells inside the bounding rectangle that see an occupied cell in
/// all four axis directions before reaching the bounds.
pub fn find_holes(cells: &BTreeSet<Cell>) -> Vec<Cell> {
    if cells.len() < 4 {
        return Vec::new();
    }

    let (Some(min_x), Some(max_x), Some(min_y), Some(max_y)) = (
        cells.iter().map(|c| c.x).min(),
        cells.iter().map(|c| c.x).max(),
        cells.iter().map(|c| c.y).min(),
        cells.iter().map(|c| c.y).max(),
    ) else {
        return Vec::new();
    };

    let in_bounds =
        |c: Cell| c.x >= min_x && c.x <= max_x && c.y >= min_y && c.y <= max_y;

    let mut holes = Vec::new();
    for x in min_x..=max_x {
        for y in min_y..=max_y {
            let candidate = Cell::new(x, y);
            if cells.contains(&candidate) {
                continue;
            }

            let enclosed = [Cell::UP, Cell::DOWN, Cell::LEFT, Cell::RIGHT]
                .into_iter()
                .all(|step| {
                    let mut probe = candidate + step;
                    while in_bounds(probe) {
                        if cells.contains(&probe) {
                            return true;
                        }
                        probe = probe + step;
                    }
                    false
                });

            if enclosed {
                holes.push(candidate);
            }
        }
    }
    holes
}

/// Trace the perimeter polygon of a contiguous cell region.
///
/// Interior holes are filled before tracing, so the outline runs around
/// the outer silhouette only. The returned vertices are in traversal order
/// and spaced by `cell_size`; consecutive vertices are always one grid
/// step apart.
pub fn trace_perimeter(cells: &[Cell], cell_size: f64) -> Result<Vec<Point>, OutlineError> {
    let mut region: BTreeSet<Cell> = cells.iter().copied().collect();
    if region.is_empty() {
        return Err(OutlineError::EmptyRegion);
    }
    if !is_contiguous(&region) {
        warn!("cell region is not contiguous, no perimeter exists");
        return Err(OutlineError::NotContiguous);
    }

    for hole in find_holes(&region) {
        region.insert(hole);
    }

    // Corner -> the cells touching it. A corner shared by all 4 possible
    // cells is interior and never part of the perimeter.
    let mut corner_map: BTreeMap<Cell, BTreeSet<Cell>> = BTreeMap::new();
    for &cell in &region {
        let corners = [
            Cell::new(cell.x, cell.y),
            Cell::new(cell.x + 1, cell.y),
            Cell::new(cell.x, cell.y + 1),
            Cell::new(cell.x + 1, cell.y + 1),
        ];
        for corner in corners {
            corner_map.entry(corner).or_default().insert(cell);
        }
    }
    corner_map.retain(|_, touching| touching.len() < 4);

    // BTreeMap order makes the start deterministic; any surviving corner
    // is on the perimeter.
    let Some(&start) = corner_map.keys().next() else {
        return Ok(Vec::new());
    };

    let mut ordered = vec![start];
    let mut remaining: BTreeSet<Cell> = corner_map.keys().copied().collect();
    remaining.remove(&start);
    let mut current = start;

    while let Some(next) = next_corner(current, &remaining, &corner_map) {
        ordered.push(next);
        remaining.remove(&next);
        current = next;
    }

    Ok(ordered
        .into_iter()
        .map(|corner| {
            Point::new(
                (corner.x as f64 - 0.5) * cell_size,
                (corner.y as f64 - 0.5) * cell_size,
            )
        })
        .collect())
}

/// The next unvisited corner one step away, probing clockwise
/// (up, right, down, left). Returns `None` when the loop is closed.
fn next_corner(
    current: Cell,
    remaining: &BTreeSet<Cell>,
    corner_map: &BTreeMap<Cell, BTreeSet<Cell>>,
) -> Option<Cell> {
    for step in [Cell::UP, Cell::RIGHT, Cell::DOWN, Cell::LEFT] {
        let candidate = current + step;
        if remaining.contains(&candidate) && is_jump_valid(current, candidate, corner_map) {
            return Some(candidate);
        }
    }
    None
}

/// A step between two perimeter corners is a real edge only when the two
/// corners share exactly one cell and the origin corner's touching cells
/// are themselves face-contiguous. Anything else is a diagonal pinch point
/// the outline must not cut across.
fn is_jump_valid(
    origin: Cell,
    other: Cell,
    corner_map: &BTreeMap<Cell, BTreeSet<Cell>>,
) -> bool {
    let origin_cells = &corner_map[&origin];
    let other_cells = &corner_map[&other];

    if !is_contiguous(origin_cells) {
        return false;
    }
    origin_cells.intersection(other_cells).count() == 1
}
