//! Scoring and completion criteria.
//!
//! Score rules produce a point value for a container; progress rules
//! produce a completion fraction in `[0, 1]`. They are separate enums on
//! purpose: the two families support disjoint queries, and keeping them
//! apart makes an unsupported rule/query pairing unrepresentable instead
//! of a runtime surprise.

use serde::{Deserialize, Serialize};

use crate::grid::board::Board;
use crate::grid::container::{Container, TileKind};
use crate::grid::error::GridError;
use crate::grid::types::ContainerId;
use crate::item::properties::TileAttribute;

/// Rules that award a point score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScoreRule {
    /// `base_score` minus a penalty per unoccupied layout cell.
    #[serde(rename_all = "kebab-case")]
    GridCapacity {
        base_score: i32,
        empty_space_penalty: i32,
    },
}

impl ScoreRule {
    pub fn score(&self, container: &Container) -> i32 {
        match *self {
            ScoreRule::GridCapacity {
                base_score,
                empty_space_penalty,
            } => {
                let empty = (container.capacity() - container.occupied_count()) as i32;
                base_score + empty_space_penalty * empty
            }
        }
    }
}

/// Rules that report completion progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProgressRule {
    /// Fraction of criteria tiles covered by an item. Trivially complete
    /// when the layout has no criteria tiles.
    CriteriaTiles,
    /// Contained items carrying the attribute's granted property, counted
    /// against `goal`. `invert` counts the items that do not carry it.
    ItemEffect { attribute: TileAttribute },
}

impl ProgressRule {
    /// Progress toward `goal`, clamped to `[0, 1]`.
    pub fn progress(
        &self,
        board: &Board,
        container_id: ContainerId,
        goal: u32,
        invert: bool,
    ) -> Result<f64, GridError> {
        let container = board.container(container_id)?;
        let fraction = match *self {
            ProgressRule::CriteriaTiles => criteria_coverage(container),
            ProgressRule::ItemEffect { attribute } => {
                let total = container.contained_items().len();
                let mut count = container
                    .contained_items()
                    .into_iter()
                    .filter(|&id| {
                        board
                            .item(id)
                            .map(|item| carries(item, attribute))
                            .unwrap_or(false)
                    })
                    .count();
                if invert {
                    count = total - count;
                }
                if goal == 0 {
                    1.0
                } else {
                    count as f64 / goal as f64
                }
            }
        };
        Ok(fraction.clamp(0.0, 1.0))
    }
}

/// Whether the item has the attribute's granted property, either attached
/// at spawn or applied by an adjacent effect tile.
fn carries(item: &crate::item::Item, attribute: TileAttribute) -> bool {
    let granted = attribute.granted_property();
    item.properties().iter().any(|p| p.tag() == granted)
        || item
            .effects()
            .iter()
            .any(|&e| e.granted_property() == granted)
}

fn criteria_coverage(container: &Container) -> f64 {
    let mut total = 0usize;
    let mut covered = 0usize;
    for (cell, kind) in container.tiles() {
        if kind == TileKind::Criteria {
            total += 1;
            if container.occupant(cell).is_some() {
                covered += 1;
            }
        }
    }
    if total == 0 {
        1.0
    } else {
        covered as f64 / total as f64
    }
}

/// One completion requirement for a puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Criteria {
    #[serde(flatten)]
    pub rule: ProgressRule,
    #[serde(default = "default_goal")]
    pub goal: u32,
    #[serde(default)]
    pub invert: bool,
}

fn default_goal() -> u32 {
    1
}

impl Criteria {
    pub fn is_met(&self, board: &Board, container: ContainerId) -> Result<bool, GridError> {
        Ok(self.rule.progress(board, container, self.goal, self.invert)? >= 1.0)
    }
}

/// True when every criterion reports full progress.
pub fn all_criteria_met(
    board: &Board,
    container: ContainerId,
    criteria: &[Criteria],
) -> Result<bool, GridError> {
    for criterion in criteria {
        if !criterion.is_met(board, container)? {
            return Ok(false);
        }
    }
    Ok(true)
}
