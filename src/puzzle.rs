//! Puzzle definitions loaded from TOML.
//!
//! A puzzle file declares the container layout, the item roster with
//! optional starting placements, completion criteria, and a scoring rule.
//! Layout and shape rows are written top to bottom, like they look.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::grid::board::Board;
use crate::grid::container::TileKind;
use crate::grid::types::{Cell, ContainerId, ItemId};
use crate::item::properties::{PropertyKind, PropertyTag, TileAttribute};
use crate::item::{ItemTemplate, ShapeError};
use crate::scoring::{Criteria, ScoreRule};

/// Errors loading or instantiating a puzzle definition.
#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("failed to read puzzle file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse puzzle TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Grid(#[from] crate::grid::error::GridError),
    #[error("container layout contains unknown symbol '{symbol}'")]
    UnknownLayoutSymbol { symbol: char },
    #[error("container layout has no cells")]
    EmptyLayout,
    #[error("starting placement of '{item}' at ({x}, {y}) was rejected")]
    PlacementRejected { item: String, x: i32, y: i32 },
}

/// TOML structure for deserializing puzzles
#[derive(Deserialize)]
struct TomlPuzzle {
    metadata: Option<TomlMetadata>,
    container: TomlContainer,
    #[serde(default)]
    items: Vec<TomlItem>,
    #[serde(default)]
    criteria: Vec<Criteria>,
    scoring: Option<ScoreRule>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TomlContainer {
    #[serde(default = "default_cell_size")]
    cell_size: f64,
    layout: Vec<String>,
}

fn default_cell_size() -> f64 {
    1.0
}

#[derive(Deserialize)]
struct TomlItem {
    name: String,
    shape: Vec<String>,
    #[serde(default)]
    properties: Vec<PropertyTag>,
    /// Starting anchor cell, `[x, y]`. Omitted items spawn uncontained.
    position: Option<[i32; 2]>,
}

/// One item declared by a puzzle file.
#[derive(Debug, Clone)]
pub struct PuzzleItem {
    pub template: ItemTemplate,
    pub position: Option<Cell>,
}

/// A parsed puzzle definition, ready to instantiate.
#[derive(Debug, Clone)]
pub struct Puzzle {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cell_size: f64,
    pub layout: HashMap<Cell, TileKind>,
    pub items: Vec<PuzzleItem>,
    pub criteria: Vec<Criteria>,
    pub scoring: Option<ScoreRule>,
}

/// A live board built from a [`Puzzle`].
#[derive(Debug)]
pub struct PuzzleSetup {
    pub board: Board,
    pub container: ContainerId,
    /// Spawned items by declaration name, in declaration order.
    pub items: Vec<(String, ItemId)>,
    pub criteria: Vec<Criteria>,
    pub scoring: Option<ScoreRule>,
}

impl Puzzle {
    /// Load a puzzle from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, PuzzleError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a puzzle from a TOML string
    pub fn from_str(content: &str) -> Result<Self, PuzzleError> {
        let parsed: TomlPuzzle = toml::from_str(content)?;

        let layout = parse_layout(&parsed.container.layout)?;
        if layout.is_empty() {
            return Err(PuzzleError::EmptyLayout);
        }

        let mut items = Vec::new();
        for item in &parsed.items {
            let rows: Vec<&str> = item.shape.iter().map(String::as_str).collect();
            let mut template = ItemTemplate::from_rows(item.name.clone(), &rows)?;
            for &tag in &item.properties {
                template = template.with_property(property_from_tag(tag));
            }
            items.push(PuzzleItem {
                template,
                position: item.position.map(|[x, y]| Cell::new(x, y)),
            });
        }

        Ok(Puzzle {
            name: parsed.metadata.as_ref().and_then(|m| m.name.clone()),
            description: parsed.metadata.as_ref().and_then(|m| m.description.clone()),
            cell_size: parsed.container.cell_size,
            layout,
            items,
            criteria: parsed.criteria,
            scoring: parsed.scoring,
        })
    }

    /// Build a board with the container, spawn all items, and apply the
    /// starting placements.
    pub fn build(&self) -> Result<PuzzleSetup, PuzzleError> {
        let mut board = Board::new();
        let container = board.add_container(self.layout.clone(), self.cell_size);

        let mut items = Vec::new();
        for spec in &self.items {
            let id = board.spawn_item(&spec.template);
            if let Some(anchor) = spec.position {
                if !board.try_add_item(id, container, anchor)? {
                    return Err(PuzzleError::PlacementRejected {
                        item: spec.template.name.clone(),
                        x: anchor.x,
                        y: anchor.y,
                    });
                }
            }
            items.push((spec.template.name.clone(), id));
        }
        board.settle();

        Ok(PuzzleSetup {
            board,
            container,
            items,
            criteria: self.criteria.clone(),
            scoring: self.scoring,
        })
    }
}

/// Layout symbols: `#` normal, `C` criteria, `V`/`H` crushable effect
/// tiles, `.` no cell. Rows are top to bottom, the y axis points up.
fn parse_layout(rows: &[String]) -> Result<HashMap<Cell, TileKind>, PuzzleError> {
    let height = rows.len() as i32;
    let mut layout = HashMap::new();

    for (row_index, row) in rows.iter().enumerate() {
        let y = height - 1 - row_index as i32;
        for (col, symbol) in row.chars().enumerate() {
            let kind = match symbol {
                '#' => TileKind::Normal,
                'C' => TileKind::Criteria,
                'V' => TileKind::Effect(TileAttribute::CrushableVertical),
                'H' => TileKind::Effect(TileAttribute::CrushableHorizontal),
                '.' => continue,
                other => return Err(PuzzleError::UnknownLayoutSymbol { symbol: other }),
            };
            layout.insert(Cell::new(col as i32, y), kind);
        }
    }
    Ok(layout)
}

fn property_from_tag(tag: PropertyTag) -> PropertyKind {
    match tag {
        PropertyTag::Heavy => PropertyKind::Heavy,
        PropertyTag::Crushable => PropertyKind::crushable(),
        PropertyTag::Fragile => PropertyKind::fragile(),
    }
}
