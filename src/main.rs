//! Packgrid CLI
//!
//! Headless puzzle simulator: loads a TOML puzzle definition, runs a number
//! of gravity ticks through the move resolver, and prints the resulting
//! grid, score, and criteria progress.
//!
//! Usage:
//!   packgrid [OPTIONS] [FILE]
//!
//! Options:
//!   -t, --ticks <N>  Number of gravity ticks to simulate (default 10)
//!   -e, --events     Print grid events as they fire
//!   -o, --outline    Print the perimeter polygon of the occupied region

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;

use packgrid::{
    all_criteria_met, trace_perimeter, Board, Cell, ContainerId, MoveResolver, Puzzle,
    PuzzleSetup, TileKind,
};

#[derive(Parser)]
#[command(name = "packgrid")]
#[command(about = "Headless grid-packing puzzle simulator")]
struct Cli {
    /// Puzzle file in TOML format (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Number of gravity ticks to simulate
    #[arg(short, long, default_value_t = 10)]
    ticks: u32,

    /// Print grid events as they fire
    #[arg(short, long)]
    events: bool,

    /// Print the perimeter polygon of the occupied region
    #[arg(short, long)]
    outline: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.input.is_none() && io::stdin().is_terminal() {
        eprintln!("packgrid: pass a puzzle file or pipe TOML on stdin (see --help)");
        std::process::exit(2);
    }

    let source = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("Error reading from stdin: {}", e);
                std::process::exit(1);
            }
            buffer
        }
    };

    let puzzle = match Puzzle::from_str(&source) {
        Ok(puzzle) => puzzle,
        Err(e) => {
            eprintln!("Error parsing puzzle: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&puzzle, &cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(puzzle: &Puzzle, cli: &Cli) -> Result<(), packgrid::Error> {
    let PuzzleSetup {
        mut board,
        container,
        items,
        criteria,
        scoring,
    } = puzzle.build()?;

    if let Some(name) = &puzzle.name {
        println!("puzzle: {name}");
    }

    if cli.events {
        board.subscribe(|event| println!("event: {event:?}"));
    }

    let mut resolver = MoveResolver::new();
    for tick in 1..=cli.ticks {
        resolver.register_all(&board, container, Cell::DOWN)?;
        let report = resolver.resolve(&mut board)?;
        if report.moved.is_empty()
            && report.crushed.is_empty()
            && report.broken.is_empty()
        {
            println!("settled after {tick} tick(s)");
            break;
        }
    }

    print_grid(&board, container, &items)?;

    if let Some(rule) = scoring {
        let score = rule.score(board.container(container)?);
        println!("score: {score}");
    }
    if !criteria.is_empty() {
        let met = all_criteria_met(&board, container, &criteria)?;
        println!("criteria met: {met}");
    }

    if cli.outline {
        let occupied: Vec<Cell> = board
            .container(container)?
            .cells()
            .keys()
            .copied()
            .collect();
        match trace_perimeter(&occupied, board.container(container)?.cell_size()) {
            Ok(vertices) => {
                let path: Vec<String> = vertices
                    .iter()
                    .map(|v| format!("({:.1}, {:.1})", v.x, v.y))
                    .collect();
                println!("outline: {}", path.join(" -> "));
            }
            Err(e) => println!("outline unavailable: {e}"),
        }
    }

    Ok(())
}

/// Render the container as ASCII art, top row first. Items print as
/// letters in declaration order; free cells print by tile kind.
fn print_grid(
    board: &Board,
    container: ContainerId,
    items: &[(String, packgrid::ItemId)],
) -> Result<(), packgrid::Error> {
    let grid = board.container(container)?;
    let cells: Vec<Cell> = grid.tiles().map(|(cell, _)| cell).collect();
    let (Some(min_x), Some(max_x)) = (
        cells.iter().map(|c| c.x).min(),
        cells.iter().map(|c| c.x).max(),
    ) else {
        return Ok(());
    };
    let min_y = cells.iter().map(|c| c.y).min().unwrap_or(0);
    let max_y = cells.iter().map(|c| c.y).max().unwrap_or(0);

    let letter = |cell: Cell| -> char {
        match grid.occupant(cell) {
            Some(id) => items
                .iter()
                .position(|&(_, item)| item == id)
                .map(|index| (b'A' + (index % 26) as u8) as char)
                .unwrap_or('?'),
            None => match grid.tile_kind(cell) {
                Some(TileKind::Normal) => '.',
                Some(TileKind::Criteria) => 'c',
                Some(TileKind::Effect(_)) => 'e',
                None => ' ',
            },
        }
    };

    for y in (min_y..=max_y).rev() {
        let row: String = (min_x..=max_x).map(|x| letter(Cell::new(x, y))).collect();
        println!("{}", row.trim_end());
    }

    for (index, (name, id)) in items.iter().enumerate() {
        let symbol = (b'A' + (index % 26) as u8) as char;
        let state = match board.item(*id)?.placement() {
            Some(placement) => format!("at ({}, {})", placement.anchor.x, placement.anchor.y),
            None => "uncontained".to_string(),
        };
        println!("  {symbol} = {name} {state}");
    }
    Ok(())
}
