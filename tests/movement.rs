//! Integration tests for per-tick movement resolution.
//!
//! These tests verify that:
//! - Blockers commit before the items that depend on them
//! - Failed moves restore the item at its original anchor
//! - Heavy items only move against the exact set of items below them
//! - Repeated gravity ticks settle a container bottom-up

use std::collections::HashMap;

use pretty_assertions::assert_eq;

use packgrid::{
    move_all_items, Board, Cell, ContainerId, ItemId, ItemTemplate, MoveResolver, Point,
    PropertyKind, TileKind,
};

fn board_with_rect(width: i32, height: i32) -> (Board, ContainerId) {
    let mut board = Board::new();
    let mut layout = HashMap::new();
    for x in 0..width {
        for y in 0..height {
            layout.insert(Cell::new(x, y), TileKind::Normal);
        }
    }
    let container = board.add_container(layout, 1.0);
    (board, container)
}

fn single() -> ItemTemplate {
    ItemTemplate::from_rows("single", &["#"]).unwrap()
}

fn heavy_single() -> ItemTemplate {
    single().with_property(PropertyKind::Heavy)
}

fn place(board: &mut Board, container: ContainerId, template: &ItemTemplate, x: i32, y: i32) -> ItemId {
    let item = board.spawn_item(template);
    assert!(
        board.try_add_item(item, container, Cell::new(x, y)).unwrap(),
        "placement at ({x}, {y}) must succeed"
    );
    item
}

fn occupant(board: &Board, container: ContainerId, x: i32, y: i32) -> Option<ItemId> {
    board.container(container).unwrap().occupant(Cell::new(x, y))
}

#[test]
fn test_item_moves_out_from_under_resting_heavy() {
    // A at (0,0), heavy B resting on it at (0,1). Only the cells of A's
    // desired placement matter for blocker detection, so A slides out and
    // B stays where it is.
    let (mut board, container) = board_with_rect(2, 2);
    let a = place(&mut board, container, &single(), 0, 0);
    let b = place(&mut board, container, &heavy_single(), 0, 1);

    let mut resolver = MoveResolver::new();
    resolver.register_move(a, Cell::RIGHT).unwrap();
    let report = resolver.resolve(&mut board).unwrap();

    assert_eq!(report.moved.len(), 1);
    assert_eq!(report.moved[0], (a, Point::new(1.0, 0.0)));
    assert_eq!(occupant(&board, container, 1, 0), Some(a));
    assert_eq!(occupant(&board, container, 0, 1), Some(b));
}

#[test]
fn test_push_chain_of_three() {
    // Registered far to near, each blocker enters the chain before its
    // dependent and the whole row shifts right in one tick.
    let (mut board, container) = board_with_rect(4, 1);
    let a = place(&mut board, container, &single(), 0, 0);
    let b = place(&mut board, container, &single(), 1, 0);
    let c = place(&mut board, container, &single(), 2, 0);

    let mut resolver = MoveResolver::new();
    resolver.register_move(c, Cell::RIGHT).unwrap();
    resolver.register_move(b, Cell::RIGHT).unwrap();
    resolver.register_move(a, Cell::RIGHT).unwrap();
    let report = resolver.resolve(&mut board).unwrap();

    assert_eq!(report.blocked, Vec::<ItemId>::new());
    assert_eq!(occupant(&board, container, 1, 0), Some(a));
    assert_eq!(occupant(&board, container, 2, 0), Some(b));
    assert_eq!(occupant(&board, container, 3, 0), Some(c));
}

#[test]
fn test_pulled_in_blocker_skips_its_own_dependencies() {
    // B enters the chain as A's blocker before its own request is
    // examined, so B's dependency on C is never scheduled. B and A fail
    // and restore; only C moves. Per-item restore, not chain rollback.
    let (mut board, container) = board_with_rect(4, 1);
    let a = place(&mut board, container, &single(), 0, 0);
    let b = place(&mut board, container, &single(), 1, 0);
    let c = place(&mut board, container, &single(), 2, 0);

    let mut resolver = MoveResolver::new();
    resolver.register_move(a, Cell::RIGHT).unwrap();
    resolver.register_move(b, Cell::RIGHT).unwrap();
    resolver.register_move(c, Cell::RIGHT).unwrap();
    let report = resolver.resolve(&mut board).unwrap();

    assert_eq!(report.moved, vec![(c, Point::new(3.0, 0.0))]);
    assert_eq!(report.blocked, vec![b, a]);
    assert_eq!(occupant(&board, container, 0, 0), Some(a));
    assert_eq!(occupant(&board, container, 1, 0), Some(b));
    assert_eq!(occupant(&board, container, 3, 0), Some(c));
}

#[test]
fn test_chain_against_wall_blocks_individually() {
    // Nobody has room; every item fails its attempt and restores in place.
    let (mut board, container) = board_with_rect(3, 1);
    let a = place(&mut board, container, &single(), 0, 0);
    let b = place(&mut board, container, &single(), 1, 0);
    let c = place(&mut board, container, &single(), 2, 0);

    let mut resolver = MoveResolver::new();
    resolver.register_move(a, Cell::RIGHT).unwrap();
    resolver.register_move(b, Cell::RIGHT).unwrap();
    resolver.register_move(c, Cell::RIGHT).unwrap();
    let report = resolver.resolve(&mut board).unwrap();

    assert_eq!(report.moved, Vec::<(ItemId, Point)>::new());
    assert_eq!(report.blocked, vec![b, a, c]);
    assert_eq!(occupant(&board, container, 0, 0), Some(a));
    assert_eq!(occupant(&board, container, 1, 0), Some(b));
    assert_eq!(occupant(&board, container, 2, 0), Some(c));
}

#[test]
fn test_heavy_falls_and_stacks() {
    // Gravity ticks drop the heavy item until it rests on the floor item.
    let (mut board, container) = board_with_rect(1, 4);
    let floor = place(&mut board, container, &single(), 0, 0);
    let heavy = place(&mut board, container, &heavy_single(), 0, 3);

    let mut resolver = MoveResolver::new();
    for _ in 0..4 {
        resolver.register_all(&board, container, Cell::DOWN).unwrap();
        resolver.resolve(&mut board).unwrap();
    }

    assert_eq!(occupant(&board, container, 0, 0), Some(floor));
    assert_eq!(occupant(&board, container, 0, 1), Some(heavy));
}

#[test]
fn test_heavy_cannot_push_a_side_neighbor() {
    let (mut board, container) = board_with_rect(3, 1);
    let heavy = place(&mut board, container, &heavy_single(), 0, 0);
    let neighbor = place(&mut board, container, &single(), 1, 0);

    let mut resolver = MoveResolver::new();
    resolver.register_move(heavy, Cell::RIGHT).unwrap();
    let report = resolver.resolve(&mut board).unwrap();

    assert_eq!(report.blocked, vec![heavy]);
    assert_eq!(occupant(&board, container, 0, 0), Some(heavy));
    assert_eq!(occupant(&board, container, 1, 0), Some(neighbor));
}

#[test]
fn test_plain_item_pushes_its_neighbor() {
    // With no validator properties the collision set is always resolvable,
    // so the neighbor is pulled into the chain and pushed along.
    let (mut board, container) = board_with_rect(3, 1);
    let a = place(&mut board, container, &single(), 0, 0);
    let b = place(&mut board, container, &single(), 1, 0);

    let mut resolver = MoveResolver::new();
    resolver.register_move(a, Cell::RIGHT).unwrap();
    resolver.register_move(b, Cell::RIGHT).unwrap();
    resolver.resolve(&mut board).unwrap();

    assert_eq!(occupant(&board, container, 1, 0), Some(a));
    assert_eq!(occupant(&board, container, 2, 0), Some(b));
}

#[test]
fn test_wide_item_reports_anchor_snap_point() {
    let (mut board, container) = board_with_rect(3, 2);
    let wide = {
        let template = ItemTemplate::from_rows("wide", &["##"]).unwrap();
        place(&mut board, container, &template, 0, 1)
    };

    let mut resolver = MoveResolver::new();
    resolver.register_move(wide, Cell::DOWN).unwrap();
    let report = resolver.resolve(&mut board).unwrap();

    assert_eq!(report.moved, vec![(wide, Point::new(0.0, 0.0))]);
}

#[test]
fn test_move_all_items_shifts_container() {
    let (mut board, container) = board_with_rect(3, 2);
    let a = place(&mut board, container, &single(), 0, 0);
    let b = place(&mut board, container, &single(), 0, 1);

    let moved = move_all_items(&mut board, container, Cell::RIGHT).unwrap();

    assert_eq!(moved, 2);
    assert_eq!(occupant(&board, container, 1, 0), Some(a));
    assert_eq!(occupant(&board, container, 1, 1), Some(b));
}
