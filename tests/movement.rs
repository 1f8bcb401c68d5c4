use jotile::collision::{CollisionMap, CollisionTable, FULL_COLLISION, NO_COLLISION};
use jotile::geometry::Aabb;
use jotile::movement::*;

/// 10×10 tiles of 16 px, all open.
fn open_map() -> CollisionMap {
    CollisionMap::new((0.0, 0.0), (16, 16), 10, vec![0; 100], CollisionTable::default()).unwrap()
}

/// 4×4 tiles of 16 px with a solid wall in column 2 (x 32..48).
fn walled_map() -> CollisionMap {
    let tiles = [0, 0, 1, 0].repeat(4);
    CollisionMap::new((0.0, 0.0), (16, 16), 4, tiles, CollisionTable::from_masks(&[NO_COLLISION, FULL_COLLISION]))
        .unwrap()
}

#[test]
fn test_open_move() {
    let map = open_map();
    let mover = Aabb::new(50.0, 50.0, 10.0, 10.0);
    assert_eq!(resolve_move(&mover, 10.0, 0.0, &[&map]).unwrap(), (60.0, 50.0));
}

#[test]
fn test_diagonal_open_move() {
    let map = open_map();
    let mover = Aabb::new(50.0, 50.0, 10.0, 10.0);
    assert_eq!(resolve_move(&mover, 10.0, -10.0, &[&map]).unwrap(), (60.0, 40.0));
}

#[test]
fn test_zero_move() {
    let mover = Aabb::new(50.0, 50.0, 10.0, 10.0);
    assert_eq!(resolve_move(&mover, 0.0, 0.0, &[]).unwrap(), (50.0, 50.0));
}

#[test]
fn test_box_obstacle_clamps() {
    let map = open_map();
    let mover = Aabb::new(50.0, 50.0, 10.0, 10.0);
    let other = Aabb::new(65.0, 50.0, 10.0, 10.0);
    assert_eq!(resolve_move(&mover, 20.0, 0.0, &[&map, &other]).unwrap(), (55.0, 50.0));
}

#[test]
fn test_box_obstacle_out_of_line_is_ignored() {
    let mover = Aabb::new(50.0, 50.0, 10.0, 10.0);
    let other = Aabb::new(65.0, 70.0, 10.0, 10.0);
    assert_eq!(resolve_move(&mover, 20.0, 0.0, &[&other]).unwrap(), (70.0, 50.0));
}

#[test]
fn test_box_obstacle_behind_is_ignored() {
    let mover = Aabb::new(50.0, 50.0, 10.0, 10.0);
    let other = Aabb::new(30.0, 50.0, 10.0, 10.0);
    assert_eq!(resolve_move(&mover, 20.0, 0.0, &[&other]).unwrap(), (70.0, 50.0));
    // Moving left toward it stops at its right edge.
    assert_eq!(resolve_move(&mover, -20.0, 0.0, &[&other]).unwrap(), (40.0, 50.0));
}

#[test]
fn test_wall_stops_leading_edge() {
    let map = walled_map();
    let mover = Aabb::new(20.0, 30.0, 10.0, 10.0);
    assert_eq!(resolve_move(&mover, 20.0, 0.0, &[&map]).unwrap(), (27.0, 30.0));
    // Already flush: no further progress.
    let flush = Aabb::new(27.0, 30.0, 10.0, 10.0);
    assert_eq!(resolve_move(&flush, 5.0, 0.0, &[&map]).unwrap(), (27.0, 30.0));
}

#[test]
fn test_long_move_stops_at_wall() {
    let map = walled_map();
    let mover = Aabb::new(10.0, 30.0, 10.0, 10.0);
    let (x, y) = resolve_move(&mover, 20.0, 0.0, &[&map]).unwrap();
    assert_eq!((x, y), (27.0, 30.0));
    assert_eq!(resolve_move(&mover, 200.0, 0.0, &[&map]).unwrap(), (27.0, 30.0));

    // Flush against the wall, and still free to back away.
    let stopped = Aabb::new(x, y, 10.0, 10.0);
    assert_eq!(resolve_move(&stopped, 1.0, 0.0, &[&map]).unwrap(), (27.0, 30.0));
    assert_eq!(resolve_move(&stopped, -5.0, 0.0, &[&map]).unwrap(), (22.0, 30.0));
}

#[test]
fn test_long_move_stops_at_map_edge() {
    let map = open_map();
    let mover = Aabb::new(50.0, 50.0, 10.0, 10.0);
    assert_eq!(resolve_move(&mover, 500.0, 0.0, &[&map]).unwrap(), (155.0, 50.0));
    assert_eq!(resolve_move(&mover, 0.0, -500.0, &[&map]).unwrap(), (50.0, 5.0));
}

#[test]
fn test_huge_mover_is_probed_only_across_the_map() {
    let map = open_map();
    let mover = Aabb::new(80.0, 50.0, 1.0e12, 10.0);
    assert_eq!(resolve_move(&mover, 0.0, 5.0, &[&map]).unwrap(), (80.0, 55.0));
}

#[test]
fn test_axes_resolve_independently() {
    // Blocked on x, free on y: slides along the wall.
    let map = walled_map();
    let mover = Aabb::new(27.0, 30.0, 10.0, 10.0);
    assert_eq!(resolve_move(&mover, 5.0, 5.0, &[&map]).unwrap(), (27.0, 35.0));
}

#[test]
fn test_map_edge_contains_mover() {
    let map = open_map();
    let mover = Aabb::new(10.0, 50.0, 10.0, 10.0);
    assert_eq!(resolve_move(&mover, -20.0, 0.0, &[&map]).unwrap(), (5.0, 50.0));
    let flush = Aabb::new(5.0, 50.0, 10.0, 10.0);
    assert_eq!(resolve_move(&flush, -3.0, 0.0, &[&map]).unwrap(), (5.0, 50.0));
}

#[test]
fn test_tightest_limit_wins() {
    let near = Aabb::new(70.0, 50.0, 10.0, 10.0);
    let far = Aabb::new(90.0, 50.0, 10.0, 10.0);
    let mover = Aabb::new(50.0, 50.0, 10.0, 10.0);
    assert_eq!(resolve_move(&mover, 50.0, 0.0, &[&far, &near]).unwrap(), (60.0, 50.0));
}

#[test]
fn test_probes_stay_inside_the_edge() {
    let points = probe_points(0.0, 16.0, 8.0);
    assert_eq!(points.len(), 4);
    assert_eq!(points.first(), Some(&PROBE_INSET));
    assert_eq!(points.last(), Some(&(16.0 - PROBE_INSET)));
    assert_eq!(probe_points(3.0, 3.5, 8.0), vec![3.25]);
}

#[test]
fn test_snap_toward_start() {
    assert_eq!(snap_toward(10, 12.9), 12);
    assert_eq!(snap_toward(10, 7.1), 8);
    assert_eq!(snap_toward(-3, -5.5), -5);
}
