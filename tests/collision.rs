use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use jotile::collision::*;
use jotile::geometry::Direction;

/// One row of tiles, 16×16 each, with the given per-index masks.
fn strip(tiles: &[u8], masks: &[u8]) -> CollisionMap {
    CollisionMap::new((0.0, 0.0), (16, 16), tiles.len(), tiles.to_vec(), CollisionTable::from_masks(masks)).unwrap()
}

// ── CollisionTable ───────────────────────────────────────────────────────────

#[test]
fn test_nibble_addressing() {
    let table = CollisionTable::new(vec![0xAB, 0xCD]);
    assert_eq!(table.get(0).bits(), 0xA);
    assert_eq!(table.get(1).bits(), 0xB);
    assert_eq!(table.get(2).bits(), 0xC);
    assert_eq!(table.get(3).bits(), 0xD);
    // Past the end nothing collides.
    assert_eq!(table.get(4), Quadrants::empty());
}

#[test]
fn test_masks_always_fit_in_a_nibble() {
    let table = CollisionTable::new((0..=255).collect());
    for i in 0..512 {
        assert!(table.get(i).bits() <= FULL_COLLISION);
    }
}

#[test]
fn test_from_masks_packs_pairs() {
    let table = CollisionTable::from_masks(&[0x1, 0x2, 0x3]);
    assert_eq!(table.as_bytes(), &[0x12, 0x30]);
}

#[test]
fn test_base64_round_trip() {
    let encoded = "AAECAwQF";
    let table = CollisionTable::from_base64(encoded).unwrap();
    assert_eq!(table.as_bytes(), &[0, 1, 2, 3, 4, 5]);
    assert_eq!(STANDARD.encode(table.as_bytes()), encoded);
}

#[test]
fn test_bad_base64_is_rejected() {
    assert!(matches!(CollisionTable::from_base64("!!!"), Err(MapError::Decode(_))));
}

// ── Construction ─────────────────────────────────────────────────────────────

#[test]
fn test_map_from_base64() {
    let tiles = STANDARD.encode([0u8, 1, 1, 0]);
    let collisions = STANDARD.encode([0x0Fu8]);
    let map = CollisionMap::from_base64((8.0, 4.0), (16, 8), 2, &tiles, &collisions).unwrap();
    assert_eq!(map.tiles_wide(), 2);
    assert_eq!(map.tiles_high(), 2);
    assert_eq!(map.tile_at(1, 0), Some(1));
    assert_eq!(map.tile_collision(1, 0), Quadrants::all());
    assert_eq!(map.tile_collision(0, 0), Quadrants::empty());
    let bounds = map.bounds();
    assert_eq!((bounds.left(), bounds.top(), bounds.right(), bounds.bottom()), (8.0, 4.0, 40.0, 20.0));
}

#[test]
fn test_construction_errors() {
    let table = CollisionTable::default();
    assert!(matches!(
        CollisionMap::new((0.0, 0.0), (16, 16), 2, vec![0, 0, 0], table.clone()),
        Err(MapError::NotDivisible { len: 3, tiles_wide: 2 })
    ));
    assert!(matches!(
        CollisionMap::new((0.0, 0.0), (0, 16), 1, vec![0], table.clone()),
        Err(MapError::ZeroTileSize(0, 16))
    ));
    assert!(matches!(CollisionMap::new((0.0, 0.0), (16, 16), 0, vec![], table), Err(MapError::ZeroWidth)));
}

#[test]
fn test_cells_are_placed_in_world_space() {
    let map = CollisionMap::new((100.0, 50.0), (16, 16), 2, vec![3, 4, 5, 6], CollisionTable::default()).unwrap();
    let cells: Vec<_> = map.cells().collect();
    assert_eq!(cells.len(), 4);
    assert_eq!((cells[3].col, cells[3].row, cells[3].tile), (1, 1, 6));
    assert_eq!((cells[3].x, cells[3].y), (116.0, 66.0));
}

// ── pointCollision ───────────────────────────────────────────────────────────

#[test]
fn test_open_map_points() {
    let map = strip(&[0, 0, 0], &[NO_COLLISION]);
    for (x, y) in [(0.0, 0.0), (7.9, 15.9), (20.0, 8.0), (47.9, 0.0)] {
        assert_eq!(map.point_collision(x, y).unwrap(), Quadrants::empty(), "({x}, {y})");
    }
    for (x, y) in [(-0.1, 4.0), (48.0, 4.0), (10.0, -1.0), (10.0, 16.0)] {
        assert_eq!(map.point_collision(x, y).unwrap(), Quadrants::all(), "({x}, {y})");
    }
}

#[test]
fn test_point_selects_quadrant() {
    // Tile 1 blocks only its top-right quadrant.
    let map = strip(&[0, 1], &[NO_COLLISION, Quadrants::TOP_RIGHT.bits()]);
    assert_eq!(map.point_collision(20.0, 4.0).unwrap(), Quadrants::empty());
    assert_eq!(map.point_collision(28.0, 4.0).unwrap(), Quadrants::TOP_RIGHT);
    assert_eq!(map.point_collision(28.0, 12.0).unwrap(), Quadrants::empty());
}

#[test]
fn test_non_finite_query() {
    let map = strip(&[0], &[]);
    assert!(matches!(map.point_collision(f64::NAN, 0.0), Err(MapError::NonFinite(..))));
    assert!(matches!(map.collision_edge(Direction::Right, 0.0, f64::INFINITY), Err(MapError::NonFinite(..))));
}

// ── collisionEdge ────────────────────────────────────────────────────────────

#[test]
fn test_blocked_tile_at_origin_clamps_to_left_boundary() {
    let map = strip(&[1], &[NO_COLLISION, FULL_COLLISION]);
    assert_eq!(map.collision_edge(Direction::Right, -1.0, 8.0).unwrap(), Some(0.0));
    assert_eq!(map.collision_edge(Direction::Right, 4.0, 8.0).unwrap(), Some(0.0));
    assert_eq!(map.collision_edge(Direction::Right, 12.0, 8.0).unwrap(), Some(0.0));
}

#[test]
fn test_edge_in_front_of_blocked_tile() {
    let map = strip(&[0, 1], &[NO_COLLISION, FULL_COLLISION]);
    assert_eq!(map.collision_edge(Direction::Right, 10.0, 4.0).unwrap(), Some(16.0));
    assert_eq!(map.collision_edge(Direction::Right, 4.0, 4.0).unwrap(), None);
    // Exactly on the boundary: unchanged.
    assert_eq!(map.collision_edge(Direction::Right, 16.0, 4.0).unwrap(), Some(16.0));
    assert_eq!(map.collision_edge(Direction::Right, 28.0, 4.0).unwrap(), Some(16.0));
}

#[test]
fn test_edge_outside_the_map() {
    let map = strip(&[0, 0], &[NO_COLLISION]);
    // Heading back toward the map from beyond its right edge.
    assert_eq!(map.collision_edge(Direction::Left, 40.0, 4.0).unwrap(), Some(32.0));
    // Heading away.
    assert_eq!(map.collision_edge(Direction::Left, -5.0, 4.0).unwrap(), None);
    assert_eq!(map.collision_edge(Direction::Right, 40.0, 4.0).unwrap(), None);
    // Off the map on the perpendicular axis.
    assert_eq!(map.collision_edge(Direction::Right, 10.0, 20.0).unwrap(), None);
}

#[test]
fn test_outer_edge_holds_flush_movers() {
    let map = strip(&[0, 0], &[NO_COLLISION]);
    assert_eq!(map.collision_edge(Direction::Right, 30.0, 4.0).unwrap(), Some(32.0));
    assert_eq!(map.collision_edge(Direction::Right, 33.0, 4.0).unwrap(), Some(32.0));
    assert_eq!(map.collision_edge(Direction::Left, 4.0, 4.0).unwrap(), Some(0.0));
    assert_eq!(map.collision_edge(Direction::Left, -1.0, 4.0).unwrap(), Some(0.0));
    assert_eq!(map.collision_edge(Direction::Top, 4.0, -1.0).unwrap(), Some(0.0));
    assert_eq!(map.collision_edge(Direction::Bottom, 4.0, 17.0).unwrap(), Some(16.0));
}

#[test]
fn test_single_quadrant_clamps_to_half_line() {
    let map = strip(&[0, 1], &[NO_COLLISION, Quadrants::TOP_RIGHT.bits()]);
    // Top row: the open left half of tile 1 is walkable up to the half line.
    assert_eq!(map.collision_edge(Direction::Right, 10.0, 4.0).unwrap(), None);
    assert_eq!(map.collision_edge(Direction::Right, 20.0, 4.0).unwrap(), Some(24.0));
    // Bottom row is open up to the map edge.
    assert_eq!(map.collision_edge(Direction::Right, 20.0, 12.0).unwrap(), None);
    assert_eq!(map.collision_edge(Direction::Right, 28.0, 12.0).unwrap(), Some(32.0));
}

#[test]
fn test_half_blocked_tile_from_both_sides() {
    // Middle tile blocks its right column.
    let right_half = (Quadrants::TOP_RIGHT | Quadrants::BOTTOM_RIGHT).bits();
    let map = strip(&[0, 1, 0], &[NO_COLLISION, right_half]);
    // From the left the limit is the half line.
    assert_eq!(map.collision_edge(Direction::Right, 20.0, 4.0).unwrap(), Some(24.0));
    // From the right it is the full tile edge.
    assert_eq!(map.collision_edge(Direction::Left, 36.0, 4.0).unwrap(), Some(32.0));
    assert_eq!(map.collision_edge(Direction::Left, 30.0, 12.0).unwrap(), Some(32.0));
}

#[test]
fn test_full_tile_widens_to_tile_edge() {
    let map = strip(&[0, 1, 0], &[NO_COLLISION, FULL_COLLISION]);
    // Second half of a fully blocked tile still reports the tile's near edge.
    assert_eq!(map.collision_edge(Direction::Left, 20.0, 4.0).unwrap(), Some(32.0));
    assert_eq!(map.collision_edge(Direction::Right, 28.0, 4.0).unwrap(), Some(16.0));
}

#[test]
fn test_vertical_edges() {
    // 1 wide, 2 high: bottom tile blocks its top-left quadrant.
    let map = CollisionMap::new(
        (0.0, 0.0),
        (16, 16),
        1,
        vec![0, 1],
        CollisionTable::from_masks(&[NO_COLLISION, Quadrants::TOP_LEFT.bits()]),
    )
    .unwrap();
    assert_eq!(map.collision_edge(Direction::Bottom, 4.0, 10.0).unwrap(), Some(16.0));
    assert_eq!(map.collision_edge(Direction::Bottom, 12.0, 10.0).unwrap(), None);
    assert_eq!(map.collision_edge(Direction::Top, 4.0, 30.0).unwrap(), Some(24.0));
}

// ── Swept edges ──────────────────────────────────────────────────────────────

#[test]
fn test_swept_edge_finds_distant_wall() {
    // Wall in tile 4 (x 64..80) of a 96 px strip.
    let map = strip(&[0, 0, 0, 0, 1, 0], &[NO_COLLISION, FULL_COLLISION]);
    assert_eq!(map.swept_edge(Direction::Right, 1.0, 4.0, 100.0).unwrap(), Some(64.0));
    assert_eq!(map.swept_edge(Direction::Left, 95.0, 4.0, 100.0).unwrap(), Some(80.0));
    // A short move never reaches it.
    assert_eq!(map.swept_edge(Direction::Right, 1.0, 4.0, 10.0).unwrap(), None);
    // The single-step query only sees the next quadrant.
    assert_eq!(map.collision_edge(Direction::Right, 1.0, 4.0).unwrap(), None);
}

#[test]
fn test_swept_edge_reaches_map_edge() {
    let map = strip(&[0, 0, 0], &[NO_COLLISION]);
    assert_eq!(map.swept_edge(Direction::Right, 1.0, 4.0, 500.0).unwrap(), Some(48.0));
    assert_eq!(map.swept_edge(Direction::Left, 47.0, 12.0, 500.0).unwrap(), Some(0.0));
    // Off the map on the perpendicular axis.
    assert_eq!(map.swept_edge(Direction::Right, 1.0, 20.0, 500.0).unwrap(), None);
    // Leaving from beyond the far edge.
    assert_eq!(map.swept_edge(Direction::Right, 60.0, 4.0, 500.0).unwrap(), None);
}

#[test]
fn test_map_keeps_its_sheet() {
    let map = strip(&[0], &[]).with_sheet(4);
    assert_eq!(map.sheet(), 4);
    assert_eq!(strip(&[0], &[]).sheet(), 0);
}
