// =============================================================================
// COLLISION.RS — Tile maps with quadrant-level collision
//
// Every tile is split into four quadrants (top-left, top-right, bottom-left,
// bottom-right).  A per-tile-index 4-bit mask says which quadrants block.
// Queries work on the "quadrant grid": a grid twice as fine as the tile grid
// in each direction, where a cell is blocked if its tile's mask has the
// matching bit set.  Everything outside the map counts as blocked.
// =============================================================================

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bitflags::bitflags;
use thiserror::Error;

use crate::geometry::{Aabb, Axis, Direction};

/// Mask value of a tile with no blocking quadrants.
pub const NO_COLLISION: u8 = 0x0;
/// Mask value of a fully blocking tile.
pub const FULL_COLLISION: u8 = 0xF;

/// Probes sit at most this far ahead of the leading edge they stand for.
pub const PROBE_REACH: f64 = 1.0;

bitflags! {
    /// Which quadrants of a tile block movement.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Quadrants: u8 {
        const TOP_LEFT = 0b1000;
        const TOP_RIGHT = 0b0100;
        const BOTTOM_LEFT = 0b0010;
        const BOTTOM_RIGHT = 0b0001;
    }
}

impl Quadrants {
    /// The single quadrant at half-column `col` and half-row `row` (each 0 or 1).
    pub fn at(col: usize, row: usize) -> Quadrants {
        match (col & 1, row & 1) {
            (0, 0) => Quadrants::TOP_LEFT,
            (1, 0) => Quadrants::TOP_RIGHT,
            (0, _) => Quadrants::BOTTOM_LEFT,
            _ => Quadrants::BOTTOM_RIGHT,
        }
    }
}

// ── MapError ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MapError {
    #[error("tile size must be non-zero (got {0}x{1})")]
    ZeroTileSize(u32, u32),
    #[error("map width in tiles must be non-zero")]
    ZeroWidth,
    #[error("map payload of {len} tiles is not divisible by width {tiles_wide}")]
    NotDivisible { len: usize, tiles_wide: usize },
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("query coordinate ({0}, {1}) is not a finite number")]
    NonFinite(f64, f64),
}

fn check_finite(x: f64, y: f64) -> Result<(), MapError> {
    if x.is_finite() && y.is_finite() { Ok(()) } else { Err(MapError::NonFinite(x, y)) }
}

// ── CollisionTable ───────────────────────────────────────────────────────────

/// Nibble-packed quadrant masks indexed by tile index.
///
/// Tile `i` lives in byte `i / 2`: the high nibble for even indices, the low
/// nibble for odd ones.  Indices past the end of the table do not collide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionTable {
    bytes: Vec<u8>,
}

impl CollisionTable {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn from_base64(encoded: &str) -> Result<Self, MapError> {
        Ok(Self::new(STANDARD.decode(encoded.trim())?))
    }

    /// Build a table from one mask per tile index.
    pub fn from_masks(masks: &[u8]) -> Self {
        let bytes = masks
            .chunks(2)
            .map(|pair| {
                let hi = pair[0] & 0xF;
                let lo = pair.get(1).copied().unwrap_or(NO_COLLISION) & 0xF;
                (hi << 4) | lo
            })
            .collect();
        Self { bytes }
    }

    pub fn get(&self, index: usize) -> Quadrants {
        let byte = self.bytes.get(index / 2).copied().unwrap_or(NO_COLLISION);
        let nibble = if index % 2 == 0 { byte >> 4 } else { byte & 0xF };
        Quadrants::from_bits_truncate(nibble)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// ── CollisionMap ─────────────────────────────────────────────────────────────

/// One drawable grid cell, in world pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCell {
    pub col: usize,
    pub row: usize,
    pub tile: u8,
    pub x: f64,
    pub y: f64,
}

/// An immutable rectangular grid of tile indices placed in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionMap {
    x: f64,
    y: f64,
    tile_width: f64,
    tile_height: f64,
    tiles_wide: usize,
    tiles_high: usize,
    tiles: Vec<u8>,
    collisions: CollisionTable,
    sheet: usize,
}

impl CollisionMap {
    /// `tiles` is row-major; its length must be a multiple of `tiles_wide`.
    pub fn new(
        origin: (f64, f64),
        tile_size: (u32, u32),
        tiles_wide: usize,
        tiles: Vec<u8>,
        collisions: CollisionTable,
    ) -> Result<Self, MapError> {
        let (tw, th) = tile_size;
        if tw == 0 || th == 0 {
            return Err(MapError::ZeroTileSize(tw, th));
        }
        if tiles_wide == 0 {
            return Err(MapError::ZeroWidth);
        }
        if tiles.len() % tiles_wide != 0 {
            return Err(MapError::NotDivisible { len: tiles.len(), tiles_wide });
        }
        Ok(Self {
            x: origin.0,
            y: origin.1,
            tile_width: tw as f64,
            tile_height: th as f64,
            tiles_wide,
            tiles_high: tiles.len() / tiles_wide,
            tiles,
            collisions,
            sheet: 0,
        })
    }

    /// Build a map from base64 tile and collision payloads.
    pub fn from_base64(
        origin: (f64, f64),
        tile_size: (u32, u32),
        tiles_wide: usize,
        tiles: &str,
        collisions: &str,
    ) -> Result<Self, MapError> {
        let tiles = STANDARD.decode(tiles.trim())?;
        Self::new(origin, tile_size, tiles_wide, tiles, CollisionTable::from_base64(collisions)?)
    }

    /// Tileset sheet number used when drawing.
    pub fn with_sheet(mut self, sheet: usize) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn sheet(&self) -> usize {
        self.sheet
    }

    pub fn tiles_wide(&self) -> usize {
        self.tiles_wide
    }

    pub fn tiles_high(&self) -> usize {
        self.tiles_high
    }

    pub fn tile_size(&self) -> (f64, f64) {
        (self.tile_width, self.tile_height)
    }

    pub fn tiles(&self) -> &[u8] {
        &self.tiles
    }

    pub fn collisions(&self) -> &CollisionTable {
        &self.collisions
    }

    /// World-space rectangle covered by the map.
    pub fn bounds(&self) -> Aabb {
        let w = self.tiles_wide as f64 * self.tile_width;
        let h = self.tiles_high as f64 * self.tile_height;
        Aabb::new(self.x + w / 2.0, self.y + h / 2.0, w, h)
    }

    pub fn tile_at(&self, col: usize, row: usize) -> Option<u8> {
        if col >= self.tiles_wide {
            return None;
        }
        self.tiles.get(row * self.tiles_wide + col).copied()
    }

    /// Quadrant mask of the tile at (`col`, `row`).
    pub fn tile_collision(&self, col: usize, row: usize) -> Quadrants {
        match self.tile_at(col, row) {
            Some(tile) => self.collisions.get(tile as usize),
            None => Quadrants::all(),
        }
    }

    /// Size of one quadrant along `axis`.
    pub fn quadrant_extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.tile_width / 2.0,
            Axis::Y => self.tile_height / 2.0,
        }
    }

    /// Every grid cell with its world-space top-left corner, row-major.
    pub fn cells(&self) -> impl Iterator<Item = MapCell> + '_ {
        self.tiles.iter().enumerate().map(move |(i, &tile)| {
            let col = i % self.tiles_wide;
            let row = i / self.tiles_wide;
            MapCell {
                col,
                row,
                tile,
                x: self.x + col as f64 * self.tile_width,
                y: self.y + row as f64 * self.tile_height,
            }
        })
    }

    /// The blocking bit at a world point: the quadrant's bit if its tile
    /// blocks there, empty if open, and every bit outside the map.
    pub fn point_collision(&self, x: f64, y: f64) -> Result<Quadrants, MapError> {
        check_finite(x, y)?;
        if !self.bounds().contains(x, y) {
            return Ok(Quadrants::all());
        }
        let lx = x - self.x;
        let ly = y - self.y;
        let col = (lx / self.tile_width).floor() as usize;
        let row = (ly / self.tile_height).floor() as usize;
        let half_col = usize::from(lx - col as f64 * self.tile_width >= self.tile_width / 2.0);
        let half_row = usize::from(ly - row as f64 * self.tile_height >= self.tile_height / 2.0);
        Ok(self.tile_collision(col, row) & Quadrants::at(half_col, half_row))
    }

    /// Whether the quadrant-grid cell (`qcol`, `qrow`) blocks.
    fn quadrant_blocked(&self, qcol: i64, qrow: i64) -> bool {
        if qcol < 0 || qrow < 0 {
            return true;
        }
        let (qcol, qrow) = (qcol as usize, qrow as usize);
        if qcol >= self.tiles_wide * 2 || qrow >= self.tiles_high * 2 {
            return true;
        }
        self.tile_collision(qcol / 2, qrow / 2).intersects(Quadrants::at(qcol, qrow))
    }

    /// The farthest coordinate a leading edge may reach when the point just
    /// ahead of it is (`x`, `y`) and it travels in `dir`.
    ///
    /// - `None` means the map places no limit here: the point is off the map
    ///   on the perpendicular axis, the map lies behind the direction of
    ///   travel, or the quadrant at the point and the one after it are open.
    /// - Approaching from outside, the limit is the map's near edge.  A
    ///   leading edge sitting on the far edge is held there.
    /// - If the quadrant at the point blocks, the limit is its near side,
    ///   widened back to the tile edge when the other half of the tile on
    ///   that row (or column) blocks as well. A point sitting exactly on a
    ///   half-tile line in front of a blocked quadrant is returned unchanged.
    /// - If only the next quadrant blocks, the limit is the line between
    ///   them: a half-tile line inside a tile, otherwise a tile edge.
    pub fn collision_edge(&self, dir: Direction, x: f64, y: f64) -> Result<Option<f64>, MapError> {
        check_finite(x, y)?;
        let axis = dir.axis();
        let bounds = self.bounds();
        let (along, across) = match axis {
            Axis::X => (x, y),
            Axis::Y => (y, x),
        };
        let (lo, hi) = bounds.span(axis);
        let (plo, phi) = bounds.span(axis.perpendicular());
        if across < plo || across >= phi {
            return Ok(None);
        }

        let q = self.quadrant_extent(axis);
        let qp = self.quadrant_extent(axis.perpendicular());
        let cells = match axis {
            Axis::X => self.tiles_wide as i64 * 2,
            Axis::Y => self.tiles_high as i64 * 2,
        };
        let offset = (along - lo) / q;
        let on_line = offset.fract() == 0.0;
        // A point on a grid line belongs to the cell it is about to enter.
        let cell = if dir.is_positive() { offset.floor() as i64 } else { offset.ceil() as i64 - 1 };
        let across_cell = ((across - plo) / qp).floor() as i64;

        // Off the map along the axis: the near edge limits a mover heading
        // in, and the far edge holds one whose leading edge is still on it.
        if cell < 0 {
            return Ok((dir.is_positive() || along >= lo - PROBE_REACH).then_some(lo));
        }
        if cell >= cells {
            return Ok((!dir.is_positive() || along <= hi + PROBE_REACH).then_some(hi));
        }

        let blocked = |c: i64| match axis {
            Axis::X => self.quadrant_blocked(c, across_cell),
            Axis::Y => self.quadrant_blocked(across_cell, c),
        };
        // Near side of a cell when entering it in `dir`.
        let near_side = |c: i64| if dir.is_positive() { lo + c as f64 * q } else { lo + (c + 1) as f64 * q };

        if blocked(cell) {
            if on_line {
                return Ok(Some(along));
            }
            // The other half of the same tile, on the side we came from.
            let first_half = if dir.is_positive() { cell % 2 == 0 } else { cell % 2 == 1 };
            let behind = cell - dir.sign() as i64;
            if !first_half && blocked(behind) {
                return Ok(Some(near_side(behind)));
            }
            return Ok(Some(near_side(cell)));
        }

        let ahead = cell + dir.sign() as i64;
        if blocked(ahead) {
            return Ok(Some(near_side(ahead)));
        }
        Ok(None)
    }

    /// [`collision_edge`](Self::collision_edge) for an edge about to travel
    /// `travel` units: quadrant cells are walked from (`x`, `y`) in `dir`
    /// until one blocks or the destination is covered.
    pub fn swept_edge(&self, dir: Direction, x: f64, y: f64, travel: f64) -> Result<Option<f64>, MapError> {
        check_finite(x, y)?;
        let axis = dir.axis();
        let bounds = self.bounds();
        let (along, across) = match axis {
            Axis::X => (x, y),
            Axis::Y => (y, x),
        };
        let (plo, phi) = bounds.span(axis.perpendicular());
        if across < plo || across >= phi {
            return Ok(None);
        }
        let (lo, hi) = bounds.span(axis);
        let step = self.quadrant_extent(axis) * 2.0;
        let sign = dir.sign();
        let end = along + sign * travel.abs();

        let mut probe = along;
        loop {
            let (px, py) = match axis {
                Axis::X => (probe, across),
                Axis::Y => (across, probe),
            };
            if let Some(limit) = self.collision_edge(dir, px, py)? {
                return Ok(Some(limit));
            }
            if probe < lo || probe >= hi {
                return Ok(None);
            }
            // Each query covers the probe's cell and the one after it.
            probe += sign * step;
            if sign * (probe - end) >= step {
                return Ok(None);
            }
            // Keep the last cell in play so the map edge is always found.
            probe = probe.clamp(lo + step / 4.0, hi - step / 4.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrant_at_maps_halves() {
        assert_eq!(Quadrants::at(0, 0), Quadrants::TOP_LEFT);
        assert_eq!(Quadrants::at(1, 0), Quadrants::TOP_RIGHT);
        assert_eq!(Quadrants::at(0, 1), Quadrants::BOTTOM_LEFT);
        assert_eq!(Quadrants::at(1, 1), Quadrants::BOTTOM_RIGHT);
        assert_eq!(Quadrants::at(3, 2), Quadrants::TOP_RIGHT);
    }

    #[test]
    fn out_of_range_quadrants_block() {
        let map = CollisionMap::new((0.0, 0.0), (16, 16), 1, vec![0], CollisionTable::default()).unwrap();
        assert!(map.quadrant_blocked(-1, 0));
        assert!(map.quadrant_blocked(2, 0));
        assert!(!map.quadrant_blocked(1, 1));
    }
}
