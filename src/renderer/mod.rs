//! Drawing collaborator contract.
//!
//! The core never touches pixels.  Everything that reaches the screen goes
//! through [`Surface::blit`]: copy a rectangle of a sprite sheet to a
//! destination coordinate.  [`ImageSurface`] is a software implementation on
//! top of `image::RgbaImage`; a GPU or canvas host supplies its own.

pub mod image_surface;
pub mod text;

pub use image_surface::ImageSurface;

use std::collections::HashMap;

use crate::collision::CollisionMap;
use crate::entity::Character;
use crate::world::World;

// ── Rect ─────────────────────────────────────────────────────────────────────

/// Pixel rectangle inside a sprite sheet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

// ── Surface ──────────────────────────────────────────────────────────────────

pub trait Surface {
    /// Copy `src` from sheet number `sheet` so its top-left lands at
    /// (`x`, `y`).  Parts outside the surface are clipped.
    fn blit(&mut self, sheet: usize, src: Rect, x: i32, y: i32);
}

// ── SpriteSheet ──────────────────────────────────────────────────────────────

/// A sheet sliced into a uniform grid of cells.
///
/// Tilesets are addressed by cell index (row-major); character sheets by
/// `dir` (row) and `frame` (column).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpriteSheet {
    pub cell_w: u32,
    pub cell_h: u32,
    pub columns: u32,
    pub rows: u32,
}

impl SpriteSheet {
    /// Slice a `sheet_w` × `sheet_h` pixel sheet into `cell_w` × `cell_h`
    /// cells.  Partial cells at the right and bottom are ignored.
    pub fn new(sheet_w: u32, sheet_h: u32, cell_w: u32, cell_h: u32) -> Self {
        let columns = if cell_w == 0 { 0 } else { sheet_w / cell_w };
        let rows = if cell_h == 0 { 0 } else { sheet_h / cell_h };
        Self { cell_w, cell_h, columns, rows }
    }

    pub fn len(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell `index` in row-major order, or `None` past the end.
    pub fn region(&self, index: usize) -> Option<Rect> {
        if index >= self.len() {
            return None;
        }
        let col = index as u32 % self.columns;
        let row = index as u32 / self.columns;
        Some(Rect::new(col * self.cell_w, row * self.cell_h, self.cell_w, self.cell_h))
    }

    /// Cell for a direction row and animation frame column.  Both wrap, so
    /// scripts can count frames freely.
    pub fn frame(&self, dir: i64, frame: i64) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        let row = dir.rem_euclid(self.rows as i64) as u32;
        let col = frame.rem_euclid(self.columns as i64) as u32;
        Some(Rect::new(col * self.cell_w, row * self.cell_h, self.cell_w, self.cell_h))
    }
}

// ── Drawing ──────────────────────────────────────────────────────────────────

/// Blit every cell of `map` from `tileset` onto the map's own sheet, shifted
/// by `-camera`.  Tile indices past the end of the tileset are skipped.
pub fn draw_map(surface: &mut dyn Surface, map: &CollisionMap, tileset: &SpriteSheet, camera: (i32, i32)) {
    for cell in map.cells() {
        let Some(src) = tileset.region(cell.tile as usize) else { continue };
        surface.blit(map.sheet(), src, cell.x as i32 - camera.0, cell.y as i32 - camera.1);
    }
}

/// Blit `character`'s current `dir`/`frame` cell with its origin at the box
/// center.
pub fn draw_character(surface: &mut dyn Surface, character: &Character, sheet: &SpriteSheet, camera: (i32, i32)) {
    let Some(src) = sheet.frame(character.dir(), character.frame()) else { return };
    let (x, y) = character.position();
    let (ox, oy) = character.origin();
    surface.blit(character.sheet(), src, x as i32 - ox - camera.0, y as i32 - oy - camera.1);
}

/// Layouts needed to draw a world, keyed by sheet number.
#[derive(Debug, Clone, Default)]
pub struct SheetLayouts {
    /// Tileset layout per sheet number used by maps.
    pub maps: HashMap<usize, SpriteSheet>,
    /// Layout per sheet number used by characters.
    pub characters: HashMap<usize, SpriteSheet>,
}

/// Draw every map, then every character in spawn order.  Anything whose
/// sheet has no layout is skipped.
pub fn draw_world(surface: &mut dyn Surface, world: &World, layouts: &SheetLayouts, camera: (i32, i32)) {
    for map in world.maps() {
        if let Some(tileset) = layouts.maps.get(&map.sheet()) {
            draw_map(surface, map, tileset, camera);
        }
    }
    for (_, character) in world.characters() {
        if let Some(layout) = layouts.characters.get(&character.sheet()) {
            draw_character(surface, character, layout, camera);
        }
    }
}
