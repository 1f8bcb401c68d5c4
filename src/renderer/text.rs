use std::collections::HashMap;

use serde::Deserialize;

use super::{Rect, Surface};

// ── GlyphPlacement ────────────────────────────────────────────────────────────

/// One glyph blit produced by [`layout_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphPlacement {
    /// Glyph region in the font sheet.
    pub src: Rect,
    /// Destination top-left in surface pixels.
    pub x: i32,
    pub y: i32,
}

// ── layout_text ───────────────────────────────────────────────────────────────

/// Lay `text` out as a list of glyph blits starting at `origin` (top-left).
///
/// # Skipping rules
/// - `'\n'` resets the X cursor to `origin.0` and advances Y by one line
///   height; it produces no blit.
/// - Characters absent from `font.glyphs` are silently skipped.
/// - Returns nothing when `font.line_height` is zero.
pub fn layout_text(text: &str, font: &Font, origin: (i32, i32)) -> Vec<GlyphPlacement> {
    if font.line_height == 0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    let (mut cx, mut cy) = origin;

    for ch in text.chars() {
        if ch == '\n' {
            cx = origin.0;
            cy += font.line_height as i32;
            continue;
        }

        let Some(glyph) = font.glyphs.get(&ch) else {
            continue;
        };

        out.push(GlyphPlacement {
            src: Rect::new(glyph.x, glyph.y, glyph.width, glyph.height),
            x: cx + glyph.x_offset,
            y: cy + glyph.y_offset,
        });
        cx += glyph.x_advance as i32;
    }

    out
}

/// Draw `text` with `font`, whose glyphs live in surface sheet `sheet`.
pub fn draw_text(surface: &mut dyn Surface, font: &Font, sheet: usize, text: &str, x: i32, y: i32) {
    for g in layout_text(text, font, (x, y)) {
        surface.blit(sheet, g.src, g.x, g.y);
    }
}

// ── Glyph ────────────────────────────────────────────────────────────────────

/// Metrics for a single character in the bitmap font sheet.
#[derive(Debug, Clone)]
pub struct Glyph {
    /// The Unicode character this glyph represents.
    pub id: char,
    /// Top-left pixel X of the glyph region in the sheet.
    pub x: u32,
    /// Top-left pixel Y of the glyph region in the sheet.
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Horizontal offset applied when drawing (may be negative).
    pub x_offset: i32,
    /// Vertical offset applied when drawing (may be negative).
    pub y_offset: i32,
    /// How far to advance the cursor after drawing this glyph.
    pub x_advance: u32,
}

// ── Font ─────────────────────────────────────────────────────────────────────

/// A bitmap font loaded from a JSON descriptor.
#[derive(Debug, Clone, Default)]
pub struct Font {
    /// All glyphs in this font, keyed by character.
    pub glyphs: HashMap<char, Glyph>,
    /// Vertical distance between successive lines in pixels.
    pub line_height: u32,
}

impl Font {
    /// Deserialise a `Font` from a JSON string.
    ///
    /// ```json
    /// { "line_height": 8, "glyphs": [ { "id": 65, "x": 0, "y": 0, "width": 8,
    ///   "height": 8, "x_offset": 0, "y_offset": 0, "x_advance": 8 } ] }
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: RawFont = serde_json::from_str(json)?;

        let glyphs = raw
            .glyphs
            .into_iter()
            .filter_map(|g| {
                // Skip any code-point that isn't a valid Unicode scalar value.
                char::from_u32(g.id).map(|ch| {
                    (ch, Glyph {
                        id: ch,
                        x: g.x,
                        y: g.y,
                        width: g.width,
                        height: g.height,
                        x_offset: g.x_offset,
                        y_offset: g.y_offset,
                        x_advance: g.x_advance,
                    })
                })
            })
            .collect();

        Ok(Self { glyphs, line_height: raw.line_height })
    }

    /// Deserialise a uniform-grid font where each key is a single character
    /// and the value is its pixel rectangle:
    ///
    /// ```json
    /// { "A": { "x": 0, "y": 0, "w": 8, "h": 8 }, ... }
    /// ```
    ///
    /// `x_advance` defaults to the glyph width; offsets are zero.
    pub fn from_atlas_json(json: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct AtlasEntry { x: u32, y: u32, w: u32, h: u32 }

        let raw: HashMap<String, AtlasEntry> = serde_json::from_str(json)?;

        let line_height = raw.values().map(|e| e.h).max().unwrap_or(0);

        let glyphs = raw
            .into_iter()
            .filter_map(|(key, entry)| {
                // Only accept single-character keys.
                let mut chars = key.chars();
                let ch = chars.next()?;
                if chars.next().is_some() { return None; }

                Some((ch, Glyph {
                    id: ch,
                    x: entry.x,
                    y: entry.y,
                    width:    entry.w,
                    height:   entry.h,
                    x_offset: 0,
                    y_offset: 0,
                    x_advance: entry.w,
                }))
            })
            .collect();

        Ok(Self { glyphs, line_height })
    }

    /// Width in pixels of the longest line of `text`.
    pub fn measure(&self, text: &str) -> u32 {
        text.lines()
            .map(|line| {
                line.chars()
                    .filter_map(|c| self.glyphs.get(&c))
                    .map(|g| g.x_advance)
                    .sum::<u32>()
            })
            .max()
            .unwrap_or(0)
    }
}

// ── Raw (JSON-facing) types ───────────────────────────────────────────────────
//
// Character IDs are stored as u32 in JSON (Unicode code points); we convert
// them to `char` when building the public `Font`.

#[derive(Deserialize)]
struct RawGlyph {
    id: u32,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    #[serde(default)]
    x_offset: i32,
    #[serde(default)]
    y_offset: i32,
    x_advance: u32,
}

#[derive(Deserialize)]
struct RawFont {
    line_height: u32,
    glyphs: Vec<RawGlyph>,
}
